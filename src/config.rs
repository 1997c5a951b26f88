//! Runtime configuration
//!
//! Defaults mirror the fixed hardware parameters of the original front
//! end; a JSON file can override any subset of fields. Live-adjustable
//! settings (trigger, hold, scales) are mirrored into the shared pipeline
//! state after startup.

use crate::acquire::trigger::TriggerEdge;
use crate::{
    BUFFER_LEN, DEFAULT_FRAME_RATE, DEFAULT_SAMPLE_RATE, DEFAULT_TRIGGER_LEVEL, NUM_BUFFERS,
    SAMPLE_MAX,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors from configuration loading
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Oscilloscope configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScopeConfig {
    /// ADC sample rate in Hz
    pub sample_rate: u32,
    /// Trigger threshold in sample units (0..=4095)
    pub trigger_level: u16,
    /// Whether trigger alignment is applied at all
    pub trigger_enabled: bool,
    /// Crossing direction the trigger fires on
    pub trigger_edge: TriggerEdge,
    /// Horizontal zoom factor applied at render time
    pub time_scale: f32,
    /// Vertical zoom factor applied at render time
    pub voltage_scale: f32,
    /// Vertical offset in sample units applied at render time
    pub voltage_offset: i32,
    /// Freeze the displayed waveform
    pub hold: bool,
    /// Keep adopting new captures even while held
    pub live_update: bool,
    /// Number of rotating capture buffers
    pub num_buffers: usize,
    /// Samples per capture buffer
    pub buffer_len: usize,
    /// Render loop target rate in frames per second
    pub frame_rate: u32,
}

impl Default for ScopeConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            trigger_level: DEFAULT_TRIGGER_LEVEL,
            trigger_enabled: true,
            trigger_edge: TriggerEdge::Rising,
            time_scale: 1.0,
            voltage_scale: 1.0,
            voltage_offset: 0,
            hold: false,
            live_update: false,
            num_buffers: NUM_BUFFERS,
            buffer_len: BUFFER_LEN,
            frame_rate: DEFAULT_FRAME_RATE,
        }
    }
}

impl ScopeConfig {
    /// Load configuration from a JSON file, falling back to defaults for
    /// any fields the file omits.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check field ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_rate == 0 {
            return Err(ConfigError::Invalid("sample_rate must be nonzero".into()));
        }
        if self.trigger_level > SAMPLE_MAX {
            return Err(ConfigError::Invalid(format!(
                "trigger_level {} exceeds {}",
                self.trigger_level, SAMPLE_MAX
            )));
        }
        if self.num_buffers < 2 {
            return Err(ConfigError::Invalid(
                "num_buffers must be at least 2".into(),
            ));
        }
        if self.buffer_len == 0 {
            return Err(ConfigError::Invalid("buffer_len must be nonzero".into()));
        }
        if self.frame_rate == 0 {
            return Err(ConfigError::Invalid("frame_rate must be nonzero".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ScopeConfig::default();
        assert_eq!(config.sample_rate, 500_000);
        assert_eq!(config.trigger_level, 2048);
        assert!(config.trigger_enabled);
        assert_eq!(config.trigger_edge, TriggerEdge::Rising);
        assert!(!config.hold);
        assert_eq!(config.num_buffers, 2);
        assert_eq!(config.buffer_len, 320);
        assert_eq!(config.frame_rate, 60);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: ScopeConfig =
            serde_json::from_str(r#"{"trigger_level": 1000, "hold": true}"#).unwrap();
        assert_eq!(config.trigger_level, 1000);
        assert!(config.hold);
        assert_eq!(config.sample_rate, 500_000);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = ScopeConfig {
            trigger_level: 5000,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        config.trigger_level = 2048;
        config.num_buffers = 1;
        assert!(config.validate().is_err());

        config.num_buffers = 2;
        config.sample_rate = 0;
        assert!(config.validate().is_err());
    }
}
