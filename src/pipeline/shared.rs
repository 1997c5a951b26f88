//! Shared pipeline state and per-side snapshots
//!
//! Both loops read their settings through short-lived snapshots taken in
//! one critical section per cycle, so neither side holds the state lock
//! while it sleeps or blits.

use crate::acquire::stats::Measurement;
use crate::acquire::trigger::TriggerEdge;
use crate::config::ScopeConfig;
use crate::acquire::pool::SlotIndex;

/// Control state shared between the acquisition and render loops
#[derive(Debug, Clone)]
pub struct SharedPipelineState {
    /// ADC sample rate in Hz
    pub sample_rate: u32,
    /// Trigger threshold in sample units
    pub trigger_level: u16,
    /// Whether trigger alignment is applied
    pub trigger_enabled: bool,
    /// Crossing direction the trigger fires on
    pub trigger_edge: TriggerEdge,
    /// Freeze the displayed waveform
    pub hold: bool,
    /// Keep adopting new captures even while held
    pub live_update: bool,
    /// Horizontal zoom factor
    pub time_scale: f32,
    /// Vertical zoom factor
    pub voltage_scale: f32,
    /// Vertical offset in sample units
    pub voltage_offset: i32,
    /// Slot whose waveform the render side should show, if any
    pub display_slot: Option<SlotIndex>,
    /// Most recent measurement from a triggered buffer
    pub measurement: Measurement,
}

impl SharedPipelineState {
    /// Seed the shared state from startup configuration
    pub fn from_config(config: &ScopeConfig) -> Self {
        Self {
            sample_rate: config.sample_rate,
            trigger_level: config.trigger_level,
            trigger_enabled: config.trigger_enabled,
            trigger_edge: config.trigger_edge,
            hold: config.hold,
            live_update: config.live_update,
            time_scale: config.time_scale,
            voltage_scale: config.voltage_scale,
            voltage_offset: config.voltage_offset,
            display_slot: None,
            measurement: Measurement::no_signal(),
        }
    }

    /// Snapshot of the fields the acquisition loop reads each cycle
    pub fn acquire_snapshot(&self) -> AcquireSnapshot {
        AcquireSnapshot {
            sample_rate: self.sample_rate,
            trigger_level: self.trigger_level,
            trigger_enabled: self.trigger_enabled,
            trigger_edge: self.trigger_edge,
            hold: self.hold,
            live_update: self.live_update,
            display_slot: self.display_slot,
        }
    }

    /// Snapshot of the fields the render loop reads each frame
    pub fn render_snapshot(&self) -> RenderSnapshot {
        RenderSnapshot {
            display_slot: self.display_slot,
            hold: self.hold,
            live_update: self.live_update,
            measurement: self.measurement,
            time_scale: self.time_scale,
            voltage_scale: self.voltage_scale,
            voltage_offset: self.voltage_offset,
        }
    }
}

/// Per-cycle view of the settings the acquisition side uses
#[derive(Debug, Clone, Copy)]
pub struct AcquireSnapshot {
    pub sample_rate: u32,
    pub trigger_level: u16,
    pub trigger_enabled: bool,
    pub trigger_edge: TriggerEdge,
    pub hold: bool,
    pub live_update: bool,
    pub display_slot: Option<SlotIndex>,
}

/// Per-frame view of the settings the render side uses
#[derive(Debug, Clone, Copy)]
pub struct RenderSnapshot {
    pub display_slot: Option<SlotIndex>,
    pub hold: bool,
    pub live_update: bool,
    pub measurement: Measurement,
    pub time_scale: f32,
    pub voltage_scale: f32,
    pub voltage_offset: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_seeds_fields() {
        let config = ScopeConfig {
            trigger_level: 1234,
            hold: true,
            ..Default::default()
        };
        let state = SharedPipelineState::from_config(&config);
        assert_eq!(state.trigger_level, 1234);
        assert!(state.hold);
        assert!(state.display_slot.is_none());
        assert_eq!(state.measurement, Measurement::no_signal());
    }

    #[test]
    fn test_snapshots_reflect_state() {
        let mut state = SharedPipelineState::from_config(&ScopeConfig::default());
        state.display_slot = Some(1);
        state.live_update = true;

        let a = state.acquire_snapshot();
        assert_eq!(a.display_slot, Some(1));
        assert!(a.live_update);

        let r = state.render_snapshot();
        assert_eq!(r.display_slot, Some(1));
        assert!(!r.hold);
    }
}
