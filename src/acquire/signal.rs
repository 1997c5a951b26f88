//! 12-bit test signal generation
//!
//! Deterministic waveform sources quantized to the sampler's 0..4095
//! domain. These stand in for the analog front end on hosted builds and
//! give tests exact, repeatable capture data.

use crate::SAMPLE_MAX;
use serde::{Deserialize, Serialize};

/// Waveform shape produced by [`SignalGenerator`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaveformKind {
    /// Two-level wave with configurable duty ratio
    Square,
    /// Full-scale sine centered at mid-scale
    Sine,
    /// Rising ramp from 0 to full scale over one period
    Ramp,
}

impl std::str::FromStr for WaveformKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "square" => Ok(Self::Square),
            "sine" => Ok(Self::Sine),
            "ramp" => Ok(Self::Ramp),
            other => Err(format!("unknown waveform: {other}")),
        }
    }
}

/// Periodic 12-bit signal generator
///
/// Pre-generates one period and cycles through it, so repeated fills are
/// phase-continuous across buffer boundaries.
///
/// # Example
/// ```
/// use dualscope::acquire::signal::{SignalGenerator, WaveformKind};
///
/// let mut gen = SignalGenerator::new(WaveformKind::Square, 32, 0.5);
/// let mut buffer = [0u16; 320];
/// gen.fill(&mut buffer);
/// assert!(buffer.iter().all(|&s| s <= 4095));
/// ```
#[derive(Debug, Clone)]
pub struct SignalGenerator {
    kind: WaveformKind,
    period: Vec<u16>,
    position: usize,
}

impl SignalGenerator {
    /// Create a generator for `kind` with the given period in samples.
    ///
    /// `duty` (0.0..=1.0) applies to square waves only.
    ///
    /// # Panics
    /// Panics if `period_samples` is less than 2.
    pub fn new(kind: WaveformKind, period_samples: usize, duty: f32) -> Self {
        assert!(period_samples >= 2, "period must be at least 2 samples");
        let duty = duty.clamp(0.0, 1.0);
        let period = Self::generate_period(kind, period_samples, duty);
        Self {
            kind,
            period,
            position: 0,
        }
    }

    fn generate_period(kind: WaveformKind, len: usize, duty: f32) -> Vec<u16> {
        let mid = (SAMPLE_MAX as f64 + 1.0) / 2.0;
        (0..len)
            .map(|i| match kind {
                WaveformKind::Square => {
                    let high_len = (len as f32 * duty) as usize;
                    if i < high_len {
                        SAMPLE_MAX
                    } else {
                        0
                    }
                }
                WaveformKind::Sine => {
                    let phase = i as f64 / len as f64 * std::f64::consts::TAU;
                    (mid + (mid - 1.0) * phase.sin()).clamp(0.0, SAMPLE_MAX as f64) as u16
                }
                WaveformKind::Ramp => ((i * SAMPLE_MAX as usize) / (len - 1)) as u16,
            })
            .collect()
    }

    /// Waveform shape
    pub fn kind(&self) -> WaveformKind {
        self.kind
    }

    /// Period length in samples
    pub fn period_samples(&self) -> usize {
        self.period.len()
    }

    /// Current phase position within the period
    pub fn position(&self) -> usize {
        self.position
    }

    /// Next sample in the cycle
    pub fn next_sample(&mut self) -> u16 {
        let sample = self.period[self.position];
        self.position = (self.position + 1) % self.period.len();
        sample
    }

    /// Fill `buffer` with consecutive samples, continuing the phase
    pub fn fill(&mut self, buffer: &mut [u16]) {
        for s in buffer.iter_mut() {
            *s = self.next_sample();
        }
    }

    /// Restart the cycle from phase zero
    pub fn reset(&mut self) {
        self.position = 0;
    }
}

impl Default for SignalGenerator {
    fn default() -> Self {
        Self::new(WaveformKind::Square, 32, 0.5)
    }
}
