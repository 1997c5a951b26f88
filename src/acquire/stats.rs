//! Waveform statistics
//!
//! Computes amplitude and timing measurements from a capture buffer:
//! min/max/peak-to-peak, frequency from trigger-level crossings, and duty
//! cycle. All crossing counting uses the configured trigger level as the
//! reference, never a recomputed running mean.

use serde::{Deserialize, Serialize};

/// One set of measurements derived from a capture buffer
///
/// Overwritten wholesale on every triggered buffer. `no_signal` is the
/// defined reset value when a buffer has fewer than two level crossings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// Smallest sample value (0..4095)
    pub min: u16,
    /// Largest sample value (0..4095)
    pub max: u16,
    /// Peak-to-peak amplitude (`max - min`)
    pub vpp: u16,
    /// Estimated signal frequency in Hz (0 when unknown)
    pub frequency: f64,
    /// Percentage of samples above the trigger level (0 when frequency is 0)
    pub duty_cycle: f32,
}

impl Measurement {
    /// The defined "no signal" value
    pub fn no_signal() -> Self {
        Self::default()
    }
}

/// Statistics engine
///
/// # Example
/// ```
/// use dualscope::acquire::stats::StatisticsEngine;
///
/// let engine = StatisticsEngine::new(500_000);
/// // 10 full periods of a square wave, period 32 samples
/// let samples: Vec<u16> = (0..320).map(|i| if (i / 16) % 2 == 0 { 4000 } else { 100 }).collect();
/// let m = engine.compute(&samples, 2048);
/// assert!((m.frequency - 500_000.0 / 32.0).abs() < 500.0);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct StatisticsEngine {
    sample_rate: u32,
}

impl StatisticsEngine {
    /// Create an engine for the given sample rate in Hz
    pub fn new(sample_rate: u32) -> Self {
        Self { sample_rate }
    }

    /// Configured sample rate
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Update the sample rate (tracks the live configuration surface)
    pub fn set_sample_rate(&mut self, rate: u32) {
        if rate > 0 {
            self.sample_rate = rate;
        }
    }

    /// Compute measurements over `samples` using `trigger_level` as the
    /// crossing reference.
    ///
    /// Fewer than two level crossings cannot bound a period, so frequency
    /// and duty cycle report 0 in that case. With two or more crossings,
    /// a coarse period estimate `2·len/crossings` is refined from the span
    /// between the first and last crossing: successive crossings bound
    /// half-period intervals, giving `period = 2·span/(crossings - 1)`.
    pub fn compute(&self, samples: &[u16], trigger_level: u16) -> Measurement {
        if samples.is_empty() {
            return Measurement::no_signal();
        }

        let mut min = u16::MAX;
        let mut max = 0u16;
        let mut crossings = 0usize;
        let mut high_samples = 0usize;
        let mut last_state = samples[0] > trigger_level;

        for &s in samples {
            min = min.min(s);
            max = max.max(s);
            let state = s > trigger_level;
            if state != last_state {
                crossings += 1;
                last_state = state;
            }
            if state {
                high_samples += 1;
            }
        }

        let vpp = max - min;

        if crossings < 2 {
            return Measurement {
                min,
                max,
                vpp,
                frequency: 0.0,
                duty_cycle: 0.0,
            };
        }

        let coarse_period = (2 * samples.len()) as f64 / crossings as f64;
        let mut frequency = self.sample_rate as f64 / coarse_period;

        if let Some(exact_period) = Self::refine_period(samples, trigger_level) {
            frequency = self.sample_rate as f64 / exact_period;
        }

        let duty_cycle = (high_samples * 100) as f32 / samples.len() as f32;

        Measurement {
            min,
            max,
            vpp,
            frequency,
            duty_cycle,
        }
    }

    /// Re-scan for the first and last crossing and derive an exact period
    /// from the crossing-bounded half-period intervals between them.
    fn refine_period(samples: &[u16], trigger_level: u16) -> Option<f64> {
        let mut first = None;
        let mut last = 0usize;
        let mut count = 0usize;

        for i in 1..samples.len() {
            let prev_state = samples[i - 1] > trigger_level;
            let state = samples[i] > trigger_level;
            if prev_state != state {
                if first.is_none() {
                    first = Some(i);
                }
                last = i;
                count += 1;
            }
        }

        if count < 2 {
            return None;
        }
        let span = (last - first?) as f64;
        let period = 2.0 * span / (count - 1) as f64;
        (period > 0.0).then_some(period)
    }
}
