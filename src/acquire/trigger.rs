//! Trigger edge detection and buffer alignment
//!
//! Scans a filled capture buffer for the first crossing of the configured
//! level in the configured direction, then aligns the buffer so the
//! crossing sits a fixed pre-trigger margin from the start. Alignment is
//! zero-copy: it produces a [`SampleWindow`] view over the buffer instead
//! of shifting samples in place, so the capture data is never mutated.

use crate::TRIGGER_GUARD;
use serde::{Deserialize, Serialize};

/// Trigger slope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerEdge {
    /// Crossing from below the level to at-or-above it
    Rising,
    /// Crossing from above the level to at-or-below it
    Falling,
}

/// Valid region of a capture buffer after trigger alignment
///
/// `apply` narrows a buffer to `[start, start + len)`. Samples past the
/// window were captured before the pre-trigger margin and are dead data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleWindow {
    start: usize,
    len: usize,
}

impl SampleWindow {
    /// Window covering an entire buffer of `len` samples
    pub fn full(len: usize) -> Self {
        Self { start: 0, len }
    }

    /// Window starting at `start` with `len` valid samples
    pub fn new(start: usize, len: usize) -> Self {
        Self { start, len }
    }

    /// Offset of the first valid sample
    pub fn start(&self) -> usize {
        self.start
    }

    /// Number of valid samples
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when the window holds no samples
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Narrow `samples` to the valid region
    pub fn apply<'a>(&self, samples: &'a [u16]) -> &'a [u16] {
        &samples[self.start..self.start + self.len]
    }
}

/// Level/slope trigger detector
///
/// # Example
/// ```
/// use dualscope::acquire::trigger::{TriggerDetector, TriggerEdge};
///
/// let detector = TriggerDetector::new(2048, TriggerEdge::Rising, true);
/// let ramp: Vec<u16> = (0..320).map(|i| (i * 4095 / 319) as u16).collect();
/// let crossing = detector.detect(&ramp).expect("ramp crosses mid-scale");
/// assert!(ramp[crossing] >= 2048 && ramp[crossing - 1] < 2048);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct TriggerDetector {
    level: u16,
    edge: TriggerEdge,
    enabled: bool,
}

impl TriggerDetector {
    /// Create a detector for the given level and slope.
    ///
    /// A disabled detector reports every buffer as triggered without
    /// inspecting or aligning it.
    pub fn new(level: u16, edge: TriggerEdge, enabled: bool) -> Self {
        Self {
            level,
            edge,
            enabled,
        }
    }

    /// Configured trigger level
    pub fn level(&self) -> u16 {
        self.level
    }

    /// Configured slope
    pub fn edge(&self) -> TriggerEdge {
        self.edge
    }

    /// Find the first crossing of the level in the configured direction.
    ///
    /// For a rising edge this is the first index `i` with
    /// `sample[i-1] < level <= sample[i]`; falling is symmetric. Returns
    /// `None` when the buffer never crosses the level, which callers treat
    /// as "not triggered".
    pub fn detect(&self, samples: &[u16]) -> Option<usize> {
        for i in 1..samples.len() {
            let hit = match self.edge {
                TriggerEdge::Rising => samples[i - 1] < self.level && samples[i] >= self.level,
                TriggerEdge::Falling => samples[i - 1] > self.level && samples[i] <= self.level,
            };
            if hit {
                return Some(i);
            }
        }
        None
    }

    /// Align a buffer of `total_len` samples around a crossing at `crossing`.
    ///
    /// When the crossing sits deeper than the pre-trigger guard, the window
    /// starts `TRIGGER_GUARD` samples before it, so the guard region of the
    /// view holds exactly the samples leading into the crossing. Earlier
    /// context is discarded with the window start; the buffer itself is
    /// untouched.
    pub fn align(&self, crossing: usize, total_len: usize) -> SampleWindow {
        if crossing > TRIGGER_GUARD {
            let start = crossing - TRIGGER_GUARD;
            SampleWindow::new(start, total_len - start)
        } else {
            SampleWindow::full(total_len)
        }
    }

    /// Run detection and alignment in one step.
    ///
    /// Returns the aligned window on trigger, the full buffer when
    /// triggering is disabled, and `None` when no crossing exists.
    pub fn evaluate(&self, samples: &[u16]) -> Option<SampleWindow> {
        if !self.enabled {
            return Some(SampleWindow::full(samples.len()));
        }
        self.detect(samples)
            .map(|crossing| self.align(crossing, samples.len()))
    }
}
