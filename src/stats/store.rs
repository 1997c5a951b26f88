//! Time-series storage for published measurements
//!
//! Keeps a bounded history of measurements from triggered buffers plus
//! running totals for the whole pipeline. The capture path only appends;
//! readers copy entries out.

use crate::acquire::stats::Measurement;
use chrono::{DateTime, Utc};
use std::collections::VecDeque;

/// Maximum number of measurements kept at full resolution
const MAX_HISTORY_SIZE: usize = 1024;

/// A measurement with the time it was published
#[derive(Debug, Clone)]
pub struct TimedMeasurement {
    /// When the buffer passed trigger and statistics ran
    pub timestamp: DateTime<Utc>,
    /// The measurement values
    pub measurement: Measurement,
}

/// Running totals since startup
#[derive(Debug, Clone, Copy, Default)]
pub struct RunTotals {
    /// Buffers handed to the render side
    pub published: u64,
    /// Buffers that failed trigger and were returned to the pool
    pub discarded: u64,
    /// Triggered buffers dropped because the handoff queue was full
    pub dropped: u64,
    /// Frames the render side completed
    pub frames_rendered: u64,
}

/// Bounded measurement log with running totals
#[derive(Debug, Default)]
pub struct MeasurementLog {
    history: VecDeque<TimedMeasurement>,
    totals: RunTotals,
}

impl MeasurementLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self {
            history: VecDeque::with_capacity(MAX_HISTORY_SIZE),
            totals: RunTotals::default(),
        }
    }

    /// Record a published measurement
    pub fn record_published(&mut self, measurement: Measurement) {
        if self.history.len() >= MAX_HISTORY_SIZE {
            self.history.pop_front();
        }
        self.history.push_back(TimedMeasurement {
            timestamp: Utc::now(),
            measurement,
        });
        self.totals.published += 1;
    }

    /// Record a buffer discarded for lack of a trigger
    pub fn record_discarded(&mut self) {
        self.totals.discarded += 1;
    }

    /// Record a triggered buffer dropped on a full handoff queue
    pub fn record_dropped(&mut self) {
        self.totals.dropped += 1;
    }

    /// Record a completed render frame
    pub fn record_frame_rendered(&mut self) {
        self.totals.frames_rendered += 1;
    }

    /// Copy of the running totals
    pub fn totals(&self) -> RunTotals {
        self.totals
    }

    /// Most recent published measurement, if any
    pub fn latest(&self) -> Option<TimedMeasurement> {
        self.history.back().cloned()
    }

    /// The most recent `n` measurements, oldest first
    pub fn recent(&self, n: usize) -> Vec<TimedMeasurement> {
        let skip = self.history.len().saturating_sub(n);
        self.history.iter().skip(skip).cloned().collect()
    }

    /// Number of measurements currently held
    pub fn len(&self) -> usize {
        self.history.len()
    }

    /// True when no measurement has been recorded yet
    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn measurement(frequency: f64) -> Measurement {
        Measurement {
            min: 0,
            max: 4095,
            vpp: 4095,
            frequency,
            duty_cycle: 50.0,
        }
    }

    #[test]
    fn test_record_and_latest() {
        let mut log = MeasurementLog::new();
        assert!(log.is_empty());
        assert!(log.latest().is_none());

        log.record_published(measurement(100.0));
        log.record_published(measurement(200.0));

        assert_eq!(log.len(), 2);
        assert_eq!(log.latest().unwrap().measurement.frequency, 200.0);
        assert_eq!(log.totals().published, 2);
    }

    #[test]
    fn test_history_is_bounded() {
        let mut log = MeasurementLog::new();
        for i in 0..(MAX_HISTORY_SIZE + 100) {
            log.record_published(measurement(i as f64));
        }
        assert_eq!(log.len(), MAX_HISTORY_SIZE);
        // Oldest entries were evicted
        assert_eq!(
            log.recent(1)[0].measurement.frequency,
            (MAX_HISTORY_SIZE + 99) as f64
        );
        assert_eq!(log.totals().published, (MAX_HISTORY_SIZE + 100) as u64);
    }

    #[test]
    fn test_totals_track_outcomes() {
        let mut log = MeasurementLog::new();
        log.record_published(measurement(1.0));
        log.record_discarded();
        log.record_discarded();
        log.record_dropped();
        log.record_frame_rendered();

        let totals = log.totals();
        assert_eq!(totals.published, 1);
        assert_eq!(totals.discarded, 2);
        assert_eq!(totals.dropped, 1);
        assert_eq!(totals.frames_rendered, 1);
    }

    #[test]
    fn test_recent_returns_oldest_first() {
        let mut log = MeasurementLog::new();
        for i in 0..5 {
            log.record_published(measurement(i as f64));
        }
        let recent = log.recent(3);
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].measurement.frequency, 2.0);
        assert_eq!(recent[2].measurement.frequency, 4.0);
    }
}
