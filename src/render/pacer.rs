//! Fixed-rate frame pacing
//!
//! Sleeps to an absolute deadline that advances by exactly one frame
//! period per frame, so composition time does not accumulate as drift.
//! After a long stall the deadline resyncs to now instead of fast-
//! forwarding through the missed frames.

use std::time::{Duration, Instant};

/// Number of frame periods behind at which the pacer resyncs
const STALL_PERIODS: u32 = 3;

/// Monotonic frame-rate governor
pub struct FramePacer {
    period: Duration,
    deadline: Instant,
    resyncs: u64,
}

impl FramePacer {
    /// Create a pacer targeting `frame_rate` frames per second
    pub fn new(frame_rate: u32) -> Self {
        let period = Duration::from_secs(1) / frame_rate.max(1);
        Self {
            period,
            deadline: Instant::now() + period,
            resyncs: 0,
        }
    }

    /// Frame period
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Times the pacer has resynced after a stall
    pub fn resyncs(&self) -> u64 {
        self.resyncs
    }

    /// Sleep until the next frame deadline, then advance it.
    ///
    /// Returns the time slept (zero when the frame overran its budget).
    pub fn wait(&mut self) -> Duration {
        let now = Instant::now();
        let slept = if now < self.deadline {
            let sleep_for = self.deadline - now;
            std::thread::sleep(sleep_for);
            sleep_for
        } else {
            Duration::ZERO
        };

        self.deadline += self.period;

        // A stalled loop should not replay every missed deadline at once
        let now = Instant::now();
        if now > self.deadline + self.period * STALL_PERIODS {
            self.deadline = now + self.period;
            self.resyncs += 1;
            tracing::debug!(resyncs = self.resyncs, "frame pacer resynced after stall");
        }

        slept
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wait_holds_target_rate() {
        let mut pacer = FramePacer::new(100);
        let start = Instant::now();
        for _ in 0..5 {
            pacer.wait();
        }
        let elapsed = start.elapsed();
        // Five 10 ms frames; allow generous slack for scheduler jitter
        assert!(elapsed >= Duration::from_millis(45), "elapsed {elapsed:?}");
        assert!(elapsed < Duration::from_millis(200), "elapsed {elapsed:?}");
    }

    #[test]
    fn test_overrun_frame_does_not_sleep() {
        let mut pacer = FramePacer::new(1000);
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(pacer.wait(), Duration::ZERO);
    }

    #[test]
    fn test_stall_triggers_resync() {
        let mut pacer = FramePacer::new(1000);
        std::thread::sleep(Duration::from_millis(20));
        pacer.wait();
        assert_eq!(pacer.resyncs(), 1);
        // After resync the pacer sleeps again
        assert!(pacer.wait() > Duration::ZERO);
    }
}
