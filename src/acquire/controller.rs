//! Acquisition loop
//!
//! Owns the sampling transport and drives the capture cycle: block on
//! transfer completion, rearm the next buffer immediately so capture never
//! gaps, then run trigger detection and statistics on the completed buffer
//! and hand it across to the render side.
//!
//! Rearm ordering matters: the next buffer is armed before processing
//! starts, so processing time never eats into the capture window. When no
//! slot is available at that point (both slots mid-flight), the rearm is
//! retried once after processing frees a slot.

use crate::acquire::pool::{PoolError, SlotIndex};
use crate::acquire::sampler::SampleTransport;
use crate::acquire::stats::StatisticsEngine;
use crate::acquire::trigger::TriggerDetector;
use crate::pipeline::channel::{CrossCoreChannel, PublishOutcome};
use crate::pipeline::shared::AcquireSnapshot;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// Errors from the acquisition loop
#[derive(Error, Debug)]
pub enum AcquisitionError {
    /// Data arrived with no buffer armed; capture integrity is lost and
    /// the loop must stop rather than show stale waveforms
    #[error("sample transport overrun")]
    TransportOverrun,

    #[error("sample transport error: {0}")]
    Transport(String),

    #[error(transparent)]
    Pool(#[from] PoolError),
}

/// What one acquisition cycle did with its buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Buffer passed trigger and was queued for rendering
    Published,
    /// Buffer failed trigger and went back to the pool
    Discarded,
    /// Buffer passed trigger but the handoff queue was full
    Dropped,
}

/// Drives one sampling transport against the shared pipeline
pub struct AcquisitionController<T: SampleTransport> {
    transport: T,
    channel: Arc<CrossCoreChannel>,
    engine: StatisticsEngine,
    current_slot: SlotIndex,
}

impl<T: SampleTransport> AcquisitionController<T> {
    pub fn new(transport: T, channel: Arc<CrossCoreChannel>) -> Self {
        let sample_rate = channel.acquire_snapshot().sample_rate;
        Self {
            transport,
            channel,
            engine: StatisticsEngine::new(sample_rate),
            current_slot: 0,
        }
    }

    /// Slot currently armed for capture
    pub fn current_slot(&self) -> SlotIndex {
        self.current_slot
    }

    /// Arm the first buffer and start the transport
    pub fn start(&mut self) -> Result<(), AcquisitionError> {
        let (slot, storage) = self.channel.with_pool(|pool| pool.acquire_for_filling())?;
        self.current_slot = slot;
        self.transport.rearm(slot, storage)?;
        self.transport.start()?;
        tracing::info!(slot, "acquisition started");
        Ok(())
    }

    /// Run one capture cycle: wait, rearm, process.
    ///
    /// A rearm failure with [`PoolError::Busy`] is not fatal here; the
    /// rearm is retried after processing, which always frees at least one
    /// slot by publishing or discarding the completed buffer.
    pub fn cycle(&mut self) -> Result<CycleOutcome, AcquisitionError> {
        let completed = self.transport.wait_complete()?;
        let snapshot = self.channel.acquire_snapshot();
        self.engine.set_sample_rate(snapshot.sample_rate);

        self.channel
            .with_pool(|pool| pool.mark_filled(completed.slot))?;

        let rearmed = self.try_rearm(completed.slot, snapshot.display_slot)?;
        let outcome = self.process(completed.slot, completed.storage, &snapshot)?;

        if !rearmed {
            // Processing just freed the completed slot; this cannot be Busy
            // again unless the pool is misconfigured
            self.try_rearm(completed.slot, snapshot.display_slot)?;
        }

        Ok(outcome)
    }

    /// Loop until `running` clears or a fatal transport error occurs
    pub fn run(&mut self, running: &AtomicBool) -> Result<(), AcquisitionError> {
        self.start()?;
        while running.load(Ordering::Relaxed) {
            match self.cycle() {
                Ok(outcome) => {
                    tracing::trace!(?outcome, "acquisition cycle");
                }
                Err(AcquisitionError::TransportOverrun) => {
                    tracing::error!("transport overrun, stopping acquisition");
                    self.stop();
                    return Err(AcquisitionError::TransportOverrun);
                }
                Err(e) => {
                    self.stop();
                    return Err(e);
                }
            }
        }
        self.stop();
        Ok(())
    }

    /// Stop the transport; armed buffers are abandoned to the pool's
    /// eventual reset
    pub fn stop(&mut self) {
        self.transport.stop();
        tracing::info!("acquisition stopped");
    }

    fn try_rearm(
        &mut self,
        completed: SlotIndex,
        display_slot: Option<SlotIndex>,
    ) -> Result<bool, AcquisitionError> {
        match self
            .channel
            .with_pool(|pool| pool.rotate_acquire(completed, display_slot))
        {
            Ok((slot, storage)) => {
                self.current_slot = slot;
                self.transport.rearm(slot, storage)?;
                Ok(true)
            }
            Err(PoolError::Busy) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn process(
        &mut self,
        slot: SlotIndex,
        storage: Vec<u16>,
        snapshot: &AcquireSnapshot,
    ) -> Result<CycleOutcome, AcquisitionError> {
        let detector = TriggerDetector::new(
            snapshot.trigger_level,
            snapshot.trigger_edge,
            snapshot.trigger_enabled,
        );

        match detector.evaluate(&storage) {
            Some(window) => {
                let measurement = self
                    .engine
                    .compute(window.apply(&storage), snapshot.trigger_level);
                let outcome = self
                    .channel
                    .publish(slot, storage, window, measurement)?;
                Ok(match outcome {
                    PublishOutcome::Queued => CycleOutcome::Published,
                    PublishOutcome::Dropped => CycleOutcome::Dropped,
                })
            }
            None => {
                self.channel.discard(slot, storage)?;
                Ok(CycleOutcome::Discarded)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquire::sampler::SyntheticSampler;
    use crate::acquire::signal::{SignalGenerator, WaveformKind};
    use crate::config::ScopeConfig;

    fn controller(kind: WaveformKind) -> AcquisitionController<SyntheticSampler> {
        let channel = CrossCoreChannel::new(&ScopeConfig::default());
        let sampler = SyntheticSampler::new(SignalGenerator::new(kind, 32, 0.5), 500_000, false);
        AcquisitionController::new(sampler, channel)
    }

    #[test]
    fn test_square_wave_cycle_publishes() {
        let mut c = controller(WaveformKind::Square);
        c.start().unwrap();
        let armed = c.current_slot();
        let outcome = c.cycle().unwrap();
        assert_eq!(outcome, CycleOutcome::Published);
        // The rearm moved capture off the published slot
        assert_ne!(c.current_slot(), armed);

        let channel = c.channel.clone();
        let m = channel.latest_measurement().unwrap().measurement;
        assert_eq!(m.max, 4095);
        assert_eq!(m.min, 0);
        assert!(m.frequency > 0.0);
    }

    #[test]
    fn test_continuous_cycles_never_stall() {
        let mut c = controller(WaveformKind::Square);
        c.start().unwrap();
        for _ in 0..20 {
            // Render side never claims anything; reclaim keeps capture alive
            c.cycle().unwrap();
        }
        assert!(c.channel.with_pool(|pool| pool.reclaimed_count()) > 0);
    }

    #[test]
    fn test_untriggered_buffer_is_discarded() {
        // Duty 1.0 square is a constant full-scale level: no crossings
        let channel = CrossCoreChannel::new(&ScopeConfig::default());
        let sampler = SyntheticSampler::new(
            SignalGenerator::new(WaveformKind::Square, 32, 1.0),
            500_000,
            false,
        );
        let mut c = AcquisitionController::new(sampler, channel);
        c.start().unwrap();
        let outcome = c.cycle().unwrap();
        assert_eq!(outcome, CycleOutcome::Discarded);
        assert_eq!(c.channel.totals().discarded, 1);
    }

    #[test]
    fn test_trigger_disabled_always_publishes() {
        use crate::acquire::trigger::TriggerEdge;
        // Same constant signal publishes once alignment is switched off
        let channel = CrossCoreChannel::new(&ScopeConfig::default());
        channel.set_trigger(2048, TriggerEdge::Rising, false);
        let sampler = SyntheticSampler::new(
            SignalGenerator::new(WaveformKind::Square, 32, 1.0),
            500_000,
            false,
        );
        let mut c = AcquisitionController::new(sampler, channel);
        c.start().unwrap();
        assert_eq!(c.cycle().unwrap(), CycleOutcome::Published);
    }

    #[test]
    fn test_overrun_is_fatal() {
        let channel = CrossCoreChannel::new(&ScopeConfig::default());
        let mut sampler = SyntheticSampler::new(
            SignalGenerator::new(WaveformKind::Square, 32, 0.5),
            500_000,
            false,
        );
        sampler.fail_after(2);
        let mut c = AcquisitionController::new(sampler, channel);
        c.start().unwrap();
        c.cycle().unwrap();
        c.cycle().unwrap();
        assert!(matches!(
            c.cycle(),
            Err(AcquisitionError::TransportOverrun)
        ));
    }

    #[test]
    fn test_run_stops_on_flag() {
        let mut c = controller(WaveformKind::Square);
        let running = AtomicBool::new(false);
        // Flag already cleared: start then exit without a cycle
        assert!(c.run(&running).is_ok());
    }
}
