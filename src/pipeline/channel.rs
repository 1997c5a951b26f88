//! Acquisition-to-render handoff
//!
//! [`CrossCoreChannel`] bundles the shared control state, the buffer pool
//! and a bounded slot-index queue behind one `Arc` handle. Publishing
//! never blocks: if the queue is full the slot is released back to the
//! pool and counted as dropped, so a slow render side can never stall
//! capture. The render side copies samples out of the pool under the pool
//! lock and frees the slot immediately, which keeps the two-slot rotation
//! from starving.
//!
//! Lock order when both are needed: state before pool. Neither lock is
//! ever held across a queue operation together with the other.

use crate::acquire::pool::{BufferPool, PoolError, SlotIndex};
use crate::acquire::stats::Measurement;
use crate::acquire::trigger::{SampleWindow, TriggerEdge};
use crate::config::ScopeConfig;
use crate::pipeline::shared::{AcquireSnapshot, RenderSnapshot, SharedPipelineState};
use crate::stats::store::{MeasurementLog, RunTotals};
use crate::HANDOFF_QUEUE_DEPTH;
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Result of offering a published slot to the render side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// Slot queued for the render side
    Queued,
    /// Queue full; slot released back to the pool and counted as dropped
    Dropped,
}

/// Shared handle connecting the acquisition and render loops
pub struct CrossCoreChannel {
    state: Mutex<SharedPipelineState>,
    pool: Mutex<BufferPool>,
    log: Mutex<MeasurementLog>,
    tx: Sender<SlotIndex>,
    rx: Receiver<SlotIndex>,
}

/// A panic while holding one of these locks leaves plain-old-data in a
/// consistent state, so the poison flag carries no information here.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl CrossCoreChannel {
    /// Create the channel from startup configuration
    pub fn new(config: &ScopeConfig) -> Arc<Self> {
        let (tx, rx) = bounded(HANDOFF_QUEUE_DEPTH);
        Arc::new(Self {
            state: Mutex::new(SharedPipelineState::from_config(config)),
            pool: Mutex::new(BufferPool::new(config.num_buffers, config.buffer_len)),
            log: Mutex::new(MeasurementLog::new()),
            tx,
            rx,
        })
    }

    /// Snapshot for one acquisition cycle
    pub fn acquire_snapshot(&self) -> AcquireSnapshot {
        lock(&self.state).acquire_snapshot()
    }

    /// Snapshot for one render frame
    pub fn render_snapshot(&self) -> RenderSnapshot {
        lock(&self.state).render_snapshot()
    }

    /// Slot currently designated for display, if any
    pub fn display_slot(&self) -> Option<SlotIndex> {
        lock(&self.state).display_slot
    }

    /// Run `f` with the pool locked
    pub fn with_pool<R>(&self, f: impl FnOnce(&mut BufferPool) -> R) -> R {
        f(&mut lock(&self.pool))
    }

    /// Freeze or unfreeze the displayed waveform
    pub fn set_hold(&self, hold: bool) {
        lock(&self.state).hold = hold;
        tracing::info!(hold, "hold changed");
    }

    /// Toggle adoption of new captures while held
    pub fn set_live_update(&self, live_update: bool) {
        lock(&self.state).live_update = live_update;
    }

    /// Update trigger settings
    pub fn set_trigger(&self, level: u16, edge: TriggerEdge, enabled: bool) {
        let mut state = lock(&self.state);
        state.trigger_level = level;
        state.trigger_edge = edge;
        state.trigger_enabled = enabled;
        tracing::info!(level, ?edge, enabled, "trigger changed");
    }

    /// Update render-time zoom and offset
    pub fn set_scale(&self, time_scale: f32, voltage_scale: f32, voltage_offset: i32) {
        let mut state = lock(&self.state);
        state.time_scale = time_scale;
        state.voltage_scale = voltage_scale;
        state.voltage_offset = voltage_offset;
    }

    /// Update the sample rate used for frequency measurements
    pub fn set_sample_rate(&self, sample_rate: u32) {
        if sample_rate > 0 {
            lock(&self.state).sample_rate = sample_rate;
        }
    }

    /// Publish a triggered slot to the render side.
    ///
    /// Marks the slot `Published` in the pool, then offers its index to the
    /// queue. On a full queue the slot goes straight back to `Free` and the
    /// drop is counted. The measurement always becomes the latest one; the
    /// display slot only advances when the display is not held (or when
    /// live update overrides the hold).
    pub fn publish(
        &self,
        slot: SlotIndex,
        storage: Vec<u16>,
        window: SampleWindow,
        measurement: Measurement,
    ) -> Result<PublishOutcome, PoolError> {
        lock(&self.pool).publish(slot, storage, window)?;

        match self.tx.try_send(slot) {
            Ok(()) => {
                let mut state = lock(&self.state);
                state.measurement = measurement;
                if !state.hold || state.live_update {
                    state.display_slot = Some(slot);
                }
                drop(state);
                lock(&self.log).record_published(measurement);
                Ok(PublishOutcome::Queued)
            }
            Err(TrySendError::Full(slot)) | Err(TrySendError::Disconnected(slot)) => {
                lock(&self.pool).release(slot)?;
                lock(&self.state).measurement = measurement;
                let mut log = lock(&self.log);
                log.record_published(measurement);
                log.record_dropped();
                tracing::debug!(slot, "handoff queue full, frame dropped");
                Ok(PublishOutcome::Dropped)
            }
        }
    }

    /// Return an untriggered slot's storage to the pool
    pub fn discard(&self, slot: SlotIndex, storage: Vec<u16>) -> Result<(), PoolError> {
        lock(&self.pool).discard(slot, storage)?;
        lock(&self.log).record_discarded();
        Ok(())
    }

    /// Non-blocking poll for the next published slot index
    pub fn try_recv_slot(&self) -> Option<SlotIndex> {
        self.rx.try_recv().ok()
    }

    /// Copy a published slot's aligned samples into `dest` and free it.
    ///
    /// Returns `false` when the slot was reclaimed for capture before the
    /// render side got to it.
    pub fn claim_samples(&self, slot: SlotIndex, dest: &mut Vec<u16>) -> Result<bool, PoolError> {
        lock(&self.pool).claim_published(slot, dest)
    }

    /// Free a queued slot the render side chose not to show
    pub fn skip_slot(&self, slot: SlotIndex) {
        let mut pool = lock(&self.pool);
        // Already-reclaimed slots are fine to skip silently
        if let Err(e) = pool.release(slot) {
            tracing::trace!(slot, error = %e, "skipped slot already recycled");
        }
    }

    /// Count a completed render frame
    pub fn note_frame_rendered(&self) {
        lock(&self.log).record_frame_rendered();
    }

    /// Latest published measurement with its timestamp
    pub fn latest_measurement(&self) -> Option<crate::stats::store::TimedMeasurement> {
        lock(&self.log).latest()
    }

    /// Running pipeline totals
    pub fn totals(&self) -> RunTotals {
        lock(&self.log).totals()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquire::pool::SlotState;

    fn fill_and_mark(channel: &CrossCoreChannel) -> (SlotIndex, Vec<u16>) {
        channel.with_pool(|pool| {
            let (slot, storage) = pool.acquire_for_filling().unwrap();
            pool.mark_filled(slot).unwrap();
            (slot, storage)
        })
    }

    fn measurement() -> Measurement {
        Measurement {
            min: 0,
            max: 4095,
            vpp: 4095,
            frequency: 1000.0,
            duty_cycle: 50.0,
        }
    }

    #[test]
    fn test_publish_queues_and_advances_display() {
        let channel = CrossCoreChannel::new(&ScopeConfig::default());
        let (slot, storage) = fill_and_mark(&channel);

        let outcome = channel
            .publish(slot, storage, SampleWindow::full(320), measurement())
            .unwrap();
        assert_eq!(outcome, PublishOutcome::Queued);
        assert_eq!(channel.display_slot(), Some(slot));
        assert_eq!(channel.try_recv_slot(), Some(slot));
        assert_eq!(channel.totals().published, 1);
    }

    #[test]
    fn test_hold_freezes_display_slot() {
        let channel = CrossCoreChannel::new(&ScopeConfig::default());
        let (a, sa) = fill_and_mark(&channel);
        channel
            .publish(a, sa, SampleWindow::full(320), measurement())
            .unwrap();
        channel.set_hold(true);

        let (b, sb) = fill_and_mark(&channel);
        channel
            .publish(b, sb, SampleWindow::full(320), measurement())
            .unwrap();

        // Display stays on the held slot, measurement still updates
        assert_eq!(channel.display_slot(), Some(a));
        assert_eq!(channel.totals().published, 2);
    }

    #[test]
    fn test_live_update_overrides_hold() {
        let channel = CrossCoreChannel::new(&ScopeConfig::default());
        channel.set_hold(true);
        channel.set_live_update(true);

        let (slot, storage) = fill_and_mark(&channel);
        channel
            .publish(slot, storage, SampleWindow::full(320), measurement())
            .unwrap();
        assert_eq!(channel.display_slot(), Some(slot));
    }

    #[test]
    fn test_full_queue_drops_and_releases() {
        let config = ScopeConfig {
            num_buffers: 8,
            ..Default::default()
        };
        let channel = CrossCoreChannel::new(&config);

        // Fill the queue to capacity
        for _ in 0..crate::HANDOFF_QUEUE_DEPTH {
            let (slot, storage) = fill_and_mark(&channel);
            let outcome = channel
                .publish(slot, storage, SampleWindow::full(320), measurement())
                .unwrap();
            assert_eq!(outcome, PublishOutcome::Queued);
        }

        let (slot, storage) = fill_and_mark(&channel);
        let outcome = channel
            .publish(slot, storage, SampleWindow::full(320), measurement())
            .unwrap();
        assert_eq!(outcome, PublishOutcome::Dropped);
        assert_eq!(channel.totals().dropped, 1);
        // The dropped slot is immediately reusable
        channel.with_pool(|pool| {
            assert_eq!(pool.state(slot).unwrap(), SlotState::Free);
        });
    }

    #[test]
    fn test_claim_copies_window_and_frees() {
        let channel = CrossCoreChannel::new(&ScopeConfig::default());
        let (slot, mut storage) = fill_and_mark(&channel);
        for (i, s) in storage.iter_mut().enumerate() {
            *s = i as u16;
        }
        channel
            .publish(slot, storage, SampleWindow::new(10, 100), measurement())
            .unwrap();

        let queued = channel.try_recv_slot().unwrap();
        let mut dest = Vec::new();
        assert!(channel.claim_samples(queued, &mut dest).unwrap());
        assert_eq!(dest.len(), 100);
        assert_eq!(dest[0], 10);
        channel.with_pool(|pool| {
            assert_eq!(pool.state(slot).unwrap(), SlotState::Free);
        });
    }

    #[test]
    fn test_settings_roundtrip() {
        let channel = CrossCoreChannel::new(&ScopeConfig::default());
        channel.set_trigger(1000, TriggerEdge::Falling, false);
        channel.set_scale(2.0, 0.5, -100);
        channel.set_sample_rate(250_000);

        let a = channel.acquire_snapshot();
        assert_eq!(a.trigger_level, 1000);
        assert_eq!(a.trigger_edge, TriggerEdge::Falling);
        assert!(!a.trigger_enabled);
        assert_eq!(a.sample_rate, 250_000);

        let r = channel.render_snapshot();
        assert_eq!(r.time_scale, 2.0);
        assert_eq!(r.voltage_scale, 0.5);
        assert_eq!(r.voltage_offset, -100);
    }
}
