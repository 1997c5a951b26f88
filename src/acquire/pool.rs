//! Rotating capture buffer pool
//!
//! An arena of N fixed-length sample buffers, each tagged with an explicit
//! lifecycle state. Sample storage physically moves with ownership: while a
//! slot is `Filling` its storage is held by the sampling transport, while it
//! is `Filled` the acquisition controller holds it, and while it is `Free`
//! or `Published` the storage is parked here. Every state change goes
//! through one checked transition function, so an illegal combination
//! (e.g. two slots filling at once, or a published slot that is also
//! filling) cannot be represented.

use crate::acquire::trigger::SampleWindow;
use thiserror::Error;

/// Index of a buffer slot within the pool
pub type SlotIndex = usize;

/// Lifecycle state of one buffer slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    /// Available for capture
    Free,
    /// Storage lent to the sampling transport; no other component may touch it
    Filling,
    /// Capture complete; owned by the acquisition controller for processing
    Filled,
    /// Passed trigger; parked here until the render side claims it
    Published,
    /// Failed trigger; transient state on the way back to `Free`
    Discarded,
}

/// Errors from buffer pool operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error("no free or reclaimable slot available")]
    Busy,

    #[error("slot {slot} illegal transition: {from:?} -> {to:?}")]
    IllegalTransition {
        slot: SlotIndex,
        from: SlotState,
        to: SlotState,
    },

    #[error("slot index {0} out of range")]
    BadSlot(SlotIndex),
}

struct Slot {
    state: SlotState,
    /// Present only while the slot is `Free`, `Published` or `Discarded`
    storage: Option<Vec<u16>>,
    /// Valid sample region; meaningful while `Published`
    window: SampleWindow,
}

/// Arena of rotating capture buffers
pub struct BufferPool {
    slots: Vec<Slot>,
    buffer_len: usize,
    /// Count of published slots reclaimed before the render side saw them
    reclaimed: u64,
}

impl BufferPool {
    /// Create a pool of `num_slots` buffers of `buffer_len` samples each.
    ///
    /// All storage is allocated here, once; the steady state recycles it.
    pub fn new(num_slots: usize, buffer_len: usize) -> Self {
        assert!(num_slots >= 2, "pool needs at least two slots");
        let slots = (0..num_slots)
            .map(|_| Slot {
                state: SlotState::Free,
                storage: Some(vec![0u16; buffer_len]),
                window: SampleWindow::full(buffer_len),
            })
            .collect();
        Self {
            slots,
            buffer_len,
            reclaimed: 0,
        }
    }

    /// Number of slots in the pool
    pub fn num_slots(&self) -> usize {
        self.slots.len()
    }

    /// Length of each buffer in samples
    pub fn buffer_len(&self) -> usize {
        self.buffer_len
    }

    /// Current state of a slot
    pub fn state(&self, slot: SlotIndex) -> Result<SlotState, PoolError> {
        self.slot(slot).map(|s| s.state)
    }

    /// Number of slots currently in the `Filling` state (0 or 1 by invariant)
    pub fn filling_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| s.state == SlotState::Filling)
            .count()
    }

    /// How many published slots were reclaimed for capture before rendering
    pub fn reclaimed_count(&self) -> u64 {
        self.reclaimed
    }

    /// Take the first `Free` slot for filling.
    ///
    /// Returns the slot index and its storage; the storage must come back
    /// through [`mark_filled`](Self::mark_filled) ownership (via the
    /// transport completion) and then [`publish`](Self::publish) or
    /// [`discard`](Self::discard).
    pub fn acquire_for_filling(&mut self) -> Result<(SlotIndex, Vec<u16>), PoolError> {
        let idx = self
            .slots
            .iter()
            .position(|s| s.state == SlotState::Free)
            .ok_or(PoolError::Busy)?;
        self.begin_filling(idx)
    }

    /// Pick the next slot for capture, cyclically after `current`.
    ///
    /// Preference order: a `Free` slot; then a `Published` slot other than
    /// the one currently displayed; then any `Published` slot. Reclaiming a
    /// published slot sacrifices an unrendered frame so capture never
    /// stalls. Fails with [`PoolError::Busy`] only when every other slot is
    /// mid-processing, in which case the caller drops this cycle and
    /// retries after processing completes.
    pub fn rotate_acquire(
        &mut self,
        current: SlotIndex,
        display_slot: Option<SlotIndex>,
    ) -> Result<(SlotIndex, Vec<u16>), PoolError> {
        let n = self.slots.len();
        let order = (1..=n).map(|step| (current + step) % n);

        let mut published_fallback = None;
        let mut published_any = None;
        for idx in order {
            match self.slots[idx].state {
                SlotState::Free => return self.begin_filling(idx),
                SlotState::Published => {
                    if Some(idx) != display_slot && published_fallback.is_none() {
                        published_fallback = Some(idx);
                    }
                    if published_any.is_none() {
                        published_any = Some(idx);
                    }
                }
                _ => {}
            }
        }

        if let Some(idx) = published_fallback.or(published_any) {
            // Capture continuity wins over the unrendered frame
            self.set_state(idx, SlotState::Free)?;
            self.reclaimed += 1;
            tracing::debug!(slot = idx, "published slot reclaimed for capture");
            return self.begin_filling(idx);
        }

        Err(PoolError::Busy)
    }

    /// Record transfer completion: `Filling -> Filled`.
    ///
    /// The returned storage from the transport stays with the controller
    /// for trigger and statistics processing.
    pub fn mark_filled(&mut self, slot: SlotIndex) -> Result<(), PoolError> {
        self.set_state(slot, SlotState::Filled)
    }

    /// Hand a processed slot to the render side: `Filled -> Published`.
    ///
    /// Parks the storage and the aligned window until the render side
    /// claims or the pool reclaims the slot.
    pub fn publish(
        &mut self,
        slot: SlotIndex,
        storage: Vec<u16>,
        window: SampleWindow,
    ) -> Result<(), PoolError> {
        self.set_state(slot, SlotState::Published)?;
        let s = &mut self.slots[slot];
        s.storage = Some(storage);
        s.window = window;
        Ok(())
    }

    /// Return an untriggered slot to the pool: `Filled -> Discarded -> Free`.
    pub fn discard(&mut self, slot: SlotIndex, storage: Vec<u16>) -> Result<(), PoolError> {
        self.set_state(slot, SlotState::Discarded)?;
        self.slots[slot].storage = Some(storage);
        self.set_state(slot, SlotState::Free)
    }

    /// Release a published slot without reading it: `Published -> Free`.
    ///
    /// Used when the handoff queue rejects the slot or the render side
    /// skips it.
    pub fn release(&mut self, slot: SlotIndex) -> Result<(), PoolError> {
        self.set_state(slot, SlotState::Free)
    }

    /// Copy the valid region of a published slot into `dest` and free it.
    ///
    /// Returns `false` (leaving `dest` untouched) when the slot is no
    /// longer `Published` — it was reclaimed for capture after the index
    /// was queued, which is a normal race, not an error.
    pub fn claim_published(
        &mut self,
        slot: SlotIndex,
        dest: &mut Vec<u16>,
    ) -> Result<bool, PoolError> {
        if self.slot(slot)?.state != SlotState::Published {
            return Ok(false);
        }
        {
            let s = &self.slots[slot];
            let storage = s.storage.as_ref().expect("published slot holds storage");
            dest.clear();
            dest.extend_from_slice(s.window.apply(storage));
        }
        self.set_state(slot, SlotState::Free)?;
        Ok(true)
    }

    fn begin_filling(&mut self, slot: SlotIndex) -> Result<(SlotIndex, Vec<u16>), PoolError> {
        // Single-filler invariant: only one transfer may be in flight
        if self.filling_count() > 0 {
            return Err(PoolError::Busy);
        }
        self.set_state(slot, SlotState::Filling)?;
        let storage = self.slots[slot]
            .storage
            .take()
            .expect("free slot holds storage");
        Ok((slot, storage))
    }

    fn slot(&self, slot: SlotIndex) -> Result<&Slot, PoolError> {
        self.slots.get(slot).ok_or(PoolError::BadSlot(slot))
    }

    /// The single checked transition point. Legal moves:
    /// Free->Filling, Filling->Filled, Filled->Published, Filled->Discarded,
    /// Published->Free, Discarded->Free.
    fn set_state(&mut self, slot: SlotIndex, to: SlotState) -> Result<(), PoolError> {
        let from = self.slot(slot)?.state;
        use SlotState::*;
        let legal = matches!(
            (from, to),
            (Free, Filling)
                | (Filling, Filled)
                | (Filled, Published)
                | (Filled, Discarded)
                | (Published, Free)
                | (Discarded, Free)
        );
        if !legal {
            return Err(PoolError::IllegalTransition { slot, from, to });
        }
        tracing::trace!(slot, ?from, ?to, "slot transition");
        self.slots[slot].state = to;
        Ok(())
    }
}
