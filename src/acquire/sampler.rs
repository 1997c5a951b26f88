//! Sampling transport interface
//!
//! Models the ADC+DMA front end at its interface: the controller arms the
//! transport with the next buffer to fill, then blocks on a completion
//! event carrying the filled slot. Buffer ownership moves with the
//! transfer — the transport holds the storage for exactly the duration of
//! one fill, so nothing else can observe a buffer mid-capture.
//!
//! [`SyntheticSampler`] is the hosted implementation: it draws samples
//! from a [`SignalGenerator`](crate::acquire::signal::SignalGenerator) and
//! can optionally pace itself to the configured sample rate.

use crate::acquire::controller::AcquisitionError;
use crate::acquire::pool::SlotIndex;
use crate::acquire::signal::SignalGenerator;
use std::collections::VecDeque;
use std::time::Duration;

/// Completion event: the transfer into `slot` finished and its storage
/// returns to the controller.
#[derive(Debug)]
pub struct TransferComplete {
    /// Slot that was just filled
    pub slot: SlotIndex,
    /// The filled sample storage, ownership returned by the transport
    pub storage: Vec<u16>,
}

/// Abstract sampling transport (ADC + DMA engine at its interface)
///
/// The contract mirrors real double-buffered DMA capture: `rearm` must be
/// called with the next buffer before the in-flight transfer completes,
/// otherwise the transport overruns and acquisition must halt.
pub trait SampleTransport: Send {
    /// Begin capturing into the armed buffer
    fn start(&mut self) -> Result<(), AcquisitionError>;

    /// Stop capturing; any armed buffers are dropped
    fn stop(&mut self);

    /// Queue the next buffer so capture continues without a gap
    fn rearm(&mut self, slot: SlotIndex, storage: Vec<u16>) -> Result<(), AcquisitionError>;

    /// Block until the oldest in-flight transfer completes.
    ///
    /// This is the acquisition core's only suspension point. Returns
    /// [`AcquisitionError::TransportOverrun`] when no buffer was armed in
    /// time for the data that arrived.
    fn wait_complete(&mut self) -> Result<TransferComplete, AcquisitionError>;
}

/// Deterministic in-process sampling transport
pub struct SyntheticSampler {
    generator: SignalGenerator,
    sample_rate: u32,
    /// Sleep one buffer-duration per transfer to approximate real capture timing
    paced: bool,
    running: bool,
    armed: VecDeque<(SlotIndex, Vec<u16>)>,
    transfers: u64,
    /// Fault injection: report an overrun after this many transfers
    fail_after: Option<u64>,
}

impl SyntheticSampler {
    /// Create a sampler producing `generator`'s waveform at `sample_rate` Hz.
    ///
    /// When `paced` is set, each completed transfer takes the wall-clock
    /// time a real capture of that length would.
    pub fn new(generator: SignalGenerator, sample_rate: u32, paced: bool) -> Self {
        Self {
            generator,
            sample_rate,
            paced,
            running: false,
            armed: VecDeque::new(),
            transfers: 0,
            fail_after: None,
        }
    }

    /// Number of completed transfers
    pub fn transfers(&self) -> u64 {
        self.transfers
    }

    /// Inject a transport overrun after `n` successful transfers
    pub fn fail_after(&mut self, n: u64) {
        self.fail_after = Some(n);
    }
}

impl SampleTransport for SyntheticSampler {
    fn start(&mut self) -> Result<(), AcquisitionError> {
        if self.armed.is_empty() {
            return Err(AcquisitionError::Transport(
                "started with no armed buffer".into(),
            ));
        }
        self.running = true;
        tracing::debug!(sample_rate = self.sample_rate, "synthetic sampler started");
        Ok(())
    }

    fn stop(&mut self) {
        self.running = false;
        self.armed.clear();
        tracing::debug!(transfers = self.transfers, "synthetic sampler stopped");
    }

    fn rearm(&mut self, slot: SlotIndex, storage: Vec<u16>) -> Result<(), AcquisitionError> {
        self.armed.push_back((slot, storage));
        Ok(())
    }

    fn wait_complete(&mut self) -> Result<TransferComplete, AcquisitionError> {
        if !self.running {
            return Err(AcquisitionError::Transport("transport not running".into()));
        }
        if let Some(limit) = self.fail_after {
            if self.transfers >= limit {
                return Err(AcquisitionError::TransportOverrun);
            }
        }
        // Data arriving with nothing armed is an overrun: the slot pointer
        // the hardware would have written through is unknown.
        let (slot, mut storage) = self
            .armed
            .pop_front()
            .ok_or(AcquisitionError::TransportOverrun)?;

        self.generator.fill(&mut storage);
        self.transfers += 1;

        if self.paced {
            let nanos = storage.len() as u64 * 1_000_000_000 / self.sample_rate.max(1) as u64;
            std::thread::sleep(Duration::from_nanos(nanos));
        }

        Ok(TransferComplete { slot, storage })
    }
}
