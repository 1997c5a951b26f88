//! Acquisition core
//!
//! This module contains everything that runs on the sampling core:
//! - Rotating capture buffer pool ([`pool`])
//! - Trigger edge detection and alignment ([`trigger`])
//! - Waveform statistics ([`stats`])
//! - Sampling transport interface and synthetic sampler ([`sampler`])
//! - 12-bit test signal generation ([`signal`])
//! - The acquisition control loop ([`controller`])

pub mod controller;
pub mod pool;
pub mod sampler;
pub mod signal;
pub mod stats;
pub mod trigger;
