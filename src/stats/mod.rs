//! Measurement history and pipeline counters

pub mod store;
