//! Cross-core coordination
//!
//! The two halves of the pipeline share three things: the mutable control
//! state (trigger settings, hold, scales, latest measurement), the buffer
//! pool, and a bounded queue of published slot indices. [`channel`] wraps
//! all three behind one handle so lock ordering lives in a single module.

pub mod channel;
pub mod shared;

pub use channel::{CrossCoreChannel, PublishOutcome};
pub use shared::{AcquireSnapshot, RenderSnapshot, SharedPipelineState};
