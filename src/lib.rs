//! Dualscope - dual-core oscilloscope acquisition and render pipeline
//!
//! This library implements the capture side of a two-core digital
//! oscilloscope: one core continuously samples an analog input into a
//! rotating pool of fixed-length buffers, aligns each buffer to a trigger
//! crossing, computes waveform statistics, and hands completed buffers to
//! the second core, which composes a double-buffered waveform image and
//! streams it to a display transport at a fixed frame rate.

pub mod acquire;
pub mod config;
pub mod pipeline;
pub mod render;
pub mod run;
pub mod stats;

pub use acquire::controller::AcquisitionController;
pub use acquire::stats::{Measurement, StatisticsEngine};
pub use acquire::trigger::{TriggerDetector, TriggerEdge};
pub use config::ScopeConfig;
pub use pipeline::channel::CrossCoreChannel;
pub use render::pipeline::RenderPipeline;

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Number of samples in one capture buffer
pub const BUFFER_LEN: usize = 320;

/// Number of rotating capture buffers
pub const NUM_BUFFERS: usize = 2;

/// Maximum sample value (12-bit ADC quantization)
pub const SAMPLE_MAX: u16 = 4095;

/// Pre-trigger margin kept in front of the trigger crossing, in samples
pub const TRIGGER_GUARD: usize = 50;

/// Default sample rate in Hz (500 kHz)
pub const DEFAULT_SAMPLE_RATE: u32 = 500_000;

/// Default trigger level (mid-scale, ~1.65 V)
pub const DEFAULT_TRIGGER_LEVEL: u16 = 2048;

/// ADC reference voltage used to convert samples to volts
pub const VREF_VOLTS: f64 = 3.3;

/// Display width in pixels
pub const DISPLAY_WIDTH: usize = 320;

/// Display height in pixels
pub const DISPLAY_HEIGHT: usize = 240;

/// Height of the measurement band above the waveform viewport
pub const WAVEFORM_TOP: usize = 50;

/// Waveform viewport width (one canvas column per sample)
pub const WAVEFORM_WIDTH: usize = DISPLAY_WIDTH;

/// Waveform viewport height
pub const WAVEFORM_HEIGHT: usize = DISPLAY_HEIGHT - WAVEFORM_TOP;

/// Target frame rate for the render loop in frames per second
pub const DEFAULT_FRAME_RATE: u32 = 60;

/// Capacity of the acquisition-to-render slot handoff queue
pub const HANDOFF_QUEUE_DEPTH: usize = 4;
