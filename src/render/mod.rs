//! Waveform rendering
//!
//! The render side composes frames into an off-screen canvas pair and
//! streams the finished canvas to a display transport at a fixed rate.
//! Canvases store palette indices; color resolution to the wire format
//! happens once, at blit time.

pub mod canvas;
pub mod display;
pub mod pacer;
pub mod pipeline;
pub mod text;

pub use canvas::{FramePair, WaveformCanvas};
pub use display::{DisplayTransport, MemoryDisplay, NullDisplay};
pub use pipeline::RenderPipeline;
