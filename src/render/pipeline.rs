//! Frame composition and display loop
//!
//! Each frame walks a fixed phase sequence: fetch the newest published
//! capture (if the display is allowed to advance), compose the waveform
//! and measurement band into the back canvas, swap the canvas pair, and
//! stream the completed canvas to the display transport. The shared state
//! lock is touched exactly once per frame, for the snapshot; everything
//! else works on local copies.

use crate::acquire::pool::PoolError;
use crate::pipeline::channel::CrossCoreChannel;
use crate::pipeline::shared::RenderSnapshot;
use crate::render::canvas::FramePair;
use crate::render::display::{self, DisplayError, DisplayTransport};
use crate::render::pacer::FramePacer;
use crate::render::text::{measurement_overlay, TextRasterizer};
use crate::{
    DISPLAY_HEIGHT, DISPLAY_WIDTH, SAMPLE_MAX, WAVEFORM_HEIGHT, WAVEFORM_TOP, WAVEFORM_WIDTH,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// Errors from the render loop
#[derive(Error, Debug)]
pub enum RenderError {
    #[error(transparent)]
    Display(#[from] DisplayError),

    #[error(transparent)]
    Pool(#[from] PoolError),
}

/// Where the frame loop currently is; diagnostic only
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FramePhase {
    Idle,
    Fetching,
    Composing,
    Swapping,
}

/// Composes waveform frames and streams them to a display transport
pub struct RenderPipeline<D: DisplayTransport, T: TextRasterizer> {
    channel: Arc<CrossCoreChannel>,
    display: D,
    text: T,
    frames: FramePair,
    pacer: FramePacer,
    phase: FramePhase,
    /// Render-side copy of the waveform being shown
    waveform: Vec<u16>,
    /// Scratch buffer for claiming newly published captures
    incoming: Vec<u16>,
    /// Preallocated RGB565 wire buffer for blits
    wire: Vec<u16>,
}

impl<D: DisplayTransport, T: TextRasterizer> RenderPipeline<D, T> {
    pub fn new(channel: Arc<CrossCoreChannel>, display: D, text: T, frame_rate: u32) -> Self {
        Self {
            channel,
            display,
            text,
            frames: FramePair::new(DISPLAY_WIDTH, DISPLAY_HEIGHT),
            pacer: FramePacer::new(frame_rate),
            phase: FramePhase::Idle,
            waveform: Vec::new(),
            incoming: Vec::new(),
            wire: vec![0u16; DISPLAY_WIDTH * DISPLAY_HEIGHT],
        }
    }

    /// Access the display transport (tests inspect the framebuffer)
    pub fn display(&self) -> &D {
        &self.display
    }

    /// Access the text rasterizer
    pub fn text(&self) -> &T {
        &self.text
    }

    /// Current frame phase; `Idle` between frames
    fn phase(&self) -> FramePhase {
        self.phase
    }

    /// Compose and present one frame
    pub fn render_frame(&mut self) -> Result<(), RenderError> {
        self.phase = FramePhase::Fetching;
        let snapshot = self.channel.render_snapshot();
        self.fetch_latest(&snapshot)?;

        self.phase = FramePhase::Composing;
        self.compose(&snapshot);

        self.phase = FramePhase::Swapping;
        self.frames.swap();
        self.present()?;

        self.channel.note_frame_rendered();
        self.phase = FramePhase::Idle;
        Ok(())
    }

    /// Run the frame loop until `running` clears
    pub fn run(&mut self, running: &AtomicBool) -> Result<(), RenderError> {
        tracing::info!("render loop started");
        while running.load(Ordering::Relaxed) {
            self.render_frame()?;
            self.pacer.wait();
        }
        tracing::info!("render loop stopped");
        Ok(())
    }

    /// Drain the handoff queue and adopt the newest capture the display is
    /// allowed to show.
    ///
    /// Only the slot the shared state designates for display is adopted;
    /// anything older in the queue, or anything arriving while the display
    /// is held, goes straight back to the pool. Adoption copies the
    /// samples out under the pool lock, so a later reclaim of the slot
    /// cannot disturb what is on screen.
    fn fetch_latest(&mut self, snapshot: &RenderSnapshot) -> Result<(), RenderError> {
        let advance = !snapshot.hold || snapshot.live_update;

        while let Some(slot) = self.channel.try_recv_slot() {
            if advance && Some(slot) == snapshot.display_slot {
                let mut incoming = std::mem::take(&mut self.incoming);
                let claimed = self.channel.claim_samples(slot, &mut incoming)?;
                if claimed {
                    std::mem::swap(&mut self.waveform, &mut incoming);
                }
                self.incoming = incoming;
            } else {
                self.channel.skip_slot(slot);
            }
        }
        Ok(())
    }

    /// Draw the graticule, trace and measurement band into the back canvas
    fn compose(&mut self, snapshot: &RenderSnapshot) {
        let canvas = self.frames.draw_mut();
        canvas.fill(display::BLACK);

        // Graticule under the trace
        for x in (0..WAVEFORM_WIDTH).step_by(32) {
            canvas.draw_vline(x, WAVEFORM_TOP, WAVEFORM_HEIGHT, display::DARK_GREY);
        }
        for y in (WAVEFORM_TOP..DISPLAY_HEIGHT).step_by(24) {
            canvas.draw_hline(0, y, WAVEFORM_WIDTH, display::DARK_GREY);
        }
        canvas.draw_hline(
            0,
            WAVEFORM_TOP + WAVEFORM_HEIGHT / 2,
            WAVEFORM_WIDTH,
            display::WHITE,
        );

        // One trace pixel per column
        for (x, &sample) in self.waveform.iter().take(WAVEFORM_WIDTH).enumerate() {
            let y = Self::sample_to_row(sample);
            canvas.set_pixel(x, WAVEFORM_TOP + y, display::RED);
        }

        // Measurement band is refreshed every frame, held or not
        for line in measurement_overlay(&snapshot.measurement) {
            self.text
                .draw_text(canvas, line.x, line.y, &line.text, line.color);
        }
        if snapshot.hold {
            self.text
                .draw_text(canvas, 260, 0, "HOLD", display::YELLOW);
        }
    }

    /// Map a 12-bit sample to a viewport row, top row for full scale
    fn sample_to_row(sample: u16) -> usize {
        let clamped = sample.min(SAMPLE_MAX) as usize;
        ((SAMPLE_MAX as usize - clamped) * WAVEFORM_HEIGHT / (SAMPLE_MAX as usize + 1))
            .min(WAVEFORM_HEIGHT - 1)
    }

    /// Resolve the active canvas to RGB565 and stream it out
    fn present(&mut self) -> Result<(), RenderError> {
        let canvas = self.frames.active();
        for (dst, &idx) in self.wire.iter_mut().zip(canvas.pixels()) {
            *dst = display::resolve(idx);
        }
        self.display
            .set_window(0, 0, DISPLAY_WIDTH, DISPLAY_HEIGHT)?;
        self.display.blit(&self.wire)?;
        Ok(())
    }
}
