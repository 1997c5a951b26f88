//! Pipeline startup and shutdown
//!
//! Spawns the acquisition and render loops on their own named threads and
//! joins them on shutdown. Errors from either loop are surfaced when the
//! handles are stopped; a fatal acquisition error also clears the shared
//! running flag so the render loop winds down on its own.

use crate::acquire::controller::AcquisitionController;
use crate::acquire::sampler::SampleTransport;
use crate::pipeline::channel::CrossCoreChannel;
use crate::render::display::DisplayTransport;
use crate::render::pipeline::RenderPipeline;
use crate::render::text::TextRasterizer;
use anyhow::{anyhow, Context, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

/// Handles to the two running pipeline threads
pub struct PipelineHandles {
    running: Arc<AtomicBool>,
    channel: Arc<CrossCoreChannel>,
    acquisition: JoinHandle<Result<()>>,
    render: JoinHandle<Result<()>>,
}

impl PipelineHandles {
    /// The shared channel, for settings and status queries
    pub fn channel(&self) -> &Arc<CrossCoreChannel> {
        &self.channel
    }

    /// Whether both loops are still meant to run
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Request shutdown without joining
    pub fn request_stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Stop both loops and surface the first error either produced
    pub fn stop(self) -> Result<()> {
        self.running.store(false, Ordering::SeqCst);

        let acquisition = self
            .acquisition
            .join()
            .map_err(|_| anyhow!("acquisition thread panicked"))?;
        let render = self
            .render
            .join()
            .map_err(|_| anyhow!("render thread panicked"))?;

        acquisition.context("acquisition loop failed")?;
        render.context("render loop failed")?;
        Ok(())
    }
}

/// Spawn the acquisition and render loops.
///
/// The transport and display are moved onto their respective threads;
/// the returned handles own the shutdown flag.
pub fn spawn_pipeline<T, D, X>(
    channel: Arc<CrossCoreChannel>,
    transport: T,
    display: D,
    text: X,
    frame_rate: u32,
) -> Result<PipelineHandles>
where
    T: SampleTransport + 'static,
    D: DisplayTransport + 'static,
    X: TextRasterizer + 'static,
{
    let running = Arc::new(AtomicBool::new(true));

    let acq_running = running.clone();
    let acq_channel = channel.clone();
    let acquisition = std::thread::Builder::new()
        .name("acquire".into())
        .spawn(move || -> Result<()> {
            let mut controller = AcquisitionController::new(transport, acq_channel);
            let result = controller.run(&acq_running);
            // A dead acquisition loop should take the render loop with it
            acq_running.store(false, Ordering::SeqCst);
            result.context("acquisition loop")
        })
        .context("failed to spawn acquisition thread")?;

    let render_running = running.clone();
    let render_channel = channel.clone();
    let render = std::thread::Builder::new()
        .name("render".into())
        .spawn(move || -> Result<()> {
            let mut pipeline = RenderPipeline::new(render_channel, display, text, frame_rate);
            let result = pipeline.run(&render_running);
            render_running.store(false, Ordering::SeqCst);
            result.context("render loop")
        })
        .context("failed to spawn render thread")?;

    tracing::info!(frame_rate, "pipeline threads spawned");

    Ok(PipelineHandles {
        running,
        channel,
        acquisition,
        render,
    })
}
