//! E2E tests for the capture-to-render pipeline
//!
//! Drives real waveforms through the full acquisition cycle (transport,
//! pool, trigger, statistics, handoff) and checks what reaches the
//! render side.

use dualscope::acquire::controller::{AcquisitionController, CycleOutcome};
use dualscope::acquire::sampler::SyntheticSampler;
use dualscope::acquire::signal::{SignalGenerator, WaveformKind};
use dualscope::acquire::trigger::{TriggerDetector, TriggerEdge};
use dualscope::config::ScopeConfig;
use dualscope::pipeline::channel::CrossCoreChannel;
use dualscope::render::display::MemoryDisplay;
use dualscope::render::text::NullText;
use dualscope::RenderPipeline;
use dualscope::{DISPLAY_HEIGHT, DISPLAY_WIDTH, TRIGGER_GUARD};

fn square_controller(period: usize) -> AcquisitionController<SyntheticSampler> {
    let channel = CrossCoreChannel::new(&ScopeConfig::default());
    let sampler = SyntheticSampler::new(
        SignalGenerator::new(WaveformKind::Square, period, 0.5),
        500_000,
        false,
    );
    AcquisitionController::new(sampler, channel)
}

/// A rising ramp has exactly one rising crossing, at its midpoint
#[test]
fn test_ramp_trigger_alignment() {
    let mut samples = vec![0u16; 320];
    let mut gen = SignalGenerator::new(WaveformKind::Ramp, 320, 0.0);
    gen.fill(&mut samples);

    let detector = TriggerDetector::new(2048, TriggerEdge::Rising, true);
    let window = detector.evaluate(&samples).expect("ramp must trigger");

    // The crossing sits mid-buffer, so the guard margin is preserved and
    // the crossing lands exactly at the guard offset
    let aligned = window.apply(&samples);
    assert!(aligned[TRIGGER_GUARD] >= 2048);
    assert!(aligned[TRIGGER_GUARD - 1] < 2048);
}

/// Amplitude statistics on a full-scale ramp
#[test]
fn test_ramp_amplitude_statistics() {
    use dualscope::StatisticsEngine;

    let mut samples = vec![0u16; 320];
    let mut gen = SignalGenerator::new(WaveformKind::Ramp, 320, 0.0);
    gen.fill(&mut samples);

    let engine = StatisticsEngine::new(500_000);
    let m = engine.compute(&samples, 2048);
    assert_eq!(m.min, 0);
    assert_eq!(m.max, 4095);
    assert_eq!(m.vpp, 4095);
    // One crossing cannot bound a period
    assert_eq!(m.frequency, 0.0);
}

/// Square wave frequency survives the whole pipeline
#[test]
fn test_square_wave_end_to_end_measurement() {
    let mut c = square_controller(32);
    c.start().unwrap();

    let mut published = 0;
    for _ in 0..10 {
        if c.cycle().unwrap() == CycleOutcome::Published {
            published += 1;
        }
    }
    assert!(published > 0);
}

/// The published measurement is readable from the channel side
#[test]
fn test_measurement_reaches_render_side() {
    let config = ScopeConfig::default();
    let channel = CrossCoreChannel::new(&config);
    let sampler = SyntheticSampler::new(
        SignalGenerator::new(WaveformKind::Square, 32, 0.5),
        500_000,
        false,
    );
    let mut c = AcquisitionController::new(sampler, channel.clone());
    c.start().unwrap();
    c.cycle().unwrap();

    let snapshot = channel.render_snapshot();
    assert_eq!(snapshot.measurement.max, 4095);
    assert_eq!(snapshot.measurement.min, 0);
    let expected = 500_000.0 / 32.0;
    assert!(
        (snapshot.measurement.frequency - expected).abs() / expected < 0.1,
        "frequency {} not near {}",
        snapshot.measurement.frequency,
        expected
    );
}

/// Acquisition keeps running when the render side never drains the queue
#[test]
fn test_unattended_render_side_never_stalls_capture() {
    let mut c = square_controller(32);
    c.start().unwrap();
    for _ in 0..100 {
        // Every cycle must complete; drops and reclaims are fine
        c.cycle().unwrap();
    }
}

/// Full two-thread run: frames render and pixels land on the panel
#[test]
fn test_pipeline_with_render_loop() {
    let config = ScopeConfig::default();
    let channel = CrossCoreChannel::new(&config);
    let sampler = SyntheticSampler::new(
        SignalGenerator::new(WaveformKind::Sine, 64, 0.0),
        500_000,
        false,
    );
    let mut controller = AcquisitionController::new(sampler, channel.clone());
    let mut render = RenderPipeline::new(
        channel.clone(),
        MemoryDisplay::new(DISPLAY_WIDTH, DISPLAY_HEIGHT),
        NullText,
        60,
    );

    controller.start().unwrap();
    for _ in 0..4 {
        controller.cycle().unwrap();
        render.render_frame().unwrap();
    }

    assert_eq!(render.display().blits(), 4);
    assert!(channel.totals().published > 0);
    assert_eq!(channel.totals().frames_rendered, 4);
}
