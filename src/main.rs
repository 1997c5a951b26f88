//! Dualscope - dual-core oscilloscope pipeline
//!
//! Entry point for the hosted build: runs the acquisition and render
//! loops against a synthetic signal source and a null display, and prints
//! live measurements once per second.

use anyhow::Result;
use dualscope::acquire::sampler::SyntheticSampler;
use dualscope::acquire::signal::{SignalGenerator, WaveformKind};
use dualscope::config::ScopeConfig;
use dualscope::pipeline::channel::CrossCoreChannel;
use dualscope::render::display::NullDisplay;
use dualscope::render::text::NullText;
use dualscope::run::spawn_pipeline;
use dualscope::{DISPLAY_HEIGHT, DISPLAY_WIDTH};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("dualscope=info".parse().unwrap()),
        )
        .init();

    println!("╔════════════════════════════════════════════════════════════╗");
    println!(
        "║             Dualscope v{} - Scope Pipeline                ║",
        dualscope::VERSION
    );
    println!("╚════════════════════════════════════════════════════════════╝");
    println!();

    // Parse command line arguments
    let args: Vec<String> = std::env::args().collect();

    let mut config_path: Option<PathBuf> = None;
    let mut waveform = WaveformKind::Square;
    let mut period_samples = 32usize;
    let mut duty = 0.5f32;
    let mut sample_rate: Option<u32> = None;
    let mut frame_rate: Option<u32> = None;
    let mut duration: Option<u64> = None;
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "--version" | "-v" => {
                println!("dualscope {}", dualscope::VERSION);
                return Ok(());
            }
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            "--config" | "-c" => {
                if i + 1 >= args.len() {
                    eprintln!("Error: --config requires a file path");
                    return Ok(());
                }
                config_path = Some(PathBuf::from(&args[i + 1]));
                i += 2;
                continue;
            }
            "--waveform" | "-w" => {
                if i + 1 >= args.len() {
                    eprintln!("Error: --waveform requires square|sine|ramp");
                    return Ok(());
                }
                match args[i + 1].parse() {
                    Ok(kind) => waveform = kind,
                    Err(e) => {
                        eprintln!("Error: {}", e);
                        return Ok(());
                    }
                }
                i += 2;
                continue;
            }
            "--period" | "-p" => {
                if i + 1 >= args.len() {
                    eprintln!("Error: --period requires a sample count");
                    return Ok(());
                }
                match args[i + 1].parse::<usize>() {
                    Ok(p) if p >= 2 => period_samples = p,
                    _ => {
                        eprintln!("Error: Invalid period: {}", args[i + 1]);
                        return Ok(());
                    }
                }
                i += 2;
                continue;
            }
            "--duty" => {
                if i + 1 >= args.len() {
                    eprintln!("Error: --duty requires a ratio 0.0..=1.0");
                    return Ok(());
                }
                match args[i + 1].parse::<f32>() {
                    Ok(d) if (0.0..=1.0).contains(&d) => duty = d,
                    _ => {
                        eprintln!("Error: Invalid duty: {}", args[i + 1]);
                        return Ok(());
                    }
                }
                i += 2;
                continue;
            }
            "--sample-rate" | "-r" => {
                if i + 1 >= args.len() {
                    eprintln!("Error: --sample-rate requires a value");
                    return Ok(());
                }
                sample_rate = args[i + 1].parse().ok();
                if sample_rate.is_none() {
                    eprintln!("Error: Invalid sample rate: {}", args[i + 1]);
                    return Ok(());
                }
                i += 2;
                continue;
            }
            "--fps" => {
                if i + 1 >= args.len() {
                    eprintln!("Error: --fps requires a value");
                    return Ok(());
                }
                frame_rate = args[i + 1].parse().ok();
                if frame_rate.is_none() {
                    eprintln!("Error: Invalid frame rate: {}", args[i + 1]);
                    return Ok(());
                }
                i += 2;
                continue;
            }
            "--duration" => {
                if i + 1 >= args.len() {
                    eprintln!("Error: --duration requires seconds");
                    return Ok(());
                }
                duration = args[i + 1].parse().ok();
                if duration.is_none() {
                    eprintln!("Error: Invalid duration: {}", args[i + 1]);
                    return Ok(());
                }
                i += 2;
                continue;
            }
            arg => {
                eprintln!("Unknown argument: {}", arg);
                print_help();
                return Ok(());
            }
        }
    }

    // Load config, then apply command-line overrides
    let mut config = match config_path {
        Some(path) => {
            info!(path = %path.display(), "loading config");
            ScopeConfig::load(&path)?
        }
        None => ScopeConfig::default(),
    };
    if let Some(rate) = sample_rate {
        config.sample_rate = rate;
    }
    if let Some(fps) = frame_rate {
        config.frame_rate = fps;
    }
    config.validate()?;

    println!("Signal:      {:?}, period {} samples", waveform, period_samples);
    println!("Sample rate: {} Hz", config.sample_rate);
    println!("Trigger:     level {}, {:?}", config.trigger_level, config.trigger_edge);
    println!("Frame rate:  {} fps", config.frame_rate);
    println!();

    let channel = CrossCoreChannel::new(&config);
    let sampler = SyntheticSampler::new(
        SignalGenerator::new(waveform, period_samples, duty),
        config.sample_rate,
        true,
    );
    let handles = spawn_pipeline(
        channel.clone(),
        sampler,
        NullDisplay::new(DISPLAY_WIDTH, DISPLAY_HEIGHT),
        NullText,
        config.frame_rate,
    )?;

    // Set up Ctrl+C handler
    let running_flag = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(true));
    let r = running_flag.clone();
    ctrlc::set_handler(move || {
        r.store(false, std::sync::atomic::Ordering::SeqCst);
    })
    .ok();

    println!("Running. Press Ctrl+C to stop.");
    println!("────────────────────────────────────────");

    let deadline = duration.map(|secs| std::time::Instant::now() + Duration::from_secs(secs));
    while running_flag.load(std::sync::atomic::Ordering::SeqCst) && handles.is_running() {
        if let Some(d) = deadline {
            if std::time::Instant::now() >= d {
                break;
            }
        }
        std::thread::sleep(Duration::from_secs(1));

        let totals = handles.channel().totals();
        match handles.channel().latest_measurement() {
            Some(timed) => {
                let m = timed.measurement;
                println!(
                    "Vpp {:>4}  Freq {:>10.1} Hz  Duty {:>5.1} %  | published {} dropped {} frames {}",
                    m.vpp, m.frequency, m.duty_cycle,
                    totals.published, totals.dropped, totals.frames_rendered
                );
            }
            None => println!("No signal yet."),
        }
    }

    println!();
    println!("Stopping...");
    if let Err(e) = handles.stop() {
        error!("Pipeline error: {:#}", e);
        return Err(e);
    }
    info!("clean shutdown");
    Ok(())
}

fn print_help() {
    println!("Usage: dualscope [OPTIONS]");
    println!();
    println!("Options:");
    println!("  -c, --config FILE       Load settings from a JSON file");
    println!("  -w, --waveform KIND     Test signal: square, sine or ramp (default: square)");
    println!("  -p, --period N          Signal period in samples (default: 32)");
    println!("      --duty RATIO        Square wave duty ratio 0.0..=1.0 (default: 0.5)");
    println!("  -r, --sample-rate RATE  Sample rate in Hz (default: 500000)");
    println!("      --fps RATE          Render frame rate (default: 60)");
    println!("      --duration SECS     Stop automatically after SECS seconds");
    println!("  -v, --version           Show version");
    println!("  -h, --help              Show this help");
    println!();
    println!("Examples:");
    println!("  dualscope -w sine -p 64 -r 250000");
    println!("  dualscope --config scope.json --duration 10");
}
