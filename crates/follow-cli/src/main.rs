//! `follow` – person-following robot command line.
//!
//! Subcommands:
//!
//! - `run` drives the full pipeline (capture thread, detector, brain,
//!   motors).  Without a robot attached it runs against the simulated camera
//!   and the logging motor driver.  The detector is the person SSD when a
//!   model is given (`--model` or `detector.model_path`, requires the `onnx`
//!   feature) and a scripted walk across the frame otherwise.
//! - `replay <FILE>` feeds a JSON-lines recording of detection events through
//!   the brain and prints the resulting commands.
//! - `config show` / `config init` inspect or create `~/.follow/config.toml`.
//!
//! Ctrl-C clears the shared running flag; the control loop then stops the
//! motors before the process exits.

mod config;
mod replay;

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use clap::{Parser, Subcommand};
use colored::Colorize;
use follow_hal::{SimCamera, SimMotorDriver};
use follow_perception::model::DEFAULT_MODEL_PATH;
use follow_perception::{Detector, ScriptedDetector, SkippingDetector, SsdPostprocessor};
use follow_runtime::{
    Brain, CaptureOptions, CaptureWorker, ControlLoop, FrameMailbox, MonotonicClock, init_tracing,
};
use tracing::{info, warn};

use crate::config::Config;

#[derive(Debug, Parser)]
#[command(name = "follow", version)]
#[command(about = "Camera-driven person follower for a differential-drive robot", long_about = None)]
struct Cli {
    /// Config file to use instead of ~/.follow/config.toml.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run the follow loop against the simulated robot.
    Run {
        /// Stop after this many processed frames.
        #[arg(long)]
        ticks: Option<u64>,

        /// Detections per phase of the simulated walk (left, centre, right,
        /// gone).
        #[arg(long, default_value_t = 10)]
        dwell: usize,

        /// Run this SSD model instead of the scripted walk.  Given without a
        /// value, models/person_ssd.onnx is used.
        #[arg(long, value_name = "PATH", num_args = 0..=1, default_missing_value = DEFAULT_MODEL_PATH)]
        model: Option<PathBuf>,
    },

    /// Replay a JSON-lines recording of detection events.
    Replay {
        /// Recording to read.
        file: PathBuf,
    },

    /// Inspect or create the config file.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Print the effective configuration (file plus FOLLOW_* overrides).
    Show,
    /// Write a config file with every default filled in.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let _telemetry = init_tracing("follow");

    let config_path = cli.config.clone().unwrap_or_else(config::config_path);

    let result = match cli.command {
        Commands::Run {
            ticks,
            dwell,
            model,
        } => {
            print_banner();
            config::load_effective(&config_path).and_then(|mut cfg| {
                if model.is_some() {
                    cfg.detector.model_path = model;
                }
                run(&cfg, ticks, dwell)
            })
        }
        Commands::Replay { file } => {
            config::load_effective(&config_path).and_then(|cfg| replay_file(&cfg, &file))
        }
        Commands::Config { action } => config_command(action, &config_path),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// run
// ─────────────────────────────────────────────────────────────────────────────

fn run(cfg: &Config, ticks: Option<u64>, dwell: usize) -> Result<(), String> {
    cfg.validate()?;

    let running = Arc::new(AtomicBool::new(true));
    let running_ctrlc = Arc::clone(&running);
    if let Err(e) = ctrlc::set_handler(move || {
        println!();
        println!("{}", "⚠  Ctrl-C received – stopping motors …".yellow().bold());
        running_ctrlc.store(false, Ordering::SeqCst);
    }) {
        warn!(error = %e, "Failed to install Ctrl-C handler; use --ticks to bound the run");
    }

    let (width, height) = (cfg.camera.width, cfg.camera.height);
    let frames = FrameMailbox::new();
    let mut capture = CaptureWorker::spawn(
        Box::new(SimCamera::new("sim_camera", width, height)),
        frames.clone(),
        CaptureOptions {
            rotate_180: cfg.camera.rotate_180,
            frame_interval: Duration::from_secs_f64(1.0 / f64::from(cfg.camera.fps)),
            ..CaptureOptions::default()
        },
    )
    .map_err(|e| format!("Failed to start capture thread: {e}"))?;

    let post = cfg.detector.postprocessor(cfg.brain.bands);
    let inner: Box<dyn Detector> = match &cfg.detector.model_path {
        Some(path) => ssd_detector(cfg, path, post)?,
        None => Box::new(ScriptedDetector::walk_across(
            width,
            height,
            dwell,
            post.classifier,
        )),
    };
    let detector = SkippingDetector::new(inner, cfg.detector.detect_every_n_frames)
        .map_err(|e| format!("[detector] {e}"))?;

    let motors = SimMotorDriver::new("drive_base");
    let motor_log = motors.log();

    info!(
        width,
        height,
        fps = cfg.camera.fps,
        detect_every_n = cfg.detector.detect_every_n_frames,
        model = ?cfg.detector.model_path,
        "starting simulated follow run"
    );

    let mut control = ControlLoop::new(
        Brain::new(cfg.brain.clone()),
        Box::new(detector),
        Box::new(motors),
        Box::new(MonotonicClock::new()),
        frames.clone(),
    )
    .with_loop_sleep(Duration::from_millis(cfg.control.loop_sleep_ms));

    let processed = control.run_until(&running, ticks);
    drop(control);
    capture.stop();

    println!();
    println!(
        "  {} {} frame(s) processed, {} command(s) applied, {} frame(s) dropped",
        "✓".green().bold(),
        processed,
        motor_log.apply_count(),
        frames.dropped()
    );
    Ok(())
}

#[cfg(feature = "onnx")]
fn ssd_detector(
    cfg: &Config,
    path: &Path,
    post: SsdPostprocessor,
) -> Result<Box<dyn Detector>, String> {
    use follow_perception::{OnnxSsdModel, SsdDetector};

    let model = OnnxSsdModel::open(path, cfg.detector.input_width, cfg.detector.input_height)
        .map_err(|e| format!("[detector] {e}"))?;
    info!(
        threshold = post.confidence_threshold,
        person_class = post.person_class,
        "using SSD person detector"
    );
    Ok(Box::new(SsdDetector::new(model, post)))
}

#[cfg(not(feature = "onnx"))]
fn ssd_detector(
    _cfg: &Config,
    path: &Path,
    _post: SsdPostprocessor,
) -> Result<Box<dyn Detector>, String> {
    Err(format!(
        "[detector] cannot run {}: follow was built without the `onnx` feature",
        path.display()
    ))
}

// ─────────────────────────────────────────────────────────────────────────────
// replay
// ─────────────────────────────────────────────────────────────────────────────

fn replay_file(cfg: &Config, path: &Path) -> Result<(), String> {
    cfg.brain.validate().map_err(|e| format!("[brain] {e}"))?;

    let file = File::open(path).map_err(|e| format!("Failed to open {}: {}", path.display(), e))?;
    let events = replay::read_events(BufReader::new(file))?;
    let mut brain = Brain::new(cfg.brain.clone());

    for step in replay::replay(&mut brain, &events) {
        let mode = step
            .mode
            .map_or_else(|| "-".to_string(), |m| format!("{m:?}").to_lowercase());
        println!(
            "{:>9.3}s  {:<7} {:<14} {:>4} {:>4}",
            step.t.as_secs_f64(),
            mode.dimmed(),
            step.command.label.to_string().bold(),
            step.command.left_speed,
            step.command.right_speed
        );
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// config
// ─────────────────────────────────────────────────────────────────────────────

fn config_command(action: ConfigAction, path: &Path) -> Result<(), String> {
    match action {
        ConfigAction::Show => {
            let cfg = config::load_effective(path)?;
            let raw = toml::to_string_pretty(&cfg)
                .map_err(|e| format!("Failed to serialize config: {e}"))?;
            println!("# {}", path.display().to_string().dimmed());
            println!("{raw}");
            if let Err(e) = cfg.validate() {
                println!("{}: {}", "invalid".red().bold(), e);
            }
            Ok(())
        }
        ConfigAction::Init { force } => {
            if path.exists() && !force {
                return Err(format!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                ));
            }
            config::save_to(&Config::default(), path)?;
            println!(
                "  {} Config saved to {}",
                "✓".green().bold(),
                path.display().to_string().bold()
            );
            Ok(())
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Banner
// ─────────────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!(
        "  {} {}",
        "follow".bold().cyan(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
    println!("  Person-following robot controller");
    println!();
}
