//! WakeView replay CLI
//!
//! Load a solver log and ship document, play it headless and optionally
//! export the sampled trace.

use clap::Parser;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use wakeview_core::{LogSources, PlayerSettings, ShipPlayer};
use wakeview_sim::error::Result;
use wakeview_sim::{ControlEvent, ReplayExport, ReplayRunner, ReplaySummary, RunnerConfig, SimError};

/// WakeView headless replay
#[derive(Parser, Debug)]
#[command(name = "wakeview-sim")]
#[command(about = "Replay a ship motion log without a renderer", long_about = None)]
struct Args {
    /// Simulation log (CSV)
    #[arg(short, long)]
    log: PathBuf,

    /// Ship document (YAML)
    #[arg(short = 'S', long)]
    ship: PathBuf,

    /// Player settings (JSON); flags below override it
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Playback speed multiplier
    #[arg(long)]
    speed: Option<f64>,

    /// Stop at the end of the log instead of looping
    #[arg(long)]
    no_loop: bool,

    /// Host ticks per second
    #[arg(short, long, default_value = "60")]
    tick_rate: u32,

    /// Host run time in seconds (default: one pass of the log)
    #[arg(short, long)]
    duration: Option<f64>,

    /// Record every n-th tick in the export
    #[arg(long, default_value = "1")]
    record_interval: u32,

    /// Control event, e.g. pause@2.5 or seek@3=12.0 (repeatable)
    #[arg(short, long = "event")]
    events: Vec<ControlEvent>,

    /// Export the replay trace to a JSON file
    #[arg(long)]
    export: Option<PathBuf>,

    /// Verbose output (RUST_LOG overrides)
    #[arg(short, long)]
    verbose: bool,

    /// JSON summary on stdout
    #[arg(long)]
    json: bool,
}

/// Valid RUST_LOG directives win over `--verbose`.
fn log_filter(verbose: bool, directives: Option<&str>) -> EnvFilter {
    directives
        .and_then(|d| EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| EnvFilter::new(if verbose { "debug" } else { "info" }))
}

fn load_settings(args: &Args) -> Result<PlayerSettings> {
    let mut settings = match &args.settings {
        Some(path) => {
            let text = fs::read_to_string(path).map_err(|e| SimError::Settings {
                path: path.clone(),
                reason: e.to_string(),
            })?;
            PlayerSettings::from_json(&text).map_err(|e| SimError::Settings {
                path: path.clone(),
                reason: e.to_string(),
            })?
        }
        None => PlayerSettings::default(),
    };

    if let Some(speed) = args.speed {
        settings = settings.with_speed(speed);
    }
    if args.no_loop {
        settings = settings.with_looping(false);
    }

    Ok(settings)
}

fn run(args: &Args) -> Result<ReplaySummary> {
    let settings = load_settings(args)?;

    let mut player = ShipPlayer::new(settings);
    let report = player.load(&LogSources::new(&args.log, &args.ship))?;
    if !report.is_playable() {
        warn!(
            "Log has {} frame(s) ending at {:.3}s; nothing to replay",
            report.frames, report.last_time
        );
    }

    let config = RunnerConfig {
        tick_rate_hz: args.tick_rate,
        duration_secs: args.duration,
        record_interval: args.record_interval,
        ..Default::default()
    };

    let mut runner = ReplayRunner::new(player)
        .with_config(config)
        .with_events(args.events.clone());
    let run = runner.run()?;
    let summary = run.summary.clone();

    if let Some(path) = &args.export {
        let source = args.log.display().to_string();
        let export = ReplayExport::from_run(&source, args.tick_rate, &args.events, run);
        export.write_to_file(path)?;
        info!("Exported {} frames to {}", export.frames.len(), path.display());
    }

    Ok(summary)
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize logging
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(log_filter(args.verbose, directives.as_deref()))
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }

    if !args.json {
        info!("WakeView replay v{}", env!("CARGO_PKG_VERSION"));
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    }

    let summary = match run(&args) {
        Ok(summary) => summary,
        Err(e) => {
            error!("✗ Replay failed: {}", e);
            if args.json {
                println!("{}", serde_json::json!({ "ok": false, "error": e.to_string() }));
            }
            return ExitCode::FAILURE;
        }
    };

    if args.json {
        let output = serde_json::json!({
            "ok": true,
            "log": args.log.display().to_string(),
            "summary": summary,
        });
        match serde_json::to_string_pretty(&output) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                error!("Failed to encode summary: {}", e);
                return ExitCode::FAILURE;
            }
        }
    } else {
        info!("");
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        info!(
            "✓ {} ticks | log t={:.2}s / {:.2}s | {} events | max speed {:.2} m/s",
            summary.total_ticks,
            summary.final_elapsed,
            summary.last_frame_time,
            summary.events_applied,
            summary.max_speed_mps
        );
        if summary.reached_end {
            info!("  Playback reached the end of the log");
        }
    }

    ExitCode::SUCCESS
}
