// src/main.rs
//! Proctor Monitor demonstration harness
//!
//! Runs both monitors against an in-process clipboard, scripts a handful of
//! copy events so the run produces output, and prints each event as it is
//! detected. This binary is a demo of the library surface, not part of the
//! core monitoring contract.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use proctor_monitor::prelude::*;

/// Command line interface for the proctor monitor demo
#[derive(Debug, Parser)]
#[command(
    name = "proctor-monitor",
    about = "Clipboard risk tracking and simulated peripheral change detection",
    long_about = "Demonstrates the proctor-monitor library: a clipboard copy/paste \
                  tracker with exponential risk scoring, keyboard shortcut blocking, \
                  and a simulated USB/monitor change detector."
)]
struct Args {
    /// How long to run before shutting the monitors down, in seconds
    #[arg(long, default_value_t = 20)]
    duration: u64,

    /// Clipboard polling interval in milliseconds
    #[arg(long, default_value_t = 1000)]
    poll_interval_ms: u64,

    /// Tick interval of the simulated device-attach generator, in seconds
    #[arg(long, default_value_t = 10)]
    device_interval: u64,

    /// Tick interval of the simulated monitor-count generator, in seconds
    #[arg(long, default_value_t = 15)]
    display_interval: u64,

    /// Seed the simulated generators for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// Activate shortcut blocking for the duration of the run
    #[arg(long)]
    block_shortcuts: bool,

    /// Output format for events
    #[arg(long, default_value = "human", value_enum)]
    format: OutputFormat,

    /// Verbosity level for logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, clap::ValueEnum)]
enum OutputFormat {
    /// Human-readable event lines
    Human,
    /// One JSON object per event
    Json,
}

fn setup_logging(args: &Args) {
    use tracing_subscriber::{fmt, EnvFilter};

    let level = match args.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    fmt()
        .with_env_filter(filter)
        .with_target(args.verbose > 1)
        .with_thread_ids(args.verbose > 2)
        .init();
}

fn clipboard_callback(format: OutputFormat) -> EventCallback<ClipboardEvent> {
    Arc::new(move |event| match format {
        OutputFormat::Human => println!(
            "[clipboard] \"{}\" words={} increment={} (x{} within window)",
            event.content_preview, event.word_count, event.risk_increment, event.multiplier
        ),
        OutputFormat::Json => {
            if let Ok(json) = serde_json::to_string(event) {
                println!("{}", json);
            }
        }
    })
}

fn peripheral_callback(format: OutputFormat) -> EventCallback<PeripheralEvent> {
    Arc::new(move |event| match format {
        OutputFormat::Human => println!(
            "[peripheral] {} (+{})",
            event.description, event.risk_increment
        ),
        OutputFormat::Json => {
            if let Ok(json) = serde_json::to_string(event) {
                println!("{}", json);
            }
        }
    })
}

/// Feed scripted pastes into the shared clipboard so a short demo run
/// reliably produces clipboard events.
fn script_pastes(clipboard: SharedClipboard, run_for: Duration) {
    std::thread::spawn(move || {
        let samples = [
            "The quick brown fox jumps over the lazy dog near the riverbank",
            "Answers to question four: mitochondria are the powerhouse of the cell",
            "def solve(n): return n * (n + 1) // 2  # closed form for the sum",
        ];
        let pause = (run_for / (samples.len() as u32 + 1)).max(Duration::from_millis(200));
        for text in samples {
            std::thread::sleep(pause);
            clipboard.set(text);
        }
    });
}

fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(&args);

    info!("starting proctor-monitor v{}", env!("CARGO_PKG_VERSION"));

    let clipboard = SharedClipboard::new();
    let clipboard_config = ClipboardMonitorConfig {
        poll_interval: Duration::from_millis(args.poll_interval_ms),
        ..Default::default()
    };
    let mut clipboard_monitor =
        ClipboardRiskMonitor::new(clipboard_config, Arc::new(clipboard.clone()))
            .with_callback(clipboard_callback(args.format.clone()));

    let peripheral_config = PeripheralMonitorConfig {
        device_interval: Duration::from_secs(args.device_interval),
        display_interval: Duration::from_secs(args.display_interval),
        rng_seed: args.seed,
        ..Default::default()
    };
    let mut peripheral_monitor = PeripheralMonitor::new(peripheral_config)
        .with_callback(peripheral_callback(args.format.clone()));

    clipboard_monitor.start();
    peripheral_monitor.start();

    if args.block_shortcuts && clipboard_monitor.disable_shortcuts() {
        info!("shortcut blocking requested for this run");
    }

    let run_for = Duration::from_secs(args.duration);
    script_pastes(clipboard, run_for);
    std::thread::sleep(run_for);

    clipboard_monitor.stop();
    peripheral_monitor.stop();

    println!(
        "clipboard: {} events, risk score {}",
        clipboard_monitor.event_count(),
        clipboard_monitor.risk_score()
    );
    println!(
        "peripheral: {} events, risk score {}",
        peripheral_monitor.event_count(),
        peripheral_monitor.risk_score()
    );

    if matches!(args.format, OutputFormat::Json) {
        println!("{}", clipboard_monitor.export_json()?);
        println!("{}", peripheral_monitor.export_json()?);
    }

    Ok(())
}
