//! quote-send - Scheduler daemon for automated quote posting
//!
//! Runs the auto-post tick at every minute boundary, or once on demand.

use chrono::{DateTime, Timelike, Utc};
use clap::Parser;
use libquotecast::{AutoPostService, Config, QuotecastError, Result, TickSummary};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "quote-send")]
#[command(version)]
#[command(about = "Scheduler daemon for automated quote posting")]
#[command(long_about = "\
quote-send - Scheduler daemon for automated quote posting

DESCRIPTION:
    quote-send runs the auto-post tick once per minute. Each tick:

      1. At local midnight, drops every pending share
      2. Publishes one quote to every page that is due this minute
      3. Relays the oldest pending share of each source page whose share
         schedule matches this minute

    Schedules are evaluated in local time (UTC+7). Every tick prints a JSON
    summary on stdout; logs go to stderr.

USAGE:
    # Run as a daemon (ticks at each minute boundary)
    quote-send

    # Run a single tick now and print the summary
    quote-send --once

    # Ignore schedules and working hours for a manual test post
    quote-send --once --force

    # Enable verbose logging
    quote-send --verbose

SIGNALS:
    SIGTERM, SIGINT - Graceful shutdown (finishes the current tick)

CONFIGURATION:
    Configuration file: ~/.config/quotecast/config.toml
    Database location: ~/.local/share/quotecast/quotecast.db

    Override with environment variables:
        QUOTECAST_CONFIG      - Path to config file
        QUOTECAST_DB_PATH     - Path to database file
        GEMINI_API_KEY        - Image generation key
        FREEIMAGE_API_KEY     - Image hosting key
        QUOTECAST_LOG_FORMAT  - text, json or pretty
        QUOTECAST_LOG_LEVEL   - error, warn, info, debug or trace

EXIT CODES:
    0 - Clean shutdown
    1 - Runtime error
    2 - Configuration error
")]
struct Cli {
    /// Run a single tick, print its summary and exit
    #[arg(long)]
    once: bool,

    /// Treat every enabled page as due and relay shares regardless of schedule
    #[arg(long)]
    force: bool,

    /// Enable verbose logging to stderr
    #[arg(short, long)]
    #[arg(help = "Enable verbose logging (useful for debugging)")]
    verbose: bool,

    /// Evaluate the tick at this instant instead of now (for testing)
    #[arg(long, hide = true, value_name = "RFC3339")]
    at: Option<DateTime<Utc>>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    libquotecast::logging::init_default(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let service = AutoPostService::from_config(&config).await?;

    info!("quote-send starting");

    if cli.once {
        let now = cli.at.unwrap_or_else(Utc::now);
        let summary = service.run_tick(now, cli.force).await;
        print_summary(&summary, true)?;
        info!("quote-send: ran one tick, exiting");
        return Ok(());
    }

    let shutdown = Arc::new(AtomicBool::new(false));
    if let Err(e) = setup_signal_handlers(shutdown.clone()) {
        warn!("Graceful shutdown unavailable: {:#}", e);
    }

    run_daemon_loop(&service, cli.force, shutdown).await?;

    info!("quote-send stopped");
    Ok(())
}

fn print_summary(summary: &TickSummary, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(summary)
    } else {
        serde_json::to_string(summary)
    }
    .map_err(|e| QuotecastError::InvalidInput(format!("failed to encode summary: {}", e)))?;

    println!("{}", json);
    Ok(())
}

/// Set up signal handlers for graceful shutdown
#[cfg(unix)]
fn setup_signal_handlers(shutdown: Arc<AtomicBool>) -> anyhow::Result<()> {
    use anyhow::Context;
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals =
        Signals::new([SIGINT, SIGTERM]).context("failed to register signal handlers")?;

    std::thread::spawn(move || {
        if signals.forever().next().is_some() {
            info!("Received shutdown signal, stopping after the current tick...");
            shutdown.store(true, Ordering::Relaxed);
        }
    });

    Ok(())
}

#[cfg(not(unix))]
fn setup_signal_handlers(shutdown: Arc<AtomicBool>) -> anyhow::Result<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl-C, stopping after the current tick...");
            shutdown.store(true, Ordering::Relaxed);
        }
    });
    Ok(())
}

/// Seconds until the start of the next minute
fn secs_until_next_minute(now: DateTime<Utc>) -> u64 {
    60 - u64::from(now.second().min(59))
}

/// Tick at every minute boundary until shutdown is requested
async fn run_daemon_loop(
    service: &AutoPostService,
    force: bool,
    shutdown: Arc<AtomicBool>,
) -> Result<()> {
    loop {
        // Sleep to the next boundary, checking for shutdown every second
        for _ in 0..secs_until_next_minute(Utc::now()) {
            if shutdown.load(Ordering::Relaxed) {
                info!("Shutdown requested, stopping daemon loop");
                return Ok(());
            }
            sleep(Duration::from_secs(1)).await;
        }

        let summary = service.run_tick(Utc::now(), force).await;
        print_summary(&summary, false)?;
    }
}
