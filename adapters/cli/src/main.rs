#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs the Lizard Hook badge engine headless.
//!
//! A synthetic trigger thread stands in for the global input hook, a watcher
//! thread republishes the configuration file when it changes, and the frames
//! the engine produces are reported through `tracing`.

mod args;
mod config;
mod headless;
mod triggers;

use std::{
    thread,
    time::{Duration, Instant},
};

use anyhow::{anyhow, ensure, Context, Result};
use clap::Parser;
use lizard_hook_engine::{EngineOptions, Overlay};
use tracing_subscriber::EnvFilter;

use crate::{
    args::Cli,
    config::{ConfigWatcher, FileConfig},
    headless::{HeadlessPlatform, LoggingRenderer},
    triggers::TriggerSource,
};

/// Filter used when nothing else names one.
const DEFAULT_LOG_LEVEL: &str = "info";
/// How often the main thread checks whether the overlay loop has exited.
const SUPERVISE_INTERVAL: Duration = Duration::from_millis(100);

/// Entry point for the Lizard Hook command-line interface.
fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = config::resolve_path(cli.config.as_deref());
    let file = match &config_path {
        Some(path) => config::load(path)?,
        None => FileConfig::default(),
    };

    let level = cli
        .log_level
        .as_deref()
        .or(file.logging_level.as_deref())
        .unwrap_or(DEFAULT_LOG_LEVEL);
    init_logging(level)?;
    match &config_path {
        Some(path) => tracing::info!(path = %path.display(), "loaded configuration"),
        None => tracing::info!("no configuration file found, using defaults"),
    }

    let deadline = cli.seconds.map(run_deadline).transpose()?;
    let platform = HeadlessPlatform::new(cli.monitors, cli.refresh_rate, deadline);
    let options = EngineOptions {
        rng_seed: cli.seed,
        ..EngineOptions::default()
    };
    let mut overlay = Overlay::new(LoggingRenderer::default(), platform, &file.overlay, options);
    overlay.init().context("failed to initialize overlay")?;

    let overlay = overlay.spawn().context("failed to start overlay")?;
    let handle = overlay.handle().clone();
    let watcher = config_path
        .map(|path| ConfigWatcher::spawn(path, handle.clone()))
        .transpose()?;
    let triggers = TriggerSource::spawn(handle, cli.triggers_per_second, cli.seed)?;

    while !overlay.is_finished() {
        thread::sleep(SUPERVISE_INTERVAL);
    }

    let fired = triggers.map_or(0, TriggerSource::stop);
    if let Some(watcher) = watcher {
        watcher.stop();
    }
    let stats = overlay.shutdown().context("overlay loop failed")?;

    tracing::info!(
        fired,
        frames = stats.frames,
        admitted = stats.admitted,
        rejected_capacity = stats.rejected_capacity,
        rejected_rate = stats.rejected_rate,
        swaps_applied = stats.swaps_applied,
        swaps_rejected = stats.swaps_rejected,
        "overlay finished"
    );
    Ok(())
}

/// Installs the global subscriber. `RUST_LOG` takes precedence over `level`.
fn init_logging(level: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level)
            .with_context(|| format!("invalid log level `{level}`"))?,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(true)
        .try_init()
        .map_err(|error| anyhow!("failed to install log subscriber: {error}"))
}

fn run_deadline(seconds: f64) -> Result<Instant> {
    ensure!(
        seconds.is_finite() && seconds > 0.0,
        "--seconds must be a positive number, got {seconds}"
    );
    let duration = Duration::try_from_secs_f64(seconds).context("--seconds is out of range")?;
    Instant::now()
        .checked_add(duration)
        .ok_or_else(|| anyhow!("--seconds is out of range"))
}
