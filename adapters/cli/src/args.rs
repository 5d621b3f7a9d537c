//! Command-line flags of the headless overlay.

use std::path::PathBuf;

use clap::Parser;
use lizard_hook_core::MonitorBounds;

/// Drives the badge engine without a display, feeding it synthetic triggers.
#[derive(Debug, Parser)]
#[command(name = "lizard-hook", version)]
pub(crate) struct Cli {
    /// JSON configuration file; watched for changes while running.
    #[arg(long)]
    pub(crate) config: Option<PathBuf>,
    /// Log filter used when `RUST_LOG` is unset, e.g. `debug` or `lizard_hook_engine=trace`.
    #[arg(long)]
    pub(crate) log_level: Option<String>,
    /// Stop after this many seconds; runs until killed when omitted.
    #[arg(long)]
    pub(crate) seconds: Option<f64>,
    /// Synthetic spawn requests per second; zero disables the trigger source.
    #[arg(long, default_value_t = 8.0)]
    pub(crate) triggers_per_second: f64,
    /// Seed for the engine and the trigger source.
    #[arg(long)]
    pub(crate) seed: Option<u64>,
    /// Monitor rectangle as `WIDTHxHEIGHT@X,Y`; repeat for several monitors.
    #[arg(long = "monitors", value_parser = parse_monitor)]
    pub(crate) monitors: Vec<MonitorBounds>,
    /// Refresh rate reported by the headless display.
    #[arg(long)]
    pub(crate) refresh_rate: Option<u32>,
}

/// Parses `WIDTHxHEIGHT@X,Y`. The `@X,Y` origin is optional and defaults to `0,0`.
pub(crate) fn parse_monitor(value: &str) -> Result<MonitorBounds, String> {
    let (size, origin) = match value.split_once('@') {
        Some((size, origin)) => (size, Some(origin)),
        None => (value, None),
    };
    let (width, height) = size
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got `{size}`"))?;
    let width: u32 = parse_number(width, "width")?;
    let height: u32 = parse_number(height, "height")?;
    if width == 0 || height == 0 {
        return Err(format!("monitor `{value}` has no area"));
    }

    let (x, y) = match origin {
        Some(origin) => {
            let (x, y) = origin
                .split_once(',')
                .ok_or_else(|| format!("expected X,Y origin, got `{origin}`"))?;
            (parse_number(x, "x")?, parse_number(y, "y")?)
        }
        None => (0, 0),
    };

    Ok(MonitorBounds::from_origin_and_size(x, y, width, height))
}

fn parse_number<T: std::str::FromStr>(text: &str, what: &str) -> Result<T, String> {
    text.trim()
        .parse()
        .map_err(|_| format!("invalid {what} `{text}`"))
}
