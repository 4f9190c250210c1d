//! Nodewatch CLI
//!
//! Runs one alerting sweep and exits; scheduling is left to cron or a timer unit.

use std::path::PathBuf;

use clap::Parser;
use nodewatch::config::{FetchErrorPolicy, FormatStrategy};
use nodewatch::{load_config, Config};
use tracing::Level;

#[derive(Parser)]
#[command(name = "nodewatch")]
#[command(about = "Fleet downtime and exception alerting to a chat webhook")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Message layout (overrides config file)
    #[arg(long, value_enum)]
    strategy: Option<FormatStrategy>,

    /// Whether a failed fetch stops the run (overrides config file)
    #[arg(long, value_enum)]
    on_fetch_error: Option<FetchErrorPolicy>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: Level,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .init();

    tracing::debug!(
        "Parsed command line arguments: config={:?}, strategy={:?}, on_fetch_error={:?}, log_level={:?}",
        args.config,
        args.strategy,
        args.on_fetch_error,
        args.log_level
    );

    let mut config = if let Some(config_path) = &args.config {
        tracing::debug!("Loading configuration from {:?}", config_path);
        load_config(config_path)?
    } else {
        tracing::debug!("Using default configuration");
        Config::default()
    };

    config.resolve_secrets()?;

    if let Some(strategy) = args.strategy {
        config.format.strategy = strategy;
    }
    if let Some(policy) = args.on_fetch_error {
        config.fetch.on_error = policy;
    }

    tracing::info!("Starting nodewatch sweep");
    let report = nodewatch::run(config).await?;
    report.ensure_complete()?;

    Ok(())
}
