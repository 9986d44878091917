//! Archive-Harvest main entry point
//!
//! This is the command-line interface for the Archive-Harvest news archive harvester.

use anyhow::Context;
use archive_harvest::config::{load_config_with_hash, Config};
use archive_harvest::crawler::harvest;
use archive_harvest::model::DateRange;
use archive_harvest::output::{ensure_writable_dir, print_summary};
use clap::Parser;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Archive-Harvest: a polite news archive harvester
///
/// Walks the day-by-day archive of a news site between two dates, writes the
/// metadata of every listed article to a CSV file and the text of each
/// article to its own file.
#[derive(Parser, Debug)]
#[command(name = "archive-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A polite news archive harvester", long_about = None)]
struct Cli {
    /// First day to harvest (YYYY-MM-DD)
    #[arg(short, long, value_name = "DATE")]
    start_date: String,

    /// Last day to harvest, inclusive (YYYY-MM-DD)
    #[arg(short, long, value_name = "DATE")]
    end_date: String,

    /// Directory receiving the metadata CSV and article files
    #[arg(short, long, value_name = "DIR")]
    path: PathBuf,

    /// Optional TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Everything that can be rejected is checked before the first request
    let range = DateRange::parse(&cli.start_date, &cli.end_date)?;
    let config = load_config(cli.config.as_ref())?;
    ensure_writable_dir(&cli.path)?;

    let cancel = CancellationToken::new();
    spawn_interrupt_handler(cancel.clone());

    tracing::info!("Writing output to: {}", cli.path.display());

    let summary = match harvest(config, range, &cli.path, cancel).await {
        Ok(summary) => summary,
        Err(e) => {
            tracing::error!("Harvest failed: {}", e);
            return Err(e.into());
        }
    };

    if !cli.quiet {
        print_summary(&summary);
    }

    Ok(())
}

/// Loads the configuration file if one was given, otherwise the defaults
fn load_config(path: Option<&PathBuf>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        tracing::info!("No configuration file given, using defaults");
        return Ok(Config::default());
    };

    tracing::info!("Loading configuration from: {}", path.display());
    let (config, hash) = load_config_with_hash(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);

    Ok(config)
}

/// Cancels the run on Ctrl-C
///
/// Articles already being fetched are finished and written; nothing new is
/// started.
fn spawn_interrupt_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing in-flight articles");
            cancel.cancel();
        }
    });
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("archive_harvest=info,warn"),
            1 => EnvFilter::new("archive_harvest=debug,info"),
            2 => EnvFilter::new("archive_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}
