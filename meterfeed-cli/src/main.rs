// Lint configuration for this crate
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! meterfeed CLI - month-to-date energy consumption per metering point.
//!
//! # Examples
//!
//! ```bash
//! # Daily table for the current month (cached for cache_ttl seconds)
//! meterfeed
//!
//! # Bypass the cache
//! meterfeed --refresh
//!
//! # Dashboard payload as JSON
//! meterfeed --format json --pretty
//!
//! # Drop the cache file
//! meterfeed clear-cache
//!
//! # Verify settings, cache and API access
//! meterfeed check
//! ```

mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use meterfeed_store::{Settings, default_settings_path};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use commands::{check, clear_cache, config, show};

// ============================================================================
// CLI Definition
// ============================================================================

/// meterfeed CLI - metering data fetch, cache and daily aggregation.
#[derive(Parser)]
#[command(name = "meterfeed")]
#[command(about = "Month-to-date energy consumption per metering point")]
#[command(long_about = r#"
meterfeed fetches daily consumption readings for your metering points,
caches the raw response on disk and shows them on one date axis with
per-day totals.

Examples:
  meterfeed                      # Daily table (cached)
  meterfeed --refresh            # Clear the cache and fetch again
  meterfeed --format json        # JSON output
  meterfeed config path          # Where settings and cache live
"#)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run. If none, runs 'show' by default.
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output format (text or json).
    #[arg(long, short = 'f', default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Pretty-print JSON output.
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Settings file.
    #[arg(long, short = 's', env = "METERFEED_SETTINGS", global = true)]
    pub settings: Option<PathBuf>,

    /// Clear the cache before loading.
    #[arg(long, short = 'r', global = true)]
    pub refresh: bool,

    /// Verbose output (show debug info).
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Quiet mode (minimal output).
    #[arg(long, short, global = true)]
    pub quiet: bool,
}

impl Cli {
    /// Settings file in effect.
    pub fn settings_path(&self) -> PathBuf {
        self.settings.clone().unwrap_or_else(default_settings_path)
    }
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Show the dashboard (default if no command specified).
    #[command(visible_alias = "s")]
    Show,

    /// Delete the cache file.
    ClearCache,

    /// Manage configuration.
    Config(config::ConfigArgs),

    /// Check settings, cache and API access.
    Check,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable text with colors.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

/// CLI exit codes.
#[repr(i32)]
pub enum ExitCode {
    /// General error.
    Error = 1,
    /// Neither live nor cached data was available.
    NoData = 2,
    /// A check failed.
    CheckFailed = 3,
}

// ============================================================================
// Logging Setup
// ============================================================================

fn setup_logging(verbose: bool, quiet: bool, request_logging: bool) {
    if quiet {
        return;
    }

    let filter = if verbose {
        EnvFilter::new("meterfeed=debug,info")
    } else if request_logging {
        EnvFilter::new("meterfeed=info,warn")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load_from(&cli.settings_path()).await;
    setup_logging(cli.verbose, cli.quiet, settings.enable_request_logging);

    let result = match &cli.command {
        Some(Commands::Show) | None => show::run(settings, &cli).await,
        Some(Commands::ClearCache) => clear_cache::run(&settings, &cli).await,
        Some(Commands::Config(args)) => config::run(args, &settings, &cli).await,
        Some(Commands::Check) => check::run(&settings, &cli).await,
    };

    if let Err(e) = result {
        if !cli.quiet {
            eprintln!("Error: {e:#}");
        }
        std::process::exit(ExitCode::Error as i32);
    }

    Ok(())
}
