//! Config command - inspect and create the settings file.

use anyhow::Result;
use clap::{Args, Subcommand};
use meterfeed_store::{Settings, default_config_dir, save_json};
use tracing::info;

use crate::output::{JsonFormatter, PathsOutput};
use crate::{Cli, OutputFormat};

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config subcommands.
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show the effective configuration (secrets hidden).
    Show,

    /// Show configuration paths.
    Path,

    /// Write a settings file with the defaults.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

/// Runs the config command.
pub async fn run(args: &ConfigArgs, settings: &Settings, cli: &Cli) -> Result<()> {
    match &args.action {
        ConfigAction::Show => show_config(settings, cli),
        ConfigAction::Path => show_paths(settings, cli),
        ConfigAction::Init { force } => init_config(*force, cli).await,
    }
}

fn show_config(settings: &Settings, cli: &Cli) -> Result<()> {
    let shown = settings.redacted();

    match cli.format {
        OutputFormat::Text => {
            println!("meterfeed Configuration");
            println!("{}", "─".repeat(40));
            println!();
            println!("Cache TTL:       {}s", shown.cache_ttl);
            println!("Cache file:      {}", shown.cache_path().display());
            println!("Auth mode:       {}", settings.auth_params().mode());
            println!("Token endpoint:  {}", shown.token_endpoint_url);
            println!("Data endpoint:   {}", shown.data_endpoint_url);
            println!("Min excl. today: {}", shown.min_day_excludes_today);
            println!("Request logging: {}", shown.enable_request_logging);
            println!();
            if shown.eic_nicknames.is_empty() {
                println!("Nicknames:       (none)");
            } else {
                println!("Nicknames:");
                for entry in shown.eic_nicknames.entries() {
                    match &entry.color {
                        Some(color) => println!("  • {} → {} ({color})", entry.key, entry.nick),
                        None => println!("  • {} → {}", entry.key, entry.nick),
                    }
                }
            }
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&shown)?);
        }
    }

    Ok(())
}

fn show_paths(settings: &Settings, cli: &Cli) -> Result<()> {
    let settings_path = cli.settings_path();
    let output = PathsOutput {
        config_dir: default_config_dir().display().to_string(),
        settings_file: settings_path.display().to_string(),
        settings_exists: settings_path.exists(),
        cache_file: settings.cache_path().display().to_string(),
    };

    match cli.format {
        OutputFormat::Text => {
            println!("Configuration Paths");
            println!("{}", "─".repeat(40));
            println!();
            println!("Config dir:    {}", output.config_dir);
            println!(
                "Settings file: {}{}",
                output.settings_file,
                if output.settings_exists { "" } else { " (missing)" }
            );
            println!("Cache file:    {}", output.cache_file);
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&output)?);
        }
    }

    Ok(())
}

async fn init_config(force: bool, cli: &Cli) -> Result<()> {
    let path = cli.settings_path();

    if path.exists() && !force {
        anyhow::bail!(
            "Settings file already exists: {} (use --force to overwrite)",
            path.display()
        );
    }

    save_json(&path, &Settings::default()).await?;

    info!(path = %path.display(), "Settings file written");
    println!("Wrote {}", path.display());

    Ok(())
}
