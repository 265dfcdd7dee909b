//! Show command - load and display the dashboard.

use anyhow::Result;
use chrono::Utc;
use meterfeed_store::{EnergyService, LoadSource, Settings};
use tracing::{debug, info};

use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, ExitCode, OutputFormat};

/// Runs the show command.
pub async fn run(settings: Settings, cli: &Cli) -> Result<()> {
    debug!(refresh = cli.refresh, "Loading dashboard");

    let service = EnergyService::from_settings(settings);
    let payload = service.load(Utc::now(), cli.refresh).await;

    info!(
        source = ?payload.source,
        meters = payload.result.series.len(),
        days = payload.result.dates.len(),
        "Dashboard ready"
    );

    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            println!("{}", formatter.format_dashboard(&payload));
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&payload)?);
        }
    }

    if payload.source == LoadSource::Empty {
        std::process::exit(ExitCode::NoData as i32);
    }

    Ok(())
}
