//! Check command - verify settings, cache and API access.
//!
//! The API check performs a real token exchange and data call but does not
//! touch the cache.

use anyhow::Result;
use chrono::Utc;
use meterfeed_fetch::{HttpMeteringSource, MeteringSource, QueryWindow};
use meterfeed_store::{CacheStore, Settings, epoch_seconds};
use tracing::debug;

use crate::output::{CheckOutput, JsonFormatter, TextFormatter};
use crate::{Cli, ExitCode, OutputFormat};

/// Runs the check command.
pub async fn run(settings: &Settings, cli: &Cli) -> Result<()> {
    let checks = vec![
        check_settings(cli),
        check_credentials(settings),
        check_cache(settings).await,
        check_api(settings).await,
    ];
    let all_ok = checks.iter().all(|c| c.ok);

    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            for check in &checks {
                println!("{}", formatter.format_check(check));
            }
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&checks)?);
        }
    }

    if !all_ok {
        std::process::exit(ExitCode::CheckFailed as i32);
    }

    Ok(())
}

fn check_settings(cli: &Cli) -> CheckOutput {
    let path = cli.settings_path();
    if path.exists() {
        CheckOutput::new("settings", true, path.display().to_string())
    } else {
        CheckOutput::new(
            "settings",
            true,
            format!("{} not found, using defaults", path.display()),
        )
    }
}

fn check_credentials(settings: &Settings) -> CheckOutput {
    let auth = settings.auth_params();
    if auth.is_empty() {
        CheckOutput::new("auth", false, "no credentials configured")
    } else {
        CheckOutput::new("auth", true, auth.mode())
    }
}

async fn check_cache(settings: &Settings) -> CheckOutput {
    let cache = CacheStore::new(settings.cache_path());
    let now = epoch_seconds(Utc::now());

    match cache.get().await {
        Some(entry) => {
            let state = if CacheStore::is_fresh(&entry, now, settings.cache_ttl()) {
                "fresh"
            } else {
                "expired"
            };
            CheckOutput::new(
                "cache",
                true,
                format!("{state}, {:.0}s old", entry.age(now).max(0.0)),
            )
        }
        None => CheckOutput::new("cache", true, "empty"),
    }
}

async fn check_api(settings: &Settings) -> CheckOutput {
    let source = match HttpMeteringSource::new(
        &settings.token_endpoint_url,
        &settings.data_endpoint_url,
        settings.auth_params(),
    ) {
        Ok(source) => source,
        Err(e) => return CheckOutput::new("api", false, e.to_string()),
    };

    debug!(url = %source.data_url(), "Checking metering API");
    match source.fetch(&QueryWindow::month_to_date(Utc::now())).await {
        Ok(payload) => {
            let points = payload.as_array().map_or(0, Vec::len);
            CheckOutput::new("api", true, format!("{points} metering point(s)"))
        }
        Err(e) => CheckOutput::new("api", false, e.to_string()),
    }
}
