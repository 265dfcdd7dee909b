//! Clear-cache command - delete the cache file.

use anyhow::Result;
use meterfeed_store::{CacheStore, Settings};

use crate::output::{ClearCacheOutput, JsonFormatter};
use crate::{Cli, OutputFormat};

/// Runs the clear-cache command.
pub async fn run(settings: &Settings, cli: &Cli) -> Result<()> {
    let cache = CacheStore::new(settings.cache_path());
    let existed = cache.delete().await?;

    match cli.format {
        OutputFormat::Text => {
            if existed {
                println!("Cache cleared: {}", cache.path().display());
            } else {
                println!("No cache to clear");
            }
        }
        OutputFormat::Json => {
            let output = ClearCacheOutput {
                cache_cleared: existed,
                path: cache.path().display().to_string(),
            };
            println!("{}", JsonFormatter::new(cli.pretty).format(&output)?);
        }
    }

    Ok(())
}
