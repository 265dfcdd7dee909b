//! Single-entry disk cache for the raw API payload.
//!
//! The file holds exactly one entry:
//!
//! ```json
//! { "_cached_at": 1714550400.123, "data": [ ... ] }
//! ```
//!
//! Read failures are treated as misses; callers never see them.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::error::StoreError;
use crate::persistence::{load_json, write_atomic};

// ============================================================================
// Cache Entry
// ============================================================================

/// The cached payload and when it was stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Store time, seconds since the Unix epoch.
    #[serde(rename = "_cached_at", default)]
    pub cached_at: f64,

    /// Raw payload as returned by the metering API.
    #[serde(default)]
    pub data: Value,
}

impl CacheEntry {
    /// Creates an entry.
    pub fn new(data: Value, cached_at: f64) -> Self {
        Self { cached_at, data }
    }

    /// Seconds elapsed between storing and `now`.
    pub fn age(&self, now: f64) -> f64 {
        now - self.cached_at
    }
}

// ============================================================================
// Cache Store
// ============================================================================

/// Disk-backed store of the latest payload.
#[derive(Debug, Clone)]
pub struct CacheStore {
    path: PathBuf,
}

impl CacheStore {
    /// Creates a store backed by `path`. Nothing is touched until first use.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the cache file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the entry. A missing or unreadable file is `None`.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub async fn get(&self) -> Option<CacheEntry> {
        match load_json::<CacheEntry>(&self.path).await {
            Ok(entry) => {
                debug!(cached_at = entry.cached_at, "Cache hit");
                Some(entry)
            }
            Err(e) if e.is_not_found() => {
                debug!("No cache file");
                None
            }
            Err(e) => {
                warn!(error = %e, "Unreadable cache file, treating as miss");
                None
            }
        }
    }

    /// Returns true if `entry` is younger than `ttl` at `now`.
    pub fn is_fresh(entry: &CacheEntry, now: f64, ttl: Duration) -> bool {
        entry.age(now) < ttl.as_secs_f64()
    }

    /// Replaces the entry with `data` stored at `now`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the file cannot be written. The previous entry
    /// is left intact in that case.
    #[instrument(skip(self, data), fields(path = %self.path.display()))]
    pub async fn put(&self, data: &Value, now: f64) -> Result<(), StoreError> {
        #[derive(Serialize)]
        struct EntryRef<'a> {
            #[serde(rename = "_cached_at")]
            cached_at: f64,
            data: &'a Value,
        }

        let bytes = serde_json::to_vec(&EntryRef {
            cached_at: now,
            data,
        })?;
        write_atomic(&self.path, &bytes).await?;

        info!(bytes = bytes.len(), "Wrote cache");
        Ok(())
    }

    /// Removes the cache file. Returns whether it existed.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` for failures other than a missing file.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub async fn delete(&self) -> Result<bool, StoreError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                info!("Cache cleared");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
