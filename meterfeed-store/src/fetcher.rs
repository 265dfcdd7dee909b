//! Cache-first loading of the metering payload.
//!
//! [`RemoteFetcher::load`] never fails. In order of preference it returns:
//!
//! 1. the cached entry, if it is younger than the TTL (no network call)
//! 2. a live payload, which is written back to the cache
//! 3. the cached entry regardless of age, if the live fetch failed
//! 4. an empty list stamped with the current time
//!
//! Concurrent callers that miss the cache share one live fetch.

use chrono::{DateTime, Utc};
use meterfeed_fetch::{MeteringSource, QueryWindow};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::cache::{CacheEntry, CacheStore};
use crate::error::StoreError;

/// Seconds since the Unix epoch, with sub-second precision.
#[allow(clippy::cast_precision_loss)]
pub fn epoch_seconds(at: DateTime<Utc>) -> f64 {
    at.timestamp_micros() as f64 / 1_000_000.0
}

/// Inverse of [`epoch_seconds`]; `None` for out-of-range values.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn from_epoch_seconds(ts: f64) -> Option<DateTime<Utc>> {
    if !ts.is_finite() {
        return None;
    }
    let secs = ts.floor();
    let nanos = ((ts - secs) * 1_000_000_000.0).round().min(999_999_999.0) as u32;
    DateTime::from_timestamp(secs as i64, nanos)
}

// ============================================================================
// Load Outcome
// ============================================================================

/// Where a loaded payload came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadSource {
    /// Cache entry within the TTL.
    Fresh,
    /// Live API response.
    Live,
    /// Expired cache entry served after a failed fetch.
    Stale,
    /// Nothing available.
    #[default]
    Empty,
}

/// Result of one load.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadOutcome {
    /// Raw payload.
    pub data: Value,
    /// When the payload was obtained, seconds since the Unix epoch.
    pub timestamp: f64,
    /// Where the payload came from.
    pub source: LoadSource,
}

impl LoadOutcome {
    fn from_entry(entry: CacheEntry, source: LoadSource) -> Self {
        Self {
            data: entry.data,
            timestamp: entry.cached_at,
            source,
        }
    }

    fn empty(now: f64) -> Self {
        Self {
            data: Value::Array(Vec::new()),
            timestamp: now,
            source: LoadSource::Empty,
        }
    }
}

// ============================================================================
// Remote Fetcher
// ============================================================================

/// Cache-first loader with stale fallback and single-flight live fetches.
pub struct RemoteFetcher {
    cache: CacheStore,
    source: Arc<dyn MeteringSource>,
    ttl: Duration,
    /// Outcome of the most recent live fetch, guarded for single-flight.
    flight: Mutex<Option<LoadOutcome>>,
    /// Number of completed live fetches.
    completed: AtomicU64,
}

impl std::fmt::Debug for RemoteFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteFetcher")
            .field("cache", &self.cache)
            .field("source", &self.source.id())
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl RemoteFetcher {
    /// Creates a fetcher.
    pub fn new(cache: CacheStore, source: Arc<dyn MeteringSource>, ttl: Duration) -> Self {
        Self {
            cache,
            source,
            ttl,
            flight: Mutex::new(None),
            completed: AtomicU64::new(0),
        }
    }

    /// Returns the cache store.
    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    /// Returns the cache TTL.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Loads the payload as of `now`.
    #[instrument(skip(self), fields(source = self.source.id()))]
    pub async fn load(&self, now: DateTime<Utc>) -> LoadOutcome {
        let ts = epoch_seconds(now);

        if let Some(outcome) = self.fresh_entry(ts).await {
            return outcome;
        }

        let seen = self.completed.load(Ordering::Acquire);
        let mut flight = self.flight.lock().await;

        // A fetch finished while we waited for the lock.
        if self.completed.load(Ordering::Acquire) != seen {
            if let Some(outcome) = flight.as_ref() {
                debug!(source = ?outcome.source, "Reusing concurrent fetch result");
                return outcome.clone();
            }
        }

        if let Some(outcome) = self.fresh_entry(ts).await {
            return outcome;
        }

        let outcome = self.fetch_and_populate(now, ts).await;
        *flight = Some(outcome.clone());
        self.completed.fetch_add(1, Ordering::Release);
        outcome
    }

    /// Deletes the cache file. Returns whether it existed.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` if the file exists but cannot be removed.
    pub async fn clear_cache(&self) -> Result<bool, StoreError> {
        self.cache.delete().await
    }

    async fn fresh_entry(&self, now: f64) -> Option<LoadOutcome> {
        let entry = self.cache.get().await?;
        if CacheStore::is_fresh(&entry, now, self.ttl) {
            debug!(age_secs = entry.age(now), "Serving fresh cache");
            Some(LoadOutcome::from_entry(entry, LoadSource::Fresh))
        } else {
            debug!(age_secs = entry.age(now), "Cache expired");
            None
        }
    }

    async fn fetch_and_populate(&self, now: DateTime<Utc>, ts: f64) -> LoadOutcome {
        let window = QueryWindow::month_to_date(now);

        match self.source.fetch(&window).await {
            Ok(data) => {
                if let Err(e) = self.cache.put(&data, ts).await {
                    warn!(error = %e, "Failed to write cache, serving live data anyway");
                }
                LoadOutcome {
                    data,
                    timestamp: ts,
                    source: LoadSource::Live,
                }
            }
            Err(e) => {
                if e.is_configuration() {
                    warn!(error = %e, "Fetch skipped, falling back to cache");
                } else {
                    warn!(error = %e, "Fetch failed, falling back to cache");
                }

                match self.cache.get().await {
                    Some(entry) => {
                        info!(cached_at = entry.cached_at, "Serving stale cache");
                        LoadOutcome::from_entry(entry, LoadSource::Stale)
                    }
                    None => {
                        info!("No cached data available");
                        LoadOutcome::empty(ts)
                    }
                }
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
