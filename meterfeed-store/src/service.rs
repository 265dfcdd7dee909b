//! Dashboard service: settings, fetcher and transform wired together.

use chrono::{DateTime, Local, NaiveDate, Utc};
use meterfeed_core::{TransformOptions, TransformResult, parse_points, transform};
use meterfeed_fetch::{HttpMeteringSource, MeteringSource, UnavailableSource};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::cache::CacheStore;
use crate::error::StoreError;
use crate::fetcher::{LoadOutcome, LoadSource, RemoteFetcher, from_epoch_seconds};
use crate::settings::Settings;

/// Layout of `fetched_at`.
const FETCHED_AT_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

// ============================================================================
// Dashboard Payload
// ============================================================================

/// The aggregated result plus fetch metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardPayload {
    /// Aggregated data.
    #[serde(flatten)]
    pub result: TransformResult,

    /// When the data was obtained, ISO-8601 UTC. `None` if nothing was available.
    pub fetched_at: Option<String>,

    /// Same instant as seconds since the Unix epoch.
    pub fetched_at_ts: Option<f64>,

    /// Whether the cache was cleared before loading.
    #[serde(default)]
    pub cache_cleared: bool,

    /// Where the data came from.
    #[serde(skip)]
    pub source: LoadSource,
}

impl DashboardPayload {
    fn new(result: TransformResult, outcome: &LoadOutcome, cache_cleared: bool) -> Self {
        let (fetched_at, fetched_at_ts) = if outcome.source == LoadSource::Empty {
            (None, None)
        } else {
            (
                from_epoch_seconds(outcome.timestamp)
                    .map(|at| at.format(FETCHED_AT_FORMAT).to_string()),
                Some(outcome.timestamp),
            )
        };

        Self {
            result,
            fetched_at,
            fetched_at_ts,
            cache_cleared,
            source: outcome.source,
        }
    }
}

// ============================================================================
// Energy Service
// ============================================================================

/// Entry point for front ends.
#[derive(Debug)]
pub struct EnergyService {
    settings: Settings,
    fetcher: RemoteFetcher,
}

impl EnergyService {
    /// Builds the service against the configured metering API.
    ///
    /// If the endpoints cannot be set up (for example a malformed URL) every
    /// fetch fails, and loads are served from the cache alone.
    pub fn from_settings(settings: Settings) -> Self {
        let source: Arc<dyn MeteringSource> = match HttpMeteringSource::new(
            &settings.token_endpoint_url,
            &settings.data_endpoint_url,
            settings.auth_params(),
        ) {
            Ok(source) => Arc::new(source),
            Err(e) => {
                warn!(error = %e, "Metering API unusable, serving cached data only");
                Arc::new(UnavailableSource::new(e.to_string()))
            }
        };
        Self::with_source(settings, source)
    }

    /// Builds the service with an explicit metering source.
    pub fn with_source(settings: Settings, source: Arc<dyn MeteringSource>) -> Self {
        let cache = CacheStore::new(settings.cache_path());
        let fetcher = RemoteFetcher::new(cache, source, settings.cache_ttl());
        Self { settings, fetcher }
    }

    /// Returns the fetcher.
    pub fn fetcher(&self) -> &RemoteFetcher {
        &self.fetcher
    }

    /// Loads and aggregates the data, with today taken from the local clock.
    pub async fn load(&self, now: DateTime<Utc>, force_refresh: bool) -> DashboardPayload {
        let today = now.with_timezone(&Local).date_naive();
        self.load_for_day(now, today, force_refresh).await
    }

    /// Loads and aggregates the data for an explicit `today`.
    ///
    /// With `force_refresh` the cache is deleted first, so the load goes to
    /// the API (and still falls back to nothing if that fails).
    #[instrument(skip(self))]
    pub async fn load_for_day(
        &self,
        now: DateTime<Utc>,
        today: NaiveDate,
        force_refresh: bool,
    ) -> DashboardPayload {
        if force_refresh {
            match self.fetcher.clear_cache().await {
                Ok(existed) => debug!(existed, "Cache cleared for refresh"),
                Err(e) => warn!(error = %e, "Failed to clear cache"),
            }
        }

        let outcome = self.fetcher.load(now).await;
        let points = parse_points(&outcome.data).unwrap_or_else(|e| {
            warn!(error = %e, "Unexpected payload shape, treating as empty");
            Vec::new()
        });

        let options =
            TransformOptions::for_day(today).with_min_day_policy(self.settings.min_day_policy());
        let result = transform(&points, self.settings.nicknames(), &options);
        let payload = DashboardPayload::new(result, &outcome, force_refresh);

        if self.settings.enable_request_logging {
            info!(
                source = ?payload.source,
                meters = payload.result.series.len(),
                days = payload.result.dates.len(),
                fetched_at = payload.fetched_at.as_deref().unwrap_or("-"),
                "Dashboard loaded"
            );
        } else {
            debug!(source = ?payload.source, "Dashboard loaded");
        }

        payload
    }

    /// Deletes the cache file. Returns whether it existed.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` if the file exists but cannot be removed.
    pub async fn clear_cache(&self) -> Result<bool, StoreError> {
        self.fetcher.clear_cache().await
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use meterfeed_fetch::{FetchError, NetworkError, QueryWindow};
    use serde_json::{Value, json};

    struct FixedSource(Option<Value>);

    #[async_trait]
    impl MeteringSource for FixedSource {
        fn id(&self) -> &str {
            "fixed"
        }

        async fn fetch(&self, _window: &QueryWindow) -> Result<Value, FetchError> {
            self.0
                .clone()
                .ok_or_else(|| NetworkError::InvalidBody("down".to_string()).into())
        }
    }

    fn settings(dir: &tempfile::TempDir, extra: Value) -> Settings {
        let mut value = json!({
            "cache_path": dir.path().join("api_cache.json"),
            "eic_nicknames": { "38ZEE-1": { "nick": "House", "color": "#ff8800" } }
        });
        if let (Some(base), Value::Object(more)) = (value.as_object_mut(), extra) {
            base.extend(more);
        }
        serde_json::from_value(value).unwrap()
    }

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-05-03T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 3).unwrap()
    }

    fn payload() -> Value {
        json!([
            {
                "meteringPointEic": "38ZEE-1",
                "accountingIntervals": [
                    { "periodStart": "2024-05-01T00:00:00Z", "consumptionKwh": 4.0 },
                    { "periodStart": "2024-05-02T00:00:00Z", "consumptionKwh": "6.5" },
                    { "periodStart": "2024-05-03T00:00:00Z", "consumptionKwh": 1.0 }
                ]
            },
            {
                "meteringPointEic": "38ZEE-2",
                "accountingIntervals": [
                    { "periodStart": "2024-05-02T00:00:00Z", "consumptionKwh": 0.5 }
                ]
            }
        ])
    }

    #[tokio::test]
    async fn test_load_live() {
        let dir = tempfile::tempdir().unwrap();
        let service =
            EnergyService::with_source(settings(&dir, json!({})), Arc::new(FixedSource(Some(payload()))));

        let out = service.load_for_day(now(), today(), false).await;

        assert_eq!(out.source, LoadSource::Live);
        assert_eq!(out.result.dates, vec!["2024-05-01", "2024-05-02", "2024-05-03"]);
        assert_eq!(out.result.series[0].display, "House");
        assert_eq!(out.result.series[0].color.as_deref(), Some("#ff8800"));
        assert_eq!(out.result.series[1].display, "38ZEE-2");
        assert_eq!(out.result.series[1].values, vec![0.0, 0.5, 0.0]);
        assert_eq!(out.result.total, vec![4.0, 7.0, 1.0]);
        assert_eq!(out.result.summary.total_kwh, 12.0);
        assert_eq!(out.result.summary.avg_per_day_kwh, 4.0);
        assert_eq!(out.result.summary.min_day_kwh, 1.0);
        assert_eq!(out.result.summary.max_day_kwh, 7.0);
        assert_eq!(out.result.summary.today_kwh, Some(1.0));
        assert_eq!(out.fetched_at.as_deref(), Some("2024-05-03T10:00:00Z"));
        assert!(!out.cache_cleared);
    }

    #[tokio::test]
    async fn test_min_day_excludes_today_setting() {
        let dir = tempfile::tempdir().unwrap();
        let service = EnergyService::with_source(
            settings(&dir, json!({ "min_day_excludes_today": true })),
            Arc::new(FixedSource(Some(payload()))),
        );

        let out = service.load_for_day(now(), today(), false).await;
        assert_eq!(out.result.summary.min_day_kwh, 4.0);
    }

    #[tokio::test]
    async fn test_nothing_available() {
        let dir = tempfile::tempdir().unwrap();
        let service = EnergyService::with_source(settings(&dir, json!({})), Arc::new(FixedSource(None)));

        let out = service.load_for_day(now(), today(), false).await;

        assert_eq!(out.source, LoadSource::Empty);
        assert!(out.result.is_empty());
        assert_eq!(out.fetched_at, None);
        assert_eq!(out.fetched_at_ts, None);
    }

    #[tokio::test]
    async fn test_unexpected_payload_shape_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let service = EnergyService::with_source(
            settings(&dir, json!({})),
            Arc::new(FixedSource(Some(json!({ "error": "maintenance" })))),
        );

        let out = service.load_for_day(now(), today(), false).await;

        assert_eq!(out.source, LoadSource::Live);
        assert!(out.result.is_empty());
        assert!(out.fetched_at.is_some());
    }

    #[tokio::test]
    async fn test_force_refresh_clears_cache() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(&dir, json!({}));
        CacheStore::new(settings.cache_path())
            .put(&json!([]), 1.0)
            .await
            .unwrap();

        let service = EnergyService::with_source(settings, Arc::new(FixedSource(None)));
        let out = service.load_for_day(now(), today(), true).await;

        assert!(out.cache_cleared);
        // The cleared entry is gone, so the failed fetch has nothing to fall back on.
        assert_eq!(out.source, LoadSource::Empty);
        assert!(service.fetcher().cache().get().await.is_none());
    }

    #[tokio::test]
    async fn test_payload_json_shape() {
        let dir = tempfile::tempdir().unwrap();
        let service =
            EnergyService::with_source(settings(&dir, json!({})), Arc::new(FixedSource(Some(payload()))));

        let out = service.load_for_day(now(), today(), false).await;
        let json = serde_json::to_value(&out).unwrap();

        assert!(json["dates"].is_array());
        assert!(json["series"].is_array());
        assert!(json["total"].is_array());
        assert_eq!(json["summary"]["today_kwh"], 1.0);
        assert_eq!(json["fetched_at"], "2024-05-03T10:00:00Z");
        assert_eq!(json["fetched_at_ts"], 1_714_730_400.0);
        assert_eq!(json["cache_cleared"], false);
        assert!(json.get("source").is_none());
        assert!(json.get("result").is_none());
    }

    #[tokio::test]
    async fn test_bad_endpoint_url_serves_stale_cache() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(
            &dir,
            json!({ "auth_mode": "none", "data_endpoint_url": "estfeed.elering.ee/api" }),
        );
        CacheStore::new(settings.cache_path())
            .put(&payload(), 1.0)
            .await
            .unwrap();

        let service = EnergyService::from_settings(settings);
        let out = service.load_for_day(now(), today(), false).await;

        assert_eq!(out.source, LoadSource::Stale);
        assert_eq!(out.result.series.len(), 2);
        assert_eq!(out.fetched_at_ts, Some(1.0));
    }

    #[tokio::test]
    async fn test_bad_endpoint_url_without_cache_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(&dir, json!({ "token_endpoint_url": "not a url" }));

        let service = EnergyService::from_settings(settings);
        let out = service.load_for_day(now(), today(), false).await;

        assert_eq!(out.source, LoadSource::Empty);
        assert!(out.result.is_empty());
    }
}
