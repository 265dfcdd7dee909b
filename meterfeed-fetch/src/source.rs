//! Metering data sources.
//!
//! A [`MeteringSource`] delivers the raw metering payload for a
//! [`QueryWindow`]. The real implementation, [`HttpMeteringSource`], performs
//! the token exchange followed by one GET against the data endpoint.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::error::{FetchError, HttpError, NetworkError, truncate_body};
use crate::http::{HttpClient, parse_url};
use crate::token::{AuthParams, TokenClient};
use crate::window::QueryWindow;

/// Timeout for the data request.
pub const DATA_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// Metering Source Trait
// ============================================================================

/// Anything that can deliver a raw metering payload.
///
/// ```ignore
/// struct FixtureSource(serde_json::Value);
///
/// #[async_trait]
/// impl MeteringSource for FixtureSource {
///     fn id(&self) -> &str {
///         "fixture"
///     }
///
///     async fn fetch(&self, _window: &QueryWindow) -> Result<Value, FetchError> {
///         Ok(self.0.clone())
///     }
/// }
/// ```
#[async_trait]
pub trait MeteringSource: Send + Sync {
    /// Identifier used in logs.
    fn id(&self) -> &str;

    /// Fetches the payload for `window`. One attempt, no retry.
    async fn fetch(&self, window: &QueryWindow) -> Result<Value, FetchError>;
}

// ============================================================================
// HTTP Metering Source
// ============================================================================

/// Metering API client: token exchange plus data call.
#[derive(Debug, Clone)]
pub struct HttpMeteringSource {
    http: HttpClient,
    data_url: Url,
    tokens: TokenClient,
    auth: AuthParams,
}

impl HttpMeteringSource {
    /// Creates a source for the given endpoints and credentials.
    ///
    /// # Errors
    ///
    /// Returns `HttpError` if either URL is invalid.
    pub fn new(token_url: &str, data_url: &str, auth: AuthParams) -> Result<Self, HttpError> {
        Ok(Self {
            http: HttpClient::with_timeout(DATA_TIMEOUT)?,
            data_url: parse_url(data_url)?,
            tokens: TokenClient::new(token_url)?,
            auth,
        })
    }

    /// Returns the data endpoint.
    pub fn data_url(&self) -> &Url {
        &self.data_url
    }

}

#[async_trait]
impl MeteringSource for HttpMeteringSource {
    fn id(&self) -> &str {
        "metering.http"
    }

    #[instrument(skip(self, window), fields(start = %window.start, end = %window.end))]
    async fn fetch(&self, window: &QueryWindow) -> Result<Value, FetchError> {
        let token = if self.auth.requires_token() {
            Some(self.tokens.get_token(&self.auth).await?)
        } else {
            debug!("Auth mode is none, skipping token exchange");
            None
        };

        let response = self
            .http
            .get_with_query(&self.data_url, &window.query_pairs(), token.as_deref())
            .await
            .map_err(NetworkError::from)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Data endpoint returned an error");
            return Err(NetworkError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            }
            .into());
        }

        let body = response
            .text()
            .await
            .map_err(|e| NetworkError::Http(HttpError::from(e)))?;
        let payload: Value = serde_json::from_str(&body)
            .map_err(|e| NetworkError::InvalidBody(e.to_string()))?;

        info!(
            bytes = body.len(),
            points = payload.as_array().map_or(0, Vec::len),
            "Fetched metering data"
        );
        Ok(payload)
    }
}

// ============================================================================
// Unavailable Source
// ============================================================================

/// Stands in for a source that could not be built, e.g. from a bad endpoint
/// URL. Every fetch fails without touching the network.
#[derive(Debug, Clone)]
pub struct UnavailableSource {
    reason: String,
}

impl UnavailableSource {
    /// Creates a source that always fails with `reason`.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl MeteringSource for UnavailableSource {
    fn id(&self) -> &str {
        "metering.unavailable"
    }

    async fn fetch(&self, _window: &QueryWindow) -> Result<Value, FetchError> {
        Err(NetworkError::Unavailable(self.reason.clone()).into())
    }
}

// ============================================================================
// Tests
// ============================================================================
