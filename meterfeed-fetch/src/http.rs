//! HTTP client with tracing and a fixed per-client timeout.

use std::time::Duration;

use reqwest::{Client, Response, header};
use tracing::{debug, instrument};
use url::Url;

use crate::error::HttpError;

/// User agent string for meterfeed.
const USER_AGENT: &str = concat!("meterfeed/", env!("CARGO_PKG_VERSION"));

// ============================================================================
// HTTP Client
// ============================================================================

/// Thin reqwest wrapper; every request is bounded by the client timeout.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: Client,
}

impl HttpClient {
    /// Creates a client whose requests time out after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns `HttpError::Request` if the TLS backend cannot be initialized.
    pub fn with_timeout(timeout: Duration) -> Result<Self, HttpError> {
        let inner = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self { inner })
    }

    /// Performs a GET request with query parameters and an optional bearer token.
    #[instrument(skip(self, query, bearer), fields(url = %url))]
    pub async fn get_with_query(
        &self,
        url: &Url,
        query: &[(&str, String)],
        bearer: Option<&str>,
    ) -> Result<Response, HttpError> {
        debug!("GET request");

        let mut request = self.inner.get(url.clone()).query(query);
        if let Some(token) = bearer {
            request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }

        let response = request.send().await?;
        debug!(status = %response.status(), "Response received");
        Ok(response)
    }

    /// Performs a POST request with an url-encoded form body.
    #[instrument(skip(self, form), fields(url = %url))]
    pub async fn post_form(
        &self,
        url: &Url,
        form: &[(String, String)],
    ) -> Result<Response, HttpError> {
        debug!("POST request with form data");

        let response = self.inner.post(url.clone()).form(form).send().await?;
        debug!(status = %response.status(), "Response received");
        Ok(response)
    }
}

/// Parses an endpoint URL.
///
/// # Errors
///
/// Returns `HttpError::InvalidUrl` if `raw` is not an absolute URL.
pub fn parse_url(raw: &str) -> Result<Url, HttpError> {
    Url::parse(raw).map_err(|e| HttpError::InvalidUrl(format!("{raw}: {e}")))
}

// ============================================================================
// Tests
// ============================================================================
