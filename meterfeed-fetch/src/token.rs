//! OAuth2 client-credentials token exchange.
//!
//! The token endpoint receives an url-encoded form and answers with JSON:
//!
//! ```text
//! POST <token_url>
//! client_id=...&client_secret=...&grant_type=client_credentials
//!
//! { "access_token": "eyJ...", "expires_in": 300, "token_type": "Bearer" }
//! ```
//!
//! The form is either built from a client id/secret pair or taken verbatim
//! from configuration.

use std::fmt;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::error::{AuthError, HttpError, truncate_body};
use crate::http::{HttpClient, parse_url};

/// Timeout for the token request.
pub const TOKEN_TIMEOUT: Duration = Duration::from_secs(10);

/// Grant type used when building the form from a client id/secret pair.
const CLIENT_CREDENTIALS_GRANT: &str = "client_credentials";

// ============================================================================
// Auth Params
// ============================================================================

/// Credential material for the token exchange.
#[derive(Clone, Default, PartialEq, Eq)]
pub enum AuthParams {
    /// Nothing configured. A fetch fails with `AuthError::MissingCredentials`.
    #[default]
    Unset,
    /// The data endpoint needs no token.
    Anonymous,
    /// Client-credentials grant.
    ClientCredentials {
        /// OAuth2 client id.
        client_id: String,
        /// OAuth2 client secret.
        client_secret: String,
    },
    /// Pre-built form body, sent as is.
    Form(Vec<(String, String)>),
}

impl AuthParams {
    /// Creates client-credentials params.
    pub fn client_credentials(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self::ClientCredentials {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// Creates form params from an url-encoded body such as `a=1&b=2`.
    pub fn from_encoded_form(body: &str) -> Self {
        Self::Form(
            url::form_urlencoded::parse(body.trim().as_bytes())
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect(),
        )
    }

    /// Returns true if no usable credential is present.
    ///
    /// [`AuthParams::Anonymous`] is not empty: it needs nothing.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Unset => true,
            Self::Anonymous => false,
            Self::ClientCredentials {
                client_id,
                client_secret,
            } => client_id.is_empty() || client_secret.is_empty(),
            Self::Form(fields) => fields.is_empty(),
        }
    }

    /// Returns true if a token exchange is required before the data call.
    pub fn requires_token(&self) -> bool {
        !matches!(self, Self::Anonymous)
    }

    /// Short name of the configured mode, safe to log.
    pub fn mode(&self) -> &'static str {
        match self {
            Self::Unset => "unset",
            Self::Anonymous => "none",
            Self::ClientCredentials { .. } => "client_credentials",
            Self::Form(_) => "form",
        }
    }

    /// Builds the form body for the token request.
    fn form(&self) -> Result<Vec<(String, String)>, AuthError> {
        if self.is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        match self {
            Self::ClientCredentials {
                client_id,
                client_secret,
            } => Ok(vec![
                ("client_id".to_string(), client_id.clone()),
                ("client_secret".to_string(), client_secret.clone()),
                ("grant_type".to_string(), CLIENT_CREDENTIALS_GRANT.to_string()),
            ]),
            Self::Form(fields) => Ok(fields.clone()),
            Self::Unset | Self::Anonymous => Err(AuthError::MissingCredentials),
        }
    }
}

impl fmt::Debug for AuthParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unset => f.write_str("Unset"),
            Self::Anonymous => f.write_str("Anonymous"),
            Self::ClientCredentials { client_id, .. } => f
                .debug_struct("ClientCredentials")
                .field("client_id", client_id)
                .field("client_secret", &"<redacted>")
                .finish(),
            Self::Form(fields) => f
                .debug_tuple("Form")
                .field(&fields.iter().map(|(k, _)| k.as_str()).collect::<Vec<_>>())
                .finish(),
        }
    }
}

// ============================================================================
// Token Response
// ============================================================================

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
}

// ============================================================================
// Token Client
// ============================================================================

/// Client for the OAuth2 token endpoint.
#[derive(Debug, Clone)]
pub struct TokenClient {
    http: HttpClient,
    token_url: Url,
}

impl TokenClient {
    /// Creates a token client for `token_url` with the 10 second timeout.
    ///
    /// # Errors
    ///
    /// Returns `HttpError` if the URL is invalid or the client cannot be built.
    pub fn new(token_url: &str) -> Result<Self, HttpError> {
        Ok(Self {
            http: HttpClient::with_timeout(TOKEN_TIMEOUT)?,
            token_url: parse_url(token_url)?,
        })
    }

    /// Exchanges credentials for a bearer token. Single attempt, no retry.
    #[instrument(skip(self, params), fields(mode = params.mode()))]
    pub async fn get_token(&self, params: &AuthParams) -> Result<String, AuthError> {
        let form = params.form()?;

        let response = self.http.post_form(&self.token_url, &form).await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Token endpoint rejected credentials");
            return Err(AuthError::Rejected {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        let token: TokenResponse = response.json().await.map_err(|e| {
            debug!(error = %e, "Token response is not JSON");
            AuthError::MissingAccessToken
        })?;

        match token.access_token {
            Some(access_token) if !access_token.is_empty() => {
                debug!(expires_in = ?token.expires_in, "Obtained access token");
                Ok(access_token)
            }
            _ => Err(AuthError::MissingAccessToken),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
