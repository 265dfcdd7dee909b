//! Fetch error types.

use thiserror::Error;

// ============================================================================
// Main Fetch Error
// ============================================================================

/// Error type for a single fetch attempt.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Credentials missing or token exchange failed.
    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),

    /// Data call failed.
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),
}

impl FetchError {
    /// Returns true if the attempt failed before any network call was made.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Auth(AuthError::MissingCredentials))
    }
}

// ============================================================================
// Auth Error
// ============================================================================

/// Error type for the token exchange.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No credentials are configured.
    #[error("No credentials configured")]
    MissingCredentials,

    /// The token request could not be sent or timed out.
    #[error("Token request failed: {0}")]
    Http(#[from] HttpError),

    /// The token endpoint answered with a non-success status.
    #[error("Token endpoint returned {status}: {body}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Response body, truncated.
        body: String,
    },

    /// The token response had no usable `access_token`.
    #[error("Token response has no access_token")]
    MissingAccessToken,
}

// ============================================================================
// Network Error
// ============================================================================

/// Error type for the metering data call.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// The request could not be sent or timed out.
    #[error("Request failed: {0}")]
    Http(#[from] HttpError),

    /// The data endpoint answered with a non-success status.
    #[error("Data endpoint returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, truncated.
        body: String,
    },

    /// The response body was not valid JSON.
    #[error("Invalid response body: {0}")]
    InvalidBody(String),

    /// The source could not be set up, so no request was sent.
    #[error("Source unavailable: {0}")]
    Unavailable(String),
}

// ============================================================================
// HTTP Error
// ============================================================================

/// HTTP-specific error type.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Request error.
    #[error("Request error: {0}")]
    Request(#[source] reqwest::Error),

    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Timeout.
    #[error("Request timed out")]
    Timeout,
}

impl From<reqwest::Error> for HttpError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            HttpError::Timeout
        } else {
            HttpError::Request(err)
        }
    }
}

/// Longest response body kept in an error message.
pub(crate) const MAX_ERROR_BODY: usize = 200;

/// Truncates a response body for inclusion in an error.
pub(crate) fn truncate_body(body: &str) -> String {
    match body.char_indices().nth(MAX_ERROR_BODY) {
        Some((idx, _)) => format!("{}…", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_body_short() {
        assert_eq!(truncate_body("nope"), "nope");
    }

    #[test]
    fn test_truncate_body_long() {
        let body = "x".repeat(500);
        let truncated = truncate_body(&body);
        assert_eq!(truncated.chars().count(), MAX_ERROR_BODY + 1);
        assert!(truncated.ends_with('…'));
    }

    #[test]
    fn test_missing_credentials_is_configuration() {
        let err = FetchError::from(AuthError::MissingCredentials);
        assert!(err.is_configuration());

        let err = FetchError::from(NetworkError::InvalidBody("x".to_string()));
        assert!(!err.is_configuration());
    }
}
