// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # meterfeed Fetch
//!
//! Network side of `meterfeed`: the OAuth2 client-credentials exchange and
//! the metering data call.
//!
//! - [`http::HttpClient`] - reqwest wrapper with tracing and a fixed timeout
//! - [`token::TokenClient`] - obtains a bearer token from the token endpoint
//! - [`window::QueryWindow`] - month-to-date query range
//! - [`source::MeteringSource`] - trait for anything that can deliver a raw
//!   metering payload; [`source::HttpMeteringSource`] is the real one
//!
//! A fetch is a single attempt. Retrying and falling back to cached data is
//! the caller's business.
//!
//! ## Example
//!
//! ```ignore
//! use meterfeed_fetch::{AuthParams, HttpMeteringSource, MeteringSource, QueryWindow};
//!
//! let source = HttpMeteringSource::new(token_url, data_url, AuthParams::client_credentials(id, secret))?;
//! let payload = source.fetch(&QueryWindow::month_to_date(chrono::Utc::now())).await?;
//! ```

pub mod error;
pub mod http;
pub mod source;
pub mod token;
pub mod window;

// Errors
pub use error::{AuthError, FetchError, HttpError, NetworkError};

// Clients
pub use http::HttpClient;
pub use source::{HttpMeteringSource, MeteringSource, UnavailableSource};
pub use token::{AuthParams, TokenClient};
pub use window::QueryWindow;

/// Default OAuth2 token endpoint.
pub const DEFAULT_TOKEN_URL: &str =
    "https://kc.elering.ee/realms/elering-sso/protocol/openid-connect/token";

/// Default metering data endpoint.
pub const DEFAULT_DATA_URL: &str = "https://estfeed.elering.ee/api/public/v1/metering-data";
