// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # meterfeed Store
//!
//! Everything with state or side effects around the metering pipeline.
//!
//! - **Settings**: JSON settings file with typed accessors and defaults
//! - **CacheStore**: one atomically written cache file for the raw payload
//! - **RemoteFetcher**: cache-first loading with stale fallback and
//!   single-flight live fetches
//! - **EnergyService**: fetcher plus transform, producing the dashboard payload
//!
//! ## Usage
//!
//! ```ignore
//! use meterfeed_store::{EnergyService, Settings, default_settings_path};
//!
//! let settings = Settings::load_from(&default_settings_path()).await;
//! let service = EnergyService::from_settings(settings);
//! let payload = service.load(chrono::Utc::now(), false).await;
//! println!("{}", serde_json::to_string(&payload)?);
//! ```

pub mod cache;
pub mod error;
pub mod fetcher;
pub mod persistence;
pub mod service;
pub mod settings;

pub use cache::{CacheEntry, CacheStore};
pub use error::StoreError;
pub use fetcher::{LoadOutcome, LoadSource, RemoteFetcher, epoch_seconds, from_epoch_seconds};
pub use persistence::{
    default_cache_dir, default_cache_path, default_config_dir, default_settings_path, load_json,
    load_json_or_default, save_json, write_atomic,
};
pub use service::{DashboardPayload, EnergyService};
pub use settings::Settings;
