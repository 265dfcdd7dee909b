// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `meterfeed` Core
//!
//! Core types and pure computations shared by the other `meterfeed` crates.
//!
//! - Domain models for raw metering data and the aggregated dashboard
//! - The ordered nickname table that turns meter codes into display names
//! - The daily aggregation that aligns every meter on one date axis
//!
//! ## Key Types
//!
//! ### Raw Data
//! - [`MeteringPoint`] - One meter with its accounting intervals
//! - [`AccountingInterval`] - One consumption reading
//!
//! ### Aggregated Data
//! - [`TransformResult`] - Shared date axis, per-meter series, totals, summary
//! - [`SeriesOut`] - Values of one meter aligned to the date axis
//! - [`SummaryStats`] - Rounded headline numbers
//!
//! ### Display
//! - [`NicknameTable`] - First-match-wins lookup of display names and colors

pub mod error;
pub mod models;
pub mod nickname;
pub mod transform;

pub use error::CoreError;

pub use models::{
    AccountingInterval, MeteringPoint, SeriesOut, SummaryStats, TransformResult, UNKNOWN_LABEL,
    parse_points,
};

pub use nickname::{NicknameEntry, NicknameTable};
pub use transform::{MinDayPolicy, TransformOptions, round3, transform};
