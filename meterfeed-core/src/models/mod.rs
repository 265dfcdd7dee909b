//! Domain models for `meterfeed`.
//!
//! ## Submodules
//!
//! - [`metering`] - Raw records as delivered by the metering API
//! - [`dashboard`] - Date-aligned output of the daily aggregation

mod dashboard;
mod metering;

pub use dashboard::{SeriesOut, SummaryStats, TransformResult};
pub use metering::{AccountingInterval, MeteringPoint, UNKNOWN_LABEL, parse_points};
