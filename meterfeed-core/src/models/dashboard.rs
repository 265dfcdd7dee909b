//! Date-aligned aggregation output.
//!
//! Every [`SeriesOut::values`] and [`TransformResult::total`] is indexed by
//! the shared [`TransformResult::dates`] axis.

use serde::{Deserialize, Serialize};

// ============================================================================
// Series
// ============================================================================

/// Daily values of one metering point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesOut {
    /// Raw meter label.
    pub label: String,
    /// Display name resolved from the nickname table.
    pub display: String,
    /// Display color, if one is configured.
    pub color: Option<String>,
    /// One value per entry of the shared date axis.
    pub values: Vec<f64>,
}

// ============================================================================
// Summary
// ============================================================================

/// Headline numbers, rounded to three decimals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    /// Sum over all days.
    pub total_kwh: f64,
    /// Average per day on the axis.
    pub avg_per_day_kwh: f64,
    /// Lowest daily total.
    pub min_day_kwh: f64,
    /// Highest daily total.
    pub max_day_kwh: f64,
    /// Today's total, if today is on the axis.
    pub today_kwh: Option<f64>,
}

// ============================================================================
// Transform Result
// ============================================================================

/// Aggregated view over all metering points.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransformResult {
    /// Sorted, unique `YYYY-MM-DD` dates.
    pub dates: Vec<String>,
    /// One series per metering point, in input order.
    pub series: Vec<SeriesOut>,
    /// Sum across all series per date.
    pub total: Vec<f64>,
    /// Summary statistics.
    pub summary: SummaryStats,
}

impl TransformResult {
    /// Returns true if there is no data on the axis.
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

}
