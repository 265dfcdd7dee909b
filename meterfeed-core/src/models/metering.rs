//! Raw metering records.
//!
//! The metering API answers with a JSON array of metering points, each
//! carrying its accounting intervals:
//!
//! ```json
//! [
//!   {
//!     "meteringPointEic": "38ZEE-00000001-X",
//!     "accountingIntervals": [
//!       { "periodStart": "2024-05-01T00:00:00Z", "consumptionKwh": 3.5 }
//!     ]
//!   }
//! ]
//! ```
//!
//! The short field names `label` and `intervals` are accepted as well.
//! Parsing is deliberately lenient: a malformed interval degrades to a zero
//! reading instead of rejecting the whole payload.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::CoreError;

/// Label used for metering points that arrive without an identifier.
pub const UNKNOWN_LABEL: &str = "unknown";

// ============================================================================
// Metering Point
// ============================================================================

/// One metering point with its interval readings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "WirePoint")]
pub struct MeteringPoint {
    /// Meter identifier, usually an EIC code.
    pub label: String,

    /// Interval readings in the order the API delivered them.
    pub intervals: Vec<AccountingInterval>,
}

/// Metering point as it arrives, under either naming.
///
/// The API names win when a record carries both.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePoint {
    #[serde(default, deserialize_with = "lenient_string")]
    metering_point_eic: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    label: Option<String>,
    #[serde(default)]
    accounting_intervals: Option<Vec<AccountingInterval>>,
    #[serde(default)]
    intervals: Option<Vec<AccountingInterval>>,
}

impl From<WirePoint> for MeteringPoint {
    fn from(wire: WirePoint) -> Self {
        let label = wire
            .metering_point_eic
            .filter(|l| !l.is_empty())
            .or(wire.label.filter(|l| !l.is_empty()))
            .unwrap_or_else(unknown_label);

        Self {
            label,
            intervals: wire
                .accounting_intervals
                .or(wire.intervals)
                .unwrap_or_default(),
        }
    }
}

impl MeteringPoint {
    /// Creates a metering point from its parts.
    pub fn new(label: impl Into<String>, intervals: Vec<AccountingInterval>) -> Self {
        Self {
            label: label.into(),
            intervals,
        }
    }
}

// ============================================================================
// Accounting Interval
// ============================================================================

/// A single consumption reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountingInterval {
    /// Start of the interval as an ISO-8601 timestamp.
    #[serde(default, deserialize_with = "lenient_string")]
    pub period_start: Option<String>,

    /// Consumption in kWh. Arrives as a number, a numeric string or null.
    #[serde(default)]
    pub consumption_kwh: Value,
}

impl AccountingInterval {
    /// Creates an interval with a numeric reading.
    pub fn new(period_start: impl Into<String>, consumption_kwh: f64) -> Self {
        Self {
            period_start: Some(period_start.into()),
            consumption_kwh: Value::from(consumption_kwh),
        }
    }

    /// Returns the calendar-date part of `periodStart` (before the `T`).
    pub fn date_key(&self) -> &str {
        let start = self.period_start.as_deref().unwrap_or_default();
        start.split_once('T').map_or(start, |(date, _)| date)
    }

    /// Returns the reading as kWh, or `0.0` if it is missing or unparseable.
    pub fn consumption(&self) -> f64 {
        let value = match &self.consumption_kwh {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };

        match value {
            Some(v) if v.is_finite() => v,
            _ => {
                if !self.consumption_kwh.is_null() {
                    debug!(value = %self.consumption_kwh, "Unparseable consumption, using 0");
                }
                0.0
            }
        }
    }
}

// ============================================================================
// Payload Parsing
// ============================================================================

/// Parses a raw metering API payload into metering points.
///
/// `null` means "no data" and yields an empty list. Array elements that are
/// not metering point objects are skipped with a warning.
///
/// # Errors
///
/// Returns `CoreError::InvalidData` if the payload is neither `null` nor an
/// array.
pub fn parse_points(payload: &Value) -> Result<Vec<MeteringPoint>, CoreError> {
    let items = match payload {
        Value::Null => return Ok(Vec::new()),
        Value::Array(items) => items,
        other => {
            return Err(CoreError::InvalidData(format!(
                "expected an array of metering points, got {}",
                json_kind(other)
            )));
        }
    };

    let mut points = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        match MeteringPoint::deserialize(item) {
            Ok(point) => points.push(point),
            Err(e) => warn!(index, error = %e, "Skipping malformed metering point"),
        }
    }
    Ok(points)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ============================================================================
// Serde Helpers
// ============================================================================

fn unknown_label() -> String {
    UNKNOWN_LABEL.to_string()
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

// ============================================================================
// Tests
// ============================================================================
