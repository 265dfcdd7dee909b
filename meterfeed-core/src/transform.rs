//! Daily aggregation of metering points.
//!
//! Turns irregular per-meter interval lists into one shared date axis:
//!
//! 1. Each meter gets a `date → kWh` map. The date is the part of
//!    `periodStart` before the `T`; unparseable readings count as `0.0`.
//!    If a meter reports the same date twice, the later reading replaces the
//!    earlier one.
//! 2. The final per-meter values are added to a running total per date.
//! 3. The distinct dates, sorted ascending, form the axis. For `YYYY-MM-DD`
//!    strings lexicographic order is chronological order.
//! 4. Every meter's values are looked up along the axis with `0.0` for gaps,
//!    so all sequences have the axis length.
//!
//! The running total only ever sees the values that end up in a series, added
//! in series order, so `total[i]` is exactly the column sum of
//! `series[*].values[i]`.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::models::{MeteringPoint, SeriesOut, SummaryStats, TransformResult};
use crate::nickname::NicknameTable;

// ============================================================================
// Options
// ============================================================================

/// Whether today's (usually partial) total may be the minimum day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MinDayPolicy {
    /// Every day on the axis is a minimum candidate.
    #[default]
    IncludeToday,
    /// Today is skipped when picking the minimum.
    ExcludeToday,
}

/// Inputs to the aggregation that do not come from the payload.
#[derive(Debug, Clone, Default)]
pub struct TransformOptions {
    /// Today's date, used for `today_kwh` and [`MinDayPolicy`].
    pub today: Option<NaiveDate>,
    /// Minimum-day policy.
    pub min_day_policy: MinDayPolicy,
}

impl TransformOptions {
    /// Creates options for the given day with the default policy.
    pub fn for_day(today: NaiveDate) -> Self {
        Self {
            today: Some(today),
            min_day_policy: MinDayPolicy::default(),
        }
    }

    /// Sets the minimum-day policy.
    pub fn with_min_day_policy(mut self, policy: MinDayPolicy) -> Self {
        self.min_day_policy = policy;
        self
    }
}

// ============================================================================
// Transform
// ============================================================================

/// Aggregates metering points onto a shared, sorted date axis.
pub fn transform(
    points: &[MeteringPoint],
    nicknames: &NicknameTable,
    options: &TransformOptions,
) -> TransformResult {
    let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
    let mut per_meter: Vec<HashMap<&str, f64>> = Vec::with_capacity(points.len());

    for point in points {
        let mut by_date: HashMap<&str, f64> = HashMap::new();
        for interval in &point.intervals {
            let date = interval.date_key();
            if date.is_empty() {
                trace!(label = %point.label, "Interval without periodStart, skipping");
                continue;
            }
            by_date.insert(date, interval.consumption());
        }

        for (&date, &value) in &by_date {
            *totals.entry(date).or_insert(0.0) += value;
        }
        per_meter.push(by_date);
    }

    if totals.is_empty() {
        debug!(meters = points.len(), "No dated intervals, empty result");
        return TransformResult::default();
    }

    let dates: Vec<String> = totals.keys().map(|d| (*d).to_string()).collect();

    let series: Vec<SeriesOut> = points
        .iter()
        .zip(&per_meter)
        .map(|(point, by_date)| {
            let (display, color) = nicknames.resolve(&point.label);
            SeriesOut {
                label: point.label.clone(),
                display,
                color,
                values: dates
                    .iter()
                    .map(|d| by_date.get(d.as_str()).copied().unwrap_or(0.0))
                    .collect(),
            }
        })
        .collect();

    let total: Vec<f64> = totals.values().copied().collect();

    let today = options.today.map(|d| d.format("%Y-%m-%d").to_string());
    let today_index = today.as_deref().and_then(|t| dates.iter().position(|d| d == t));
    let summary = summarize(&total, today_index, options.min_day_policy);

    debug!(
        meters = series.len(),
        days = dates.len(),
        total_kwh = summary.total_kwh,
        "Transformed metering data"
    );

    TransformResult {
        dates,
        series,
        total,
        summary,
    }
}

/// Computes the summary over the per-date totals.
fn summarize(total: &[f64], today_index: Option<usize>, policy: MinDayPolicy) -> SummaryStats {
    if total.is_empty() {
        return SummaryStats::default();
    }

    let total_kwh = round3(total.iter().sum());
    #[allow(clippy::cast_precision_loss)]
    let avg_per_day_kwh = round3(total_kwh / total.len() as f64);

    let min_candidates = total.iter().enumerate().filter(|(i, _)| {
        policy == MinDayPolicy::IncludeToday || Some(*i) != today_index
    });
    let min_day_kwh = min_candidates
        .map(|(_, v)| *v)
        .reduce(f64::min)
        .map_or(0.0, round3);
    let max_day_kwh = total.iter().copied().reduce(f64::max).map_or(0.0, round3);

    SummaryStats {
        total_kwh,
        avg_per_day_kwh,
        min_day_kwh,
        max_day_kwh,
        today_kwh: today_index.map(|i| round3(total[i])),
    }
}

/// Rounds to three decimals.
pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AccountingInterval;
    use crate::nickname::NicknameEntry;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn meter(label: &str, readings: &[(&str, f64)]) -> MeteringPoint {
        MeteringPoint::new(
            label,
            readings
                .iter()
                .map(|(date, kwh)| AccountingInterval::new(format!("{date}T00:00:00Z"), *kwh))
                .collect(),
        )
    }

    #[test]
    fn test_empty_input() {
        let result = transform(&[], &NicknameTable::default(), &TransformOptions::default());

        assert!(result.dates.is_empty());
        assert!(result.series.is_empty());
        assert!(result.total.is_empty());
        assert_eq!(result.summary, SummaryStats::default());
        assert_eq!(result.summary.today_kwh, None);
    }

    #[test]
    fn test_meters_without_intervals_yield_empty_result() {
        let points = vec![meter("E1", &[]), meter("E2", &[])];
        let result = transform(&points, &NicknameTable::default(), &TransformOptions::default());
        assert!(result.is_empty());
        assert!(result.series.is_empty());
    }

    #[test]
    fn test_dates_sorted_and_unique() {
        let points = vec![
            meter("A", &[("2024-05-03", 1.0), ("2024-05-01", 1.0)]),
            meter("B", &[("2024-05-02", 1.0), ("2024-05-01", 1.0)]),
        ];
        let result = transform(&points, &NicknameTable::default(), &TransformOptions::default());
        assert_eq!(result.dates, vec!["2024-05-01", "2024-05-02", "2024-05-03"]);
    }

    #[test]
    fn test_gaps_are_zero_filled() {
        let points = vec![
            meter("A", &[("2024-05-01", 1.0)]),
            meter("B", &[("2024-05-02", 2.0)]),
        ];
        let result = transform(&points, &NicknameTable::default(), &TransformOptions::default());

        assert_eq!(result.series[0].values, vec![1.0, 0.0]);
        assert_eq!(result.series[1].values, vec![0.0, 2.0]);
        assert_eq!(result.total, vec![1.0, 2.0]);
    }

    #[test]
    fn test_duplicate_date_last_write_wins() {
        let points = vec![meter("A", &[("2024-05-01", 1.0), ("2024-05-01", 4.0)])];
        let result = transform(&points, &NicknameTable::default(), &TransformOptions::default());

        assert_eq!(result.series[0].values, vec![4.0]);
        assert_eq!(result.total, vec![4.0]);
    }

    #[test]
    fn test_min_day_policy_include_vs_exclude_today() {
        let points = vec![meter(
            "A",
            &[("2024-05-01", 5.0), ("2024-05-02", 3.0), ("2024-05-03", 0.5)],
        )];
        let today = day("2024-05-03");

        let included = transform(
            &points,
            &NicknameTable::default(),
            &TransformOptions::for_day(today),
        );
        assert_eq!(included.summary.min_day_kwh, 0.5);

        let excluded = transform(
            &points,
            &NicknameTable::default(),
            &TransformOptions::for_day(today).with_min_day_policy(MinDayPolicy::ExcludeToday),
        );
        assert_eq!(excluded.summary.min_day_kwh, 3.0);

        assert_eq!(included.summary.today_kwh, Some(0.5));
        assert_eq!(excluded.summary.today_kwh, Some(0.5));
        assert_eq!(included.summary.max_day_kwh, 5.0);
        assert_eq!(excluded.summary.max_day_kwh, 5.0);
    }

    #[test]
    fn test_exclude_today_with_only_today_is_zero() {
        let points = vec![meter("A", &[("2024-05-03", 2.0)])];
        let options = TransformOptions::for_day(day("2024-05-03"))
            .with_min_day_policy(MinDayPolicy::ExcludeToday);
        let result = transform(&points, &NicknameTable::default(), &options);

        assert_eq!(result.summary.min_day_kwh, 0.0);
        assert_eq!(result.summary.max_day_kwh, 2.0);
    }

    #[test]
    fn test_today_absent_is_none() {
        let points = vec![meter("A", &[("2024-05-01", 2.0)])];
        let result = transform(
            &points,
            &NicknameTable::default(),
            &TransformOptions::for_day(day("2024-06-01")),
        );
        assert_eq!(result.summary.today_kwh, None);
    }

    #[test]
    fn test_summary_rounding() {
        let points = vec![meter(
            "A",
            &[("2024-05-01", 1.2344), ("2024-05-02", 2.0014)],
        )];
        let result = transform(&points, &NicknameTable::default(), &TransformOptions::default());

        assert_eq!(result.summary.total_kwh, 3.236);
        assert_eq!(result.summary.avg_per_day_kwh, 1.618);
        assert_eq!(result.summary.min_day_kwh, 1.234);
        assert_eq!(result.summary.max_day_kwh, 2.001);
        // Series keep full precision.
        assert_eq!(result.series[0].values, vec![1.2344, 2.0014]);
    }

    #[test]
    fn test_series_use_nicknames() {
        let nicknames = NicknameTable::new(vec![NicknameEntry::new("E1", "House", Some("red"))]);
        let points = vec![meter("E1", &[("2024-05-01", 1.0)]), meter("E2", &[("2024-05-01", 1.0)])];
        let result = transform(&points, &nicknames, &TransformOptions::default());

        assert_eq!(result.series[0].display, "House");
        assert_eq!(result.series[0].color.as_deref(), Some("red"));
        assert_eq!(result.series[1].display, "E2");
        assert_eq!(result.series[1].color, None);
    }

    #[test]
    fn test_round3() {
        assert_eq!(round3(1.0004), 1.0);
        assert_eq!(round3(1.0006), 1.001);
        assert_eq!(round3(0.0), 0.0);
    }
}
