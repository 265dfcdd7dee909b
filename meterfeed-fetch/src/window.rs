//! Query window for the metering data call.

use chrono::{DateTime, Datelike, TimeZone, Timelike, Utc};

/// Timestamp layout the metering API expects, e.g. `2024-05-01T00:00:00.000Z`.
const QUERY_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Aggregation resolution requested from the API.
pub const RESOLUTION: &str = "one_day";

/// Time range for one data request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryWindow {
    /// Inclusive start.
    pub start: DateTime<Utc>,
    /// End, usually "now".
    pub end: DateTime<Utc>,
}

impl QueryWindow {
    /// From midnight on the first day of `now`'s UTC month up to `now`.
    pub fn month_to_date(now: DateTime<Utc>) -> Self {
        let start = Utc
            .with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0)
            .single()
            .unwrap_or(now);
        Self { start, end: now }
    }

    /// Query parameters for the data endpoint.
    ///
    /// Sub-second precision of the bounds is dropped; the API gets `.000`.
    pub fn query_pairs(&self) -> [(&'static str, String); 3] {
        [
            ("startDateTime", format_query_time(self.start)),
            ("endDateTime", format_query_time(self.end)),
            ("resolution", RESOLUTION.to_string()),
        ]
    }
}

fn format_query_time(at: DateTime<Utc>) -> String {
    at.with_nanosecond(0)
        .unwrap_or(at)
        .format(QUERY_TIME_FORMAT)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_month_to_date() {
        let window = QueryWindow::month_to_date(utc("2024-05-17T13:45:12.789Z"));
        assert_eq!(window.start, utc("2024-05-01T00:00:00Z"));
        assert_eq!(window.end, utc("2024-05-17T13:45:12.789Z"));
    }

    #[test]
    fn test_month_to_date_on_first_midnight() {
        let now = utc("2024-03-01T00:00:00Z");
        let window = QueryWindow::month_to_date(now);
        assert_eq!(window.start, now);
        assert_eq!(window.end, now);
    }

    #[test]
    fn test_query_pairs_format() {
        let window = QueryWindow::month_to_date(utc("2024-05-17T13:45:12.789Z"));
        let pairs = window.query_pairs();

        assert_eq!(pairs[0], ("startDateTime", "2024-05-01T00:00:00.000Z".to_string()));
        assert_eq!(pairs[1], ("endDateTime", "2024-05-17T13:45:12.000Z".to_string()));
        assert_eq!(pairs[2], ("resolution", "one_day".to_string()));
    }
}
