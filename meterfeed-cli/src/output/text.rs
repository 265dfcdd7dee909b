//! Text output formatting with a per-day table and colors.

use meterfeed_core::SummaryStats;
use meterfeed_store::{DashboardPayload, LoadSource};

use super::CheckOutput;

// ============================================================================
// ANSI Colors
// ============================================================================

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";

/// Header of the date column.
const DATE_HEADER: &str = "Date";

/// Header of the totals column.
const TOTAL_HEADER: &str = "Total";

/// Text formatter with optional colors.
pub struct TextFormatter {
    use_colors: bool,
}

impl TextFormatter {
    /// Creates a new text formatter.
    pub fn new(use_colors: bool) -> Self {
        Self { use_colors }
    }

    /// Formats the dashboard as a table with one row per date.
    pub fn format_dashboard(&self, payload: &DashboardPayload) -> String {
        let mut lines = Vec::new();

        let fetched = payload.fetched_at.as_deref().unwrap_or("never");
        lines.push(format!(
            "{} ({}, fetched {})",
            self.bold("Energy consumption"),
            self.format_source(payload.source),
            fetched
        ));
        if payload.cache_cleared {
            lines.push(self.dim("Cache cleared before loading"));
        }
        lines.push("─".repeat(40));

        let result = &payload.result;
        if result.is_empty() {
            lines.push(self.dim("No metering data available"));
            return lines.join("\n");
        }

        // Column widths are computed on plain text, colors are applied after padding.
        let mut headers = vec![DATE_HEADER.to_string()];
        headers.extend(result.series.iter().map(|s| s.display.clone()));
        headers.push(TOTAL_HEADER.to_string());

        let rows: Vec<Vec<String>> = result
            .dates
            .iter()
            .enumerate()
            .map(|(i, date)| {
                let mut row = vec![date.clone()];
                row.extend(
                    result
                        .series
                        .iter()
                        .map(|s| Self::format_kwh(s.values.get(i).copied().unwrap_or(0.0))),
                );
                row.push(Self::format_kwh(result.total.get(i).copied().unwrap_or(0.0)));
                row
            })
            .collect();

        let widths: Vec<usize> = (0..headers.len())
            .map(|col| {
                rows.iter()
                    .map(|r| r[col].chars().count())
                    .chain(std::iter::once(headers[col].chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let header_line: Vec<String> = headers
            .iter()
            .zip(&widths)
            .enumerate()
            .map(|(col, (h, w))| {
                let padded = if col == 0 {
                    format!("{h:<w$}")
                } else {
                    format!("{h:>w$}")
                };
                self.bold(&padded)
            })
            .collect();
        lines.push(header_line.join("  "));

        for row in &rows {
            let cells: Vec<String> = row
                .iter()
                .zip(&widths)
                .enumerate()
                .map(|(col, (cell, w))| {
                    if col == 0 {
                        format!("{cell:<w$}")
                    } else if col == row.len() - 1 {
                        self.bold(&format!("{cell:>w$}"))
                    } else {
                        format!("{cell:>w$}")
                    }
                })
                .collect();
            lines.push(cells.join("  "));
        }

        lines.push("─".repeat(40));
        lines.push(self.format_summary(&result.summary));

        lines.join("\n")
    }

    /// Formats the summary line.
    pub fn format_summary(&self, summary: &SummaryStats) -> String {
        let mut parts = vec![
            format!("Total {} kWh", self.bold(&Self::format_kwh(summary.total_kwh))),
            format!("Avg/day {}", Self::format_kwh(summary.avg_per_day_kwh)),
            format!("Min {}", Self::format_kwh(summary.min_day_kwh)),
            format!("Max {}", Self::format_kwh(summary.max_day_kwh)),
        ];
        if let Some(today) = summary.today_kwh {
            parts.push(format!("Today {}", self.green(&Self::format_kwh(today))));
        }
        parts.join("   ")
    }

    /// Formats a check line.
    pub fn format_check(&self, check: &CheckOutput) -> String {
        let mark = if check.ok {
            self.green("✓")
        } else {
            self.red("✗")
        };
        format!("{mark} {:<10} {}", check.name, check.detail)
    }

    /// Formats where the data came from.
    pub fn format_source(&self, source: LoadSource) -> String {
        match source {
            LoadSource::Fresh => self.green("cached"),
            LoadSource::Live => self.green("live"),
            LoadSource::Stale => self.yellow("stale"),
            LoadSource::Empty => self.red("no data"),
        }
    }

    /// Formats a kWh value with three decimals.
    pub fn format_kwh(value: f64) -> String {
        format!("{value:.3}")
    }

    // ========================================================================
    // Color/style helpers
    // ========================================================================

    fn paint(&self, code: &str, text: &str) -> String {
        if self.use_colors {
            format!("{code}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    fn bold(&self, text: &str) -> String {
        self.paint(BOLD, text)
    }

    fn dim(&self, text: &str) -> String {
        self.paint(DIM, text)
    }

    fn green(&self, text: &str) -> String {
        self.paint(GREEN, text)
    }

    fn yellow(&self, text: &str) -> String {
        self.paint(YELLOW, text)
    }

    fn red(&self, text: &str) -> String {
        self.paint(RED, text)
    }
}
