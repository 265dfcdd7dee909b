//! JSON output formatting.

use anyhow::Result;
use serde::Serialize;

// ============================================================================
// Output Types
// ============================================================================

/// Result of `clear-cache`.
#[derive(Debug, Serialize)]
pub struct ClearCacheOutput {
    pub cache_cleared: bool,
    pub path: String,
}

/// Configuration paths.
#[derive(Debug, Serialize)]
pub struct PathsOutput {
    pub config_dir: String,
    pub settings_file: String,
    pub settings_exists: bool,
    pub cache_file: String,
}

/// One line of `check`.
#[derive(Debug, Serialize)]
pub struct CheckOutput {
    pub name: String,
    pub ok: bool,
    pub detail: String,
}

impl CheckOutput {
    /// Creates a check line.
    pub fn new(name: &str, ok: bool, detail: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            ok,
            detail: detail.into(),
        }
    }
}

// ============================================================================
// JSON Formatter
// ============================================================================

/// JSON formatter.
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    /// Creates a new JSON formatter.
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    /// Formats any serializable value.
    pub fn format<T: Serialize>(&self, data: &T) -> Result<String> {
        let json = if self.pretty {
            serde_json::to_string_pretty(data)?
        } else {
            serde_json::to_string(data)?
        };
        Ok(json)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_pretty() {
        let formatter = JsonFormatter::new(true);
        let data = serde_json::json!({"key": "value"});
        let output = formatter.format(&data).unwrap();
        assert!(output.contains('\n'));
    }

    #[test]
    fn test_format_compact() {
        let formatter = JsonFormatter::new(false);
        let data = serde_json::json!({"key": "value"});
        let output = formatter.format(&data).unwrap();
        assert!(!output.contains('\n'));
    }

    #[test]
    fn test_check_output_shape() {
        let formatter = JsonFormatter::new(false);
        let output = formatter
            .format(&vec![CheckOutput::new("cache", true, "fresh")])
            .unwrap();
        assert_eq!(output, r#"[{"name":"cache","ok":true,"detail":"fresh"}]"#);
    }
}
