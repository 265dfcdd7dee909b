//! Settings file.
//!
//! One JSON object, every field optional:
//!
//! ```json
//! {
//!   "cache_ttl": 3600,
//!   "eic_nicknames": { "38ZEE-00000001-X": { "nick": "House", "color": "#ff8800" } },
//!   "client_id": "...",
//!   "client_secret": "...",
//!   "elering_api_url": "https://estfeed.elering.ee/api/public/v1/metering-data"
//! }
//! ```
//!
//! Loading never fails: a missing or broken file yields the defaults.

use meterfeed_core::{MinDayPolicy, NicknameTable};
use meterfeed_fetch::{AuthParams, DEFAULT_DATA_URL, DEFAULT_TOKEN_URL};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

use crate::persistence::{default_cache_path, load_json_or_default};

/// Default cache lifetime in seconds.
pub const DEFAULT_CACHE_TTL: u64 = 3600;

/// Default port for a serving front end.
pub const DEFAULT_SERVER_PORT: u16 = 8889;

/// Default bind host for a serving front end.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Environment variable holding the OAuth2 client id.
pub const ENV_CLIENT_ID: &str = "AUTH_CLIENT_ID";

/// Environment variable holding the OAuth2 client secret.
pub const ENV_CLIENT_SECRET: &str = "AUTH_CLIENT_SECRET";

/// Placeholder shown instead of secrets.
const REDACTED: &str = "********";

// ============================================================================
// Settings
// ============================================================================

/// Resolved configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Cache lifetime in seconds.
    #[serde(deserialize_with = "lenient_ttl")]
    pub cache_ttl: u64,

    /// Ordered nickname table.
    pub eic_nicknames: NicknameTable,

    /// OAuth2 client id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    /// OAuth2 client secret.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,

    /// Pre-built token request body: a JSON object or an url-encoded string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_data: Option<Value>,

    /// `"none"` disables the token exchange.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_mode: Option<String>,

    /// OAuth2 token endpoint.
    #[serde(alias = "elering_api_token_url")]
    pub token_endpoint_url: String,

    /// Metering data endpoint.
    #[serde(alias = "elering_api_url")]
    pub data_endpoint_url: String,

    /// HTTP Basic Auth user for a serving front end.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub basic_auth_user: Option<String>,

    /// HTTP Basic Auth password for a serving front end.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub basic_auth_password: Option<String>,

    /// Port for a serving front end.
    pub server_port: u16,

    /// Bind host for a serving front end.
    pub host: String,

    /// Log each load at info level.
    pub enable_request_logging: bool,

    /// Cache file location; defaults to the platform cache directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_path: Option<PathBuf>,

    /// Skip today when picking the minimum day.
    pub min_day_excludes_today: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cache_ttl: DEFAULT_CACHE_TTL,
            eic_nicknames: NicknameTable::default(),
            client_id: None,
            client_secret: None,
            auth_data: None,
            auth_mode: None,
            token_endpoint_url: DEFAULT_TOKEN_URL.to_string(),
            data_endpoint_url: DEFAULT_DATA_URL.to_string(),
            basic_auth_user: None,
            basic_auth_password: None,
            server_port: DEFAULT_SERVER_PORT,
            host: DEFAULT_HOST.to_string(),
            enable_request_logging: false,
            cache_path: None,
            min_day_excludes_today: false,
        }
    }
}

impl Settings {
    /// Loads settings from `path`, falling back to defaults on any error.
    ///
    /// Client credentials missing from the file are taken from
    /// `AUTH_CLIENT_ID` / `AUTH_CLIENT_SECRET`.
    pub async fn load_from(path: &Path) -> Self {
        let mut settings: Settings = load_json_or_default(path).await;
        settings.fill_from_env(|key| std::env::var(key).ok());
        debug!(
            path = %path.display(),
            ttl = settings.cache_ttl,
            nicknames = settings.eic_nicknames.len(),
            auth_mode = settings.auth_params().mode(),
            "Settings loaded"
        );
        settings
    }

    /// Fills missing client credentials through `lookup`.
    pub fn fill_from_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if self.client_id.as_deref().is_none_or(str::is_empty) {
            self.client_id = non_empty(ENV_CLIENT_ID).or(self.client_id.take());
        }
        if self.client_secret.as_deref().is_none_or(str::is_empty) {
            self.client_secret = non_empty(ENV_CLIENT_SECRET).or(self.client_secret.take());
        }
    }

    /// Cache lifetime.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl)
    }

    /// Nickname table in declaration order.
    pub fn nicknames(&self) -> &NicknameTable {
        &self.eic_nicknames
    }

    /// Minimum-day policy for the summary.
    pub fn min_day_policy(&self) -> MinDayPolicy {
        if self.min_day_excludes_today {
            MinDayPolicy::ExcludeToday
        } else {
            MinDayPolicy::IncludeToday
        }
    }

    /// Cache file location.
    pub fn cache_path(&self) -> PathBuf {
        self.cache_path.clone().unwrap_or_else(default_cache_path)
    }

    /// Credentials for the token exchange.
    ///
    /// `auth_mode: "none"` wins, then a complete client id/secret pair, then
    /// `auth_data`.
    pub fn auth_params(&self) -> AuthParams {
        if self
            .auth_mode
            .as_deref()
            .is_some_and(|m| m.eq_ignore_ascii_case("none"))
        {
            return AuthParams::Anonymous;
        }

        if let (Some(id), Some(secret)) = (&self.client_id, &self.client_secret) {
            if !id.is_empty() && !secret.is_empty() {
                return AuthParams::client_credentials(id.clone(), secret.clone());
            }
        }

        match &self.auth_data {
            Some(Value::String(body)) if !body.trim().is_empty() => {
                AuthParams::from_encoded_form(body)
            }
            Some(Value::Object(fields)) if !fields.is_empty() => AuthParams::Form(
                fields
                    .iter()
                    .filter(|(_, v)| !v.is_null())
                    .map(|(k, v)| {
                        let value = match v {
                            Value::String(s) => s.clone(),
                            other => other.to_string(),
                        };
                        (k.clone(), value)
                    })
                    .collect(),
            ),
            Some(other) if !other.is_null() => {
                warn!("auth_data must be an object or an url-encoded string, ignoring");
                AuthParams::Unset
            }
            _ => AuthParams::Unset,
        }
    }

    /// Basic Auth user and password, if both are set.
    pub fn basic_auth_credentials(&self) -> Option<(&str, &str)> {
        match (
            self.basic_auth_user.as_deref(),
            self.basic_auth_password.as_deref(),
        ) {
            (Some(user), Some(password)) if !user.is_empty() && !password.is_empty() => {
                Some((user, password))
            }
            _ => None,
        }
    }

    /// Copy with every secret replaced by a placeholder, for display.
    #[must_use]
    pub fn redacted(&self) -> Self {
        let hide = |v: &Option<String>| v.as_ref().map(|_| REDACTED.to_string());
        Self {
            client_secret: hide(&self.client_secret),
            basic_auth_password: hide(&self.basic_auth_password),
            auth_data: self.auth_data.as_ref().map(|_| Value::from(REDACTED)),
            ..self.clone()
        }
    }
}

// ============================================================================
// Serde Helpers
// ============================================================================

/// Accepts an integer, a numeric string or null; anything else is the default.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn lenient_ttl<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let value = Value::deserialize(deserializer)?;
    let ttl = match &value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0 && f.is_finite()).map(|f| f as u64)),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        Value::Null => Some(DEFAULT_CACHE_TTL),
        _ => None,
    };

    Ok(ttl.unwrap_or_else(|| {
        warn!(value = %value, "Invalid cache_ttl, using default");
        DEFAULT_CACHE_TTL
    }))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: Value) -> Settings {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.cache_ttl(), Duration::from_secs(3600));
        assert!(settings.nicknames().is_empty());
        assert_eq!(settings.token_endpoint_url, DEFAULT_TOKEN_URL);
        assert_eq!(settings.data_endpoint_url, DEFAULT_DATA_URL);
        assert_eq!(settings.server_port, 8889);
        assert_eq!(settings.host, "0.0.0.0");
        assert!(!settings.enable_request_logging);
        assert_eq!(settings.auth_params(), AuthParams::Unset);
        assert_eq!(settings.min_day_policy(), MinDayPolicy::IncludeToday);
    }

    #[test]
    fn test_cache_ttl_variants() {
        assert_eq!(parse(json!({ "cache_ttl": 60 })).cache_ttl, 60);
        assert_eq!(parse(json!({ "cache_ttl": "120" })).cache_ttl, 120);
        assert_eq!(parse(json!({ "cache_ttl": "soon" })).cache_ttl, DEFAULT_CACHE_TTL);
        assert_eq!(parse(json!({ "cache_ttl": null })).cache_ttl, DEFAULT_CACHE_TTL);
    }

    #[test]
    fn test_legacy_endpoint_aliases() {
        let settings = parse(json!({
            "elering_api_token_url": "https://auth.example.com/token",
            "elering_api_url": "https://api.example.com/data"
        }));
        assert_eq!(settings.token_endpoint_url, "https://auth.example.com/token");
        assert_eq!(settings.data_endpoint_url, "https://api.example.com/data");
    }

    #[test]
    fn test_auth_params_precedence() {
        let settings = parse(json!({
            "client_id": "id",
            "client_secret": "secret",
            "auth_data": "grant_type=client_credentials"
        }));
        assert_eq!(settings.auth_params(), AuthParams::client_credentials("id", "secret"));

        let settings = parse(json!({ "auth_mode": "none", "client_id": "id", "client_secret": "s" }));
        assert_eq!(settings.auth_params(), AuthParams::Anonymous);
    }

    #[test]
    fn test_auth_data_forms() {
        let settings = parse(json!({ "auth_data": "client_id=a&client_secret=b" }));
        assert_eq!(
            settings.auth_params(),
            AuthParams::Form(vec![
                ("client_id".to_string(), "a".to_string()),
                ("client_secret".to_string(), "b".to_string()),
            ])
        );

        let settings = parse(json!({ "auth_data": { "grant_type": "client_credentials", "n": 1 } }));
        match settings.auth_params() {
            AuthParams::Form(fields) => {
                assert!(fields.contains(&("grant_type".to_string(), "client_credentials".to_string())));
                assert!(fields.contains(&("n".to_string(), "1".to_string())));
            }
            other => panic!("unexpected params: {other:?}"),
        }

        let settings = parse(json!({ "auth_data": 42 }));
        assert_eq!(settings.auth_params(), AuthParams::Unset);
    }

    #[test]
    fn test_fill_from_env() {
        let mut settings = Settings::default();
        settings.fill_from_env(|key| match key {
            ENV_CLIENT_ID => Some("env-id".to_string()),
            ENV_CLIENT_SECRET => Some("env-secret".to_string()),
            _ => None,
        });
        assert_eq!(
            settings.auth_params(),
            AuthParams::client_credentials("env-id", "env-secret")
        );
    }

    #[test]
    fn test_fill_from_env_keeps_file_values() {
        let mut settings = parse(json!({ "client_id": "file-id", "client_secret": "file-secret" }));
        settings.fill_from_env(|_| Some("env".to_string()));
        assert_eq!(settings.client_id.as_deref(), Some("file-id"));
        assert_eq!(settings.client_secret.as_deref(), Some("file-secret"));
    }

    #[test]
    fn test_basic_auth_credentials() {
        assert_eq!(Settings::default().basic_auth_credentials(), None);

        let settings = parse(json!({ "basic_auth_user": "u", "basic_auth_password": "p" }));
        assert_eq!(settings.basic_auth_credentials(), Some(("u", "p")));

        let settings = parse(json!({ "basic_auth_user": "u", "basic_auth_password": "" }));
        assert_eq!(settings.basic_auth_credentials(), None);
    }

    #[test]
    fn test_min_day_policy_setting() {
        let settings = parse(json!({ "min_day_excludes_today": true }));
        assert_eq!(settings.min_day_policy(), MinDayPolicy::ExcludeToday);
    }

    #[test]
    fn test_cache_path_override() {
        let settings = parse(json!({ "cache_path": "/tmp/meterfeed-test/cache.json" }));
        assert_eq!(settings.cache_path(), PathBuf::from("/tmp/meterfeed-test/cache.json"));
        assert!(Settings::default().cache_path().ends_with("api_cache.json"));
    }

    #[test]
    fn test_redacted_hides_secrets() {
        let settings = parse(json!({
            "client_id": "id",
            "client_secret": "hunter2",
            "auth_data": "client_secret=hunter2",
            "basic_auth_password": "hunter2"
        }));
        let shown = serde_json::to_string(&settings.redacted()).unwrap();
        assert!(!shown.contains("hunter2"));
        assert!(shown.contains("\"client_id\":\"id\""));
    }

    #[tokio::test]
    async fn test_load_from_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = Settings::load_from(&dir.path().join("absent.json")).await;
        // Environment may carry credentials; compare everything else.
        settings.client_id = None;
        settings.client_secret = None;
        assert_eq!(settings, Settings::default());
    }

    #[tokio::test]
    async fn test_load_from_corrupt_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        tokio::fs::write(&path, "{ \"cache_ttl\": ").await.unwrap();

        let settings = Settings::load_from(&path).await;
        assert_eq!(settings.cache_ttl, DEFAULT_CACHE_TTL);
    }

    #[tokio::test]
    async fn test_load_from_file_keeps_nickname_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        tokio::fs::write(
            &path,
            r#"{ "cache_ttl": 10, "eic_nicknames": { "Z-1": "Zeta", "A-1": { "nick": "Alpha", "color": "red" } } }"#,
        )
        .await
        .unwrap();

        let settings = Settings::load_from(&path).await;
        assert_eq!(settings.cache_ttl(), Duration::from_secs(10));
        assert_eq!(settings.nicknames().entries()[0].nick, "Zeta");
        assert_eq!(settings.nicknames().entries()[1].nick, "Alpha");
    }
}
