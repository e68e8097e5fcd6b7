//! Application configuration loaded from environment variables.
//!
//! Credentials and identifiers are read once at startup; everything else
//! has a default suited to the production Scoutbook API.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Default Scoutbook API host.
pub const DEFAULT_API_URL: &str = "https://api.scouting.org";
/// Default Scoutbook login host.
pub const DEFAULT_AUTH_URL: &str = "https://my.scouting.org";

/// Sync configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Credentials and identifiers (required) ---
    /// Scoutbook login name
    pub username: String,
    /// Scoutbook password
    pub password: String,
    /// Organization GUID of the unit
    pub org_guid: String,
    /// Numeric unit ID (used by the events endpoint)
    pub unit_id: String,
    /// Firestore project backing local storage
    pub storage_project_id: String,

    // --- Provider endpoints ---
    pub api_url: String,
    pub auth_url: String,

    // --- Request pacing ---
    /// Minimum gap between outgoing provider requests
    pub rate_limit_interval: Duration,
    /// Retry budget shared by network and 429 retries of one call
    pub max_retries: u32,
    /// Base delay for exponential backoff
    pub retry_base_delay: Duration,
    /// Sessions are refreshed this long before their token expires
    pub session_refresh_buffer: Duration,

    // --- Event window ---
    pub events_past_days: i64,
    pub events_future_days: i64,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            username: "test_user".to_string(),
            password: "test_password".to_string(),
            org_guid: "00000000-0000-0000-0000-000000000000".to_string(),
            unit_id: "12345".to_string(),
            storage_project_id: "test-project".to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            auth_url: DEFAULT_AUTH_URL.to_string(),
            rate_limit_interval: Duration::from_millis(1000),
            max_retries: 3,
            retry_base_delay: Duration::from_millis(1000),
            session_refresh_buffer: Duration::from_secs(30 * 60),
            events_past_days: 30,
            events_future_days: 180,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// A `.env` file in the working directory is honored for local runs.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            username: required("SCOUTBOOK_USERNAME")?,
            password: env::var("SCOUTBOOK_PASSWORD")
                .map_err(|_| ConfigError::Missing("SCOUTBOOK_PASSWORD"))?,
            org_guid: required("SCOUTBOOK_ORG_GUID")?,
            unit_id: required("SCOUTBOOK_UNIT_ID")?,
            storage_project_id: required("FIRESTORE_PROJECT_ID")?,

            api_url: env::var("SCOUTBOOK_API_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            auth_url: env::var("SCOUTBOOK_AUTH_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| DEFAULT_AUTH_URL.to_string()),

            rate_limit_interval: Duration::from_millis(optional(
                "SCOUTBOOK_RATE_LIMIT_MS",
                1000,
            )?),
            max_retries: optional("SCOUTBOOK_MAX_RETRIES", 3)?,
            retry_base_delay: Duration::from_millis(optional("SCOUTBOOK_RETRY_BASE_MS", 1000)?),
            session_refresh_buffer: Duration::from_secs(
                optional::<u64>("SCOUTBOOK_SESSION_BUFFER_MINS", 30)? * 60,
            ),

            events_past_days: optional("SYNC_EVENTS_PAST_DAYS", 30)?,
            events_future_days: optional("SYNC_EVENTS_FUTURE_DAYS", 180)?,
        })
    }
}

/// Read a required, non-blank variable (trimmed).
fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .map(|v| v.trim().to_string())
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(name))
}

/// Read an optional variable, falling back to `default` when unset.
fn optional<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            name,
            value: raw.clone(),
        }),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    // Environment is process-global; keep all env mutation in one test.
    #[test]
    fn test_config_from_env() {
        env::set_var("SCOUTBOOK_USERNAME", "leader");
        env::set_var("SCOUTBOOK_PASSWORD", "hunter2");
        env::set_var("SCOUTBOOK_ORG_GUID", "ABC-123");
        env::set_var("SCOUTBOOK_UNIT_ID", "98765");
        env::set_var("FIRESTORE_PROJECT_ID", "troop-project");
        env::set_var("SCOUTBOOK_API_URL", "http://localhost:9999/");
        env::set_var("SCOUTBOOK_RATE_LIMIT_MS", "250");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.username, "leader");
        assert_eq!(config.org_guid, "ABC-123");
        assert_eq!(config.api_url, "http://localhost:9999");
        assert_eq!(config.auth_url, DEFAULT_AUTH_URL);
        assert_eq!(config.rate_limit_interval, Duration::from_millis(250));
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.session_refresh_buffer, Duration::from_secs(1800));

        env::set_var("SCOUTBOOK_MAX_RETRIES", "lots");
        let err = Config::from_env().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                name: "SCOUTBOOK_MAX_RETRIES",
                ..
            }
        ));
        env::remove_var("SCOUTBOOK_MAX_RETRIES");

        env::set_var("SCOUTBOOK_UNIT_ID", "   ");
        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::Missing("SCOUTBOOK_UNIT_ID")));
    }
}
