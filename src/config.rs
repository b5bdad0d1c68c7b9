//! Configuration types for safe-fetch

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Batch execution and HTTP client settings
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Maximum identifiers fetched at once (default: 1 = sequential)
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Per-request timeout applied by the HTTP fetcher (default: 30 seconds)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,

    /// User agent sent by the HTTP fetcher
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Base URL that resource keys are appended to (None = identifiers must be URLs)
    #[serde(default)]
    pub base_url: Option<String>,

    /// Capacity of the event broadcast channel (default: 256)
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            request_timeout: default_request_timeout(),
            user_agent: default_user_agent(),
            base_url: None,
            event_capacity: default_event_capacity(),
        }
    }
}

/// Retry configuration with exponential backoff
///
/// `max_attempts` counts retries after the first call, so the fetcher runs at
/// most `max_attempts + 1` times per identifier.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (default: 3)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Initial delay before first retry (default: 1 second)
    #[serde(default = "default_initial_delay", with = "duration_serde")]
    pub initial_delay: Duration,

    /// Maximum delay between retries (default: 30 seconds)
    #[serde(default = "default_max_delay", with = "duration_serde")]
    pub max_delay: Duration,

    /// Multiplier for exponential backoff (default: 2.0)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Add random jitter to delays (default: true)
    #[serde(default = "default_true")]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay: default_initial_delay(),
            max_delay: default_max_delay(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// A retry policy that never retries
    pub fn disabled() -> Self {
        Self {
            max_attempts: 0,
            ..Self::default()
        }
    }
}

/// Main configuration for [`BatchFetcher`](crate::BatchFetcher)
///
/// Every field has a default, so `Config::default()` (or `{}` in JSON) gives a
/// sequential fetcher with three retries per identifier.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Batch execution and HTTP client settings
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Retry behavior for transient failures
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Config {
    /// Parse configuration from a JSON document and validate it
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that all settings are usable
    pub fn validate(&self) -> Result<()> {
        if self.fetch.concurrency == 0 {
            return Err(Error::config(
                "fetch.concurrency",
                "concurrency must be at least 1",
            ));
        }
        if self.fetch.request_timeout.is_zero() {
            return Err(Error::config(
                "fetch.request_timeout",
                "request timeout must be greater than zero",
            ));
        }
        if self.fetch.event_capacity == 0 {
            return Err(Error::config(
                "fetch.event_capacity",
                "event channel capacity must be at least 1",
            ));
        }
        if let Some(base) = &self.fetch.base_url {
            let parsed = url::Url::parse(base).map_err(|e| {
                Error::config("fetch.base_url", format!("invalid base URL {base}: {e}"))
            })?;
            if parsed.cannot_be_a_base() {
                return Err(Error::config(
                    "fetch.base_url",
                    format!("{base} cannot be used as a base URL"),
                ));
            }
        }
        let multiplier = self.retry.backoff_multiplier;
        if !multiplier.is_finite() || multiplier < 1.0 {
            return Err(Error::config(
                "retry.backoff_multiplier",
                "backoff multiplier must be finite and >= 1.0",
            ));
        }
        if self.retry.initial_delay > self.retry.max_delay {
            return Err(Error::config(
                "retry.initial_delay",
                "initial delay must not exceed max delay",
            ));
        }
        Ok(())
    }
}

fn default_concurrency() -> usize {
    1
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_user_agent() -> String {
    format!("safe-fetch/{}", env!("CARGO_PKG_VERSION"))
}

fn default_event_capacity() -> usize {
    256
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay() -> Duration {
    Duration::from_secs(1)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(30)
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_true() -> bool {
    true
}

// Durations are stored as whole seconds
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn assert_config_key(result: Result<()>, expected: &str) {
        match result {
            Err(Error::Config { key, .. }) => assert_eq!(key.as_deref(), Some(expected)),
            other => panic!("expected config error on {expected}, got {other:?}"),
        }
    }

    #[test]
    fn defaults_are_sequential_with_retries() {
        let config = Config::default();
        assert_eq!(config.fetch.concurrency, 1);
        assert_eq!(config.fetch.request_timeout, Duration::from_secs(30));
        assert!(config.fetch.user_agent.starts_with("safe-fetch/"));
        assert_eq!(config.retry.max_attempts, 3);
        assert!(config.retry.jitter);
        config.validate().unwrap();
    }

    #[test]
    fn empty_json_yields_defaults() {
        let config = Config::from_json_str("{}").unwrap();
        assert_eq!(config.fetch.concurrency, 1);
        assert_eq!(config.retry.initial_delay, Duration::from_secs(1));
        assert_eq!(config.retry.max_delay, Duration::from_secs(30));
    }

    #[test]
    fn partial_json_overrides_fields() {
        let config = Config::from_json_str(
            r#"{
                "fetch": { "concurrency": 8, "request_timeout": 5, "base_url": "https://www.dnd5eapi.co/api/monsters" },
                "retry": { "max_attempts": 0 }
            }"#,
        )
        .unwrap();

        assert_eq!(config.fetch.concurrency, 8);
        assert_eq!(config.fetch.request_timeout, Duration::from_secs(5));
        assert_eq!(
            config.fetch.base_url.as_deref(),
            Some("https://www.dnd5eapi.co/api/monsters")
        );
        assert_eq!(config.retry.max_attempts, 0);
        assert_eq!(config.retry.backoff_multiplier, 2.0);
    }

    #[test]
    fn durations_serialize_as_seconds() {
        let json = serde_json::to_value(Config::default()).unwrap();
        assert_eq!(json["fetch"]["request_timeout"], 30);
        assert_eq!(json["retry"]["initial_delay"], 1);
    }

    #[test]
    fn rejects_zero_concurrency() {
        let mut config = Config::default();
        config.fetch.concurrency = 0;
        assert_config_key(config.validate(), "fetch.concurrency");
    }

    #[test]
    fn rejects_zero_request_timeout() {
        let mut config = Config::default();
        config.fetch.request_timeout = Duration::ZERO;
        assert_config_key(config.validate(), "fetch.request_timeout");

        let parsed = Config::from_json_str(r#"{"fetch": {"request_timeout": 0}}"#);
        assert!(matches!(parsed, Err(Error::Config { .. })));
    }

    #[test]
    fn rejects_zero_event_capacity() {
        let mut config = Config::default();
        config.fetch.event_capacity = 0;
        assert_config_key(config.validate(), "fetch.event_capacity");
    }

    #[test]
    fn rejects_bad_base_url() {
        let mut config = Config::default();
        config.fetch.base_url = Some("not a url".into());
        assert_config_key(config.validate(), "fetch.base_url");

        config.fetch.base_url = Some("mailto:someone@example.com".into());
        assert_config_key(config.validate(), "fetch.base_url");
    }

    #[test]
    fn rejects_shrinking_backoff() {
        let mut config = Config::default();
        config.retry.backoff_multiplier = 0.5;
        assert_config_key(config.validate(), "retry.backoff_multiplier");

        config.retry.backoff_multiplier = f64::NAN;
        assert_config_key(config.validate(), "retry.backoff_multiplier");

        config.retry.backoff_multiplier = f64::INFINITY;
        assert_config_key(config.validate(), "retry.backoff_multiplier");
    }

    #[test]
    fn rejects_initial_delay_above_max() {
        let mut config = Config::default();
        config.retry.initial_delay = Duration::from_secs(60);
        config.retry.max_delay = Duration::from_secs(10);
        assert_config_key(config.validate(), "retry.initial_delay");
    }

    #[test]
    fn from_json_str_validates() {
        let result = Config::from_json_str(r#"{ "fetch": { "concurrency": 0 } }"#);
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn disabled_retry_has_no_attempts() {
        assert_eq!(RetryConfig::disabled().max_attempts, 0);
    }
}
