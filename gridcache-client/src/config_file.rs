//! Declarative configuration loading from TOML and environment variables.
//!
//! File-based configuration goes through mirror structs deserialized with
//! serde, which are then converted into the programmatic
//! [`ClientConfig`](crate::config::ClientConfig) using the builder API.
//!
//! # Example TOML
//!
//! ```toml
//! operation-timeout-ms = 2000
//! partition-aware = true
//!
//! [retry]
//! max-attempts = 3
//! initial-backoff-ms = 0
//! max-backoff-ms = 1000
//! multiplier = 2.0
//! jitter = 0.1
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::{ClientConfig, ClientConfigBuilder, ConfigError};

/// Top-level file-based configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case", default)]
pub struct FileConfig {
    /// Retry policy.
    pub retry: Option<FileRetryConfig>,
    /// Bound on a single exchange in milliseconds.
    pub operation_timeout_ms: Option<u64>,
    /// Whether to route requests to the partition owner.
    pub partition_aware: Option<bool>,
}

/// File-based retry configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case", default)]
pub struct FileRetryConfig {
    /// Maximum number of attempts, the first one included.
    pub max_attempts: Option<u32>,
    /// Pause before the first retry in milliseconds.
    pub initial_backoff_ms: Option<u64>,
    /// Maximum pause between attempts in milliseconds.
    pub max_backoff_ms: Option<u64>,
    /// Backoff multiplier.
    pub multiplier: Option<f64>,
    /// Jitter factor (0.0 to 1.0).
    pub jitter: Option<f64>,
}

impl TryFrom<FileConfig> for ClientConfig {
    type Error = ConfigError;

    fn try_from(file: FileConfig) -> Result<Self, Self::Error> {
        let mut builder = ClientConfigBuilder::new();

        if let Some(retry) = file.retry {
            builder = builder.retry(|mut r| {
                if let Some(n) = retry.max_attempts {
                    r = r.max_attempts(n);
                }
                if let Some(ms) = retry.initial_backoff_ms {
                    r = r.initial_backoff(Duration::from_millis(ms));
                }
                if let Some(ms) = retry.max_backoff_ms {
                    r = r.max_backoff(Duration::from_millis(ms));
                }
                if let Some(m) = retry.multiplier {
                    r = r.multiplier(m);
                }
                if let Some(j) = retry.jitter {
                    r = r.jitter(j);
                }
                r
            });
        }

        if let Some(ms) = file.operation_timeout_ms {
            builder = builder.operation_timeout(Duration::from_millis(ms));
        }

        if let Some(enabled) = file.partition_aware {
            builder = builder.partition_aware(enabled);
        }

        builder.build()
    }
}

impl ClientConfig {
    /// Parses configuration from a TOML document.
    ///
    /// Requires the `config-file` feature.
    #[cfg(feature = "config-file")]
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let file_config: FileConfig = toml_crate::from_str(content)
            .map_err(|e| ConfigError::new(format!("failed to parse TOML config: {e}")))?;
        file_config.try_into()
    }

    /// Loads configuration from a TOML file.
    ///
    /// Requires the `config-file` feature.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let config = ClientConfig::from_toml("gridcache-client.toml")?;
    /// let client = GridClient::new(transport, config);
    /// ```
    #[cfg(feature = "config-file")]
    pub fn from_toml<P: AsRef<std::path::Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("failed to read TOML config file: {e}")))?;
        Self::from_toml_str(&content)
    }

    /// Loads configuration from environment variables.
    ///
    /// This method is always available (no feature flag required).
    ///
    /// # Supported Environment Variables
    ///
    /// | Variable | Maps to |
    /// |----------|---------|
    /// | `GRIDCACHE_MAX_ATTEMPTS` | Attempts per operation |
    /// | `GRIDCACHE_INITIAL_BACKOFF_MS` | Pause before the first retry |
    /// | `GRIDCACHE_MAX_BACKOFF_MS` | Maximum pause between attempts |
    /// | `GRIDCACHE_OPERATION_TIMEOUT_MS` | Bound on a single exchange |
    /// | `GRIDCACHE_PARTITION_AWARE` | `"true"` or `"false"` |
    ///
    /// Unset variables keep their defaults; values that do not parse are
    /// rejected.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    pub(crate) fn from_vars<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut file_config = FileConfig::default();

        if let Some(n) = parse_var(&lookup, "GRIDCACHE_MAX_ATTEMPTS")? {
            file_config
                .retry
                .get_or_insert_with(Default::default)
                .max_attempts = Some(n);
        }

        if let Some(ms) = parse_var(&lookup, "GRIDCACHE_INITIAL_BACKOFF_MS")? {
            file_config
                .retry
                .get_or_insert_with(Default::default)
                .initial_backoff_ms = Some(ms);
        }

        if let Some(ms) = parse_var(&lookup, "GRIDCACHE_MAX_BACKOFF_MS")? {
            file_config
                .retry
                .get_or_insert_with(Default::default)
                .max_backoff_ms = Some(ms);
        }

        if let Some(ms) = parse_var(&lookup, "GRIDCACHE_OPERATION_TIMEOUT_MS")? {
            file_config.operation_timeout_ms = Some(ms);
        }

        if let Some(val) = lookup("GRIDCACHE_PARTITION_AWARE") {
            file_config.partition_aware = Some(val.trim().eq_ignore_ascii_case("true"));
        }

        file_config.try_into()
    }
}

fn parse_var<F, T>(lookup: &F, name: &str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(val) => val
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::new(format!("invalid value for {name}: {e}"))),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_file_config_defaults_produce_valid_client_config() {
        let config: ClientConfig = FileConfig::default().try_into().unwrap();
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn test_file_config_with_retry() {
        let file_config = FileConfig {
            retry: Some(FileRetryConfig {
                max_attempts: Some(4),
                initial_backoff_ms: Some(20),
                max_backoff_ms: Some(500),
                multiplier: Some(1.5),
                jitter: Some(0.2),
            }),
            ..Default::default()
        };
        let config: ClientConfig = file_config.try_into().unwrap();
        assert_eq!(config.retry().max_attempts(), 4);
        assert_eq!(config.retry().initial_backoff(), Duration::from_millis(20));
        assert_eq!(config.retry().max_backoff(), Duration::from_millis(500));
        assert_eq!(config.retry().multiplier(), 1.5);
        assert_eq!(config.retry().jitter(), 0.2);
    }

    #[test]
    fn test_file_config_invalid_retry_rejected() {
        let file_config = FileConfig {
            retry: Some(FileRetryConfig {
                max_attempts: Some(0),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(ClientConfig::try_from(file_config).is_err());
    }

    #[test]
    fn test_from_vars() {
        let config = ClientConfig::from_vars(vars(&[
            ("GRIDCACHE_MAX_ATTEMPTS", "5"),
            ("GRIDCACHE_INITIAL_BACKOFF_MS", "10"),
            ("GRIDCACHE_MAX_BACKOFF_MS", "100"),
            ("GRIDCACHE_OPERATION_TIMEOUT_MS", "2500"),
            ("GRIDCACHE_PARTITION_AWARE", "FALSE"),
        ]))
        .unwrap();

        assert_eq!(config.retry().max_attempts(), 5);
        assert_eq!(config.retry().initial_backoff(), Duration::from_millis(10));
        assert_eq!(config.retry().max_backoff(), Duration::from_millis(100));
        assert_eq!(config.operation_timeout(), Some(Duration::from_millis(2500)));
        assert!(!config.partition_aware());
    }

    #[test]
    fn test_from_vars_empty_uses_defaults() {
        let config = ClientConfig::from_vars(vars(&[])).unwrap();
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn test_from_vars_rejects_unparsable_number() {
        let err = ClientConfig::from_vars(vars(&[("GRIDCACHE_MAX_ATTEMPTS", "three")]))
            .unwrap_err();
        assert!(err.to_string().contains("GRIDCACHE_MAX_ATTEMPTS"));
    }

    #[test]
    fn test_from_env_with_max_attempts() {
        std::env::set_var("GRIDCACHE_MAX_ATTEMPTS", "6");
        let config = ClientConfig::from_env();
        std::env::remove_var("GRIDCACHE_MAX_ATTEMPTS");
        assert_eq!(config.unwrap().retry().max_attempts(), 6);
    }

    #[cfg(feature = "config-file")]
    #[test]
    fn test_from_toml_str() {
        let config = ClientConfig::from_toml_str(
            r#"
            operation-timeout-ms = 1500
            partition-aware = false

            [retry]
            max-attempts = 2
            jitter = 0.5
            "#,
        )
        .unwrap();

        assert_eq!(config.operation_timeout(), Some(Duration::from_millis(1500)));
        assert!(!config.partition_aware());
        assert_eq!(config.retry().max_attempts(), 2);
        assert_eq!(config.retry().jitter(), 0.5);
    }

    #[cfg(feature = "config-file")]
    #[test]
    fn test_from_toml_str_rejects_malformed() {
        let err = ClientConfig::from_toml_str("retry = [").unwrap_err();
        assert!(err.to_string().contains("failed to parse TOML"));
    }

    #[cfg(feature = "config-file")]
    #[test]
    fn test_from_toml_file() {
        let path = std::env::temp_dir().join(format!(
            "gridcache-client-{}.toml",
            uuid::Uuid::new_v4()
        ));
        std::fs::write(&path, "[retry]\nmax-attempts = 9\n").unwrap();
        let config = ClientConfig::from_toml(&path);
        std::fs::remove_file(&path).unwrap();
        assert_eq!(config.unwrap().retry().max_attempts(), 9);
    }

    #[cfg(feature = "config-file")]
    #[test]
    fn test_from_toml_missing_file() {
        let err = ClientConfig::from_toml("/nonexistent/gridcache.toml").unwrap_err();
        assert!(err.to_string().contains("failed to read TOML config file"));
    }

    #[cfg(feature = "config-file")]
    #[test]
    fn test_toml_round_trip() {
        let file_config = FileConfig {
            operation_timeout_ms: Some(300),
            ..Default::default()
        };
        let toml_str = toml_crate::to_string(&file_config).unwrap();
        let parsed: FileConfig = toml_crate::from_str(&toml_str).unwrap();
        assert_eq!(parsed.operation_timeout_ms, Some(300));
    }
}
