//! Configuration for the redemption engine.
//!
//! Supports YAML file and environment variable overrides.

use std::path::Path;
use std::time::Duration;

use backon::ExponentialBuilder;
use serde::Deserialize;

/// Engine configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Retry tuning for post-claim credit and log writes.
    pub retry: RetryConfig,
}

/// Storage configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Storage type (sqlite).
    #[serde(rename = "type")]
    pub storage_type: String,
    /// Path to database file.
    pub path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            storage_type: "sqlite".to_string(),
            path: "./data/scrip.db".to_string(),
        }
    }
}

/// Retry configuration for transient storage failures.
///
/// Applies to the credit step after a successful claim and to async
/// transaction-log retries. The claim itself is never retried.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Delay before the first retry, in milliseconds.
    pub min_delay_ms: u64,
    /// Delay cap, in milliseconds.
    pub max_delay_ms: u64,
    /// Maximum number of retry attempts.
    pub max_attempts: usize,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: 10,
            max_delay_ms: 2000,
            max_attempts: 10,
        }
    }
}

impl RetryConfig {
    /// Build an exponential backoff with jitter from this config.
    pub fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(Duration::from_millis(self.min_delay_ms))
            .with_max_delay(Duration::from_millis(self.max_delay_ms))
            .with_max_times(self.max_attempts)
            .with_jitter()
    }
}

impl Config {
    /// Load configuration from file and environment.
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables
    /// 2. Config file
    /// 3. Defaults
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("SCRIP_CONFIG").unwrap_or_else(|_| "config.yaml".to_string());

        let mut config = if Path::new(&config_path).exists() {
            Self::from_file(&config_path)?
        } else {
            Self::default()
        };

        config.apply_env_overrides();

        Ok(config)
    }

    /// Load configuration from a YAML file.
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileRead(path.to_string(), e.to_string()))?;

        serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Apply environment variable overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("STORAGE_PATH") {
            self.storage.path = path;
        }

        if let Ok(attempts) = std::env::var("RETRY_MAX_ATTEMPTS") {
            if let Ok(n) = attempts.parse() {
                self.retry.max_attempts = n;
            }
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{0}': {1}")]
    FileRead(String, String),

    #[error("Failed to parse config: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.storage.storage_type, "sqlite");
        assert_eq!(config.storage.path, "./data/scrip.db");
        assert_eq!(config.retry.max_attempts, 10);
        assert_eq!(config.retry.min_delay_ms, 10);
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
storage:
  type: sqlite
  path: /tmp/test.db

retry:
  min_delay_ms: 5
  max_delay_ms: 500
  max_attempts: 3
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.storage.path, "/tmp/test.db");
        assert_eq!(config.retry.min_delay_ms, 5);
        assert_eq!(config.retry.max_delay_ms, 500);
        assert_eq!(config.retry.max_attempts, 3);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = r#"
storage:
  path: /tmp/other.db
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.storage.storage_type, "sqlite");
        assert_eq!(config.storage.path, "/tmp/other.db");
        assert_eq!(config.retry.max_attempts, 10);
    }
}
