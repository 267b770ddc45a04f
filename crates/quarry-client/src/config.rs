//! Client configuration
//!
//! Loads from a YAML file with environment variable overrides; a `.env`
//! file is read first when present. Environment variables always win over
//! file values.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::retry::RetryPolicy;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Query execution settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Page size requested from the service; None lets the service decide.
    #[serde(default)]
    pub max_results: Option<u64>,

    /// Render decoded timestamps in the local offset.
    #[serde(default)]
    pub local_timestamps: bool,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self { max_results: None, local_timestamps: false }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error) or module-specific
    pub level: String,

    /// Output format: pretty, json, compact
    pub format: String,

    /// Output destination: stdout, file, both
    pub output: String,

    /// Directory for log files
    pub directory: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            output: "stdout".to_string(),
            directory: "./logs".to_string(),
        }
    }
}

/// Main client configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub retry: RetryPolicy,

    #[serde(default)]
    pub query: QueryConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ClientConfig {
    /// Load configuration from YAML file with environment variable overrides
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let contents = std::fs::read_to_string(path)?;
        let mut config: ClientConfig = serde_yaml::from_str(&contents)?;

        if let Ok(attempts) = std::env::var("QUARRY_RETRY_ATTEMPTS") {
            if let Ok(n) = attempts.parse() {
                config.retry.attempts = n;
            }
        }
        if let Ok(delay) = std::env::var("QUARRY_RETRY_DELAY_MS") {
            if let Ok(ms) = delay.parse() {
                config.retry.delay_ms = ms;
            }
        }
        if let Ok(max) = std::env::var("QUARRY_MAX_RESULTS") {
            if let Ok(n) = max.parse() {
                config.query.max_results = Some(n);
            }
        }

        if let Ok(level) = std::env::var("RUST_LOG") {
            config.logging.level = level;
        }
        if let Ok(format) = std::env::var("LOG_FORMAT") {
            config.logging.format = format;
        }
        if let Ok(output) = std::env::var("LOG_OUTPUT") {
            config.logging.output = output;
        }
        if let Ok(dir) = std::env::var("LOG_DIR") {
            config.logging.directory = dir;
        }

        Ok(config)
    }

    /// Set logging environment variables for the logging module
    pub fn apply_logging_env(&self) {
        std::env::set_var("RUST_LOG", &self.logging.level);
        std::env::set_var("LOG_FORMAT", &self.logging.format);
        std::env::set_var("LOG_OUTPUT", &self.logging.output);
        std::env::set_var("LOG_DIR", &self.logging.directory);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.retry.attempts, 5);
        assert_eq!(config.retry.delay_ms, 1000);
        assert_eq!(config.query.max_results, None);
        assert!(!config.query.local_timestamps);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_env_var_override() {
        std::env::set_var("QUARRY_RETRY_ATTEMPTS", "50");
        std::env::set_var("QUARRY_RETRY_DELAY_MS", "10000");

        let config_yaml = r#"
retry:
  attempts: 3
  delay_ms: 500
query:
  max_results: 1000
logging:
  level: "info"
  format: "pretty"
  output: "stdout"
  directory: "./logs"
"#;
        let temp_file = std::env::temp_dir().join("quarry_client_test_config.yaml");
        std::fs::write(&temp_file, config_yaml).unwrap();

        let config = ClientConfig::load(&temp_file).unwrap();
        assert_eq!(config.retry.attempts, 50);
        assert_eq!(config.retry.delay_ms, 10000);
        assert_eq!(config.query.max_results, Some(1000));

        std::env::remove_var("QUARRY_RETRY_ATTEMPTS");
        std::env::remove_var("QUARRY_RETRY_DELAY_MS");
        std::fs::remove_file(temp_file).ok();
    }
}
