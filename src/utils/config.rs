// src/utils/config.rs
//! Relay configuration
//!
//! Layered with the `config` crate: built-in defaults, then an optional file
//! (path from `LOCUS_CONFIG`), then `LOCUS__<SECTION>__<KEY>` environment
//! variables.

use crate::recording::coordinator::FlushSettings;
use crate::utils::errors::{RelayError, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

const CONFIG_PATH_VAR: &str = "LOCUS_CONFIG";

/// Top-level relay configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub queue: QueueConfig,
    pub flush: FlushConfig,
    pub storage: StorageConfig,
    pub observability: ObservabilityConfig,
}

/// Queue bounds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Hard upper bound on resident events
    pub max_queue_size: usize,

    /// Hard upper bound on events per upload batch
    pub max_batch_size: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_queue_size: 1000,
            max_batch_size: 100,
        }
    }
}

/// Flush triggering policy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FlushConfig {
    /// Resident count that triggers a flush right after an add
    pub flush_at: usize,

    /// Period of the flush timer (seconds)
    pub flush_interval_secs: u64,

    /// Smallest batch worth uploading
    pub min_batch_size: usize,
}

impl Default for FlushConfig {
    fn default() -> Self {
        Self {
            flush_at: 20,
            flush_interval_secs: 30,
            min_batch_size: 1,
        }
    }
}

/// Durable snapshot of resident events
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite database path. No persistence when unset.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default filter directive, overridden by `RUST_LOG`
    pub log_level: String,

    /// Emit JSON log lines instead of human-readable output
    pub json_logs: bool,

    /// Prometheus listener address. No exporter when unset.
    pub metrics_addr: Option<SocketAddr>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_addr: None,
        }
    }
}

impl RelayConfig {
    /// Load configuration from `LOCUS_CONFIG` (if set) and the environment
    pub fn load() -> Result<Self> {
        let path = std::env::var_os(CONFIG_PATH_VAR).map(PathBuf::from);
        Self::from_sources(path.as_deref())
    }

    /// Load configuration from an optional file plus the environment
    pub fn from_sources(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }

        let config: RelayConfig = builder
            .add_source(
                Environment::with_prefix("LOCUS")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Check that every bound and interval is positive
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("queue.max_queue_size", self.queue.max_queue_size as u64),
            ("queue.max_batch_size", self.queue.max_batch_size as u64),
            ("flush.flush_at", self.flush.flush_at as u64),
            ("flush.flush_interval_secs", self.flush.flush_interval_secs),
            ("flush.min_batch_size", self.flush.min_batch_size as u64),
        ];

        for (name, value) in positive {
            if value == 0 {
                return Err(RelayError::ConfigError(format!("{} must be positive", name)));
            }
        }

        if self.queue.max_batch_size > self.queue.max_queue_size {
            warn!(
                max_batch_size = self.queue.max_batch_size,
                max_queue_size = self.queue.max_queue_size,
                "max_batch_size exceeds max_queue_size; batches are capped by queue content"
            );
        }

        Ok(())
    }

    /// Immutable settings handed to the upload coordinator
    pub fn flush_settings(&self) -> FlushSettings {
        FlushSettings {
            max_queue_size: self.queue.max_queue_size,
            max_batch_size: self.queue.max_batch_size,
            flush_at: self.flush.flush_at,
            flush_interval: Duration::from_secs(self.flush.flush_interval_secs),
            min_batch_size: self.flush.min_batch_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = RelayConfig::default();
        assert_eq!(config.queue.max_queue_size, 1000);
        assert_eq!(config.queue.max_batch_size, 100);
        assert_eq!(config.flush.flush_at, 20);
        assert_eq!(config.flush.flush_interval_secs, 30);
        assert!(config.storage.path.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_values_rejected() {
        let mut config = RelayConfig::default();
        config.flush.flush_at = 0;
        assert!(matches!(config.validate(), Err(RelayError::ConfigError(_))));

        let mut config = RelayConfig::default();
        config.queue.max_queue_size = 0;
        assert!(config.validate().is_err());

        let mut config = RelayConfig::default();
        config.flush.flush_interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_batch_larger_than_queue_allowed() {
        let mut config = RelayConfig::default();
        config.queue.max_queue_size = 10;
        config.queue.max_batch_size = 50;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[queue]
max_queue_size = 333
max_batch_size = 33

[flush]
flush_at = 3
flush_interval_secs = 4
"#
        )
        .unwrap();

        let config = RelayConfig::from_sources(Some(file.path())).unwrap();
        assert_eq!(config.queue.max_queue_size, 333);
        assert_eq!(config.queue.max_batch_size, 33);
        assert_eq!(config.flush.flush_at, 3);
        assert_eq!(config.flush.min_batch_size, 1);

        let settings = config.flush_settings();
        assert_eq!(settings.flush_interval, Duration::from_secs(4));
        assert_eq!(settings.max_batch_size, 33);
    }

    #[test]
    fn test_invalid_file_rejected() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[flush]\nflush_at = 0").unwrap();

        let result = RelayConfig::from_sources(Some(file.path()));
        assert!(matches!(result, Err(RelayError::ConfigError(_))));
    }
}
