// src/utils/errors.rs
//! Error types for the telemetry pipeline
//!
//! Queue operations never fail. Errors only come out of configuration,
//! durable storage and payload serialization. Upload failures stay inside
//! the coordinator and are reported as a `FlushOutcome`.

use thiserror::Error;

/// Crate-wide error type
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Storage failed: {0}")]
    StorageFailed(String),

    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<config::ConfigError> for RelayError {
    fn from(err: config::ConfigError) -> Self {
        RelayError::ConfigError(err.to_string())
    }
}

impl From<rusqlite::Error> for RelayError {
    fn from(err: rusqlite::Error) -> Self {
        RelayError::StorageFailed(err.to_string())
    }
}

impl From<serde_json::Error> for RelayError {
    fn from(err: serde_json::Error) -> Self {
        RelayError::SerializationFailed(err.to_string())
    }
}

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, RelayError>;
