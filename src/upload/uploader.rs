// src/upload/uploader.rs
//! Uploader collaborator
//!
//! The coordinator hands each non-empty batch to an `Uploader` exactly once
//! and waits for a definite outcome. Timeouts and retry backoff belong to the
//! implementation.

use crate::recording::payload::UploadPayload;
use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

/// Why an upload did not succeed
#[derive(Debug, Clone, Error)]
pub enum UploadError {
    #[error("network error: {0}")]
    Network(String),

    #[error("rejected by server ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("upload timed out")]
    Timeout,

    #[error("payload serialization failed: {0}")]
    Serialization(String),
}

/// Delivers batches to the backend
#[async_trait]
pub trait Uploader: Send + Sync {
    async fn upload(&self, payload: &UploadPayload) -> Result<(), UploadError>;
}

/// Writes each payload as a log record and reports success
#[derive(Debug, Clone, Default)]
pub struct LoggingUploader;

#[async_trait]
impl Uploader for LoggingUploader {
    async fn upload(&self, payload: &UploadPayload) -> Result<(), UploadError> {
        let body = payload
            .to_json()
            .map_err(|e| UploadError::Serialization(e.to_string()))?;

        info!(count = payload.events.len(), payload = %body, "uploaded batch");
        Ok(())
    }
}
