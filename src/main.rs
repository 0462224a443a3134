// src/main.rs
//! Locus Relay
//!
//! Reads newline-delimited JSON events from stdin, buffers them and uploads
//! them in batches. Residual events are saved to the configured store on
//! exit and restored on the next start.
//!
//! ```text
//! {"type":"application_open"}
//! {"type":"message_opened","message_id":"m1","source":"inbox"}
//! ```

use anyhow::Result;
use locus_telemetry::observability::{init_metrics, init_tracing};
use locus_telemetry::recording::{ingest_lines, EventStore, UploadCoordinator};
use locus_telemetry::upload::LoggingUploader;
use locus_telemetry::utils::config::RelayConfig;
use locus_telemetry::VERSION;
use std::sync::Arc;
use tokio::io::BufReader;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first: it carries the log level
    let config = RelayConfig::load()?;

    init_tracing(&config.observability)?;
    init_metrics(config.observability.metrics_addr)?;

    info!("Starting Locus relay v{}", VERSION);
    info!("Configuration loaded: {:?}", config);

    let store = match &config.storage.path {
        Some(path) => Some(EventStore::open(path).await?),
        None => None,
    };

    let coordinator = UploadCoordinator::new(config.flush_settings(), Arc::new(LoggingUploader));

    if let Some(store) = &store {
        let events = store.load().await?;
        coordinator.restore(events);
    }

    coordinator.start();

    let stdin = BufReader::new(tokio::io::stdin());

    tokio::select! {
        summary = ingest_lines(stdin, &coordinator) => {
            info!(
                "Input closed: {} accepted, {} rejected",
                summary.accepted, summary.rejected
            );
        }
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                warn!("Failed to listen for shutdown signal: {}", e);
            }
            info!("Received shutdown signal, cleaning up...");
        }
    }

    let outcome = coordinator.shutdown().await;
    info!("Final flush: {:?}", outcome);

    if let Some(store) = &store {
        let residual = coordinator.snapshot();
        store.save(&residual).await?;
        info!("Saved {} residual events", residual.len());
    }

    Ok(())
}
