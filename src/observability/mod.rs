// src/observability/mod.rs
//! Logging and metrics setup
//!
//! `RUST_LOG` overrides the configured level. Log lines go to stderr so the
//! relay's stdout stays free for piping.

use crate::utils::config::ObservabilityConfig;
use crate::utils::errors::{RelayError, Result};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global tracing subscriber
pub fn init_tracing(config: &ObservabilityConfig) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let registry = tracing_subscriber::registry().with(env_filter);

    let result = if config.json_logs {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };

    result.map_err(|e| RelayError::ConfigError(format!("Failed to install tracing: {}", e)))
}

/// Install the Prometheus exporter when an address is configured.
///
/// Without one, metric macros stay no-ops. Must run inside a Tokio runtime.
pub fn init_metrics(addr: Option<SocketAddr>) -> Result<()> {
    let Some(addr) = addr else {
        return Ok(());
    };

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| RelayError::ConfigError(format!("Failed to install metrics exporter: {}", e)))?;

    info!("Prometheus metrics listening on {}", addr);
    Ok(())
}
