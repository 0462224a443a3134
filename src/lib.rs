// src/lib.rs
//! Locus Telemetry Library
//!
//! On-device buffering and batch upload of application telemetry events
//! such as location updates, geofence and beacon transitions, message opens
//! and lifecycle events.
//!
//! # Architecture
//!
//! The library is structured into several key modules:
//!
//! - **events**: typed event records and observer capabilities
//! - **recording**: bounded queue, batches, flush coordination, snapshots
//! - **upload**: uploader collaborator and payload context providers
//! - **observability**: tracing and metrics setup
//! - **utils**: configuration and error types

// Public module exports
pub mod events;
pub mod observability;
pub mod recording;
pub mod upload;
pub mod utils;

// Re-export commonly used types
pub use events::{Event, EventId, EventKind, EventObserver};
pub use recording::{EventBatch, EventQueue, FlushOutcome, FlushSettings, UploadCoordinator};
pub use upload::{ContextProvider, ContextRegistry, UploadError, Uploader};
pub use utils::config::RelayConfig;
pub use utils::errors::{RelayError, Result};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
