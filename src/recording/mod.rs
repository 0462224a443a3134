// src/recording/mod.rs
//! Event buffering and batch upload
//!
//! This module provides the queue/batch lifecycle and flush policy:
//!
//! - **Event Queue**: bounded FIFO buffer, evicts oldest on overflow
//! - **Batch**: capped snapshot of the oldest resident events
//! - **Coordinator**: decides when to flush and removes acknowledged batches
//! - **Payload**: JSON document sent to the uploader
//! - **Storage**: optional SQLite snapshot of resident events
//! - **Intake**: newline-delimited JSON records fed into the coordinator
//!
//! # Architecture
//!
//! ```text
//! Producers → add() → EventQueue (capacity N, FIFO eviction)
//!                          │
//!        timer / flush_at / request
//!                          ↓
//!                 next_batch (≤ max_batch_size)
//!                          ↓
//!                 Uploader (lock released)
//!                    ↓            ↓
//!               success        failure
//!            remove(batch)   keep, retry later
//! ```

pub mod batch;
pub mod coordinator;
pub mod event_queue;
pub mod intake;
pub mod payload;
pub mod storage;

// Re-export commonly used types
pub use batch::EventBatch;
pub use coordinator::{CoordinatorStats, FlushOutcome, FlushSettings, FlushState, UploadCoordinator};
pub use event_queue::{EventQueue, QueueStats};
pub use intake::{ingest_lines, IntakeSummary};
pub use payload::{EventPayload, UploadPayload};
pub use storage::EventStore;
