// src/recording/intake.rs
//! Newline-delimited JSON event intake
//!
//! Lines are read as raw bytes. A line that is not valid UTF-8 or not a
//! valid event record is skipped with a warning. A read error ends intake
//! without touching events already queued.

use crate::events::{Event, EventKind};
use crate::recording::coordinator::UploadCoordinator;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, warn};

/// Counts from one intake run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntakeSummary {
    pub accepted: usize,
    pub rejected: usize,
    /// Set when input ended on a read error instead of EOF
    pub read_error: Option<String>,
}

/// Feed every record from `reader` into the coordinator until EOF or a
/// read error
pub async fn ingest_lines<R>(reader: R, coordinator: &UploadCoordinator) -> IntakeSummary
where
    R: AsyncBufRead + Unpin,
{
    let mut summary = IntakeSummary::default();
    let mut lines = reader.split(b'\n');

    loop {
        match lines.next_segment().await {
            Ok(Some(line)) => match ingest_line(coordinator, &line) {
                Some(true) => summary.accepted += 1,
                Some(false) => summary.rejected += 1,
                None => {}
            },
            Ok(None) => break,
            Err(e) => {
                warn!("Stopping intake on read error: {}", e);
                summary.read_error = Some(e.to_string());
                break;
            }
        }
    }

    debug!(
        accepted = summary.accepted,
        rejected = summary.rejected,
        "intake finished"
    );
    summary
}

/// Returns `None` for blank lines, otherwise whether the record was queued
fn ingest_line(coordinator: &UploadCoordinator, line: &[u8]) -> Option<bool> {
    if line.iter().all(u8::is_ascii_whitespace) {
        return None;
    }

    match serde_json::from_slice::<EventKind>(line) {
        Ok(kind) => {
            coordinator.add(Event::new(kind));
            Some(true)
        }
        Err(e) => {
            warn!("Ignoring malformed event: {}", e);
            Some(false)
        }
    }
}
