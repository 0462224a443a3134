// src/recording/storage.rs
//! Durable snapshot of resident events
//!
//! Optional. The queue lives in memory; the relay saves whatever is still
//! resident on shutdown and restores it on the next start. Each save replaces
//! the previous snapshot atomically.

use crate::events::Event;
use crate::utils::errors::{RelayError, Result};
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// SQLite-backed event snapshot
pub struct EventStore {
    path: PathBuf,
    db: Arc<Mutex<Connection>>,
}

impl EventStore {
    /// Open (or create) the store at `path`
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(|e| {
                RelayError::StorageFailed(format!("Failed to create directory: {}", e))
            })?;
        }

        let conn = Connection::open(&path).map_err(|e| {
            RelayError::StorageFailed(format!("Failed to open database: {}", e))
        })?;

        let store = Self {
            path,
            db: Arc::new(Mutex::new(conn)),
        };

        store.init_schema().await?;

        info!("Event store opened at {:?}", store.path);

        Ok(store)
    }

    async fn init_schema(&self) -> Result<()> {
        let db = self.db.lock().await;

        db.execute(
            r#"
            CREATE TABLE IF NOT EXISTS resident_events (
                position INTEGER PRIMARY KEY,
                event_id TEXT NOT NULL,
                payload TEXT NOT NULL,
                saved_at INTEGER NOT NULL
            )
            "#,
            [],
        )
        .map_err(|e| RelayError::StorageFailed(format!("Schema creation failed: {}", e)))?;

        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the stored snapshot with `events`, keeping their order
    pub async fn save(&self, events: &[Event]) -> Result<()> {
        let mut db = self.db.lock().await;
        let saved_at = chrono::Utc::now().timestamp();

        let tx = db.transaction()?;
        tx.execute("DELETE FROM resident_events", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO resident_events (position, event_id, payload, saved_at) VALUES (?, ?, ?, ?)",
            )?;

            for (position, event) in events.iter().enumerate() {
                let payload = serde_json::to_string(event)?;
                stmt.execute(params![
                    position as i64,
                    event.id().to_string(),
                    payload,
                    saved_at
                ])?;
            }
        }
        tx.commit()?;

        debug!("Saved {} events to {:?}", events.len(), self.path);
        Ok(())
    }

    /// Load the stored snapshot in arrival order.
    ///
    /// Rows that no longer decode are skipped.
    pub async fn load(&self) -> Result<Vec<Event>> {
        let db = self.db.lock().await;

        let mut stmt = db
            .prepare("SELECT event_id, payload FROM resident_events ORDER BY position")
            .map_err(|e| RelayError::StorageFailed(format!("Query preparation failed: {}", e)))?;

        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))
            .map_err(|e| RelayError::StorageFailed(format!("Query execution failed: {}", e)))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| RelayError::StorageFailed(format!("Result collection failed: {}", e)))?;

        let mut events = Vec::with_capacity(rows.len());
        for (event_id, payload) in rows {
            match serde_json::from_str::<Event>(&payload) {
                Ok(event) => events.push(event),
                Err(e) => warn!("Skipping undecodable stored event {}: {}", event_id, e),
            }
        }

        Ok(events)
    }

    /// Number of stored events
    pub async fn count(&self) -> Result<usize> {
        let db = self.db.lock().await;

        let count: i64 = db
            .query_row("SELECT COUNT(*) FROM resident_events", [], |row| row.get(0))
            .map_err(|e| RelayError::StorageFailed(format!("Count failed: {}", e)))?;

        Ok(count as usize)
    }
}
