// src/recording/coordinator.rs
//! Flush scheduling and upload coordination
//!
//! The coordinator owns the event queue behind a single mutex. A flush takes
//! a batch under the lock, uploads it with the lock released, and re-locks
//! only to remove the batch once the uploader reports success. A failed
//! upload leaves the queue untouched so the same events are retried by the
//! next flush.
//!
//! Flushes are triggered by the interval timer, by the resident count
//! reaching `flush_at` after an add, or by an explicit request. At most one
//! flush runs at a time; a trigger that arrives meanwhile is coalesced.
//!
//! # Architecture
//!
//! ```text
//! Producers → add() → EventQueue (mutex) ──┐
//!                       ▲                  │ next_batch (brief lock)
//!                       │                  ▼
//!              remove on success     UploadPayload + Context
//!                       │                  │
//!                       └──── Uploader ◄───┘  (no lock held)
//! ```

use crate::events::{Event, EventObserver};
use crate::recording::batch::EventBatch;
use crate::recording::event_queue::{EventQueue, QueueStats};
use crate::recording::payload::UploadPayload;
use crate::upload::context::{ContextProvider, ContextRegistry};
use crate::upload::uploader::Uploader;
use metrics::{counter, gauge};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Shortest flush timer period the background loop runs with
pub const MIN_FLUSH_INTERVAL: Duration = Duration::from_millis(1);

/// Immutable coordinator settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlushSettings {
    /// Queue capacity
    pub max_queue_size: usize,

    /// Maximum events per batch
    pub max_batch_size: usize,

    /// Resident count that triggers a flush after an add
    pub flush_at: usize,

    /// Flush timer period
    pub flush_interval: Duration,

    /// Smallest batch worth uploading
    pub min_batch_size: usize,
}

impl Default for FlushSettings {
    fn default() -> Self {
        Self {
            max_queue_size: 1000,
            max_batch_size: 100,
            flush_at: 20,
            flush_interval: Duration::from_secs(30),
            min_batch_size: 1,
        }
    }
}

/// Coordinator state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushState {
    Idle,
    Flushing,
}

/// Result of one flush attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlushOutcome {
    /// Nothing to upload (empty queue or under the minimum batch size)
    Empty,

    /// Batch acknowledged and removed from the queue
    Uploaded { count: usize },

    /// Upload failed; the events stay queued
    Failed { count: usize, reason: String },

    /// Another flush was already running
    InFlight,
}

impl FlushOutcome {
    fn label(&self) -> &'static str {
        match self {
            FlushOutcome::Empty => "empty",
            FlushOutcome::Uploaded { .. } => "uploaded",
            FlushOutcome::Failed { .. } => "failed",
            FlushOutcome::InFlight => "in_flight",
        }
    }
}

/// What started a flush
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlushTrigger {
    Timer,
    Requested,
    Manual,
    Shutdown,
}

/// Coordinator statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoordinatorStats {
    pub flushes_attempted: u64,
    pub batches_uploaded: u64,
    pub events_uploaded: u64,
    pub upload_failures: u64,
    pub skipped_in_flight: u64,
}

/// Resets the in-flight flag when a flush finishes or is abandoned
struct FlushGuard<'a> {
    flushing: &'a AtomicBool,
}

impl<'a> FlushGuard<'a> {
    fn acquire(flushing: &'a AtomicBool) -> Option<Self> {
        flushing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flushing })
    }
}

impl Drop for FlushGuard<'_> {
    fn drop(&mut self) {
        self.flushing.store(false, Ordering::Release);
    }
}

struct Shared {
    settings: FlushSettings,
    queue: Mutex<EventQueue>,
    uploader: Arc<dyn Uploader>,
    contexts: ContextRegistry,
    observers: RwLock<Vec<Arc<dyn EventObserver>>>,
    flushing: AtomicBool,
    flush_notify: Notify,
    cancel: CancellationToken,
    worker: Mutex<Option<JoinHandle<()>>>,
    stats: Mutex<CoordinatorStats>,
}

impl Shared {
    async fn flush(&self, trigger: FlushTrigger) -> FlushOutcome {
        let outcome = self.flush_once(trigger).await;
        counter!("locus_flush_total", "outcome" => outcome.label()).increment(1);
        outcome
    }

    async fn flush_once(&self, trigger: FlushTrigger) -> FlushOutcome {
        let Some(_guard) = FlushGuard::acquire(&self.flushing) else {
            debug!(?trigger, "flush already in flight, coalescing trigger");
            self.stats.lock().skipped_in_flight += 1;
            return FlushOutcome::InFlight;
        };

        self.stats.lock().flushes_attempted += 1;

        let batch = self.queue.lock().next_batch(self.settings.min_batch_size);
        if batch.is_empty() {
            debug!(?trigger, "nothing to flush");
            return FlushOutcome::Empty;
        }

        let count = batch.len();
        debug!(?trigger, count, "flushing batch");

        let payload = UploadPayload::new(&batch, self.contexts.capture());

        match self.uploader.upload(&payload).await {
            Ok(()) => {
                let (removed, remaining) = self.remove(&batch);

                let mut stats = self.stats.lock();
                stats.batches_uploaded += 1;
                stats.events_uploaded += count as u64;
                drop(stats);

                debug!(count, removed, remaining, "batch uploaded");
                FlushOutcome::Uploaded { count }
            }
            Err(e) => {
                self.stats.lock().upload_failures += 1;
                warn!(count, error = %e, "batch upload failed, events kept for retry");
                FlushOutcome::Failed {
                    count,
                    reason: e.to_string(),
                }
            }
        }
    }

    fn remove(&self, batch: &EventBatch) -> (usize, usize) {
        let mut queue = self.queue.lock();
        let removed = queue.remove(batch);
        let remaining = queue.count();
        drop(queue);

        counter!("locus_events_removed_total").increment(removed as u64);
        gauge!("locus_queue_size").set(remaining as f64);
        (removed, remaining)
    }

    async fn run(self: Arc<Self>) {
        let period = self.settings.flush_interval;
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let trigger = tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = interval.tick() => FlushTrigger::Timer,
                _ = self.flush_notify.notified() => FlushTrigger::Requested,
            };

            tokio::select! {
                _ = self.flush(trigger) => {}
                _ = self.cancel.cancelled() => {
                    debug!("abandoning in-flight upload on shutdown");
                    break;
                }
            }
        }

        debug!("flush loop stopped");
    }
}

/// Buffers events and uploads them in batches
///
/// Cloning yields another handle to the same queue.
#[derive(Clone)]
pub struct UploadCoordinator {
    shared: Arc<Shared>,
}

impl UploadCoordinator {
    /// Create a coordinator with the default context providers
    pub fn new(settings: FlushSettings, uploader: Arc<dyn Uploader>) -> Self {
        Self::with_contexts(settings, uploader, ContextRegistry::with_defaults())
    }

    /// Create a coordinator with an explicit context registry
    pub fn with_contexts(
        mut settings: FlushSettings,
        uploader: Arc<dyn Uploader>,
        contexts: ContextRegistry,
    ) -> Self {
        if settings.flush_interval < MIN_FLUSH_INTERVAL {
            warn!(
                flush_interval_ms = settings.flush_interval.as_millis() as u64,
                "flush interval too short, using {:?}", MIN_FLUSH_INTERVAL
            );
            settings.flush_interval = MIN_FLUSH_INTERVAL;
        }

        info!(
            max_queue_size = settings.max_queue_size,
            max_batch_size = settings.max_batch_size,
            flush_at = settings.flush_at,
            flush_interval_secs = settings.flush_interval.as_secs_f64(),
            "initializing upload coordinator"
        );

        let queue = EventQueue::new(settings.max_queue_size, settings.max_batch_size);

        Self {
            shared: Arc::new(Shared {
                settings,
                queue: Mutex::new(queue),
                uploader,
                contexts,
                observers: RwLock::new(Vec::new()),
                flushing: AtomicBool::new(false),
                flush_notify: Notify::new(),
                cancel: CancellationToken::new(),
                worker: Mutex::new(None),
                stats: Mutex::new(CoordinatorStats::default()),
            }),
        }
    }

    pub fn settings(&self) -> &FlushSettings {
        &self.shared.settings
    }

    pub fn contexts(&self) -> &ContextRegistry {
        &self.shared.contexts
    }

    /// Register an extra context provider consulted at upload time
    pub fn register_context_provider(&self, provider: Arc<dyn ContextProvider>) {
        self.shared.contexts.register(provider);
    }

    /// Register an observer notified of region transitions on add
    pub fn add_observer(&self, observer: Arc<dyn EventObserver>) {
        self.shared.observers.write().push(observer);
    }

    /// Enqueue an event.
    ///
    /// Notifies observers and requests a flush once the resident count
    /// reaches `flush_at`. Never blocks on the network.
    pub fn add(&self, event: Event) {
        let observers = self.shared.observers.read().clone();
        for observer in &observers {
            event.notify(observer.as_ref());
        }

        let (count, evicted) = {
            let mut queue = self.shared.queue.lock();
            let evicted = queue.add(event);
            (queue.count(), evicted)
        };

        counter!("locus_events_added_total").increment(1);
        gauge!("locus_queue_size").set(count as f64);

        if let Some(evicted) = evicted {
            counter!("locus_events_evicted_total").increment(1);
            debug!(event_id = %evicted.id(), name = evicted.name(), "queue full, evicted oldest event");
        }

        if count >= self.shared.settings.flush_at {
            self.request_flush();
        }
    }

    /// Ask the background loop to flush as soon as possible
    pub fn request_flush(&self) {
        self.shared.flush_notify.notify_one();
    }

    /// Run one flush attempt now and wait for its outcome
    pub async fn flush(&self) -> FlushOutcome {
        self.shared.flush(FlushTrigger::Manual).await
    }

    /// Spawn the background flush loop
    pub fn start(&self) {
        let mut worker = self.shared.worker.lock();
        if worker.is_some() {
            warn!("upload coordinator already started");
            return;
        }
        if self.shared.cancel.is_cancelled() {
            warn!("upload coordinator already shut down, not restarting flush loop");
            return;
        }

        info!("starting background flush loop");
        let shared = Arc::clone(&self.shared);
        *worker = Some(tokio::spawn(shared.run()));
    }

    /// Stop the flush loop and make a final best-effort flush.
    ///
    /// An upload in flight on the loop is abandoned; its events stay queued
    /// and go out with the final flush.
    pub async fn shutdown(&self) -> FlushOutcome {
        info!("shutting down upload coordinator");
        self.shared.cancel.cancel();

        let handle = self.shared.worker.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!("flush loop terminated abnormally: {}", e);
            }
        }

        let outcome = self.shared.flush(FlushTrigger::Shutdown).await;
        info!(outcome = outcome.label(), remaining = self.count(), "upload coordinator stopped");
        outcome
    }

    pub fn state(&self) -> FlushState {
        if self.shared.flushing.load(Ordering::Acquire) {
            FlushState::Flushing
        } else {
            FlushState::Idle
        }
    }

    /// Current resident event count
    pub fn count(&self) -> usize {
        self.shared.queue.lock().count()
    }

    /// Copy of every resident event, oldest first
    pub fn snapshot(&self) -> Vec<Event> {
        self.shared.queue.lock().snapshot()
    }

    /// Re-enqueue previously persisted events in their original order.
    ///
    /// Capacity still applies; returns the resident count afterwards.
    pub fn restore(&self, events: Vec<Event>) -> usize {
        let restored = events.len();
        let count = {
            let mut queue = self.shared.queue.lock();
            for event in events {
                queue.add(event);
            }
            queue.count()
        };

        gauge!("locus_queue_size").set(count as f64);
        info!(restored, resident = count, "restored persisted events");
        count
    }

    pub fn queue_stats(&self) -> QueueStats {
        self.shared.queue.lock().stats()
    }

    pub fn stats(&self) -> CoordinatorStats {
        self.shared.stats.lock().clone()
    }
}

impl std::fmt::Debug for UploadCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadCoordinator")
            .field("settings", &self.shared.settings)
            .field("state", &self.state())
            .field("count", &self.count())
            .finish()
    }
}
