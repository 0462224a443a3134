// src/recording/event_queue.rs
//! Bounded FIFO event queue
//!
//! Holds at most `capacity` events in arrival order. Adding to a full queue
//! evicts the single oldest event first. Batches are read from the front
//! without removing anything; only `remove` deletes events, by identity.
//!
//! The queue itself is not synchronized. The upload coordinator owns it
//! behind a mutex.

use crate::events::Event;
use crate::recording::batch::EventBatch;
use std::collections::VecDeque;
use tracing::trace;

/// Bounded event queue
#[derive(Debug)]
pub struct EventQueue {
    /// Resident events, oldest first
    events: VecDeque<Event>,

    /// Maximum resident events
    capacity: usize,

    /// Maximum events per batch
    max_batch_size: usize,

    /// Events accepted by `add`
    added_count: u64,

    /// Events dropped because the queue was full
    evicted_count: u64,

    /// Events deleted by `remove`
    removed_count: u64,
}

impl EventQueue {
    /// Create a new event queue. Both bounds are raised to at least one.
    pub fn new(capacity: usize, max_batch_size: usize) -> Self {
        let capacity = capacity.max(1);

        Self {
            events: VecDeque::with_capacity(capacity.min(4096)),
            capacity,
            max_batch_size: max_batch_size.max(1),
            added_count: 0,
            evicted_count: 0,
            removed_count: 0,
        }
    }

    /// Append an event, evicting the oldest one if the queue is full.
    ///
    /// Returns the evicted event, if any.
    pub fn add(&mut self, event: Event) -> Option<Event> {
        let evicted = if self.events.len() >= self.capacity {
            self.evicted_count += 1;
            self.events.pop_front()
        } else {
            None
        };

        trace!(event_id = %event.id(), name = event.name(), "queued event");

        self.events.push_back(event);
        self.added_count += 1;
        evicted
    }

    /// Oldest `min(len, max_batch_size)` events, or an empty batch when fewer
    /// than `min_size` events are resident.
    pub fn next_batch(&self, min_size: usize) -> EventBatch {
        if self.events.is_empty() || self.events.len() < min_size {
            return EventBatch::empty();
        }

        let events = self
            .events
            .iter()
            .take(self.max_batch_size)
            .cloned()
            .collect();

        EventBatch::from_events(events)
    }

    /// Delete every resident event whose id is in `batch`.
    ///
    /// Ids that are no longer resident are ignored. Returns how many events
    /// were deleted.
    pub fn remove(&mut self, batch: &EventBatch) -> usize {
        if batch.is_empty() {
            return 0;
        }

        let before = self.events.len();
        self.events.retain(|event| !batch.contains(&event.id()));

        let removed = before - self.events.len();
        self.removed_count += removed as u64;
        removed
    }

    /// Current resident event count
    pub fn count(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }

    /// Resident events, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &Event> {
        self.events.iter()
    }

    /// Copy of every resident event, oldest first
    pub fn snapshot(&self) -> Vec<Event> {
        self.events.iter().cloned().collect()
    }

    /// Get queue statistics
    pub fn stats(&self) -> QueueStats {
        QueueStats {
            added_count: self.added_count,
            evicted_count: self.evicted_count,
            removed_count: self.removed_count,
            current_size: self.events.len(),
            capacity: self.capacity,
        }
    }
}

/// Queue statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueStats {
    /// Total events added
    pub added_count: u64,

    /// Total events evicted (queue full)
    pub evicted_count: u64,

    /// Total events removed after upload
    pub removed_count: u64,

    /// Current queue size
    pub current_size: usize,

    /// Queue capacity
    pub capacity: usize,
}

impl QueueStats {
    /// Calculate fill percentage
    pub fn fill_percentage(&self) -> f64 {
        (self.current_size as f64 / self.capacity as f64) * 100.0
    }

    /// Calculate eviction rate
    pub fn eviction_rate(&self) -> f64 {
        if self.added_count == 0 {
            0.0
        } else {
            (self.evicted_count as f64 / self.added_count as f64) * 100.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventId;

    fn ids(queue: &EventQueue) -> Vec<EventId> {
        queue.iter().map(Event::id).collect()
    }

    #[test]
    fn test_queue_creation() {
        let queue = EventQueue::new(100, 10);
        assert_eq!(queue.capacity(), 100);
        assert_eq!(queue.max_batch_size(), 10);
        assert_eq!(queue.count(), 0);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_add_until_full() {
        let mut queue = EventQueue::new(3, 3);

        for _ in 0..3 {
            assert!(queue.add(Event::device_update()).is_none());
        }
        assert_eq!(queue.count(), 3);
    }

    #[test]
    fn test_overflow_evicts_oldest() {
        let mut queue = EventQueue::new(3, 5);
        let events: Vec<Event> = (0..4).map(|_| Event::application_open()).collect();

        for event in &events[..3] {
            queue.add(event.clone());
        }
        let evicted = queue.add(events[3].clone());

        assert_eq!(evicted.map(|e| e.id()), Some(events[0].id()));
        assert_eq!(queue.count(), 3);
        assert_eq!(
            ids(&queue),
            vec![events[1].id(), events[2].id(), events[3].id()]
        );

        let batch = queue.next_batch(1);
        assert_eq!(batch.ids(), ids(&queue));

        queue.remove(&batch);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_next_batch_threshold() {
        let mut queue = EventQueue::new(10, 5);
        assert!(queue.next_batch(0).is_empty());
        assert!(queue.next_batch(1).is_empty());

        queue.add(Event::device_update());
        queue.add(Event::device_update());

        assert!(queue.next_batch(3).is_empty());
        assert_eq!(queue.next_batch(2).len(), 2);
        assert_eq!(queue.next_batch(0).len(), 2);
    }

    #[test]
    fn test_next_batch_capped() {
        let mut queue = EventQueue::new(10, 5);
        for _ in 0..7 {
            queue.add(Event::device_update());
        }

        let batch = queue.next_batch(1);
        assert_eq!(batch.len(), 5);
        assert_eq!(batch.ids(), ids(&queue)[..5].to_vec());
    }

    #[test]
    fn test_next_batch_is_read_only() {
        let mut queue = EventQueue::new(10, 4);
        for _ in 0..6 {
            queue.add(Event::device_update());
        }

        let first = queue.next_batch(1);
        let second = queue.next_batch(1);

        assert_eq!(first.ids(), second.ids());
        assert_eq!(queue.count(), 6);
    }

    #[test]
    fn test_flaky_upload_scenario() {
        let mut queue = EventQueue::new(10, 5);
        for _ in 0..7 {
            queue.add(Event::device_update());
        }

        // Upload failed: nothing removed
        let _failed = queue.next_batch(1);
        assert_eq!(queue.count(), 7);

        // Retry succeeds
        let batch = queue.next_batch(1);
        queue.remove(&batch);
        assert_eq!(queue.count(), 2);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut queue = EventQueue::new(10, 3);
        for _ in 0..5 {
            queue.add(Event::device_update());
        }

        let batch = queue.next_batch(1);
        assert_eq!(queue.remove(&batch), 3);
        let remaining = ids(&queue);

        assert_eq!(queue.remove(&batch), 0);
        assert_eq!(ids(&queue), remaining);
    }

    #[test]
    fn test_remove_ignores_evicted_ids() {
        let mut queue = EventQueue::new(3, 3);
        for _ in 0..3 {
            queue.add(Event::device_update());
        }

        let batch = queue.next_batch(1);

        // Two of the batch members get evicted meanwhile
        let late_a = Event::application_open();
        let late_b = Event::application_open();
        queue.add(late_a.clone());
        queue.add(late_b.clone());

        assert_eq!(queue.remove(&batch), 1);
        assert_eq!(ids(&queue), vec![late_a.id(), late_b.id()]);

        // The batch itself was not affected by the evictions
        assert_eq!(batch.len(), 3);
    }

    #[test]
    fn test_remove_preserves_remainder_order() {
        let mut queue = EventQueue::new(10, 2);
        let events: Vec<Event> = (0..5).map(|_| Event::device_update()).collect();
        for event in &events {
            queue.add(event.clone());
        }

        let batch = queue.next_batch(1);
        queue.remove(&batch);

        let expected: Vec<EventId> = events[2..].iter().map(Event::id).collect();
        assert_eq!(ids(&queue), expected);
    }

    #[test]
    fn test_zero_bounds_clamped() {
        let mut queue = EventQueue::new(0, 0);
        queue.add(Event::device_update());
        queue.add(Event::device_update());

        assert_eq!(queue.count(), 1);
        assert_eq!(queue.next_batch(1).len(), 1);
    }

    #[test]
    fn test_stats() {
        let mut queue = EventQueue::new(2, 2);
        for _ in 0..3 {
            queue.add(Event::device_update());
        }
        let batch = queue.next_batch(1);
        queue.remove(&batch);

        let stats = queue.stats();
        assert_eq!(stats.added_count, 3);
        assert_eq!(stats.evicted_count, 1);
        assert_eq!(stats.removed_count, 2);
        assert_eq!(stats.current_size, 0);
        assert_eq!(stats.fill_percentage(), 0.0);
        assert!((stats.eviction_rate() - 100.0 / 3.0).abs() < 1e-9);
    }
}
