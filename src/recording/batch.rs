// src/recording/batch.rs
//! Upload batches
//!
//! A batch is an independent copy of the oldest resident events. Evicting or
//! removing events from the queue after the batch was taken leaves the batch
//! untouched, and removing a batch only needs the ids it carries.

use crate::events::{Event, EventId};
use std::collections::HashSet;

/// Ordered, capped, read-only run of events taken from the queue front
#[derive(Debug, Clone, Default)]
pub struct EventBatch {
    events: Vec<Event>,
    ids: HashSet<EventId>,
}

impl EventBatch {
    /// The "nothing to upload" batch
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn from_events(events: Vec<Event>) -> Self {
        let ids = events.iter().map(Event::id).collect();
        Self { events, ids }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Membership test by identity
    pub fn contains(&self, id: &EventId) -> bool {
        self.ids.contains(id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Event> {
        self.events.iter()
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Member ids in batch order
    pub fn ids(&self) -> Vec<EventId> {
        self.events.iter().map(Event::id).collect()
    }

    pub fn first(&self) -> Option<&Event> {
        self.events.first()
    }

    pub fn last(&self) -> Option<&Event> {
        self.events.last()
    }

    pub fn to_vec(&self) -> Vec<Event> {
        self.events.clone()
    }
}

impl<'a> IntoIterator for &'a EventBatch {
    type Item = &'a Event;
    type IntoIter = std::slice::Iter<'a, Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_batch() {
        let batch = EventBatch::empty();
        assert!(batch.is_empty());
        assert_eq!(batch.len(), 0);
        assert!(batch.first().is_none());
    }

    #[test]
    fn test_contains_by_identity() {
        let a = Event::application_open();
        let b = Event::application_open();
        let batch = EventBatch::from_events(vec![a.clone()]);

        assert!(batch.contains(&a.id()));
        // Same content, different identity
        assert!(!batch.contains(&b.id()));
    }

    #[test]
    fn test_order_preserved() {
        let events: Vec<Event> = (0..4).map(|_| Event::device_update()).collect();
        let expected: Vec<EventId> = events.iter().map(Event::id).collect();
        let batch = EventBatch::from_events(events);

        assert_eq!(batch.ids(), expected);
        assert_eq!(batch.first().map(Event::id), expected.first().copied());
        assert_eq!(batch.last().map(Event::id), expected.last().copied());
        assert_eq!((&batch).into_iter().count(), 4);
    }
}
