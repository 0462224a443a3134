// src/recording/payload.rs
//! Upload payload
//!
//! The wire document sent for one batch:
//!
//! ```json
//! {
//!   "context": { "sdk_version": "0.1.0", ... },
//!   "events": [
//!     { "id": "01H...", "name": "geofence-enter",
//!       "timestamp": "2024-01-01T00:00:00+00:00", "properties": { ... } }
//!   ]
//! }
//! ```

use crate::events::{Event, EventId};
use crate::recording::batch::EventBatch;
use crate::upload::context::Context;
use crate::utils::errors::{RelayError, Result};
use chrono::SecondsFormat;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

/// One event as it appears on the wire
#[derive(Debug, Clone, Serialize)]
pub struct EventPayload {
    pub id: EventId,
    pub name: &'static str,
    pub timestamp: String,
    pub properties: Map<String, Value>,
}

impl From<&Event> for EventPayload {
    fn from(event: &Event) -> Self {
        Self {
            id: event.id(),
            name: event.name(),
            timestamp: event.timestamp().to_rfc3339_opts(SecondsFormat::Millis, false),
            properties: event.properties(),
        }
    }
}

/// A batch plus the context captured at dispatch time
#[derive(Debug, Clone, Serialize)]
pub struct UploadPayload {
    pub context: Context,
    pub events: Vec<EventPayload>,
}

impl UploadPayload {
    pub fn new(batch: &EventBatch, context: Context) -> Self {
        debug!(count = batch.len(), "building upload payload");

        Self {
            context,
            events: batch.iter().map(EventPayload::from).collect(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| {
            RelayError::SerializationFailed(format!("payload serialization error: {}", e))
        })
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| {
            RelayError::SerializationFailed(format!("payload serialization error: {}", e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{CircularRegion, EventKind, Place};
    use crate::recording::event_queue::EventQueue;
    use chrono::{TimeZone, Utc};

    fn geofence_event() -> Event {
        Event::at(
            EventKind::ExitGeofence {
                region: CircularRegion {
                    identifier: "hq".to_string(),
                    latitude: 43.0,
                    longitude: -79.0,
                    radius: 25.0,
                },
                place: Some(Place {
                    id: "place_1".to_string(),
                    name: "HQ".to_string(),
                    tags: vec!["office".to_string()],
                }),
            },
            Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap(),
        )
    }

    #[test]
    fn test_payload_shape() {
        let mut queue = EventQueue::new(10, 10);
        let event = geofence_event();
        queue.add(event.clone());
        queue.add(Event::application_open());

        let mut context = Context::new();
        context.insert("app".to_string(), Value::from("demo"));

        let payload = UploadPayload::new(&queue.next_batch(1), context);
        let json: Value = serde_json::from_str(&payload.to_json().unwrap()).unwrap();

        assert_eq!(json["context"]["app"], "demo");
        assert_eq!(json["events"].as_array().unwrap().len(), 2);
        assert_eq!(json["events"][0]["id"], event.id().to_string());
        assert_eq!(json["events"][0]["name"], "geofence-exit");
        assert_eq!(json["events"][0]["timestamp"], "2024-03-01T12:30:00.000+00:00");
        assert_eq!(json["events"][0]["properties"]["place"]["id"], "place_1");
        assert_eq!(json["events"][1]["name"], "app-open");
        assert!(json["events"][1]["properties"].as_object().unwrap().is_empty());
    }

    #[test]
    fn test_pretty_json() {
        let payload = UploadPayload::new(&EventBatch::empty(), Context::new());
        let json = payload.to_json_pretty().unwrap();
        assert!(json.contains("\"events\": []"));
    }
}
