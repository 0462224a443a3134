// src/events/event.rs
//! Telemetry events
//!
//! An `Event` is immutable once built. Its `EventId` is only used to match
//! batch members against resident events on removal, never for ordering.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;
use ulid::Ulid;

/// Stable event identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(Ulid);

impl EventId {
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A single position fix
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,

    /// Meters above sea level
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,

    /// Radius of uncertainty in meters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub horizontal_accuracy: Option<f64>,

    /// Meters per second
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,

    /// Degrees relative to due north
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course: Option<f64>,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            altitude: None,
            horizontal_accuracy: None,
            speed: None,
            course: None,
        }
    }

    pub fn with_accuracy(mut self, meters: f64) -> Self {
        self.horizontal_accuracy = Some(meters);
        self
    }
}

/// A monitored beacon region
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeaconRegion {
    pub identifier: String,
    pub uuid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub major: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minor: Option<u16>,
}

/// Server-side configuration attached to a known beacon
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeaconConfiguration {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A monitored circular region (geofence)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircularRegion {
    pub identifier: String,
    pub latitude: f64,
    pub longitude: f64,

    /// Meters
    pub radius: f64,
}

/// A known place associated with a region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// What happened, with the payload each occurrence carries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    ApplicationOpen,
    DeviceUpdate,
    LocationUpdate {
        coordinate: Coordinate,
    },
    EnterBeaconRegion {
        region: BeaconRegion,
        #[serde(default)]
        config: Option<BeaconConfiguration>,
        #[serde(default)]
        place: Option<Place>,
    },
    ExitBeaconRegion {
        region: BeaconRegion,
        #[serde(default)]
        config: Option<BeaconConfiguration>,
        #[serde(default)]
        place: Option<Place>,
    },
    EnterGeofence {
        region: CircularRegion,
        #[serde(default)]
        place: Option<Place>,
    },
    ExitGeofence {
        region: CircularRegion,
        #[serde(default)]
        place: Option<Place>,
    },
    MessageOpened {
        message_id: String,
        source: String,
    },
}

impl EventKind {
    /// Wire name of the occurrence
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::ApplicationOpen => "app-open",
            EventKind::DeviceUpdate => "device-update",
            EventKind::LocationUpdate { .. } => "location-update",
            EventKind::EnterBeaconRegion { .. } => "beacon-region-enter",
            EventKind::ExitBeaconRegion { .. } => "beacon-region-exit",
            EventKind::EnterGeofence { .. } => "geofence-enter",
            EventKind::ExitGeofence { .. } => "geofence-exit",
            EventKind::MessageOpened { .. } => "message-open",
        }
    }

    /// Variant payload as a JSON object
    pub fn properties(&self) -> Map<String, Value> {
        let value = match self {
            EventKind::ApplicationOpen | EventKind::DeviceUpdate => return Map::new(),
            EventKind::LocationUpdate { coordinate } => json!({ "location": coordinate }),
            EventKind::EnterBeaconRegion {
                region,
                config,
                place,
            }
            | EventKind::ExitBeaconRegion {
                region,
                config,
                place,
            } => json!({ "region": region, "config": config, "place": place }),
            EventKind::EnterGeofence { region, place }
            | EventKind::ExitGeofence { region, place } => {
                json!({ "region": region, "place": place })
            }
            EventKind::MessageOpened { message_id, source } => {
                json!({ "identifier": message_id, "source": source })
            }
        };

        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }
}

/// One recorded occurrence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    id: EventId,
    timestamp: DateTime<Utc>,
    kind: EventKind,
}

impl Event {
    /// Create an event stamped with the current time
    pub fn new(kind: EventKind) -> Self {
        Self::at(kind, Utc::now())
    }

    /// Create an event with an explicit creation time
    pub fn at(kind: EventKind, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: EventId::new(),
            timestamp,
            kind,
        }
    }

    pub fn application_open() -> Self {
        Self::new(EventKind::ApplicationOpen)
    }

    pub fn device_update() -> Self {
        Self::new(EventKind::DeviceUpdate)
    }

    pub fn location_update(coordinate: Coordinate) -> Self {
        Self::new(EventKind::LocationUpdate { coordinate })
    }

    pub fn message_opened(message_id: impl Into<String>, source: impl Into<String>) -> Self {
        Self::new(EventKind::MessageOpened {
            message_id: message_id.into(),
            source: source.into(),
        })
    }

    pub fn id(&self) -> EventId {
        self.id
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn kind(&self) -> &EventKind {
        &self.kind
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn properties(&self) -> Map<String, Value> {
        self.kind.properties()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region() -> CircularRegion {
        CircularRegion {
            identifier: "store-42".to_string(),
            latitude: 43.65,
            longitude: -79.38,
            radius: 100.0,
        }
    }

    #[test]
    fn test_ids_are_unique() {
        let a = Event::application_open();
        let b = Event::application_open();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_clone_keeps_identity() {
        let event = Event::device_update();
        let copy = event.clone();
        assert_eq!(event.id(), copy.id());
        assert_eq!(event.timestamp(), copy.timestamp());
    }

    #[test]
    fn test_lifecycle_events_have_no_properties() {
        assert!(Event::application_open().properties().is_empty());
        assert!(Event::device_update().properties().is_empty());
    }

    #[test]
    fn test_message_properties() {
        let event = Event::message_opened("msg_1", "notification");
        let props = event.properties();
        assert_eq!(event.name(), "message-open");
        assert_eq!(props["identifier"], "msg_1");
        assert_eq!(props["source"], "notification");
    }

    #[test]
    fn test_geofence_properties() {
        let event = Event::new(EventKind::EnterGeofence {
            region: region(),
            place: None,
        });
        let props = event.properties();
        assert_eq!(event.name(), "geofence-enter");
        assert_eq!(props["region"]["identifier"], "store-42");
        assert!(props["place"].is_null());
    }

    #[test]
    fn test_location_properties() {
        let event = Event::location_update(Coordinate::new(1.5, 2.5).with_accuracy(10.0));
        let props = event.properties();
        assert_eq!(props["location"]["latitude"], 1.5);
        assert_eq!(props["location"]["horizontal_accuracy"], 10.0);
        assert!(props["location"].get("altitude").is_none());
    }

    #[test]
    fn test_kind_deserializes_from_tagged_json() {
        let kind: EventKind = serde_json::from_str(
            r#"{"type":"message_opened","message_id":"m","source":"inbox"}"#,
        )
        .unwrap();
        assert_eq!(kind.name(), "message-open");

        let kind: EventKind = serde_json::from_str(
            r#"{"type":"exit_geofence","region":{"identifier":"r","latitude":0.0,"longitude":0.0,"radius":5.0}}"#,
        )
        .unwrap();
        assert!(matches!(kind, EventKind::ExitGeofence { place: None, .. }));
    }
}
