// src/events/mod.rs
//! Event model
//!
//! - **Event**: immutable record of one occurrence with a typed payload
//! - **Observer**: capability traits invoked for region transitions

pub mod event;
pub mod observer;

pub use event::{
    BeaconConfiguration, BeaconRegion, CircularRegion, Coordinate, Event, EventId, EventKind,
    Place,
};
pub use observer::{
    EventObserver, OnEnterBeaconRegion, OnEnterGeofence, OnExitBeaconRegion, OnExitGeofence,
};
