// src/events/observer.rs
//! Observer capabilities
//!
//! An observer advertises which hooks it implements by returning `Some` from
//! the matching capability accessor. Dispatch is an exhaustive match over the
//! event variant; variants without a hook notify nobody.

use crate::events::event::{BeaconConfiguration, Event, EventKind, Place};

pub trait OnEnterBeaconRegion: Send + Sync {
    fn did_enter_beacon_region(&self, config: &BeaconConfiguration, place: &Place);
}

pub trait OnExitBeaconRegion: Send + Sync {
    fn did_exit_beacon_region(&self, config: &BeaconConfiguration, place: &Place);
}

pub trait OnEnterGeofence: Send + Sync {
    fn did_enter_geofence(&self, place: &Place);
}

pub trait OnExitGeofence: Send + Sync {
    fn did_exit_geofence(&self, place: &Place);
}

/// Capability set of an event observer
pub trait EventObserver: Send + Sync {
    fn on_enter_beacon_region(&self) -> Option<&dyn OnEnterBeaconRegion> {
        None
    }

    fn on_exit_beacon_region(&self) -> Option<&dyn OnExitBeaconRegion> {
        None
    }

    fn on_enter_geofence(&self) -> Option<&dyn OnEnterGeofence> {
        None
    }

    fn on_exit_geofence(&self) -> Option<&dyn OnExitGeofence> {
        None
    }
}

impl Event {
    /// Invoke the observer hook matching this event, if it has one.
    ///
    /// Beacon hooks need both a beacon configuration and a place; geofence
    /// hooks need a place.
    pub fn notify(&self, observer: &dyn EventObserver) {
        match self.kind() {
            EventKind::EnterBeaconRegion {
                config: Some(config),
                place: Some(place),
                ..
            } => {
                if let Some(hook) = observer.on_enter_beacon_region() {
                    hook.did_enter_beacon_region(config, place);
                }
            }
            EventKind::ExitBeaconRegion {
                config: Some(config),
                place: Some(place),
                ..
            } => {
                if let Some(hook) = observer.on_exit_beacon_region() {
                    hook.did_exit_beacon_region(config, place);
                }
            }
            EventKind::EnterGeofence {
                place: Some(place), ..
            } => {
                if let Some(hook) = observer.on_enter_geofence() {
                    hook.did_enter_geofence(place);
                }
            }
            EventKind::ExitGeofence {
                place: Some(place), ..
            } => {
                if let Some(hook) = observer.on_exit_geofence() {
                    hook.did_exit_geofence(place);
                }
            }
            EventKind::EnterBeaconRegion { .. }
            | EventKind::ExitBeaconRegion { .. }
            | EventKind::EnterGeofence { .. }
            | EventKind::ExitGeofence { .. }
            | EventKind::ApplicationOpen
            | EventKind::DeviceUpdate
            | EventKind::LocationUpdate { .. }
            | EventKind::MessageOpened { .. } => {}
        }
    }
}
