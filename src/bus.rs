//! Typed outbound event channels.
//!
//! Each event kind has its own broadcast channel. Publishing never blocks and
//! an event with no subscribers is simply dropped.

use mode_detection::ModeChanged;
use tokio::sync::broadcast::{self, Receiver, Sender};
use trip_lifecycle::{
    SampleAppended, TripEnded, TripEvent, TripStarted, VehicleDeparted, VehicleParked,
};

use crate::dispatcher::StatusChanged;

#[derive(Debug, Clone)]
pub struct EventBus {
    mode_changed: Sender<ModeChanged>,
    trip_started: Sender<TripStarted>,
    sample_appended: Sender<SampleAppended>,
    trip_ended: Sender<TripEnded>,
    vehicle_parked: Sender<VehicleParked>,
    vehicle_departed: Sender<VehicleDeparted>,
    status_changed: Sender<StatusChanged>,
}

impl EventBus {
    /// Create a bus whose channels each buffer up to `capacity` events per
    /// subscriber.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            mode_changed: broadcast::channel(capacity).0,
            trip_started: broadcast::channel(capacity).0,
            sample_appended: broadcast::channel(capacity).0,
            trip_ended: broadcast::channel(capacity).0,
            vehicle_parked: broadcast::channel(capacity).0,
            vehicle_departed: broadcast::channel(capacity).0,
            status_changed: broadcast::channel(capacity).0,
        }
    }

    #[must_use]
    pub fn subscribe_mode_changed(&self) -> Receiver<ModeChanged> {
        self.mode_changed.subscribe()
    }

    #[must_use]
    pub fn subscribe_trip_started(&self) -> Receiver<TripStarted> {
        self.trip_started.subscribe()
    }

    #[must_use]
    pub fn subscribe_sample_appended(&self) -> Receiver<SampleAppended> {
        self.sample_appended.subscribe()
    }

    #[must_use]
    pub fn subscribe_trip_ended(&self) -> Receiver<TripEnded> {
        self.trip_ended.subscribe()
    }

    #[must_use]
    pub fn subscribe_vehicle_parked(&self) -> Receiver<VehicleParked> {
        self.vehicle_parked.subscribe()
    }

    #[must_use]
    pub fn subscribe_vehicle_departed(&self) -> Receiver<VehicleDeparted> {
        self.vehicle_departed.subscribe()
    }

    #[must_use]
    pub fn subscribe_status_changed(&self) -> Receiver<StatusChanged> {
        self.status_changed.subscribe()
    }

    pub fn publish_mode_changed(&self, event: ModeChanged) {
        publish(&self.mode_changed, event, "mode_changed");
    }

    pub fn publish_status_changed(&self, event: StatusChanged) {
        publish(&self.status_changed, event, "status_changed");
    }

    /// Route a lifecycle event to its channel.
    pub fn publish_trip_event(&self, event: TripEvent) {
        match event {
            TripEvent::Started(e) => publish(&self.trip_started, e, "trip_started"),
            TripEvent::SampleAppended(e) => publish(&self.sample_appended, e, "sample_appended"),
            TripEvent::Ended(e) => publish(&self.trip_ended, e, "trip_ended"),
            TripEvent::Parked(e) => publish(&self.vehicle_parked, e, "vehicle_parked"),
            TripEvent::Departed(e) => publish(&self.vehicle_departed, e, "vehicle_departed"),
        }
    }
}

fn publish<T>(sender: &Sender<T>, event: T, kind: &str) {
    if sender.send(event).is_err() {
        tracing::trace!(kind, "no subscribers");
    }
}
