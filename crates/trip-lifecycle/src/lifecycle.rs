//! # Trip Lifecycle
//!
//! Idle/Tracking state machine. A latched Automotive mode (or a departure
//! from the parked region) opens a trip; sustained low speed closes it.
//! Timeouts are measured between record timestamps, so a gap in the stream
//! counts as stationary time.

use chrono::{DateTime, Utc};
use mode_detection::{LocationSample, ModeChanged, SpeedBounds, TransportationMode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::{GeofenceConfig, LifecycleConfig};
use crate::events::{
    SampleAppended, TripEnded, TripEvent, TripStarted, VehicleDeparted, VehicleParked,
};
use crate::geofence::Geofence;
use crate::stats::Aggregator;
use crate::trip::Trip;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LifecycleState {
    #[default]
    Idle,
    Tracking,
}

#[derive(Debug)]
struct ActiveTrip {
    trip: Trip,
    buffer: Vec<LocationSample>,
    last_movement: DateTime<Utc>,
    // detector mode as of the last significant movement
    moving_mode: Option<TransportationMode>,
}

#[derive(Debug)]
pub struct TripLifecycle {
    config: LifecycleConfig,
    aggregator: Aggregator,
    geofence: Geofence,
    active: Option<ActiveTrip>,
    last_position: Option<LocationSample>,
}

impl Default for TripLifecycle {
    fn default() -> Self {
        Self::new(LifecycleConfig::default(), GeofenceConfig::default(), SpeedBounds::default())
    }
}

impl TripLifecycle {
    #[must_use]
    pub const fn new(
        config: LifecycleConfig, geofence: GeofenceConfig, bounds: SpeedBounds,
    ) -> Self {
        Self {
            config,
            aggregator: Aggregator::new(bounds),
            geofence: Geofence::new(geofence),
            active: None,
            last_position: None,
        }
    }

    #[must_use]
    pub const fn state(&self) -> LifecycleState {
        if self.active.is_some() { LifecycleState::Tracking } else { LifecycleState::Idle }
    }

    /// The open trip, if tracking.
    #[must_use]
    pub fn current_trip(&self) -> Option<&Trip> {
        self.active.as_ref().map(|active| &active.trip)
    }

    /// Id of the open trip.
    #[must_use]
    pub fn trip_id(&self) -> Option<Uuid> {
        self.current_trip().map(|trip| trip.id)
    }

    /// Samples buffered for the open trip.
    #[must_use]
    pub fn buffered(&self) -> &[LocationSample] {
        self.active.as_ref().map_or(&[], |active| active.buffer.as_slice())
    }

    #[must_use]
    pub const fn geofence(&self) -> &Geofence {
        &self.geofence
    }

    /// React to a latched mode change from the detector.
    pub fn on_mode_change(&mut self, change: &ModeChanged) -> Vec<TripEvent> {
        let timeout = self.config.stationary_timeout;
        let stationary = self
            .active
            .as_ref()
            .map(|active| change.timestamp - active.last_movement >= timeout);

        match stationary {
            None if change.mode == TransportationMode::Automotive => {
                vec![self.start(change.timestamp)]
            }
            Some(true) if change.mode != TransportationMode::Automotive => {
                self.end(change.timestamp, Some(change.mode), true)
            }
            _ => Vec::new(),
        }
    }

    /// Feed a location sample. While tracking, the sample is buffered unless
    /// the stationary timeout has already elapsed; while idle, it is checked
    /// against the parked geofence.
    ///
    /// `live_mode` is the detector's mode at this sample. A trip is classified
    /// with the live mode seen at its last significant movement, so the slide
    /// to Walking while parked does not relabel a drive.
    pub fn on_sample(
        &mut self, sample: LocationSample, live_mode: Option<TransportationMode>,
    ) -> Vec<TripEvent> {
        // a fix arriving after a long gap closes the trip before it is handled
        let mut events = self.on_tick(sample.timestamp(), live_mode);
        self.last_position = Some(sample);

        if self.active.is_none() {
            let Some(departed) = self.geofence.check(&sample, self.config.min_accuracy) else {
                return events;
            };
            events.extend(self.on_departure(&departed));
        }

        let config = &self.config;
        let Some(active) = self.active.as_mut() else {
            return events;
        };

        active.buffer.push(sample);
        events.push(TripEvent::SampleAppended(SampleAppended { trip_id: active.trip.id, sample }));

        if sample.accuracy() <= config.min_accuracy && sample.speed_kmh() >= config.low_speed_kmh {
            active.last_movement = active.last_movement.max(sample.timestamp());
            active.moving_mode = live_mode.or(active.moving_mode);
        }

        events
    }

    /// Evaluate the stationary timeout at `at` without a location fix.
    ///
    /// Ends the open trip, stamped `at`, once `at` is at least the stationary
    /// timeout past the last significant movement.
    pub fn on_tick(
        &mut self, at: DateTime<Utc>, live_mode: Option<TransportationMode>,
    ) -> Vec<TripEvent> {
        let Some(active) = &self.active else {
            return Vec::new();
        };
        if at - active.last_movement < self.config.stationary_timeout {
            return Vec::new();
        }

        debug!(
            trip_id = %active.trip.id,
            last_movement = %active.last_movement,
            "stationary timeout elapsed"
        );
        self.end(at, live_mode, true)
    }

    /// Secondary start path: the device left the parked region.
    pub fn on_departure(&mut self, departed: &VehicleDeparted) -> Vec<TripEvent> {
        let mut events = Vec::new();
        if self.active.is_none() {
            info!(monotonic_counter.vehicle_departures = 1, timestamp = %departed.timestamp);
            events.push(TripEvent::Departed(*departed));
            events.push(self.start(departed.timestamp));
        }
        events
    }

    /// Close the open trip, if any, with the samples buffered so far. The
    /// vehicle is reported parked at its last known position.
    pub fn flush(
        &mut self, at: DateTime<Utc>, live_mode: Option<TransportationMode>,
    ) -> Vec<TripEvent> {
        self.end(at, live_mode, true)
    }

    /// Close the open trip, if any, without a parked signal. Used when
    /// location tracking is lost and the vehicle may still be moving.
    pub fn interrupt(
        &mut self, at: DateTime<Utc>, live_mode: Option<TransportationMode>,
    ) -> Vec<TripEvent> {
        self.end(at, live_mode, false)
    }

    fn start(&mut self, at: DateTime<Utc>) -> TripEvent {
        let trip = Trip::start(at);
        self.geofence.clear();

        info!(monotonic_counter.trips_started = 1, trip_id = %trip.id, started_at = %at);
        let event = TripEvent::Started(TripStarted { trip_id: trip.id, started_at: at });
        self.active =
            Some(ActiveTrip { trip, buffer: Vec::new(), last_movement: at, moving_mode: None });
        event
    }

    fn end(
        &mut self, at: DateTime<Utc>, live_mode: Option<TransportationMode>, park: bool,
    ) -> Vec<TripEvent> {
        let Some(active) = self.active.take() else {
            return Vec::new();
        };

        let live_mode = active.moving_mode.or(live_mode);
        let trip = self.aggregator.finalize(&active.trip, &active.buffer, at, live_mode);
        info!(
            monotonic_counter.trips_ended = 1,
            trip_id = %trip.id,
            distance = trip.distance,
            average_speed = trip.average_speed,
            mode = %trip.mode,
            samples = active.buffer.len(),
            "trip ended"
        );

        let mut events = vec![TripEvent::Ended(TripEnded { trip })];
        if !park {
            return events;
        }
        if let Some(position) = parked_position(&active.buffer, self.last_position) {
            let region = self.geofence.arm(&position);
            events.push(TripEvent::Parked(VehicleParked {
                trip_id: active.trip.id,
                timestamp: at,
                latitude: region.latitude,
                longitude: region.longitude,
                radius: region.radius,
            }));
        }
        events
    }
}

// Latest buffered fix, or the last fix seen at all.
fn parked_position(
    buffer: &[LocationSample], last_seen: Option<LocationSample>,
) -> Option<LocationSample> {
    buffer.iter().max_by_key(|s| s.timestamp()).copied().or(last_seen)
}
