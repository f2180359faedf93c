//! # Dispatcher
//!
//! Consumes the merged inbound stream one record at a time: each sample goes
//! through the mode detector, then the trip lifecycle, and the resulting
//! events are published on the bus.

use chrono::{DateTime, Utc};
use mode_detection::{
    LocationFix, LocationSample, ModeChanged, ModeDetector, MotionActivity, MotionSample, Sample,
};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use trip_lifecycle::{TripEvent, TripLifecycle, VehicleDeparted};

use crate::bus::EventBus;
use crate::config::Config;

/// Sensor availability and authorization changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SensorStatus {
    MotionAvailable,
    MotionUnavailable,
    PermissionGranted,
    PermissionDenied,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    pub timestamp: DateTime<Utc>,
    pub status: SensorStatus,
}

/// What the monitor is currently able to do.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TrackingStatus {
    #[default]
    Active,
    /// No motion activity; modes come from speed alone.
    SpeedOnly,
    /// Location access revoked; nothing is tracked.
    PermissionDenied,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChanged {
    pub status: TrackingStatus,
    pub timestamp: DateTime<Utc>,
}

/// One record of the merged inbound stream.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Inbound {
    Location(LocationFix),
    Motion(MotionActivity),
    Status(StatusUpdate),
    Departure(VehicleDeparted),
}

impl Inbound {
    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::Location(fix) => fix.timestamp,
            Self::Motion(activity) => activity.timestamp,
            Self::Status(update) => update.timestamp,
            Self::Departure(departed) => departed.timestamp,
        }
    }
}

#[derive(Debug)]
pub(crate) enum Command {
    Inbound(Inbound),
    Stop,
}

#[derive(Debug)]
pub struct Dispatcher {
    detector: ModeDetector,
    lifecycle: TripLifecycle,
    bus: EventBus,
    location_enabled: bool,
    status: TrackingStatus,
    last_seen: Option<DateTime<Utc>>,
}

impl Dispatcher {
    #[must_use]
    pub fn new(config: &Config, bus: EventBus) -> Self {
        let detection = config.detection.clone();
        let bounds = detection.speed_bounds;
        Self {
            detector: ModeDetector::new(detection),
            lifecycle: TripLifecycle::new(
                config.lifecycle.clone(),
                config.geofence.clone(),
                bounds,
            ),
            bus,
            location_enabled: true,
            status: TrackingStatus::Active,
            last_seen: None,
        }
    }

    #[must_use]
    pub const fn detector(&self) -> &ModeDetector {
        &self.detector
    }

    #[must_use]
    pub const fn lifecycle(&self) -> &TripLifecycle {
        &self.lifecycle
    }

    #[must_use]
    pub const fn status(&self) -> TrackingStatus {
        self.status
    }

    /// Process one inbound record.
    pub fn handle(&mut self, inbound: Inbound) {
        let timestamp = inbound.timestamp();
        self.last_seen = Some(self.last_seen.map_or(timestamp, |seen| seen.max(timestamp)));

        match inbound {
            Inbound::Location(fix) => self.on_location(fix),
            Inbound::Motion(activity) => {
                self.on_motion(activity);
                self.tick(timestamp);
            }
            Inbound::Status(update) => {
                self.tick(timestamp);
                self.on_status(update);
            }
            Inbound::Departure(departed) => {
                self.tick(timestamp);
                if self.location_enabled {
                    let events = self.lifecycle.on_departure(&departed);
                    self.publish(events);
                }
            }
        }
    }

    /// Close any open trip, stamped with the latest timestamp seen.
    pub fn flush(&mut self) {
        let at = self.last_seen.unwrap_or_else(Utc::now);
        let events = self.lifecycle.flush(at, Some(self.detector.current_mode()));
        self.publish(events);
    }

    pub(crate) async fn run(mut self, mut commands: mpsc::Receiver<Command>) {
        while let Some(command) = commands.recv().await {
            match command {
                Command::Inbound(inbound) => self.handle(inbound),
                Command::Stop => break,
            }
        }
        debug!("dispatcher stopping");
        self.flush();
    }

    fn on_location(&mut self, fix: LocationFix) {
        if !self.location_enabled {
            debug!("location permission denied, fix dropped");
            return;
        }

        let sample = match LocationSample::try_from(fix) {
            Ok(sample) => sample,
            Err(err) => {
                warn!(
                    monotonic_counter.samples_rejected = 1,
                    code = err.code(),
                    error = %err,
                    "invalid location fix"
                );
                return;
            }
        };

        if let Some(change) = self.detector.observe(&Sample::Location(sample)) {
            self.on_mode_change(change);
        }

        let live_mode = Some(self.detector.current_mode());
        let events = self.lifecycle.on_sample(sample, live_mode);
        self.publish(events);
    }

    fn on_motion(&mut self, activity: MotionActivity) {
        let sample = Sample::Motion(MotionSample::from(activity));
        if let Some(change) = self.detector.observe(&sample) {
            self.on_mode_change(change);
        }
    }

    // Records without a location fix still advance the stationary clock.
    fn tick(&mut self, at: DateTime<Utc>) {
        if self.location_enabled {
            let events = self.lifecycle.on_tick(at, Some(self.detector.current_mode()));
            self.publish(events);
        }
    }

    fn on_mode_change(&mut self, change: ModeChanged) {
        info!(
            monotonic_counter.mode_changes = 1,
            mode = %change.mode,
            previous = %change.previous,
            timestamp = %change.timestamp
        );
        self.bus.publish_mode_changed(change);

        if self.location_enabled {
            let events = self.lifecycle.on_mode_change(&change);
            self.publish(events);
        }
    }

    fn on_status(&mut self, update: StatusUpdate) {
        match update.status {
            SensorStatus::MotionAvailable => self.detector.set_motion_available(true),
            SensorStatus::MotionUnavailable => self.detector.set_motion_available(false),
            SensorStatus::PermissionGranted => self.location_enabled = true,
            SensorStatus::PermissionDenied => {
                self.location_enabled = false;
                let events =
                    self.lifecycle.interrupt(update.timestamp, Some(self.detector.current_mode()));
                self.publish(events);
            }
        }

        let status = if !self.location_enabled {
            TrackingStatus::PermissionDenied
        } else if self.detector.motion_available() {
            TrackingStatus::Active
        } else {
            TrackingStatus::SpeedOnly
        };

        if status != self.status {
            self.status = status;
            warn!(monotonic_counter.status_changes = 1, status = ?status, "tracking status changed");
            self.bus.publish_status_changed(StatusChanged { status, timestamp: update.timestamp });
        }
    }

    fn publish(&self, events: Vec<TripEvent>) {
        for event in events {
            self.bus.publish_trip_event(event);
        }
    }
}
