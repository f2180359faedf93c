//! # Parked Geofence
//!
//! When a trip ends a circular region is placed around the vehicle. A later
//! accurate fix outside that region means the device is on the move again.

use geo::{Distance, Haversine, Point};
use mode_detection::LocationSample;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::GeofenceConfig;
use crate::events::VehicleDeparted;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    pub latitude: f64,
    pub longitude: f64,
    /// Metres.
    pub radius: f64,
}

impl Region {
    /// Whether `sample` lies outside the region.
    #[must_use]
    pub fn excludes(&self, sample: &LocationSample) -> bool {
        let center = Point::new(self.longitude, self.latitude);
        let position = Point::new(sample.longitude(), sample.latitude());
        Haversine::distance(center, position) > self.radius
    }
}

#[derive(Debug, Clone, Default)]
pub struct Geofence {
    config: GeofenceConfig,
    region: Option<Region>,
}

impl Geofence {
    #[must_use]
    pub const fn new(config: GeofenceConfig) -> Self {
        Self { config, region: None }
    }

    /// Place the parked region around `position`. The radius follows the fix
    /// accuracy, bounded by the configured minimum and maximum.
    pub fn arm(&mut self, position: &LocationSample) -> Region {
        let radius = position.accuracy().min(self.config.radius).max(self.config.min_radius);
        let region =
            Region { latitude: position.latitude(), longitude: position.longitude(), radius };
        debug!(latitude = region.latitude, longitude = region.longitude, radius, "geofence armed");
        self.region = Some(region);
        region
    }

    pub fn clear(&mut self) {
        self.region = None;
    }

    #[must_use]
    pub const fn region(&self) -> Option<&Region> {
        self.region.as_ref()
    }

    /// Check a fix against the armed region. Fixes worse than `max_accuracy`
    /// metres are ignored. A departure disarms the geofence.
    pub fn check(&mut self, sample: &LocationSample, max_accuracy: f64) -> Option<VehicleDeparted> {
        let region = self.region?;
        if sample.accuracy() > max_accuracy || !region.excludes(sample) {
            return None;
        }

        debug!(timestamp = %sample.timestamp(), "left parked region");
        self.region = None;
        Some(VehicleDeparted { timestamp: sample.timestamp() })
    }
}
