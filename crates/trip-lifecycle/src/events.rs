use chrono::{DateTime, Utc};
use mode_detection::LocationSample;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::trip::Trip;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripStarted {
    pub trip_id: Uuid,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleAppended {
    pub trip_id: Uuid,
    pub sample: LocationSample,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripEnded {
    pub trip: Trip,
}

/// Last known position of the vehicle when a trip ends.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleParked {
    pub trip_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
    /// Parked region radius in metres.
    pub radius: f64,
}

/// The device has left the parked region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleDeparted {
    pub timestamp: DateTime<Utc>,
}

/// Everything the lifecycle controller reports, in emission order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TripEvent {
    Started(TripStarted),
    SampleAppended(SampleAppended),
    Ended(TripEnded),
    Parked(VehicleParked),
    Departed(VehicleDeparted),
}

impl TripEvent {
    /// Trip the event belongs to, if any.
    #[must_use]
    pub const fn trip_id(&self) -> Option<Uuid> {
        match self {
            Self::Started(e) => Some(e.trip_id),
            Self::SampleAppended(e) => Some(e.trip_id),
            Self::Ended(e) => Some(e.trip.id),
            Self::Parked(e) => Some(e.trip_id),
            Self::Departed(_) => None,
        }
    }
}
