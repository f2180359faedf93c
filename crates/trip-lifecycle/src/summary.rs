use mode_detection::TransportationMode;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::trip::Trip;

/// Totals for the trips of one mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModeSummary {
    pub mode: TransportationMode,
    pub trip_count: usize,
    /// Metres.
    pub distance: f64,
    /// Mean of the trips' average speeds (km/h).
    pub average_speed: f64,
}

/// Aggregate view over a set of finished trips.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripSummary {
    pub trip_count: usize,
    /// Metres.
    pub total_distance: f64,
    pub total_duration_secs: i64,
    pub average_speed: f64,
    /// Trip with the greatest distance.
    pub longest_trip: Uuid,
    /// Trip with the highest average speed.
    pub fastest_trip: Uuid,
    /// One entry per mode that has trips, in [`TransportationMode::ALL`] order.
    pub by_mode: Vec<ModeSummary>,
}

impl TripSummary {
    /// Summarize the finished trips in `trips`. Open trips are skipped;
    /// returns `None` when nothing is left.
    #[must_use]
    pub fn from_trips(trips: &[Trip]) -> Option<Self> {
        let finished: Vec<&Trip> = trips.iter().filter(|trip| trip.is_finished()).collect();

        let longest = finished.iter().max_by(|a, b| a.distance.total_cmp(&b.distance))?;
        let fastest = finished.iter().max_by(|a, b| a.average_speed.total_cmp(&b.average_speed))?;

        let by_mode = TransportationMode::ALL
            .into_iter()
            .filter_map(|mode| {
                let trips: Vec<&Trip> =
                    finished.iter().copied().filter(|trip| trip.mode == mode).collect();
                (!trips.is_empty()).then(|| ModeSummary {
                    mode,
                    trip_count: trips.len(),
                    distance: trips.iter().map(|trip| trip.distance).sum(),
                    average_speed: mean(trips.iter().map(|trip| trip.average_speed)),
                })
            })
            .collect();

        Some(Self {
            trip_count: finished.len(),
            total_distance: finished.iter().map(|trip| trip.distance).sum(),
            total_duration_secs: finished.iter().map(|trip| trip.duration().num_seconds()).sum(),
            average_speed: mean(finished.iter().map(|trip| trip.average_speed)),
            longest_trip: longest.id,
            fastest_trip: fastest.id,
            by_mode,
        })
    }

    /// Summary for `mode`, if any trips used it.
    #[must_use]
    pub fn mode(&self, mode: TransportationMode) -> Option<&ModeSummary> {
        self.by_mode.iter().find(|summary| summary.mode == mode)
    }
}

#[allow(clippy::cast_precision_loss)]
fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0_usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 { 0.0 } else { sum / count as f64 }
}
