use chrono::{DateTime, Duration, Utc};
use mode_detection::TransportationMode;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single journey. Open while `ended_at` is `None`; statistics are only
/// meaningful once the trip has been finalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trip {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    /// Metres.
    pub distance: f64,
    /// km/h.
    pub average_speed: f64,
    /// km/h.
    pub max_speed: f64,
    pub mode: TransportationMode,
    pub confidence: f64,
}

impl Trip {
    /// Open a new trip with a fresh id.
    #[must_use]
    pub fn start(started_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at,
            ended_at: None,
            distance: 0.0,
            average_speed: 0.0,
            max_speed: 0.0,
            mode: TransportationMode::Unknown,
            confidence: 0.0,
        }
    }

    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.ended_at.is_some()
    }

    /// Elapsed time of a finished trip, zero while open.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.ended_at.map_or_else(Duration::zero, |ended| ended - self.started_at)
    }
}
