//! Transportation modes and their static speed reference data.
//!
//! All speeds in this module are in km/h.

use std::fmt::{self, Display};
use std::ops::Range;

use serde::{Deserialize, Serialize};

/// Upper bound (exclusive) of walking speeds.
pub const MAX_WALKING_SPEED: f64 = 7.0;
/// Upper bound (exclusive) of cycling speeds.
pub const MAX_CYCLING_SPEED: f64 = 30.0;
/// Upper bound (inclusive) of plausible driving speeds.
pub const MAX_DRIVING_SPEED: f64 = 200.0;

const AVERAGE_WALKING_SPEED: f64 = 5.0;
const AVERAGE_CYCLING_SPEED: f64 = 15.0;
const AVERAGE_DRIVING_SPEED: f64 = 50.0;

/// Closed set of transport types the detector can report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransportationMode {
    Automotive,
    Cycling,
    Walking,
    #[default]
    Unknown,
}

impl TransportationMode {
    pub const ALL: [Self; 4] = [Self::Automotive, Self::Cycling, Self::Walking, Self::Unknown];

    /// Classify a speed against the default speed boundaries.
    #[must_use]
    pub fn classify(speed_kmh: f64) -> Self {
        SpeedBounds::default().classify(speed_kmh)
    }

    /// Typical speed range for the mode. `Unknown` has an empty range.
    #[must_use]
    pub fn speed_range(self) -> Range<f64> {
        match self {
            Self::Walking => 0.0..MAX_WALKING_SPEED,
            Self::Cycling => MAX_WALKING_SPEED..MAX_CYCLING_SPEED,
            // inclusive upper bound, see `SpeedBounds::classify`
            Self::Automotive => MAX_CYCLING_SPEED..MAX_DRIVING_SPEED.next_up(),
            Self::Unknown => 0.0..0.0,
        }
    }

    /// Whether `speed_kmh` falls within the mode's typical range.
    #[must_use]
    pub fn is_typical_speed(self, speed_kmh: f64) -> bool {
        self.speed_range().contains(&speed_kmh)
    }

    /// Representative average speed used as a fallback estimate.
    #[must_use]
    pub const fn typical_average_speed(self) -> f64 {
        match self {
            Self::Walking => AVERAGE_WALKING_SPEED,
            Self::Cycling => AVERAGE_CYCLING_SPEED,
            Self::Automotive => AVERAGE_DRIVING_SPEED,
            Self::Unknown => 0.0,
        }
    }

    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Automotive => "Driving",
            Self::Cycling => "Cycling",
            Self::Walking => "Walking",
            Self::Unknown => "Unknown",
        }
    }

    /// Classify a whole trip from its average and max speed and duration,
    /// returning the mode and a confidence in `[0, 1]`.
    ///
    /// Short trips (under two minutes) halve the confidence, trips longer than
    /// five minutes boost it by 20%.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn detect_with_confidence(
        average_kmh: f64, max_kmh: f64, duration: chrono::Duration,
    ) -> (Self, f64) {
        let mut mode = Self::classify(average_kmh);
        let avg_typical = mode.is_typical_speed(average_kmh);
        let max_typical = mode.is_typical_speed(max_kmh);

        let mut confidence = match (avg_typical, max_typical) {
            (true, true) => 0.8,
            (true, false) => 0.6,
            (false, true) => 0.4,
            (false, false) => {
                mode = Self::Unknown;
                0.2
            }
        };

        let minutes = duration.num_seconds() as f64 / 60.0;
        if minutes < 2.0 {
            confidence *= 0.5;
        } else if minutes > 5.0 {
            confidence *= 1.2;
        }

        (mode, f64::min(confidence, 1.0))
    }

    pub(crate) const fn index(self) -> usize {
        match self {
            Self::Automotive => 0,
            Self::Cycling => 1,
            Self::Walking => 2,
            Self::Unknown => 3,
        }
    }
}

impl Display for TransportationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Speed boundaries between modes (km/h).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedBounds {
    pub walking_max: f64,
    pub cycling_max: f64,
    pub automotive_max: f64,
}

impl Default for SpeedBounds {
    fn default() -> Self {
        Self {
            walking_max: MAX_WALKING_SPEED,
            cycling_max: MAX_CYCLING_SPEED,
            automotive_max: MAX_DRIVING_SPEED,
        }
    }
}

impl SpeedBounds {
    /// Walking `[0, walking_max)`, cycling `[walking_max, cycling_max)`,
    /// automotive `[cycling_max, automotive_max]`, unknown otherwise
    /// (negative, NaN, or implausibly fast).
    #[must_use]
    pub fn classify(&self, speed_kmh: f64) -> TransportationMode {
        if !(0.0..=self.automotive_max).contains(&speed_kmh) {
            TransportationMode::Unknown
        } else if speed_kmh < self.walking_max {
            TransportationMode::Walking
        } else if speed_kmh < self.cycling_max {
            TransportationMode::Cycling
        } else {
            TransportationMode::Automotive
        }
    }
}
