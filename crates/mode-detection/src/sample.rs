//! Sample ingest.
//!
//! Raw fixes from the location collaborator and raw activity tuples from the
//! motion collaborator are normalized into [`Sample`]s. Speeds are converted
//! from m/s to km/h here; everything downstream works in km/h.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

const MPS_TO_KMH: f64 = 3.6;
const DEFAULT_SPEED_WINDOW: usize = 10;

/// Location fix as delivered by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationFix {
    pub timestamp: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
    /// Radius of uncertainty in metres. Negative values mark an invalid fix.
    pub horizontal_accuracy: f64,
    /// Instantaneous speed in m/s. Negative when the platform has no estimate.
    pub speed: f64,
}

/// Platform confidence attached to a motion activity classification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConfidenceTier {
    #[default]
    Low,
    Medium,
    High,
}

/// Motion activity tuple as delivered by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MotionActivity {
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub automotive: bool,
    #[serde(default)]
    pub cycling: bool,
    #[serde(default)]
    pub walking: bool,
    #[serde(default)]
    pub stationary: bool,
    #[serde(default)]
    pub confidence: ConfidenceTier,
}

/// Single activity reported by a motion sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Activity {
    Automotive,
    Cycling,
    Walking,
    /// Stationary or not classifiable.
    Stationary,
}

/// Normalized location observation. Speed is in km/h and never negative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationSample {
    timestamp: DateTime<Utc>,
    latitude: f64,
    longitude: f64,
    accuracy: f64,
    speed_kmh: f64,
}

impl LocationSample {
    /// Create a sample, clamping an invalid or negative speed to zero.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidSample`] when the coordinates are not finite or
    /// out of range, or when the accuracy is negative (the platform's marker
    /// for an unusable fix).
    pub fn new(
        timestamp: DateTime<Utc>, latitude: f64, longitude: f64, accuracy: f64, speed_kmh: f64,
    ) -> Result<Self> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(Error::InvalidSample(format!("latitude {latitude} out of range")));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(Error::InvalidSample(format!("longitude {longitude} out of range")));
        }
        if !accuracy.is_finite() || accuracy < 0.0 {
            return Err(Error::InvalidSample(format!("horizontal accuracy {accuracy} invalid")));
        }

        let speed_kmh = clamp_speed(speed_kmh);
        Ok(Self { timestamp, latitude, longitude, accuracy, speed_kmh })
    }

    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    #[must_use]
    pub const fn latitude(&self) -> f64 {
        self.latitude
    }

    #[must_use]
    pub const fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Horizontal accuracy in metres.
    #[must_use]
    pub const fn accuracy(&self) -> f64 {
        self.accuracy
    }

    #[must_use]
    pub const fn speed_kmh(&self) -> f64 {
        self.speed_kmh
    }
}

impl TryFrom<LocationFix> for LocationSample {
    type Error = Error;

    fn try_from(fix: LocationFix) -> Result<Self> {
        if !fix.speed.is_finite() || fix.speed < 0.0 {
            debug!(speed = fix.speed, "clamping invalid speed to zero");
        }
        Self::new(
            fix.timestamp,
            fix.latitude,
            fix.longitude,
            fix.horizontal_accuracy,
            fix.speed * MPS_TO_KMH,
        )
    }
}

/// Normalized motion activity observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MotionSample {
    pub timestamp: DateTime<Utc>,
    pub activity: Activity,
    pub tier: ConfidenceTier,
}

impl From<MotionActivity> for MotionSample {
    // the platform may set several flags at once; the most specific wins
    fn from(raw: MotionActivity) -> Self {
        let activity = if raw.automotive {
            Activity::Automotive
        } else if raw.cycling {
            Activity::Cycling
        } else if raw.walking {
            Activity::Walking
        } else {
            Activity::Stationary
        };

        Self { timestamp: raw.timestamp, activity, tier: raw.confidence }
    }
}

/// A normalized observation flowing through the detection pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Sample {
    Location(LocationSample),
    Motion(MotionSample),
}

impl Sample {
    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::Location(sample) => sample.timestamp,
            Self::Motion(sample) => sample.timestamp,
        }
    }
}

impl From<LocationSample> for Sample {
    fn from(sample: LocationSample) -> Self {
        Self::Location(sample)
    }
}

impl From<MotionSample> for Sample {
    fn from(sample: MotionSample) -> Self {
        Self::Motion(sample)
    }
}

/// Rolling mean over the most recent speeds, for display.
#[derive(Debug, Clone)]
pub struct SpeedWindow {
    readings: VecDeque<f64>,
    capacity: usize,
}

impl Default for SpeedWindow {
    fn default() -> Self {
        Self::new(DEFAULT_SPEED_WINDOW)
    }
}

impl SpeedWindow {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self { readings: VecDeque::with_capacity(capacity), capacity }
    }

    pub fn push(&mut self, speed_kmh: f64) {
        if self.readings.len() == self.capacity {
            self.readings.pop_front();
        }
        self.readings.push_back(clamp_speed(speed_kmh));
    }

    /// Mean of the retained readings, zero when empty.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn average(&self) -> f64 {
        if self.readings.is_empty() {
            return 0.0;
        }
        self.readings.iter().sum::<f64>() / self.readings.len() as f64
    }

    pub fn clear(&mut self) {
        self.readings.clear();
    }
}

fn clamp_speed(speed: f64) -> f64 {
    if speed.is_finite() { speed.max(0.0) } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn fix(speed: f64) -> LocationFix {
        LocationFix {
            timestamp: at(0),
            latitude: -36.8485,
            longitude: 174.7633,
            horizontal_accuracy: 5.0,
            speed,
        }
    }

    #[test]
    fn converts_speed_to_kmh() {
        let sample = LocationSample::try_from(fix(10.0)).expect("valid fix");
        assert!((sample.speed_kmh() - 36.0).abs() < 1e-9);
    }

    #[test]
    fn clamps_negative_speed() {
        let sample = LocationSample::try_from(fix(-1.0)).expect("valid fix");
        assert!(sample.speed_kmh().abs() < f64::EPSILON);

        let sample = LocationSample::try_from(fix(f64::NAN)).expect("valid fix");
        assert!(sample.speed_kmh().abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_bad_position() {
        let mut bad = fix(1.0);
        bad.latitude = 91.0;
        let Err(Error::InvalidSample(_)) = LocationSample::try_from(bad) else {
            panic!("should reject latitude");
        };

        let mut bad = fix(1.0);
        bad.longitude = f64::INFINITY;
        assert!(LocationSample::try_from(bad).is_err());

        let mut bad = fix(1.0);
        bad.horizontal_accuracy = -1.0;
        assert!(LocationSample::try_from(bad).is_err());
    }

    #[test]
    fn activity_priority() {
        let raw = MotionActivity {
            timestamp: at(0),
            automotive: true,
            cycling: false,
            walking: true,
            stationary: false,
            confidence: ConfidenceTier::High,
        };
        let sample = MotionSample::from(raw);
        assert_eq!(sample.activity, Activity::Automotive);
        assert_eq!(sample.tier, ConfidenceTier::High);

        let raw = MotionActivity { automotive: false, walking: false, stationary: true, ..raw };
        assert_eq!(MotionSample::from(raw).activity, Activity::Stationary);
    }

    #[test]
    fn deserialize_fix() {
        let json = r#"{
            "timestamp": "2024-10-23T08:00:00Z",
            "latitude": -36.8485,
            "longitude": 174.7633,
            "horizontalAccuracy": 8.5,
            "speed": 12.5
        }"#;
        let fix: LocationFix = serde_json::from_str(json).expect("should deserialize");
        assert!((fix.horizontal_accuracy - 8.5).abs() < f64::EPSILON);

        let json = r#"{"timestamp": "2024-10-23T08:00:00Z", "walking": true, "confidence": "medium"}"#;
        let activity: MotionActivity = serde_json::from_str(json).expect("should deserialize");
        assert!(activity.walking && !activity.automotive);
        assert_eq!(activity.confidence, ConfidenceTier::Medium);
    }

    #[test]
    fn speed_window_rolls() {
        let mut window = SpeedWindow::new(3);
        assert!(window.average().abs() < f64::EPSILON);
        for speed in [10.0, 20.0, 30.0, 40.0] {
            window.push(speed);
        }
        assert!((window.average() - 30.0).abs() < 1e-9);
    }
}
