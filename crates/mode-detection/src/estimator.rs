//! Per-mode running confidence and consecutive-detection counters.

use crate::mode::{SpeedBounds, TransportationMode};
use crate::sample::{Activity, ConfidenceTier, MotionSample};

// Confidence-weighting buckets for speed observations (km/h). 25-30 km/h
// classifies as cycling but falls in the driving bucket, so it is weak
// evidence for either.
const WALKING_BUCKET_MAX: f64 = 7.0;
const CYCLING_BUCKET_MAX: f64 = 25.0;

const LOW_TIER_CONFIDENCE: f64 = 0.2;

/// One mode hypothesis with the certainty of the source that produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub mode: TransportationMode,
    pub confidence: f64,
}

impl Observation {
    /// Derive an observation from a speed: the classified mode, weighted high
    /// when the speed bucket agrees with it and low when it does not.
    #[must_use]
    pub fn from_speed(speed_kmh: f64, bounds: &SpeedBounds) -> Self {
        let mode = bounds.classify(speed_kmh);

        let confidence = if (0.0..WALKING_BUCKET_MAX).contains(&speed_kmh) {
            if mode == TransportationMode::Walking { 0.9 } else { 0.3 }
        } else if (WALKING_BUCKET_MAX..CYCLING_BUCKET_MAX).contains(&speed_kmh) {
            if mode == TransportationMode::Cycling { 0.8 } else { 0.4 }
        } else if speed_kmh >= CYCLING_BUCKET_MAX {
            if mode == TransportationMode::Automotive { 0.95 } else { 0.5 }
        } else {
            LOW_TIER_CONFIDENCE
        };

        Self { mode, confidence }
    }

    /// Derive an observation from a motion activity. Only high-tier
    /// classifications carry weight; everything else is weak `Unknown`.
    #[must_use]
    pub const fn from_activity(sample: &MotionSample) -> Self {
        let (mode, confidence) = match (sample.tier, sample.activity) {
            (ConfidenceTier::High, Activity::Automotive) => (TransportationMode::Automotive, 0.8),
            (ConfidenceTier::High, Activity::Cycling) => (TransportationMode::Cycling, 0.7),
            (ConfidenceTier::High, Activity::Walking) => (TransportationMode::Walking, 0.9),
            _ => (TransportationMode::Unknown, LOW_TIER_CONFIDENCE),
        };
        Self { mode, confidence }
    }
}

/// Running confidence per mode, kept in `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfidenceEstimator {
    confidences: [f64; 4],
    consecutive: [u32; 4],
    decay_factor: f64,
}

impl ConfidenceEstimator {
    #[must_use]
    pub const fn new(decay_factor: f64) -> Self {
        Self { confidences: [0.0; 4], consecutive: [0; 4], decay_factor }
    }

    /// Fold one observation into the running state.
    ///
    /// The observed mode's confidence moves halfway towards the observed
    /// value and its counter increments. Every other mode has its counter
    /// reset and its confidence decayed.
    pub fn update(&mut self, observation: Observation) {
        let observed = if observation.confidence.is_nan() {
            0.0
        } else {
            observation.confidence.clamp(0.0, 1.0)
        };
        let active = observation.mode.index();

        self.confidences[active] = ((self.confidences[active] + observed) / 2.0).clamp(0.0, 1.0);
        self.consecutive[active] = self.consecutive[active].saturating_add(1);

        for mode in TransportationMode::ALL {
            let idx = mode.index();
            if idx != active {
                self.consecutive[idx] = 0;
                self.confidences[idx] = (self.confidences[idx] * self.decay_factor).clamp(0.0, 1.0);
            }
        }
    }

    #[must_use]
    pub const fn confidence(&self, mode: TransportationMode) -> f64 {
        self.confidences[mode.index()]
    }

    #[must_use]
    pub const fn consecutive(&self, mode: TransportationMode) -> u32 {
        self.consecutive[mode.index()]
    }

    pub fn reset(&mut self) {
        self.confidences = [0.0; 4];
        self.consecutive = [0; 4];
    }
}
