use tracing::{debug, info};

use crate::config::DetectionConfig;
use crate::decision::{ModeChanged, ModeDecision};
use crate::estimator::{ConfidenceEstimator, Observation};
use crate::mode::TransportationMode;
use crate::sample::{Sample, SpeedWindow};

/// Combines the confidence estimator and the decision state machine behind a
/// single per-sample entry point.
///
/// Samples must be fed one at a time in arrival order; the estimator's
/// counter reset relies on each update seeing the previous one complete.
#[derive(Debug, Clone)]
pub struct ModeDetector {
    config: DetectionConfig,
    estimator: ConfidenceEstimator,
    decision: ModeDecision,
    speeds: SpeedWindow,
    motion_available: bool,
}

impl ModeDetector {
    #[must_use]
    pub fn new(config: DetectionConfig) -> Self {
        let estimator = ConfidenceEstimator::new(config.decay_factor);
        Self {
            config,
            estimator,
            decision: ModeDecision::new(),
            speeds: SpeedWindow::default(),
            motion_available: true,
        }
    }

    /// Process one sample, returning a change event when the current mode
    /// switched as a result.
    ///
    /// Motion samples are ignored while motion activity is marked unavailable,
    /// leaving detection to speed alone.
    pub fn observe(&mut self, sample: &Sample) -> Option<ModeChanged> {
        let observation = match sample {
            Sample::Location(location) => {
                self.speeds.push(location.speed_kmh());
                Observation::from_speed(location.speed_kmh(), &self.config.speed_bounds)
            }
            Sample::Motion(motion) => {
                if !self.motion_available {
                    debug!("motion activity unavailable, ignoring motion sample");
                    return None;
                }
                Observation::from_activity(motion)
            }
        };

        self.apply(observation, sample)
    }

    fn apply(&mut self, observation: Observation, sample: &Sample) -> Option<ModeChanged> {
        self.estimator.update(observation);

        let mode = observation.mode;
        let confidence = self.estimator.confidence(mode);
        let consecutive = self.estimator.consecutive(mode);
        debug!(
            mode = %mode,
            observed = observation.confidence,
            confidence,
            consecutive,
            "confidence updated"
        );

        let change =
            self.decision.evaluate(mode, confidence, consecutive, sample.timestamp(), &self.config)?;
        info!(
            mode = %change.mode,
            previous = %change.previous,
            confidence,
            "transportation mode changed"
        );
        Some(change)
    }

    /// Mark motion activity as (un)available. While unavailable, detection
    /// degrades to speed-only.
    pub const fn set_motion_available(&mut self, available: bool) {
        self.motion_available = available;
    }

    #[must_use]
    pub const fn motion_available(&self) -> bool {
        self.motion_available
    }

    #[must_use]
    pub const fn current_mode(&self) -> TransportationMode {
        self.decision.current()
    }

    #[must_use]
    pub const fn confidence(&self, mode: TransportationMode) -> f64 {
        self.estimator.confidence(mode)
    }

    #[must_use]
    pub const fn consecutive(&self, mode: TransportationMode) -> u32 {
        self.estimator.consecutive(mode)
    }

    /// Rolling mean of the most recent location speeds (km/h).
    #[must_use]
    pub fn rolling_speed(&self) -> f64 {
        self.speeds.average()
    }

    #[must_use]
    pub const fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Return to the initial state: `Unknown`, no confidence, no history.
    pub fn reset(&mut self) {
        self.estimator.reset();
        self.decision.reset();
        self.speeds.clear();
    }
}

impl Default for ModeDetector {
    fn default() -> Self {
        Self::new(DetectionConfig::default())
    }
}
