use std::env;

use chrono::Duration;

use crate::error::{Error, Result};
use crate::mode::SpeedBounds;

/// Tunables for the confidence estimator and the mode decision state machine.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionConfig {
    pub speed_bounds: SpeedBounds,
    /// Confidence required to switch between two already-known modes.
    pub high_confidence: f64,
    /// Confidence required to latch a first mode from `Unknown`.
    pub medium_confidence: f64,
    /// Multiplier applied to non-observed modes after every update.
    pub decay_factor: f64,
    pub required_consecutive: u32,
    /// Minimum time between accepted mode switches.
    pub dwell_time: Duration,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            speed_bounds: SpeedBounds::default(),
            high_confidence: 0.8,
            medium_confidence: 0.5,
            decay_factor: 0.9,
            required_consecutive: 3,
            dwell_time: Duration::seconds(10),
        }
    }
}

impl DetectionConfig {
    /// Load settings from `TRIPTRACK_*` environment variables, falling back to
    /// defaults for anything unset or unparsable.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let speed_bounds = SpeedBounds {
            walking_max: env_f64("TRIPTRACK_WALKING_MAX_KMH", defaults.speed_bounds.walking_max),
            cycling_max: env_f64("TRIPTRACK_CYCLING_MAX_KMH", defaults.speed_bounds.cycling_max),
            automotive_max: env_f64(
                "TRIPTRACK_AUTOMOTIVE_MAX_KMH",
                defaults.speed_bounds.automotive_max,
            ),
        };

        Self {
            speed_bounds,
            high_confidence: env_f64("TRIPTRACK_HIGH_CONFIDENCE", defaults.high_confidence),
            medium_confidence: env_f64("TRIPTRACK_MEDIUM_CONFIDENCE", defaults.medium_confidence),
            decay_factor: env_f64("TRIPTRACK_DECAY_FACTOR", defaults.decay_factor),
            required_consecutive: env_u32(
                "TRIPTRACK_REQUIRED_CONSECUTIVE",
                defaults.required_consecutive,
            ),
            dwell_time: env_secs("TRIPTRACK_MODE_DWELL_SECS", defaults.dwell_time),
        }
    }

    /// Check the settings are internally consistent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] describing the first offending value.
    pub fn validate(&self) -> Result<()> {
        let bounds = &self.speed_bounds;
        if !(0.0 < bounds.walking_max
            && bounds.walking_max < bounds.cycling_max
            && bounds.cycling_max < bounds.automotive_max)
        {
            return Err(Error::InvalidConfig(format!(
                "speed bounds must be strictly increasing: {bounds:?}"
            )));
        }
        for (name, value) in
            [("high_confidence", self.high_confidence), ("medium_confidence", self.medium_confidence)]
        {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::InvalidConfig(format!("{name} {value} outside [0, 1]")));
            }
        }
        if self.medium_confidence > self.high_confidence {
            return Err(Error::InvalidConfig(
                "medium_confidence exceeds high_confidence".to_string(),
            ));
        }
        if !(self.decay_factor > 0.0 && self.decay_factor <= 1.0) {
            return Err(Error::InvalidConfig(format!(
                "decay_factor {} outside (0, 1]",
                self.decay_factor
            )));
        }
        if self.required_consecutive == 0 {
            return Err(Error::InvalidConfig("required_consecutive must be at least 1".to_string()));
        }
        if self.dwell_time < Duration::zero() {
            return Err(Error::InvalidConfig("dwell_time must not be negative".to_string()));
        }
        Ok(())
    }
}

/// Read a float from the environment, or `default` when unset or invalid.
#[must_use]
pub fn env_f64(key: &str, default: f64) -> f64 {
    env::var(key).ok().and_then(|value| value.parse::<f64>().ok()).unwrap_or(default)
}

/// Read an unsigned integer from the environment, or `default`.
#[must_use]
pub fn env_u32(key: &str, default: u32) -> u32 {
    env::var(key).ok().and_then(|value| value.parse::<u32>().ok()).unwrap_or(default)
}

/// Read a whole number of seconds from the environment, or `default`.
#[must_use]
pub fn env_secs(key: &str, default: Duration) -> Duration {
    env::var(key)
        .ok()
        .and_then(|value| value.parse::<i64>().ok())
        .map_or(default, Duration::seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        DetectionConfig::default().validate().expect("defaults should validate");
    }

    #[test]
    fn rejects_overlapping_bounds() {
        let mut config = DetectionConfig::default();
        config.speed_bounds.cycling_max = 5.0;
        let Err(err) = config.validate() else {
            panic!("should reject bounds");
        };
        assert_eq!(err.code(), "invalid_config");
    }

    #[test]
    fn rejects_thresholds() {
        let config = DetectionConfig { high_confidence: 1.5, ..DetectionConfig::default() };
        assert!(config.validate().is_err());

        let config = DetectionConfig { medium_confidence: 0.9, ..DetectionConfig::default() };
        assert!(config.validate().is_err());

        let config = DetectionConfig { decay_factor: 0.0, ..DetectionConfig::default() };
        assert!(config.validate().is_err());

        let config = DetectionConfig { required_consecutive: 0, ..DetectionConfig::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn env_fallback() {
        assert!((env_f64("TRIPTRACK_TEST_UNSET_FLOAT", 0.25) - 0.25).abs() < f64::EPSILON);
        assert_eq!(env_u32("TRIPTRACK_TEST_UNSET_INT", 7), 7);
        assert_eq!(env_secs("TRIPTRACK_TEST_UNSET_SECS", Duration::seconds(3)), Duration::seconds(3));
    }
}
