use chrono::Duration;
use mode_detection::config::{env_f64, env_secs};

use crate::error::{Error, Result};

/// Tunables for the trip lifecycle controller.
#[derive(Debug, Clone, PartialEq)]
pub struct LifecycleConfig {
    /// Sustained low-speed time after which a trip ends.
    pub stationary_timeout: Duration,
    /// Fixes less accurate than this (metres) never count as movement.
    pub min_accuracy: f64,
    /// Speeds below this (km/h) count as stopped.
    pub low_speed_kmh: f64,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            stationary_timeout: Duration::seconds(300),
            min_accuracy: 20.0,
            low_speed_kmh: 1.0,
        }
    }
}

impl LifecycleConfig {
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            stationary_timeout: env_secs(
                "TRIPTRACK_STATIONARY_TIMEOUT_SECS",
                defaults.stationary_timeout,
            ),
            min_accuracy: env_f64("TRIPTRACK_MIN_ACCURACY_M", defaults.min_accuracy),
            low_speed_kmh: env_f64("TRIPTRACK_LOW_SPEED_KMH", defaults.low_speed_kmh),
        }
    }

    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] for a non-positive timeout, accuracy
    /// or low-speed threshold.
    pub fn validate(&self) -> Result<()> {
        if self.stationary_timeout <= Duration::zero() {
            return Err(Error::InvalidConfig("stationary_timeout must be positive".to_string()));
        }
        if !(self.min_accuracy.is_finite() && self.min_accuracy > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "min_accuracy {} must be positive",
                self.min_accuracy
            )));
        }
        if !(self.low_speed_kmh.is_finite() && self.low_speed_kmh > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "low_speed_kmh {} must be positive",
                self.low_speed_kmh
            )));
        }
        Ok(())
    }
}

/// Parked-vehicle geofence settings.
#[derive(Debug, Clone, PartialEq)]
pub struct GeofenceConfig {
    /// Largest radius of the parked region (metres).
    pub radius: f64,
    /// Smallest radius (metres).
    pub min_radius: f64,
}

impl Default for GeofenceConfig {
    fn default() -> Self {
        Self { radius: 100.0, min_radius: 5.0 }
    }
}

impl GeofenceConfig {
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            radius: env_f64("TRIPTRACK_GEOFENCE_RADIUS_M", defaults.radius),
            min_radius: env_f64("TRIPTRACK_GEOFENCE_MIN_RADIUS_M", defaults.min_radius),
        }
    }

    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] when the radii are not positive or
    /// the minimum exceeds the maximum.
    pub fn validate(&self) -> Result<()> {
        if !(self.min_radius > 0.0 && self.min_radius <= self.radius) {
            return Err(Error::InvalidConfig(format!(
                "geofence radius bounds invalid: min {} max {}",
                self.min_radius, self.radius
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        LifecycleConfig::default().validate().expect("lifecycle defaults");
        GeofenceConfig::default().validate().expect("geofence defaults");
    }

    #[test]
    fn rejects_invalid() {
        let config =
            LifecycleConfig { stationary_timeout: Duration::zero(), ..LifecycleConfig::default() };
        assert!(config.validate().is_err());

        let config = LifecycleConfig { low_speed_kmh: f64::NAN, ..LifecycleConfig::default() };
        assert!(config.validate().is_err());

        let config = GeofenceConfig { radius: 5.0, min_radius: 10.0 };
        assert!(config.validate().is_err());
    }
}
