use anyhow::{Context, Result};
use mode_detection::DetectionConfig;
use trip_lifecycle::{GeofenceConfig, LifecycleConfig};

const DEFAULT_QUEUE_CAPACITY: usize = 256;
const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Application configuration, assembled from the per-crate configs.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub detection: DetectionConfig,
    pub lifecycle: LifecycleConfig,
    pub geofence: GeofenceConfig,
    /// Bound of the inbound sample queue.
    pub queue_capacity: usize,
    /// Per-kind capacity of the outbound event channels.
    pub event_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            detection: DetectionConfig::default(),
            lifecycle: LifecycleConfig::default(),
            geofence: GeofenceConfig::default(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl Config {
    /// Load configuration from `TRIPTRACK_*` environment variables, falling
    /// back to defaults for anything unset or unparseable.
    ///
    /// # Errors
    ///
    /// Returns an error when the resulting configuration is inconsistent.
    pub fn from_env() -> Result<Self> {
        let config = Self {
            detection: DetectionConfig::from_env(),
            lifecycle: LifecycleConfig::from_env(),
            geofence: GeofenceConfig::from_env(),
            queue_capacity: env_usize("TRIPTRACK_QUEUE_CAPACITY", DEFAULT_QUEUE_CAPACITY),
            event_capacity: env_usize("TRIPTRACK_EVENT_CAPACITY", DEFAULT_EVENT_CAPACITY),
        };
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns an error naming the first invalid section.
    pub fn validate(&self) -> Result<()> {
        self.detection.validate().context("validating detection config")?;
        self.lifecycle.validate().context("validating lifecycle config")?;
        self.geofence.validate().context("validating geofence config")?;
        anyhow::ensure!(self.queue_capacity > 0, "queue_capacity must be positive");
        anyhow::ensure!(self.event_capacity > 0, "event_capacity must be positive");
        Ok(())
    }
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key).ok().and_then(|value| value.parse::<usize>().ok()).unwrap_or_else(|| {
        tracing::trace!("{key} not set, using default: {default}");
        default
    })
}
