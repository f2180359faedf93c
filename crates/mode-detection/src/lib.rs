//! Transportation mode detection.
//!
//! Raw location fixes and motion activity tuples are normalized into samples,
//! folded into per-mode running confidences, and passed through a decision
//! state machine that reports when the current mode changes.

pub mod config;
pub mod decision;
pub mod detector;
pub mod error;
pub mod estimator;
pub mod mode;
pub mod sample;

pub use config::DetectionConfig;
pub use decision::{ModeChanged, ModeDecision};
pub use detector::ModeDetector;
pub use error::*;
pub use estimator::{ConfidenceEstimator, Observation};
pub use mode::{SpeedBounds, TransportationMode};
pub use sample::{
    Activity, ConfidenceTier, LocationFix, LocationSample, MotionActivity, MotionSample, Sample,
    SpeedWindow,
};
