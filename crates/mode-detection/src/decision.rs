//! Mode decision state machine.
//!
//! States mirror [`TransportationMode`]. After every confidence update for the
//! observed mode `m`, the current mode switches to `m` when either
//!
//! - `confidence[m] >= high` and `consecutive[m] >= required` and at least the
//!   dwell time has passed since the last switch, or
//! - `confidence[m] >= medium` and the current mode is `Unknown` and
//!   `consecutive[m] >= required`.
//!
//! The second rule lets a cold start latch quickly; the first guards against
//! flapping between two confident modes, e.g. at traffic lights.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::DetectionConfig;
use crate::mode::TransportationMode;

/// Emitted when the externally visible mode changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModeChanged {
    pub mode: TransportationMode,
    pub previous: TransportationMode,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModeDecision {
    current: TransportationMode,
    last_change: Option<DateTime<Utc>>,
}

impl ModeDecision {
    #[must_use]
    pub const fn new() -> Self {
        Self { current: TransportationMode::Unknown, last_change: None }
    }

    #[must_use]
    pub const fn current(&self) -> TransportationMode {
        self.current
    }

    #[must_use]
    pub const fn last_change(&self) -> Option<DateTime<Utc>> {
        self.last_change
    }

    /// Evaluate the transition rule for the just-observed `mode`.
    ///
    /// Returns the change event when the current mode switched. Re-selecting
    /// the current mode is a no-op and does not restart the dwell timer.
    pub fn evaluate(
        &mut self, mode: TransportationMode, confidence: f64, consecutive: u32,
        now: DateTime<Utc>, config: &DetectionConfig,
    ) -> Option<ModeChanged> {
        if mode == self.current {
            return None;
        }

        let sustained = consecutive >= config.required_consecutive;
        let dwell_elapsed = self.last_change.is_none_or(|last| now - last >= config.dwell_time);

        let confident_switch = confidence >= config.high_confidence && sustained && dwell_elapsed;
        let cold_start = confidence >= config.medium_confidence
            && self.current == TransportationMode::Unknown
            && sustained;

        if !(confident_switch || cold_start) {
            return None;
        }

        let previous = self.current;
        self.current = mode;
        self.last_change = Some(now);

        Some(ModeChanged { mode, previous, timestamp: now })
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}
