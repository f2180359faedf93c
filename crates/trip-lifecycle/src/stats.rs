//! # Trip Statistics
//!
//! Reduces the location samples buffered during a trip to its final
//! distance, speeds and mode.

use chrono::{DateTime, Utc};
use geo::{Distance, Haversine, Point};
use mode_detection::{LocationSample, SpeedBounds, TransportationMode};

use crate::trip::Trip;

/// Confidence assigned when the live mode disagrees with the trip profile.
const OVERRIDE_CONFIDENCE: f64 = 0.2;

/// Raw figures computed from one trip's samples.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TripStats {
    /// Metres.
    pub distance: f64,
    pub average_speed: f64,
    pub max_speed: f64,
    /// 75th percentile of positive speeds, if there were any.
    pub percentile_speed: Option<f64>,
}

impl TripStats {
    /// Compute statistics over `samples`, which need not be in order.
    /// Fewer than two samples yields all zeros.
    #[must_use]
    pub fn compute(samples: &[LocationSample]) -> Self {
        if samples.len() < 2 {
            return Self::default();
        }

        let mut sorted = samples.to_vec();
        sorted.sort_by_key(LocationSample::timestamp);

        let distance = sorted.windows(2).map(|w| haversine_distance(&w[0], &w[1])).sum();

        let mut speeds: Vec<f64> =
            sorted.iter().map(LocationSample::speed_kmh).filter(|s| *s > 0.0).collect();
        if speeds.is_empty() {
            return Self { distance, ..Self::default() };
        }
        speeds.sort_by(f64::total_cmp);

        #[allow(clippy::cast_precision_loss)]
        let average_speed = speeds.iter().sum::<f64>() / speeds.len() as f64;
        let max_speed = speeds.last().copied().unwrap_or_default();
        let percentile_speed = speeds.get(speeds.len() * 3 / 4).copied();

        Self { distance, average_speed, max_speed, percentile_speed }
    }
}

/// Finalizes trips using the configured mode boundaries.
#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    bounds: SpeedBounds,
}

impl Aggregator {
    #[must_use]
    pub const fn new(bounds: SpeedBounds) -> Self {
        Self { bounds }
    }

    /// Produce the finished version of `trip` from its samples.
    ///
    /// The final mode is `live_mode` when one is supplied and known, otherwise
    /// the percentile speed classified by range. Fewer than two samples always
    /// yields zeros and [`TransportationMode::Unknown`].
    #[must_use]
    pub fn finalize(
        &self, trip: &Trip, samples: &[LocationSample], ended_at: DateTime<Utc>,
        live_mode: Option<TransportationMode>,
    ) -> Trip {
        let mut finished = Trip {
            ended_at: Some(ended_at),
            distance: 0.0,
            average_speed: 0.0,
            max_speed: 0.0,
            mode: TransportationMode::Unknown,
            confidence: 0.0,
            ..trip.clone()
        };
        if samples.len() < 2 {
            return finished;
        }

        let stats = TripStats::compute(samples);
        let fallback =
            stats.percentile_speed.map_or(TransportationMode::Unknown, |s| self.bounds.classify(s));
        let mode = match live_mode {
            Some(live) if live != TransportationMode::Unknown => live,
            _ => fallback,
        };

        let (profile_mode, profile_confidence) = TransportationMode::detect_with_confidence(
            stats.average_speed,
            stats.max_speed,
            ended_at - trip.started_at,
        );
        let confidence =
            if profile_mode == mode { profile_confidence } else { OVERRIDE_CONFIDENCE };

        finished.distance = stats.distance;
        finished.average_speed = stats.average_speed;
        finished.max_speed = stats.max_speed;
        finished.mode = mode;
        finished.confidence = confidence;
        finished
    }
}

fn haversine_distance(from: &LocationSample, to: &LocationSample) -> f64 {
    let from = Point::new(from.longitude(), from.latitude());
    let to = Point::new(to.longitude(), to.latitude());
    Haversine::distance(from, to)
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_729_670_400, 0).unwrap() + Duration::seconds(secs)
    }

    fn sample(secs: i64, latitude: f64, speed_kmh: f64) -> LocationSample {
        LocationSample::new(at(secs), latitude, 174.7633, 5.0, speed_kmh).expect("valid sample")
    }

    #[test]
    fn percentile_index() {
        let samples: Vec<_> =
            [10.0, 20.0, 30.0, 40.0].iter().zip(0..).map(|(s, i)| sample(i, -36.8, *s)).collect();
        let stats = TripStats::compute(&samples);

        assert_eq!(stats.percentile_speed, Some(40.0));
        assert!((stats.average_speed - 25.0).abs() < 1e-9);
        assert!((stats.max_speed - 40.0).abs() < f64::EPSILON);
    }

    #[test]
    fn ignores_stopped_samples() {
        let samples = [sample(0, -36.8, 0.0), sample(1, -36.8, 12.0), sample(2, -36.8, 0.0)];
        let stats = TripStats::compute(&samples);

        assert!((stats.average_speed - 12.0).abs() < f64::EPSILON);
        assert_eq!(stats.percentile_speed, Some(12.0));
    }

    #[test]
    fn all_stopped() {
        let samples = [sample(0, -36.8, 0.0), sample(60, -36.801, 0.0)];
        let stats = TripStats::compute(&samples);

        assert!(stats.distance > 0.0);
        assert_eq!(stats.percentile_speed, None);
        assert!(stats.max_speed.abs() < f64::EPSILON);
    }

    #[test]
    fn live_mode_overrides() {
        let trip = Trip::start(at(0));
        let samples: Vec<_> = (0..10_i32)
            .map(|i| sample(i64::from(i) * 60, -0.01_f64.mul_add(f64::from(i), -36.8), 50.0))
            .collect();
        let aggregator = Aggregator::default();

        let fallback = aggregator.finalize(&trip, &samples, at(600), None);
        assert_eq!(fallback.mode, TransportationMode::Automotive);
        assert!((fallback.confidence - 0.96).abs() < 1e-9);

        let unknown =
            aggregator.finalize(&trip, &samples, at(600), Some(TransportationMode::Unknown));
        assert_eq!(unknown.mode, TransportationMode::Automotive);

        let walking =
            aggregator.finalize(&trip, &samples, at(600), Some(TransportationMode::Walking));
        assert_eq!(walking.mode, TransportationMode::Walking);
        assert!((walking.confidence - OVERRIDE_CONFIDENCE).abs() < f64::EPSILON);
    }
}
