use chrono::{DateTime, Duration, TimeZone, Utc};
use mode_detection::{LocationSample, ModeChanged, TransportationMode};
use pretty_assertions::assert_eq;
use trip_lifecycle::{Aggregator, LifecycleState, Trip, TripEvent, TripLifecycle};

const LONGITUDE: f64 = 174.7633;

fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(1_729_670_400, 0).unwrap() + Duration::seconds(secs)
}

fn fix(secs: i64, latitude: f64, speed_kmh: f64) -> LocationSample {
    LocationSample::new(at(secs), latitude, LONGITUDE, 5.0, speed_kmh).expect("valid sample")
}

fn automotive(secs: i64) -> ModeChanged {
    ModeChanged {
        mode: TransportationMode::Automotive,
        previous: TransportationMode::Unknown,
        timestamp: at(secs),
    }
}

fn ended(events: &[TripEvent]) -> Vec<Trip> {
    events
        .iter()
        .filter_map(|event| match event {
            TripEvent::Ended(e) => Some(e.trip.clone()),
            _ => None,
        })
        .collect()
}

fn haversine(lat1: f64, lat2: f64) -> f64 {
    const EARTH_RADIUS: f64 = 6_371_008.8;
    let dlat = (lat2 - lat1).to_radians();
    let a = (dlat / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS * a.sqrt().asin()
}

// Should end the trip exactly once, at the moment the stationary timeout is
// crossed.
#[test]
fn stationary_timeout_ends_once() {
    let mut lifecycle = TripLifecycle::default();
    let mut events = lifecycle.on_mode_change(&automotive(0));

    for secs in 0..=400 {
        events.extend(lifecycle.on_sample(fix(secs, -36.8485, 0.0), None));
    }

    let trips = ended(&events);
    assert_eq!(trips.len(), 1);
    assert_eq!(trips[0].ended_at, Some(at(300)));
    assert_eq!(trips[0].started_at, at(0));
    assert_eq!(events.iter().filter(|e| matches!(e, TripEvent::Parked(_))).count(), 1);
    assert_eq!(lifecycle.state(), LifecycleState::Idle);
}

// Should treat a gap in the sample stream as stationary time.
#[test]
fn gap_counts_as_stationary() {
    let mut lifecycle = TripLifecycle::default();
    lifecycle.on_mode_change(&automotive(0));
    lifecycle.on_sample(fix(10, -36.8485, 40.0), None);

    let events = lifecycle.on_sample(fix(400, -36.8485, 0.0), None);

    let trips = ended(&events);
    assert_eq!(trips.len(), 1);
    assert_eq!(trips[0].ended_at, Some(at(400)));
}

// Should end the trip when a moving fix arrives after a gap longer than the
// stationary timeout, then start a new trip from the parked region.
#[test]
fn gap_then_moving_fix_ends_trip() {
    let mut lifecycle = TripLifecycle::default();
    lifecycle.on_mode_change(&automotive(0));
    let first_id = lifecycle.trip_id();
    for (secs, latitude) in [(10, -36.8485), (20, -36.8474)] {
        lifecycle.on_sample(fix(secs, latitude, 40.0), Some(TransportationMode::Automotive));
    }

    let events = lifecycle.on_sample(fix(1210, -36.8300, 45.0), None);

    let trips = ended(&events);
    assert_eq!(trips.len(), 1);
    assert_eq!(Some(trips[0].id), first_id);
    assert_eq!(trips[0].ended_at, Some(at(1210)));
    assert_eq!(trips[0].mode, TransportationMode::Automotive);
    assert_eq!(trips[0].started_at, at(0));

    assert!(matches!(events[1], TripEvent::Parked(_)));
    assert!(matches!(events[2], TripEvent::Departed(_)));
    assert!(matches!(events[3], TripEvent::Started(_)));
    assert_eq!(lifecycle.state(), LifecycleState::Tracking);
    assert_ne!(lifecycle.trip_id(), first_id);
    assert_eq!(lifecycle.buffered().len(), 1);
}

// Should end the trip from a timestamp alone once the timeout has elapsed.
#[test]
fn tick_ends_trip() {
    let mut lifecycle = TripLifecycle::default();
    lifecycle.on_mode_change(&automotive(0));
    lifecycle.on_sample(fix(10, -36.8485, 40.0), None);

    assert!(lifecycle.on_tick(at(309), None).is_empty());
    assert_eq!(lifecycle.state(), LifecycleState::Tracking);

    let events = lifecycle.on_tick(at(310), None);
    assert_eq!(ended(&events).len(), 1);
    assert!(matches!(events.last(), Some(TripEvent::Parked(_))));
    assert!(lifecycle.on_tick(at(900), None).is_empty());
}

// Should close the trip without a parked signal when tracking is interrupted.
#[test]
fn interrupt_skips_parked() {
    let mut lifecycle = TripLifecycle::default();
    lifecycle.on_mode_change(&automotive(0));
    lifecycle.on_sample(fix(10, -36.8485, 40.0), None);

    let events = lifecycle.interrupt(at(20), None);

    assert_eq!(events.len(), 1);
    assert_eq!(ended(&events)[0].ended_at, Some(at(20)));
    assert!(lifecycle.geofence().region().is_none());
    assert_eq!(lifecycle.state(), LifecycleState::Idle);
}

// Should keep tracking while the vehicle keeps moving.
#[test]
fn movement_extends_trip() {
    let mut lifecycle = TripLifecycle::default();
    let mut events = lifecycle.on_mode_change(&automotive(0));

    for minute in 0..20 {
        let speed = if minute % 4 == 3 { 0.0 } else { 35.0 };
        events.extend(lifecycle.on_sample(fix(minute * 60, -36.8485, speed), None));
    }

    assert!(ended(&events).is_empty());
    assert_eq!(lifecycle.state(), LifecycleState::Tracking);
    assert_eq!(lifecycle.buffered().len(), 20);
}

// Should compute straight-line distance within 1% of the great-circle value.
#[test]
fn straight_line_distance() {
    let trip = Trip::start(at(0));
    let samples: Vec<_> = (0..=10_i32)
        .map(|i| fix(i64::from(i) * 60, (-0.01_f64).mul_add(f64::from(i), -36.80), 50.0))
        .collect();

    let finished = Aggregator::default().finalize(&trip, &samples, at(600), None);

    let expected = haversine(-36.80, -36.90);
    assert!((finished.distance - expected).abs() / expected < 0.01);
    assert_eq!(finished.mode, TransportationMode::Automotive);
    assert_eq!(finished.id, trip.id);
}

// Should produce identical output for identical or reordered input.
#[test]
fn finalize_is_idempotent() {
    let trip = Trip::start(at(0));
    let samples: Vec<_> = [5.0, 12.0, 0.0, 18.0, 22.0, 9.0]
        .iter()
        .zip(0_i32..)
        .map(|(speed, i)| fix(i64::from(i) * 30, (-0.001_f64).mul_add(f64::from(i), -36.8), *speed))
        .collect();
    let aggregator = Aggregator::default();

    let first = aggregator.finalize(&trip, &samples, at(180), None);
    let second = aggregator.finalize(&trip, &samples, at(180), None);
    assert_eq!(first, second);

    let mut reversed = samples;
    reversed.reverse();
    let third = aggregator.finalize(&trip, &reversed, at(180), None);
    assert!((first.distance - third.distance).abs() < 1e-6);
    assert_eq!(first.mode, third.mode);
    assert_eq!(first.mode, TransportationMode::Cycling);
}

// Should yield zeros and Unknown for an empty buffer.
#[test]
fn empty_finalize() {
    let trip = Trip::start(at(0));
    let finished =
        Aggregator::default().finalize(&trip, &[], at(60), Some(TransportationMode::Automotive));

    assert_eq!(finished.ended_at, Some(at(60)));
    assert!(finished.distance.abs() < f64::EPSILON);
    assert!(finished.average_speed.abs() < f64::EPSILON);
    assert!(finished.max_speed.abs() < f64::EPSILON);
    assert_eq!(finished.mode, TransportationMode::Unknown);
}

// Should close an open trip with what has been buffered so far.
#[test]
fn flush_open_trip() {
    let mut lifecycle = TripLifecycle::default();
    lifecycle.on_mode_change(&automotive(0));
    for secs in [10, 20, 30] {
        lifecycle.on_sample(fix(secs, -36.8485, 40.0), None);
    }

    let events = lifecycle.flush(at(45), Some(TransportationMode::Automotive));

    let trips = ended(&events);
    assert_eq!(trips.len(), 1);
    assert_eq!(trips[0].ended_at, Some(at(45)));
    assert_eq!(trips[0].mode, TransportationMode::Automotive);
    assert!(matches!(events.last(), Some(TripEvent::Parked(p)) if (p.radius - 5.0).abs() < 1e-9));
    assert!(lifecycle.flush(at(50), None).is_empty());
}

// Should start a new trip when the device leaves the parked region.
#[test]
fn departure_starts_trip() {
    let mut lifecycle = TripLifecycle::default();
    lifecycle.on_mode_change(&automotive(0));
    lifecycle.on_sample(fix(10, -36.8485, 40.0), None);
    lifecycle.flush(at(20), None);
    assert!(lifecycle.geofence().region().is_some());

    // still parked
    assert!(lifecycle.on_sample(fix(100, -36.8485, 0.0), None).is_empty());

    let events = lifecycle.on_sample(fix(200, -36.8465, 4.0), None);

    assert_eq!(events.len(), 3);
    assert!(matches!(events[0], TripEvent::Departed(_)));
    assert!(matches!(events[1], TripEvent::Started(_)));
    assert!(matches!(events[2], TripEvent::SampleAppended(_)));
    assert_eq!(lifecycle.state(), LifecycleState::Tracking);
    assert!(lifecycle.geofence().region().is_none());
    assert_eq!(lifecycle.current_trip().map(|trip| trip.started_at), Some(at(200)));
}

// Should classify the trip by the mode detected while it was still moving.
#[test]
fn classified_by_moving_mode() {
    let mut lifecycle = TripLifecycle::default();
    lifecycle.on_mode_change(&automotive(0));
    for secs in [10, 20, 30] {
        lifecycle.on_sample(fix(secs, -36.8485, 45.0), Some(TransportationMode::Automotive));
    }

    let mut events = Vec::new();
    for secs in (40..=330).step_by(10) {
        let live_mode = Some(TransportationMode::Walking);
        events.extend(lifecycle.on_sample(fix(secs, -36.8485, 0.0), live_mode));
    }

    let trips = ended(&events);
    assert_eq!(trips.len(), 1);
    assert_eq!(trips[0].ended_at, Some(at(330)));
    assert_eq!(trips[0].mode, TransportationMode::Automotive);
}
