//! Trip lifecycle.
//!
//! Opens and closes trips from detected mode changes and the location stream,
//! reduces each trip's samples to its statistics, and keeps a parked-vehicle
//! geofence between trips.

pub mod config;
pub mod error;
pub mod events;
pub mod geofence;
pub mod lifecycle;
pub mod stats;
pub mod summary;
pub mod trip;

pub use config::{GeofenceConfig, LifecycleConfig};
pub use error::*;
pub use events::{
    SampleAppended, TripEnded, TripEvent, TripStarted, VehicleDeparted, VehicleParked,
};
pub use geofence::{Geofence, Region};
pub use lifecycle::{LifecycleState, TripLifecycle};
pub use stats::{Aggregator, TripStats};
pub use summary::{ModeSummary, TripSummary};
pub use trip::Trip;
