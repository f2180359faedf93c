//! # Trip Tracking
//!
//! Automatic trip tracking from a merged stream of location fixes, motion
//! activity and sensor status updates.
//!
//! An [`AppContext`] holds the configuration and the outbound [`EventBus`].
//! Starting it spawns a dispatcher task that feeds every record through the
//! mode detector and the trip lifecycle, publishing mode changes, trip
//! starts and ends, and parked-vehicle signals as they occur.

pub mod bus;
pub mod config;
pub mod dispatcher;
pub mod monitor;

pub use bus::EventBus;
pub use config::Config;
pub use dispatcher::{
    Dispatcher, Inbound, SensorStatus, StatusChanged, StatusUpdate, TrackingStatus,
};
pub use monitor::{AppContext, Monitor, MonitorHandle};
pub use {mode_detection, trip_lifecycle};
