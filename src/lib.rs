//! IoT energy monitor.
//!
//! REST backend for sensors and time-stamped energy readings, plus a
//! day-ahead load forecast built by chaining single-step calls to an
//! external prediction service.

pub mod analytics;
pub mod api;
pub mod config;
pub mod domain;
pub mod forecast;
pub mod repo;
pub mod state;
pub mod telemetry;
