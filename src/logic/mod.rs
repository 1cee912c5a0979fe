//! Logic Module - Monitoring Pipeline
//!
//! Telemetry → Features → Model → Detector → Imagery, driven by `monitor`.

pub mod config;
pub mod error;

pub mod telemetry;
pub mod features;
pub mod model;
pub mod detector;
pub mod imagery;

pub mod monitor;

#[cfg(test)]
pub(crate) mod http_stub;
