//! Vessel Watch - AIS anomaly monitor
//!
//! Polls fleet telemetry, flags statistically unusual vessels with a
//! per-snapshot isolation forest and pulls a satellite image of each
//! flagged position.

pub mod constants;
pub mod logic;

pub use logic::config::MonitorConfig;
pub use logic::detector::{AnomalyDetector, AnomalyLabel, LabeledRecord};
pub use logic::imagery::{GeoWindow, ImageryCorrelator, SentinelHubClient};
pub use logic::monitor::{CycleReport, MonitorLoop, MonitorState};
pub use logic::telemetry::{MarineTrafficClient, TelemetryRecord, TelemetryTable};
