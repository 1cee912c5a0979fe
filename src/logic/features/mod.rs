//! Features Module - Feature Selection & Imputation
//!
//! Turns a telemetry snapshot into the numeric matrix the outlier model fits on.

pub mod layout;
pub mod matrix;


pub use layout::{FEATURE_COUNT, FEATURE_LAYOUT};
pub use matrix::FeatureMatrix;
