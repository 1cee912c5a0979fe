//! Feature Layout - Centralized Feature Definition
//!
//! Column order here is the column order of every feature matrix.
//! Adding or reordering features changes what the outlier model sees.

pub const COL_LAT: &str = "LAT";
pub const COL_LON: &str = "LON";
pub const COL_SPEED: &str = "SPEED";
pub const COL_COURSE: &str = "COURSE";

/// Feature columns in exact matrix order
pub const FEATURE_LAYOUT: &[&str] = &[
    COL_LAT,    // 0: latitude, degrees
    COL_LON,    // 1: longitude, degrees
    COL_SPEED,  // 2: speed, provider units
    COL_COURSE, // 3: course over ground, degrees
];

/// Total number of features
/// IMPORTANT: Must match FEATURE_LAYOUT.len()!
pub const FEATURE_COUNT: usize = 4;

/// Imputed value when a feature is missing on every row of a snapshot
pub const FEATURE_FALLBACK: [f64; FEATURE_COUNT] = [
    0.0,   // equator
    0.0,   // prime meridian
    0.0,   // stationary
    180.0, // midpoint of 0-360
];

/// Index of a feature by column name
pub fn feature_index(name: &str) -> Option<usize> {
    FEATURE_LAYOUT.iter().position(|&n| n == name)
}
