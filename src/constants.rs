//! Central Configuration Constants
//!
//! Single source of truth for all configuration defaults.
//! Environment variable names live here too so `config.rs` and the docs agree.

/// Default MarineTraffic API root
pub const DEFAULT_TELEMETRY_URL: &str = "https://services.marinetraffic.com";

/// Default Sentinel Hub API root (token + process endpoints)
pub const DEFAULT_IMAGERY_URL: &str = "https://services.sentinel-hub.com";

/// Default poll interval (seconds)
pub const DEFAULT_POLL_INTERVAL: u64 = 600;

/// Default satellite time window, `start/end`
pub const DEFAULT_TIME_WINDOW: &str = "2024-01-01T00:00:00/2024-01-31T23:59:59";

/// Default bounding box padding around an anomaly (degrees)
pub const DEFAULT_BBOX_PADDING: f64 = 0.1;

/// Default ground resolution (meters per pixel)
pub const DEFAULT_RESOLUTION: f64 = 10.0;

/// Default expected outlier fraction
pub const DEFAULT_CONTAMINATION: f64 = 0.1;

/// Default number of isolation trees per fit
pub const DEFAULT_FOREST_TREES: usize = 100;

/// Default sub-sample size per tree
pub const DEFAULT_FOREST_SAMPLE_SIZE: usize = 256;

/// Default timeout for a single provider call (seconds)
pub const DEFAULT_REQUEST_TIMEOUT: u64 = 30;

/// Largest image side the process API accepts (pixels)
pub const MAX_IMAGE_DIMENSION: u32 = 2500;

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// App name
pub const APP_NAME: &str = "Vessel Watch";

// ============================================
// Environment variable names
// ============================================

pub const ENV_TELEMETRY_API_KEY: &str = "MARINETRAFFIC_API_KEY";
pub const ENV_TELEMETRY_URL: &str = "MARINETRAFFIC_BASE_URL";
pub const ENV_IMAGERY_CLIENT_ID: &str = "SENTINELHUB_CLIENT_ID";
pub const ENV_IMAGERY_CLIENT_SECRET: &str = "SENTINELHUB_CLIENT_SECRET";
pub const ENV_IMAGERY_URL: &str = "SENTINELHUB_BASE_URL";
pub const ENV_POLL_INTERVAL: &str = "POLL_INTERVAL_SECS";
pub const ENV_TIME_WINDOW: &str = "SATELLITE_TIME_WINDOW";
pub const ENV_BBOX_PADDING: &str = "BBOX_PADDING_DEG";
pub const ENV_RESOLUTION: &str = "IMAGERY_RESOLUTION_M";
pub const ENV_CONTAMINATION: &str = "CONTAMINATION";
pub const ENV_FOREST_TREES: &str = "FOREST_TREES";
pub const ENV_FOREST_SAMPLE_SIZE: &str = "FOREST_SAMPLE_SIZE";
pub const ENV_FOREST_SEED: &str = "FOREST_SEED";
pub const ENV_REQUEST_TIMEOUT: &str = "REQUEST_TIMEOUT_SECS";
