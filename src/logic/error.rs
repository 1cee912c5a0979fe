//! Error taxonomy
//!
//! One error type per pipeline stage. Only `ConfigError` is fatal; the other
//! three are caught at the cycle boundary by the monitor loop.

use thiserror::Error;

/// Telemetry snapshot could not be obtained
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FetchError {
    #[error("telemetry network error: {0}")]
    Network(String),

    #[error("telemetry provider returned status {0}")]
    Status(u16),

    #[error("telemetry response malformed: {0}")]
    Parse(String),

    #[error("telemetry provider error: {0}")]
    Provider(String),

    #[error("telemetry request timed out after {0}s")]
    Timeout(u64),
}

/// Telemetry table has an unusable shape
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DetectionError {
    #[error("required feature column `{0}` is absent from the telemetry schema")]
    MissingColumn(&'static str),

    #[error("outlier model failure: {0}")]
    Model(String),
}

/// Imagery for one anomaly could not be retrieved
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ImageryError {
    #[error("imagery authentication failed: {0}")]
    Auth(String),

    #[error("imagery network error: {0}")]
    Network(String),

    #[error("imagery provider returned status {0}")]
    Status(u16),

    #[error("imagery provider returned no image for the window")]
    Empty,

    #[error("vessel {0} has no usable position")]
    MissingPosition(String),

    #[error("imagery request timed out after {0}s")]
    Timeout(u64),
}

/// Startup configuration is unusable
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),

    #[error("invalid setting {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(var: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid { var, reason: reason.into() }
    }
}
