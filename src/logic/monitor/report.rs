//! Cycle reports
//!
//! What one fetch → detect → correlate pass produced. Built fresh every
//! cycle and handed to the caller; the loop keeps no history.

use chrono::{DateTime, Utc};

use crate::logic::error::{DetectionError, FetchError, ImageryError};
use crate::logic::imagery::{Confirmation, GeoWindow};

/// Loop position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Idle,
    Fetching,
    Detecting,
    /// `current` is 1-based
    Correlating { current: usize, total: usize },
    Sleeping,
    Terminated,
}

/// Retrieved image, summarised after hand-off
#[derive(Debug, Clone, PartialEq)]
pub struct ImageSummary {
    pub bytes: usize,
    pub content_type: String,
    pub confirmation: Confirmation,
}

/// Imagery correlation outcome for one anomalous vessel
#[derive(Debug, Clone, PartialEq)]
pub struct Correlation {
    pub vessel_id: String,
    pub position: Option<(f64, f64)>,
    pub score: f64,
    /// `None` when the vessel had no position to build a window from
    pub window: Option<GeoWindow>,
    pub outcome: Result<ImageSummary, ImageryError>,
}

impl Correlation {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// Telemetry failed; detection and correlation were skipped
    FetchFailed(FetchError),
    /// Detection failed; correlation was skipped
    DetectionFailed(DetectionError),
    /// Detection ran; one entry per anomaly, in detection order
    Completed {
        vessels: usize,
        correlations: Vec<Correlation>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub cycle: u64,
    pub started_at: DateTime<Utc>,
    pub outcome: CycleOutcome,
}

impl CycleReport {
    pub fn correlations(&self) -> &[Correlation] {
        match &self.outcome {
            CycleOutcome::Completed { correlations, .. } => correlations,
            _ => &[],
        }
    }

    pub fn anomaly_count(&self) -> usize {
        self.correlations().len()
    }

    pub fn imagery_failures(&self) -> usize {
        self.correlations().iter().filter(|c| !c.is_success()).count()
    }

    /// Check if the cycle got through detection
    pub fn is_completed(&self) -> bool {
        matches!(self.outcome, CycleOutcome::Completed { .. })
    }
}
