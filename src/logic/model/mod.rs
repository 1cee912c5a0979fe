//! Model Module - Outlier Scoring
//!
//! Per-cycle model: fit, score, decide, discard.

pub mod isolation_forest;
pub mod threshold;

pub use isolation_forest::IsolationForest;
pub use threshold::ContaminationThreshold;
