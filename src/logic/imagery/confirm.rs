//! Image-based confirmation hook
//!
//! Retrieved imagery is handed to an `ImageConfirmer` before it is dropped.
//! No image analysis ships with the crate; plug one in here.

use serde::{Deserialize, Serialize};

use crate::logic::detector::LabeledRecord;

use super::ImageryResult;

/// Verdict of an image check on one anomaly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confirmation {
    /// Image was not analysed
    Unevaluated,
    /// Image supports the telemetry anomaly
    Confirmed,
    /// Image contradicts the telemetry anomaly
    Rejected,
}

pub trait ImageConfirmer {
    fn confirm(&self, anomaly: &LabeledRecord, image: &ImageryResult) -> Confirmation;
}

/// Default confirmer: never evaluates
#[derive(Debug, Clone, Copy, Default)]
pub struct Unevaluated;

impl ImageConfirmer for Unevaluated {
    fn confirm(&self, _anomaly: &LabeledRecord, _image: &ImageryResult) -> Confirmation {
        Confirmation::Unevaluated
    }
}

impl<F> ImageConfirmer for F
where
    F: Fn(&LabeledRecord, &ImageryResult) -> Confirmation,
{
    fn confirm(&self, anomaly: &LabeledRecord, image: &ImageryResult) -> Confirmation {
        self(anomaly, image)
    }
}
