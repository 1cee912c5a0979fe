//! Imagery Module - Satellite Image Correlation
//!
//! - `geo.rs`: BoundingBox / TimeRange / GeoWindow
//! - `client.rs`: Sentinel Hub HTTP adapter
//! - `confirm.rs`: image-based confirmation extension point

pub mod client;
pub mod confirm;
pub mod geo;

pub use client::SentinelHubClient;
pub use confirm::{Confirmation, ImageConfirmer, Unevaluated};
pub use geo::{BoundingBox, GeoWindow, TimeRange};

use crate::logic::error::ImageryError;

/// One fetched image. Handed off once, never cached.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageryResult {
    pub window: GeoWindow,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageryResult {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Provider of imagery for a window (most recent scene first)
#[allow(async_fn_in_trait)]
pub trait ImagerySource {
    async fn fetch(&self, window: &GeoWindow) -> Result<ImageryResult, ImageryError>;
}

impl<S: ImagerySource + ?Sized> ImagerySource for &S {
    async fn fetch(&self, window: &GeoWindow) -> Result<ImageryResult, ImageryError> {
        (**self).fetch(window).await
    }
}

/// Derives the window around an anomaly and asks the source for one image
pub struct ImageryCorrelator<S> {
    source: S,
    padding_deg: f64,
}

impl<S: ImagerySource> ImageryCorrelator<S> {
    pub fn new(source: S, padding_deg: f64) -> Self {
        Self { source, padding_deg }
    }

    /// Padded window around `point` = `(lat, lon)`
    pub fn window_for(&self, point: (f64, f64), time_range: TimeRange) -> GeoWindow {
        GeoWindow::around(point, self.padding_deg, time_range)
    }

    /// Fetch the most recent image covering `point` within `time_range`
    pub async fn fetch(
        &self,
        point: (f64, f64),
        time_range: TimeRange,
    ) -> Result<ImageryResult, ImageryError> {
        let window = self.window_for(point, time_range);
        let image = self.source.fetch(&window).await?;
        if image.is_empty() {
            return Err(ImageryError::Empty);
        }
        Ok(image)
    }
}
