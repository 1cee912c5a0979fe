//! Geographic window types
//!
//! A GeoWindow is a padded bounding box around one anomaly position plus the
//! process-wide satellite time range.

use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::MAX_IMAGE_DIMENSION;

/// Meters per degree of latitude (mean)
const METERS_PER_DEG_LAT: f64 = 110_574.0;
/// Meters per degree of longitude at the equator
const METERS_PER_DEG_LON: f64 = 111_320.0;

/// Acquisition time interval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, String> {
        if start >= end {
            return Err(format!("start {} is not before end {}", start, end));
        }
        Ok(Self { start, end })
    }

    /// Parse `start/end`. Each side is RFC 3339, a naive
    /// `YYYY-MM-DDTHH:MM:SS` (read as UTC) or a bare date.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let (start, end) = raw
            .split_once('/')
            .ok_or_else(|| format!("`{}` is not in start/end form", raw))?;

        Self::new(parse_instant(start)?, parse_instant(end)?)
    }

    pub fn start_rfc3339(&self) -> String {
        self.start.to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    pub fn end_rfc3339(&self) -> String {
        self.end.to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.start_rfc3339(), self.end_rfc3339())
    }
}

fn parse_instant(raw: &str) -> Result<DateTime<Utc>, String> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Ok(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| format!("cannot parse timestamp `{}`", raw))
}

/// Rectangle in EPSG:4326 degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub lon_min: f64,
    pub lat_min: f64,
    pub lon_max: f64,
    pub lat_max: f64,
}

impl BoundingBox {
    /// Square box of `padding` degrees on each side of `(lat, lon)`
    pub fn around(lat: f64, lon: f64, padding: f64) -> Self {
        Self {
            lon_min: lon - padding,
            lat_min: lat - padding,
            lon_max: lon + padding,
            lat_max: lat + padding,
        }
    }

    /// `[lon_min, lat_min, lon_max, lat_max]`
    pub fn as_array(&self) -> [f64; 4] {
        [self.lon_min, self.lat_min, self.lon_max, self.lat_max]
    }

    /// `(lat, lon)` of the box center
    pub fn center(&self) -> (f64, f64) {
        (
            (self.lat_min + self.lat_max) / 2.0,
            (self.lon_min + self.lon_max) / 2.0,
        )
    }

    /// Image size in pixels for a ground resolution in meters per pixel,
    /// clamped to what the process API accepts.
    pub fn pixel_dimensions(&self, resolution_m: f64) -> (u32, u32) {
        let (lat_center, _) = self.center();
        let width_m =
            (self.lon_max - self.lon_min) * METERS_PER_DEG_LON * lat_center.to_radians().cos();
        let height_m = (self.lat_max - self.lat_min) * METERS_PER_DEG_LAT;

        (to_pixels(width_m, resolution_m), to_pixels(height_m, resolution_m))
    }
}

fn to_pixels(extent_m: f64, resolution_m: f64) -> u32 {
    let pixels = (extent_m.abs() / resolution_m).round();
    pixels.clamp(1.0, MAX_IMAGE_DIMENSION as f64) as u32
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:.4}, {:.4}, {:.4}, {:.4}]",
            self.lon_min, self.lat_min, self.lon_max, self.lat_max
        )
    }
}

/// Region + time range for one imagery request
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoWindow {
    pub bbox: BoundingBox,
    pub time_range: TimeRange,
}

impl GeoWindow {
    pub fn around(point: (f64, f64), padding: f64, time_range: TimeRange) -> Self {
        let (lat, lon) = point;
        Self {
            bbox: BoundingBox::around(lat, lon, padding),
            time_range,
        }
    }
}

impl fmt::Display for GeoWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {}", self.bbox, self.time_range)
    }
}
