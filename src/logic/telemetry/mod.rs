//! Telemetry Module - Fleet Snapshot Acquisition
//!
//! - `record.rs`: TelemetryRecord / TelemetryTable and payload parsing
//! - `client.rs`: MarineTraffic HTTP adapter

pub mod client;
pub mod record;

pub use client::MarineTrafficClient;
pub use record::{TelemetryRecord, TelemetryTable};

use crate::logic::error::FetchError;

/// Source of fleet telemetry snapshots
#[allow(async_fn_in_trait)]
pub trait TelemetrySource {
    /// Fetch the current snapshot. Never returns a partially-parsed table.
    async fn fetch(&self) -> Result<TelemetryTable, FetchError>;
}

impl<S: TelemetrySource + ?Sized> TelemetrySource for &S {
    async fn fetch(&self) -> Result<TelemetryTable, FetchError> {
        (**self).fetch().await
    }
}
