//! MarineTraffic API Client
//!
//! HTTP client for the fleet telemetry snapshot. One request per call,
//! no internal retry.

use std::time::Duration;

use crate::logic::config::TelemetryConfig;
use crate::logic::error::FetchError;

use super::record::TelemetryTable;
use super::TelemetrySource;

/// Telemetry snapshot fetcher backed by the MarineTraffic export API
pub struct MarineTrafficClient {
    config: TelemetryConfig,
    http_client: reqwest::Client,
}

impl MarineTrafficClient {
    /// Create new telemetry client
    pub fn new(config: TelemetryConfig) -> Result<Self, FetchError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        Ok(Self { config, http_client })
    }

    /// Endpoint URL (embeds the API key, so never log it)
    fn export_url(&self) -> String {
        format!(
            "{}/api/exportvessels/v:2/{}/protocol:jsono",
            self.config.base_url, self.config.api_key
        )
    }
}

impl TelemetrySource for MarineTrafficClient {
    async fn fetch(&self) -> Result<TelemetryTable, FetchError> {
        let response = self
            .http_client
            .get(self.export_url())
            .send()
            .await
            .map_err(|e| map_transport_error(e, self.config.timeout))?;

        let status = response.status();
        if !status.is_success() {
            log::debug!("Telemetry provider responded {}", status);
            return Err(FetchError::Status(status.as_u16()));
        }

        let payload: serde_json::Value = response
            .json()
            .await
            .map_err(|e| FetchError::Parse(e.to_string()))?;

        let table = TelemetryTable::from_json(payload)?;
        log::debug!("Telemetry snapshot: {} vessels", table.len());
        Ok(table)
    }
}

fn map_transport_error(err: reqwest::Error, timeout: Duration) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout(timeout.as_secs())
    } else {
        // Strip the URL: it carries the API key
        FetchError::Network(err.without_url().to_string())
    }
}
