//! Sentinel Hub API Client
//!
//! OAuth client-credentials token + Process API request for the most recent
//! Sentinel-2 L1C scene covering a GeoWindow.

use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::json;

use crate::logic::config::ImageryConfig;
use crate::logic::error::ImageryError;

use super::geo::GeoWindow;
use super::{ImageryResult, ImagerySource};

const TOKEN_PATH: &str = "/auth/realms/main/protocol/openid-connect/token";
const PROCESS_PATH: &str = "/api/v1/process";
const CRS_WGS84: &str = "http://www.opengis.net/def/crs/EPSG/0/4326";
const DATA_COLLECTION: &str = "sentinel-2-l1c";
const OUTPUT_FORMAT: &str = "image/tiff";
/// Refresh tokens this long before the provider says they expire
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

const TRUE_COLOR_EVALSCRIPT: &str = r#"//VERSION=3
function setup() {
  return {
    input: ["B02", "B03", "B04"],
    output: { bands: 3 }
  };
}

function evaluatePixel(sample) {
  return [2.5 * sample.B04, 2.5 * sample.B03, 2.5 * sample.B02];
}
"#;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Clone)]
struct AccessToken {
    value: String,
    expires_at: Instant,
}

/// Imagery source backed by the Sentinel Hub Process API
pub struct SentinelHubClient {
    config: ImageryConfig,
    http_client: reqwest::Client,
    token: Mutex<Option<AccessToken>>,
}

impl SentinelHubClient {
    /// Create new imagery client
    pub fn new(config: ImageryConfig) -> Result<Self, ImageryError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ImageryError::Network(e.to_string()))?;

        Ok(Self {
            config,
            http_client,
            token: Mutex::new(None),
        })
    }

    /// Cached bearer token, refreshed when close to expiry
    async fn access_token(&self) -> Result<String, ImageryError> {
        if let Some(token) = self.token.lock().as_ref() {
            if Instant::now() < token.expires_at {
                return Ok(token.value.clone());
            }
        }

        let url = format!("{}{}", self.config.base_url, TOKEN_PATH);
        let response = self
            .http_client
            .post(&url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
            ])
            .send()
            .await
            .map_err(|e| map_transport_error(e, self.config.timeout))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let error_text = response.text().await.unwrap_or_default();
            log::debug!("Token request failed ({}): {}", status, error_text);
            return Err(ImageryError::Auth(format!("token endpoint returned {}", status)));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| ImageryError::Auth(e.to_string()))?;

        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(TOKEN_EXPIRY_MARGIN);
        *self.token.lock() = Some(AccessToken {
            value: token.access_token.clone(),
            expires_at: Instant::now() + lifetime,
        });

        Ok(token.access_token)
    }
}

impl ImagerySource for SentinelHubClient {
    async fn fetch(&self, window: &GeoWindow) -> Result<ImageryResult, ImageryError> {
        let token = self.access_token().await?;
        let body = process_request(window, self.config.resolution_m);
        let url = format!("{}{}", self.config.base_url, PROCESS_PATH);

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(token)
            .header(reqwest::header::ACCEPT, OUTPUT_FORMAT)
            .json(&body)
            .send()
            .await
            .map_err(|e| map_transport_error(e, self.config.timeout))?;

        let status = response.status();
        if !status.is_success() {
            if status == reqwest::StatusCode::UNAUTHORIZED {
                // Force a fresh token next time
                self.token.lock().take();
            }
            return Err(ImageryError::Status(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or(OUTPUT_FORMAT)
            .to_string();

        let bytes = response
            .bytes()
            .await
            .map_err(|e| map_transport_error(e, self.config.timeout))?;

        if bytes.is_empty() {
            return Err(ImageryError::Empty);
        }

        Ok(ImageryResult {
            window: *window,
            content_type,
            bytes: bytes.to_vec(),
        })
    }
}

/// Process API request body for one window
pub(crate) fn process_request(window: &GeoWindow, resolution_m: f64) -> serde_json::Value {
    let (width, height) = window.bbox.pixel_dimensions(resolution_m);

    json!({
        "input": {
            "bounds": {
                "bbox": window.bbox.as_array(),
                "properties": { "crs": CRS_WGS84 }
            },
            "data": [{
                "type": DATA_COLLECTION,
                "dataFilter": {
                    "timeRange": {
                        "from": window.time_range.start_rfc3339(),
                        "to": window.time_range.end_rfc3339()
                    },
                    "mosaickingOrder": "mostRecent"
                }
            }]
        },
        "output": {
            "width": width,
            "height": height,
            "responses": [{
                "identifier": "default",
                "format": { "type": OUTPUT_FORMAT }
            }]
        },
        "evalscript": TRUE_COLOR_EVALSCRIPT
    })
}

fn map_transport_error(err: reqwest::Error, timeout: Duration) -> ImageryError {
    if err.is_timeout() {
        ImageryError::Timeout(timeout.as_secs())
    } else {
        ImageryError::Network(err.to_string())
    }
}
