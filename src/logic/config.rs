//! Configuration module
//!
//! `MonitorConfig` is built once at startup and handed to each collaborator
//! at construction. Nothing mutates it afterwards.

use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use crate::constants::*;
use crate::logic::error::ConfigError;
use crate::logic::imagery::TimeRange;

/// Telemetry provider settings
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout: Duration,
}

/// Imagery provider settings
#[derive(Debug, Clone)]
pub struct ImageryConfig {
    pub base_url: String,
    pub client_id: String,
    pub client_secret: String,
    /// Padding added on each side of the anomaly position (degrees)
    pub padding_deg: f64,
    /// Ground resolution (meters per pixel)
    pub resolution_m: f64,
    /// Satellite acquisition window, process-wide
    pub time_range: TimeRange,
    pub timeout: Duration,
}

/// Outlier model settings
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorConfig {
    /// Expected fraction of outliers per snapshot
    pub contamination: f64,
    pub n_trees: usize,
    pub sample_size: usize,
    /// Fixed seed for reproducible fits; entropy when unset
    pub seed: Option<u64>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            contamination: DEFAULT_CONTAMINATION,
            n_trees: DEFAULT_FOREST_TREES,
            sample_size: DEFAULT_FOREST_SAMPLE_SIZE,
            seed: None,
        }
    }
}

impl DetectorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.contamination > 0.0 && self.contamination <= 0.5) {
            return Err(ConfigError::invalid(
                ENV_CONTAMINATION,
                format!("{} is outside (0, 0.5]", self.contamination),
            ));
        }
        if self.n_trees == 0 {
            return Err(ConfigError::invalid(ENV_FOREST_TREES, "must be at least 1"));
        }
        if self.sample_size < 2 {
            return Err(ConfigError::invalid(ENV_FOREST_SAMPLE_SIZE, "must be at least 2"));
        }
        Ok(())
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Delay between cycles, also the cool-down after a failed cycle
    pub poll_interval: Duration,
    /// Upper bound on every provider call made by the loop
    pub request_timeout: Duration,
    pub telemetry: TelemetryConfig,
    pub imagery: ImageryConfig,
    pub detector: DetectorConfig,
}

impl MonitorConfig {
    /// Load configuration from environment variables (after `.env`, if any)
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from a fixed set of variables
    pub fn from_map(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        Self::from_lookup(|key| vars.get(key).cloned())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let poll_secs: u64 = parse_or(&lookup, ENV_POLL_INTERVAL, DEFAULT_POLL_INTERVAL)?;
        if poll_secs == 0 {
            return Err(ConfigError::invalid(ENV_POLL_INTERVAL, "must be greater than zero"));
        }

        let timeout_secs: u64 = parse_or(&lookup, ENV_REQUEST_TIMEOUT, DEFAULT_REQUEST_TIMEOUT)?;
        if timeout_secs == 0 {
            return Err(ConfigError::invalid(ENV_REQUEST_TIMEOUT, "must be greater than zero"));
        }
        let request_timeout = Duration::from_secs(timeout_secs);

        let window = lookup(ENV_TIME_WINDOW).unwrap_or_else(|| DEFAULT_TIME_WINDOW.to_string());
        let time_range = TimeRange::parse(&window)
            .map_err(|reason| ConfigError::invalid(ENV_TIME_WINDOW, reason))?;

        let padding_deg: f64 = parse_or(&lookup, ENV_BBOX_PADDING, DEFAULT_BBOX_PADDING)?;
        if !(padding_deg > 0.0) {
            return Err(ConfigError::invalid(ENV_BBOX_PADDING, "must be positive"));
        }

        let resolution_m: f64 = parse_or(&lookup, ENV_RESOLUTION, DEFAULT_RESOLUTION)?;
        if !(resolution_m > 0.0) {
            return Err(ConfigError::invalid(ENV_RESOLUTION, "must be positive"));
        }

        let detector = DetectorConfig {
            contamination: parse_or(&lookup, ENV_CONTAMINATION, DEFAULT_CONTAMINATION)?,
            n_trees: parse_or(&lookup, ENV_FOREST_TREES, DEFAULT_FOREST_TREES)?,
            sample_size: parse_or(&lookup, ENV_FOREST_SAMPLE_SIZE, DEFAULT_FOREST_SAMPLE_SIZE)?,
            seed: parse_opt(&lookup, ENV_FOREST_SEED)?,
        };
        detector.validate()?;

        Ok(Self {
            poll_interval: Duration::from_secs(poll_secs),
            request_timeout,
            telemetry: TelemetryConfig {
                base_url: url_or(&lookup, ENV_TELEMETRY_URL, DEFAULT_TELEMETRY_URL),
                api_key: required(&lookup, ENV_TELEMETRY_API_KEY)?,
                timeout: request_timeout,
            },
            imagery: ImageryConfig {
                base_url: url_or(&lookup, ENV_IMAGERY_URL, DEFAULT_IMAGERY_URL),
                client_id: required(&lookup, ENV_IMAGERY_CLIENT_ID)?,
                client_secret: required(&lookup, ENV_IMAGERY_CLIENT_SECRET)?,
                padding_deg,
                resolution_m,
                time_range,
                timeout: request_timeout,
            },
            detector,
        })
    }
}

fn required<F>(lookup: &F, var: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        Some(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(ConfigError::Missing(var)),
    }
}

fn url_or<F>(lookup: &F, var: &'static str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup(var)
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
        .trim_end_matches('/')
        .to_string()
}

fn parse_or<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    Ok(parse_opt(lookup, var)?.unwrap_or(default))
}

fn parse_opt<F, T>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(var) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::invalid(var, format!("cannot parse `{}`", raw.trim()))),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_vars() -> HashMap<String, String> {
        [
            (ENV_TELEMETRY_API_KEY, "mt-key"),
            (ENV_IMAGERY_CLIENT_ID, "sh-id"),
            (ENV_IMAGERY_CLIENT_SECRET, "sh-secret"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn test_defaults_applied() {
        let config = MonitorConfig::from_map(&base_vars()).unwrap();

        assert_eq!(config.poll_interval, Duration::from_secs(600));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.detector, DetectorConfig::default());
        assert_eq!(config.imagery.padding_deg, 0.1);
        assert_eq!(config.imagery.resolution_m, 10.0);
        assert_eq!(config.telemetry.base_url, DEFAULT_TELEMETRY_URL);
        assert!(config.imagery.time_range.start < config.imagery.time_range.end);
    }

    #[test]
    fn test_overrides() {
        let mut vars = base_vars();
        vars.insert(ENV_POLL_INTERVAL.into(), "60".into());
        vars.insert(ENV_CONTAMINATION.into(), "0.2".into());
        vars.insert(ENV_FOREST_SEED.into(), "7".into());
        vars.insert(ENV_TELEMETRY_URL.into(), "http://localhost:9000/".into());

        let config = MonitorConfig::from_map(&vars).unwrap();
        assert_eq!(config.poll_interval, Duration::from_secs(60));
        assert_eq!(config.detector.contamination, 0.2);
        assert_eq!(config.detector.seed, Some(7));
        assert_eq!(config.telemetry.base_url, "http://localhost:9000");
    }

    #[test]
    fn test_missing_credentials_rejected() {
        let mut vars = base_vars();
        vars.remove(ENV_TELEMETRY_API_KEY);
        assert_eq!(
            MonitorConfig::from_map(&vars).unwrap_err(),
            ConfigError::Missing(ENV_TELEMETRY_API_KEY)
        );

        let mut vars = base_vars();
        vars.insert(ENV_IMAGERY_CLIENT_SECRET.into(), "   ".into());
        assert_eq!(
            MonitorConfig::from_map(&vars).unwrap_err(),
            ConfigError::Missing(ENV_IMAGERY_CLIENT_SECRET)
        );
    }

    #[test]
    fn test_invalid_values_rejected() {
        let cases = [
            (ENV_POLL_INTERVAL, "0"),
            (ENV_POLL_INTERVAL, "soon"),
            (ENV_CONTAMINATION, "0.7"),
            (ENV_CONTAMINATION, "0"),
            (ENV_BBOX_PADDING, "-0.1"),
            (ENV_TIME_WINDOW, "2024-02-01T00:00:00/2024-01-01T00:00:00"),
            (ENV_FOREST_SAMPLE_SIZE, "1"),
        ];

        for (var, value) in cases {
            let mut vars = base_vars();
            vars.insert(var.into(), value.into());
            match MonitorConfig::from_map(&vars) {
                Err(ConfigError::Invalid { var: got, .. }) => assert_eq!(got, var),
                other => panic!("expected Invalid for {}={}, got {:?}", var, value, other),
            }
        }
    }
}
