use std::env;
use std::str::FromStr;
use serde::{Serialize, Deserialize};
use thiserror::Error;

pub const DEFAULT_INGEST_URL: &str = "http://localhost:8080/api/analytics/events";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key} must be a number, got {value:?}")]
    NotANumber { key: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub ingest_url: String,
    /// Queue length that triggers an immediate flush.
    pub batch_size: usize,
    /// Quiet period before a debounced flush, and the periodic tick cadence.
    pub flush_interval_secs: u64,
    /// Most events kept buffered while deliveries keep failing.
    pub retry_cap: usize,
    pub request_timeout_ms: u64,
    pub teardown_timeout_ms: u64,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            ingest_url: DEFAULT_INGEST_URL.to_string(),
            batch_size: 30,
            flush_interval_secs: 15,
            retry_cap: 100,
            request_timeout_ms: 10_000,
            teardown_timeout_ms: 2_000,
        }
    }
}

impl TelemetryConfig {
    /// Defaults overridden by `ENGAGE_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(url) = lookup("ENGAGE_INGEST_URL") {
            config.ingest_url = url;
        }
        override_num(&lookup, "ENGAGE_BATCH_SIZE", &mut config.batch_size)?;
        override_num(&lookup, "ENGAGE_FLUSH_INTERVAL_SECS", &mut config.flush_interval_secs)?;
        override_num(&lookup, "ENGAGE_RETRY_CAP", &mut config.retry_cap)?;
        override_num(&lookup, "ENGAGE_REQUEST_TIMEOUT_MS", &mut config.request_timeout_ms)?;
        override_num(&lookup, "ENGAGE_TEARDOWN_TIMEOUT_MS", &mut config.teardown_timeout_ms)?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::Zero("batch_size"));
        }
        if self.flush_interval_secs == 0 {
            return Err(ConfigError::Zero("flush_interval_secs"));
        }
        if self.retry_cap == 0 {
            return Err(ConfigError::Zero("retry_cap"));
        }
        Ok(())
    }
}

fn override_num<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    slot: &mut T,
) -> Result<(), ConfigError> {
    if let Some(value) = lookup(key) {
        *slot = value
            .trim()
            .parse()
            .map_err(|_| ConfigError::NotANumber { key, value: value.clone() })?;
    }
    Ok(())
}
