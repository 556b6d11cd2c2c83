//! Configuration types for skycache
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::forecast::analyzer::{DEFAULT_FORECAST_WINDOW, DEFAULT_RAIN_THRESHOLD};

/// Default forecast endpoint (3-hourly, 5-day)
pub const DEFAULT_FORECAST_ENDPOINT: &str = "https://api.openweathermap.org/data/2.5/forecast";

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SkycacheConfig {
    /// Position source configuration
    #[serde(default)]
    pub position_source: PositionSourceConfig,

    /// Forecast API configuration
    pub weather: WeatherApiConfig,

    /// Cache backend configuration
    #[serde(default)]
    pub cache: CacheConfig,

    /// Refresh policy
    #[serde(default)]
    pub refresh: RefreshConfig,
}

impl SkycacheConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.position_source.validate()?;
        self.weather.validate()?;
        self.cache.validate()?;
        self.refresh.validate()?;
        Ok(())
    }
}

/// Position source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PositionSourceConfig {
    /// Fixed coordinates
    Fixed { latitude: f64, longitude: f64 },

    /// IP geolocation over HTTP
    Http {
        /// URL returning `{ "lat": .., "lon": .. }`
        url: String,
    },
}

impl PositionSourceConfig {
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            PositionSourceConfig::Fixed {
                latitude,
                longitude,
            } => {
                if !(-90.0..=90.0).contains(latitude) {
                    return Err(crate::Error::config(format!(
                        "Latitude must be between -90 and 90. Got: {}",
                        latitude
                    )));
                }
                if !(-180.0..=180.0).contains(longitude) {
                    return Err(crate::Error::config(format!(
                        "Longitude must be between -180 and 180. Got: {}",
                        longitude
                    )));
                }
                Ok(())
            }
            PositionSourceConfig::Http { url } => {
                if url.is_empty() {
                    return Err(crate::Error::config("Position source URL cannot be empty"));
                }
                Ok(())
            }
        }
    }

    /// Get the source type name
    pub fn type_name(&self) -> &'static str {
        match self {
            PositionSourceConfig::Fixed { .. } => "fixed",
            PositionSourceConfig::Http { .. } => "http",
        }
    }
}

impl Default for PositionSourceConfig {
    fn default() -> Self {
        PositionSourceConfig::Fixed {
            latitude: 0.0,
            longitude: 0.0,
        }
    }
}

/// Forecast API configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct WeatherApiConfig {
    /// Forecast endpoint URL, without query string
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// API credential
    /// ⚠️ NEVER log this value
    pub api_key: String,

    /// Unit system flag sent with every request
    #[serde(default = "default_units")]
    pub units: String,

    /// Request timeout (in seconds)
    #[serde(default = "default_request_timeout_secs")]
    pub timeout_secs: u64,
}

impl WeatherApiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.api_key.is_empty() {
            return Err(crate::Error::config("Weather API key cannot be empty"));
        }
        if !self.endpoint.starts_with("https://") && !self.endpoint.starts_with("http://") {
            return Err(crate::Error::config(format!(
                "Weather endpoint must use HTTP or HTTPS scheme. Got: {}",
                self.endpoint
            )));
        }
        if self.timeout_secs == 0 {
            return Err(crate::Error::config("Weather request timeout must be > 0"));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for WeatherApiConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key: String::new(),
            units: default_units(),
            timeout_secs: default_request_timeout_secs(),
        }
    }
}

// Custom Debug implementation that hides the API key
impl fmt::Debug for WeatherApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeatherApiConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<REDACTED>")
            .field("units", &self.units)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Cache backend configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CacheConfig {
    /// File-backed cache
    File {
        /// Path to the cache document
        path: String,
    },

    /// In-memory cache (not persistent)
    #[default]
    Memory,
}

impl CacheConfig {
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            CacheConfig::File { path } if path.is_empty() => {
                Err(crate::Error::config("Cache file path cannot be empty"))
            }
            _ => Ok(()),
        }
    }
}

/// Refresh policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshConfig {
    /// Age (in seconds) beyond which the cached snapshot is refreshed
    #[serde(default = "default_refresh_threshold_secs")]
    pub refresh_threshold_secs: u64,

    /// Bounded wait on position acquisition (in seconds)
    #[serde(default = "default_position_timeout_secs")]
    pub position_timeout_secs: u64,

    /// Number of forecast intervals the analyzer scans
    #[serde(default = "default_forecast_window")]
    pub forecast_window: usize,

    /// Rain volume per 3h that must be exceeded to count as rain
    #[serde(default = "default_rain_threshold")]
    pub rain_threshold: f64,

    /// Interval between refresh attempts when running as a loop (in seconds)
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Capacity of the refresh event channel
    ///
    /// When full, new events are dropped (with a warning log).
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl RefreshConfig {
    pub fn validate(&self) -> Result<(), crate::Error> {
        if checked_threshold(self.refresh_threshold_secs).is_none() {
            return Err(crate::Error::config(format!(
                "Refresh threshold is out of range. Got: {}s",
                self.refresh_threshold_secs
            )));
        }
        if self.position_timeout_secs == 0 {
            return Err(crate::Error::config("Position timeout must be > 0"));
        }
        if self.forecast_window == 0 {
            return Err(crate::Error::config("Forecast window must be > 0"));
        }
        if !self.rain_threshold.is_finite() || self.rain_threshold < 0.0 {
            return Err(crate::Error::config(format!(
                "Rain threshold must be a non-negative number. Got: {}",
                self.rain_threshold
            )));
        }
        if self.poll_interval_secs == 0 {
            return Err(crate::Error::config("Poll interval must be > 0"));
        }
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }
        Ok(())
    }

    /// Refresh threshold, saturating at `Duration::MAX` when out of range
    pub fn refresh_threshold(&self) -> chrono::Duration {
        checked_threshold(self.refresh_threshold_secs).unwrap_or(chrono::Duration::MAX)
    }

    pub fn position_timeout(&self) -> Duration {
        Duration::from_secs(self.position_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            refresh_threshold_secs: default_refresh_threshold_secs(),
            position_timeout_secs: default_position_timeout_secs(),
            forecast_window: default_forecast_window(),
            rain_threshold: default_rain_threshold(),
            poll_interval_secs: default_poll_interval_secs(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

fn checked_threshold(secs: u64) -> Option<chrono::Duration> {
    i64::try_from(secs)
        .ok()
        .and_then(chrono::Duration::try_seconds)
}

fn default_endpoint() -> String {
    DEFAULT_FORECAST_ENDPOINT.to_string()
}

fn default_units() -> String {
    "metric".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_refresh_threshold_secs() -> u64 {
    60
}

fn default_position_timeout_secs() -> u64 {
    5
}

fn default_forecast_window() -> usize {
    DEFAULT_FORECAST_WINDOW
}

fn default_rain_threshold() -> f64 {
    DEFAULT_RAIN_THRESHOLD
}

fn default_poll_interval_secs() -> u64 {
    300
}

fn default_event_channel_capacity() -> usize {
    100
}
