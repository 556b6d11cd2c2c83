//! Error types for skycache
//!
//! This module defines all error types used throughout the crate.
//!
//! Position and weather failures have their own types because the
//! components that produce them absorb them locally (alert + `Err`);
//! the orchestrator only ever pattern-matches on them.

use std::fmt;
use thiserror::Error;

/// Result type alias for skycache operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for skycache
#[derive(Error, Debug)]
pub enum Error {
    /// Position acquisition failed
    #[error("Position error: {0}")]
    Position(#[from] PositionError),

    /// Weather fetch failed
    #[error("Weather fetch error: {0}")]
    WeatherFetch(#[from] WeatherFetchError),

    /// Persistence backend errors (I/O, corruption). A read miss is not an error.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP transport errors
    #[error("HTTP error: {0}")]
    Http(String),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a persistence error
    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

/// Geolocation failure codes
///
/// Numeric values follow the usual geolocation convention so that codes
/// coming from platform sources can be mapped without a lookup table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionErrorCode {
    /// The user or platform refused access to the position
    PermissionDenied = 1,
    /// No position could be determined
    PositionUnavailable = 2,
    /// Acquisition exceeded the bounded wait
    Timeout = 3,
}

impl PositionErrorCode {
    /// Numeric code
    pub fn code(self) -> u16 {
        self as u16
    }
}

impl fmt::Display for PositionErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::PermissionDenied => "permission denied",
            Self::PositionUnavailable => "position unavailable",
            Self::Timeout => "timeout",
        };
        write!(f, "{} ({})", name, self.code())
    }
}

/// Position acquisition failure (code + message)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{code}: {message}")]
pub struct PositionError {
    pub code: PositionErrorCode,
    pub message: String,
}

impl PositionError {
    pub fn new(code: PositionErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::new(PositionErrorCode::PermissionDenied, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(PositionErrorCode::PositionUnavailable, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(PositionErrorCode::Timeout, message)
    }
}

/// Weather API failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WeatherFetchError {
    /// The request never produced a response
    #[error("transport failure: {0}")]
    Transport(String),

    /// The API answered with a non-2xx status
    #[error("unexpected status {0}")]
    Status(u16),

    /// The body could not be read as a forecast payload
    #[error("malformed body: {0}")]
    Malformed(String),
}
