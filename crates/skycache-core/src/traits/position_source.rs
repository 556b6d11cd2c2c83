// # Position Source Trait
//
// Defines the interface for one-shot device position acquisition.
//
// ## Implementations
//
// - Fixed coordinates: `FixedPositionSource` (this crate)
// - IP geolocation over HTTP: `skycache-geo-http` crate
//
// ## Usage
//
// ```rust,ignore
// use skycache_core::PositionSource;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let source = /* PositionSource implementation */;
//
//     let position = source.acquire().await?;
//     println!("{}, {}", position.latitude, position.longitude);
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::PositionError;

/// A device position in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

impl Position {
    /// Create a new position
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Whether both coordinates are finite and inside their valid ranges
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Trait for position source implementations
///
/// A position source performs a single acquisition per call. It does not
/// cache, retry, alert the user, or enforce a timeout: the
/// [`PositionProvider`](crate::position::PositionProvider) wrapping it owns
/// the bounded wait and the user-facing alert.
///
/// Implementations must be thread-safe and usable across async tasks.
#[async_trait]
pub trait PositionSource: Send + Sync {
    /// Acquire the current position
    ///
    /// # Returns
    ///
    /// - `Ok(Position)`: The current position
    /// - `Err(PositionError)`: Acquisition was denied or no fix was available
    async fn acquire(&self) -> Result<Position, PositionError>;

    /// Get the source name (for logging/debugging)
    fn source_name(&self) -> &'static str;
}
