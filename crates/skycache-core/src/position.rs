//! Position acquisition with a bounded wait
//!
//! [`PositionProvider`] wraps a [`PositionSource`]: it applies the timeout,
//! alerts the user on failure, and reports the failure as a
//! [`PositionError`] for the orchestrator to match on.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::error::PositionError;
use crate::traits::{Alert, Alerter, Position, PositionSource};

/// Default bounded wait on a position acquisition
pub const DEFAULT_POSITION_TIMEOUT: Duration = Duration::from_secs(5);

/// Timeout-guarded, alerting wrapper around a position source
pub struct PositionProvider {
    source: Box<dyn PositionSource>,
    alerter: Arc<dyn Alerter>,
    timeout: Duration,
}

impl PositionProvider {
    pub fn new(source: Box<dyn PositionSource>, alerter: Arc<dyn Alerter>) -> Self {
        Self::with_timeout(source, alerter, DEFAULT_POSITION_TIMEOUT)
    }

    pub fn with_timeout(
        source: Box<dyn PositionSource>,
        alerter: Arc<dyn Alerter>,
        timeout: Duration,
    ) -> Self {
        Self {
            source,
            alerter,
            timeout,
        }
    }

    /// Acquire the current position
    ///
    /// On timeout or denial the user is alerted and the failure is returned.
    pub async fn get_position(&self) -> Result<Position, PositionError> {
        let outcome = match tokio::time::timeout(self.timeout, self.source.acquire()).await {
            Ok(result) => result,
            Err(_) => Err(PositionError::timeout(format!(
                "no position from {} within {:?}",
                self.source.source_name(),
                self.timeout
            ))),
        };

        match outcome {
            Ok(position) => {
                tracing::debug!(
                    "Position from {}: {}, {}",
                    self.source.source_name(),
                    position.latitude,
                    position.longitude
                );
                Ok(position)
            }
            Err(e) => {
                tracing::warn!("Position acquisition failed: {}", e);
                self.alerter.alert(&Alert::new("Location unavailable", e.to_string()));
                Err(e)
            }
        }
    }
}

/// Position source that always reports the same coordinates
#[derive(Debug, Clone, Copy)]
pub struct FixedPositionSource {
    position: Position,
}

impl FixedPositionSource {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            position: Position::new(latitude, longitude),
        }
    }
}

#[async_trait]
impl PositionSource for FixedPositionSource {
    async fn acquire(&self) -> Result<Position, PositionError> {
        if self.position.is_valid() {
            Ok(self.position)
        } else {
            Err(PositionError::unavailable(format!(
                "configured coordinates out of range: {}, {}",
                self.position.latitude, self.position.longitude
            )))
        }
    }

    fn source_name(&self) -> &'static str {
        "fixed"
    }
}
