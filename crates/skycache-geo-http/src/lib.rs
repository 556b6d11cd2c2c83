// # HTTP Position Source
//
// This crate provides an IP-geolocation `PositionSource` for skycache.
//
// ## Purpose
//
// Headless hosts have no GPS or platform location service. This source
// asks a geolocation endpoint where the host's public address is and
// reports that as the position.
//
// ## Accepted Responses
//
// Any JSON object carrying the coordinates under `lat`/`lon` or
// `latitude`/`longitude`, e.g. `{"lat": 35.68, "lon": 139.69}`.
// Other fields are ignored.
//
// ## Failure Mapping
//
// | Condition                    | PositionErrorCode     |
// |------------------------------|-----------------------|
// | request timed out            | Timeout               |
// | 401 / 403                    | PermissionDenied      |
// | anything else                | PositionUnavailable   |

use async_trait::async_trait;
use serde::Deserialize;
use skycache_core::error::PositionError;
use skycache_core::traits::{Position, PositionSource};
use std::time::Duration;

/// Default HTTP timeout for a geolocation lookup
const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Deserialize)]
struct GeoResponse {
    #[serde(alias = "latitude")]
    lat: f64,
    #[serde(alias = "longitude")]
    lon: f64,
}

/// IP-geolocation position source
#[derive(Debug, Clone)]
pub struct HttpPositionSource {
    /// URL to fetch the position from
    url: String,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpPositionSource {
    /// Create a new HTTP position source
    ///
    /// # Parameters
    ///
    /// - `url`: URL returning the position as JSON
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_timeout(url, DEFAULT_LOOKUP_TIMEOUT)
    }

    /// Create with a custom lookup timeout
    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
        }
    }

    async fn lookup(&self) -> Result<Position, PositionError> {
        let response = self.client.get(&self.url).send().await.map_err(|e| {
            if e.is_timeout() {
                PositionError::timeout(format!("geolocation lookup timed out: {}", self.url))
            } else {
                PositionError::unavailable(format!("geolocation request failed: {}", e))
            }
        })?;

        let status = response.status();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(PositionError::permission_denied(format!(
                "geolocation service refused the lookup: {}",
                status
            )));
        }
        if !status.is_success() {
            return Err(PositionError::unavailable(format!(
                "geolocation service error: {}",
                status
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| PositionError::unavailable(format!("failed to read response: {}", e)))?;

        let geo: GeoResponse = serde_json::from_str(&body).map_err(|e| {
            PositionError::unavailable(format!("no coordinates in response: {}", e))
        })?;

        let position = Position::new(geo.lat, geo.lon);
        if !position.is_valid() {
            return Err(PositionError::unavailable(format!(
                "coordinates out of range: {}, {}",
                geo.lat, geo.lon
            )));
        }

        Ok(position)
    }
}

#[async_trait]
impl PositionSource for HttpPositionSource {
    async fn acquire(&self) -> Result<Position, PositionError> {
        let position = self.lookup().await?;
        tracing::debug!(
            "Geolocated to {}, {} via {}",
            position.latitude,
            position.longitude,
            self.url
        );
        Ok(position)
    }

    fn source_name(&self) -> &'static str {
        "http"
    }
}
