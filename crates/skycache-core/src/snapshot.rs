//! The cached weather record

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::forecast::{ForecastPayload, ForecastSummary};
use crate::traits::Position;

/// Cached composite of position, raw forecast and derived summary
///
/// A snapshot written by a successful refresh is *complete*: all three
/// payload fields are present. The payload fields are optional only so that
/// records written by older builds still decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub position: Option<Position>,

    #[serde(default)]
    pub raw_weather: Option<ForecastPayload>,

    #[serde(default)]
    pub summary: Option<ForecastSummary>,

    pub last_updated: DateTime<Utc>,

    /// Set when this value is a reused prior snapshot rather than the
    /// product of the refresh attempt that returned it
    #[serde(default)]
    pub is_stale_fallback: bool,
}

impl Snapshot {
    /// Assemble a complete snapshot
    pub fn complete(
        position: Position,
        raw_weather: ForecastPayload,
        summary: ForecastSummary,
        last_updated: DateTime<Utc>,
    ) -> Self {
        Self {
            position: Some(position),
            raw_weather: Some(raw_weather),
            summary: Some(summary),
            last_updated,
            is_stale_fallback: false,
        }
    }

    /// Whether position, raw forecast and summary are all present
    pub fn is_complete(&self) -> bool {
        self.position.is_some() && self.raw_weather.is_some() && self.summary.is_some()
    }

    /// Time elapsed since `last_updated`
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now.signed_duration_since(self.last_updated)
    }

    /// Stale when strictly more than `threshold` has elapsed
    pub fn is_stale(&self, threshold: Duration, now: DateTime<Utc>) -> bool {
        self.age(now) > threshold
    }

    /// Same snapshot, marked as a reused prior value
    pub fn into_fallback(mut self) -> Self {
        self.is_stale_fallback = true;
        self
    }

    /// Whether the summary reports rain today
    pub fn is_raining(&self) -> bool {
        self.summary.as_ref().is_some_and(|s| s.is_raining)
    }
}
