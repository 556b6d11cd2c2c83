//! Forecast payload and summary types
//!
//! [`ForecastPayload`] mirrors the JSON body of the 3-hourly forecast
//! endpoint. Only the fields the analyzer reads are typed; everything else
//! is kept in `extra` maps so the payload round-trips through the cache
//! without losing data.
//!
//! ```json
//! {
//!   "cnt": 40,
//!   "list": [
//!     {
//!       "dt_txt": "2024-03-10 15:00:00",
//!       "main": { "temp_min": 11.2, "temp_max": 13.9 },
//!       "weather": [ { "description": "light rain" } ],
//!       "rain": { "3h": 3.5 }
//!     }
//!   ]
//! }
//! ```

pub mod analyzer;

pub use analyzer::{ForecastAnalyzer, twelve_hour_label};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Raw forecast payload as returned by the weather API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPayload {
    /// Number of intervals the API reports (informational)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cnt: Option<u32>,

    /// Intervals in chronological order, earliest first
    pub list: Vec<ForecastInterval>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ForecastPayload {
    /// Build a payload from intervals alone
    pub fn from_intervals(list: Vec<ForecastInterval>) -> Self {
        Self {
            cnt: Some(list.len() as u32),
            list,
            extra: Map::new(),
        }
    }
}

/// One 3-hour forecast interval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastInterval {
    /// Local timestamp, `YYYY-MM-DD HH:MM:SS`
    pub dt_txt: String,

    pub main: IntervalReadings,

    #[serde(default)]
    pub weather: Vec<IntervalCondition>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rain: Option<RainVolume>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Temperature readings for an interval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntervalReadings {
    pub temp_min: f64,
    pub temp_max: f64,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Condition text for an interval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntervalCondition {
    #[serde(default)]
    pub description: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Precipitation volume for an interval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RainVolume {
    /// Volume over the last 3 hours
    #[serde(rename = "3h", default)]
    pub volume_3h: f64,
}

impl ForecastInterval {
    /// Create an interval from its analyzed fields
    pub fn new(
        timestamp_text: impl Into<String>,
        temp_min: f64,
        temp_max: f64,
        description: impl Into<String>,
        rain_volume_3h: Option<f64>,
    ) -> Self {
        Self {
            dt_txt: timestamp_text.into(),
            main: IntervalReadings {
                temp_min,
                temp_max,
                extra: Map::new(),
            },
            weather: vec![IntervalCondition {
                description: description.into(),
                extra: Map::new(),
            }],
            rain: rain_volume_3h.map(|volume_3h| RainVolume { volume_3h }),
            extra: Map::new(),
        }
    }

    pub fn timestamp_text(&self) -> &str {
        &self.dt_txt
    }

    pub fn temp_min(&self) -> f64 {
        self.main.temp_min
    }

    pub fn temp_max(&self) -> f64 {
        self.main.temp_max
    }

    /// Description of the first listed condition, empty if none
    pub fn description(&self) -> &str {
        self.weather
            .first()
            .map(|w| w.description.as_str())
            .unwrap_or("")
    }

    /// Rain volume over 3h; an absent field counts as zero
    pub fn rain_volume_3h(&self) -> f64 {
        self.rain.as_ref().map(|r| r.volume_3h).unwrap_or(0.0)
    }
}

/// Same-day forecast summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSummary {
    pub description: String,
    pub temp_min: f64,
    pub temp_max: f64,
    pub is_raining: bool,
}
