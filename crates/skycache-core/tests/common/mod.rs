//! Test doubles and common utilities for refresh contract tests
//!
//! This module provides minimal test doubles that count calls and replay
//! scripted outcomes without touching a network or the disk.

#![allow(dead_code)]

use chrono::{Duration, Local, Utc};
use serde_json::json;
use skycache_core::cache::{CacheKey, CacheStore};
use skycache_core::config::{RefreshConfig, WeatherApiConfig};
use skycache_core::error::PositionError;
use skycache_core::forecast::{ForecastAnalyzer, ForecastInterval, ForecastPayload, ForecastSummary};
use skycache_core::refresh::{RefreshEvent, RefreshOrchestrator};
use skycache_core::store::MemoryPersistence;
use skycache_core::traits::{Alert, Alerter, HttpClient, HttpResponse, Position, PositionSource};
use skycache_core::{PositionProvider, Snapshot, WeatherClient};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// A PositionSource whose next outcome is set by the test
///
/// Clones share the outcome and the call counter.
#[derive(Clone)]
pub struct ScriptedPositionSource {
    outcome: Arc<Mutex<Result<Position, PositionError>>>,
    call_count: Arc<AtomicUsize>,
}

impl ScriptedPositionSource {
    pub fn new(position: Position) -> Self {
        Self {
            outcome: Arc::new(Mutex::new(Ok(position))),
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn set_outcome(&self, outcome: Result<Position, PositionError>) {
        *self.outcome.lock().unwrap() = outcome;
    }

    /// Get the number of times acquire() was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl PositionSource for ScriptedPositionSource {
    async fn acquire(&self) -> Result<Position, PositionError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.outcome.lock().unwrap().clone()
    }

    fn source_name(&self) -> &'static str {
        "scripted"
    }
}

/// Scripted outcome of a GET
#[derive(Clone)]
pub enum HttpOutcome {
    Respond(HttpResponse),
    TransportError(String),
}

/// An HttpClient that replays a scripted outcome and records requested URLs
#[derive(Clone)]
pub struct ScriptedHttpClient {
    outcome: Arc<Mutex<HttpOutcome>>,
    requested_urls: Arc<Mutex<Vec<String>>>,
}

impl ScriptedHttpClient {
    pub fn new(outcome: HttpOutcome) -> Self {
        Self {
            outcome: Arc::new(Mutex::new(outcome)),
            requested_urls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn set_outcome(&self, outcome: HttpOutcome) {
        *self.outcome.lock().unwrap() = outcome;
    }

    /// Get the number of times get() was called
    pub fn call_count(&self) -> usize {
        self.requested_urls.lock().unwrap().len()
    }

    pub fn requested_urls(&self) -> Vec<String> {
        self.requested_urls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl HttpClient for ScriptedHttpClient {
    async fn get(&self, url: &str) -> skycache_core::Result<HttpResponse> {
        self.requested_urls.lock().unwrap().push(url.to_string());
        match self.outcome.lock().unwrap().clone() {
            HttpOutcome::Respond(response) => Ok(response),
            HttpOutcome::TransportError(message) => Err(skycache_core::Error::http(message)),
        }
    }

    fn client_name(&self) -> &'static str {
        "scripted"
    }
}

/// An Alerter that records every alert
#[derive(Clone, Default)]
pub struct RecordingAlerter {
    alerts: Arc<Mutex<Vec<Alert>>>,
}

impl RecordingAlerter {
    pub fn alerts(&self) -> Vec<Alert> {
        self.alerts.lock().unwrap().clone()
    }
}

impl Alerter for RecordingAlerter {
    fn alert(&self, alert: &Alert) {
        self.alerts.lock().unwrap().push(alert.clone());
    }
}

/// One forecast interval for today: (hour, temp_min, temp_max, description, rain)
pub type IntervalSpec<'a> = (u32, f64, f64, &'a str, Option<f64>);

/// Forecast API body whose intervals fall on today's local date
pub fn forecast_body_today(intervals: &[IntervalSpec<'_>]) -> serde_json::Value {
    let today = Local::now().date_naive();
    let list: Vec<serde_json::Value> = intervals
        .iter()
        .map(|(hour, lo, hi, desc, rain)| {
            let mut entry = json!({
                "dt_txt": format!("{} {:02}:00:00", today.format("%Y-%m-%d"), hour),
                "main": { "temp_min": lo, "temp_max": hi },
                "weather": [{ "description": desc }],
            });
            if let Some(volume) = rain {
                entry["rain"] = json!({ "3h": volume });
            }
            entry
        })
        .collect();

    json!({ "cod": "200", "cnt": list.len(), "list": list })
}

/// A dry forecast body for today
pub fn clear_body() -> serde_json::Value {
    forecast_body_today(&[(9, 4.0, 8.0, "clear sky", None), (12, 6.0, 11.0, "few clouds", None)])
}

/// Everything a contract test needs to drive and inspect an orchestrator
pub struct Harness {
    pub orchestrator: RefreshOrchestrator,
    pub events: mpsc::Receiver<RefreshEvent>,
    pub position: ScriptedPositionSource,
    pub http: ScriptedHttpClient,
    pub alerter: RecordingAlerter,
    pub backend: MemoryPersistence,
    pub cache: CacheStore,
}

impl Harness {
    /// Harness with a working position source and a clear-sky forecast
    pub fn new() -> Self {
        Self::with_config(RefreshConfig::default())
    }

    pub fn with_config(config: RefreshConfig) -> Self {
        Self::try_with_config(config).expect("orchestrator construction succeeds")
    }

    pub fn try_with_config(config: RefreshConfig) -> skycache_core::Result<Self> {
        let position = ScriptedPositionSource::new(Position::new(35.68, 139.69));
        let http = ScriptedHttpClient::new(HttpOutcome::Respond(HttpResponse::json(200, clear_body())));
        let alerter = RecordingAlerter::default();
        let backend = MemoryPersistence::new();
        let cache = CacheStore::new(Arc::new(backend.clone()));

        let alerter_arc: Arc<dyn Alerter> = Arc::new(alerter.clone());
        let provider = PositionProvider::with_timeout(
            Box::new(position.clone()),
            alerter_arc.clone(),
            config.position_timeout(),
        );
        let weather = WeatherClient::new(
            Arc::new(http.clone()),
            alerter_arc,
            WeatherApiConfig {
                endpoint: "https://api.example.test/forecast".to_string(),
                api_key: "test-key".to_string(),
                ..WeatherApiConfig::default()
            },
        );
        let analyzer = ForecastAnalyzer::new(config.forecast_window, config.rain_threshold);

        let (orchestrator, events) =
            RefreshOrchestrator::new(provider, weather, analyzer, cache.clone(), &config)?;

        Ok(Self {
            orchestrator,
            events,
            position,
            http,
            alerter,
            backend,
            cache,
        })
    }

    /// Persist a complete snapshot last updated `age` ago
    pub async fn seed_snapshot(&self, age: Duration) -> Snapshot {
        let snapshot = Snapshot::complete(
            Position::new(51.5, -0.12),
            ForecastPayload::from_intervals(vec![ForecastInterval::new(
                "2024-03-10 09:00:00",
                2.0,
                7.0,
                "overcast clouds",
                None,
            )]),
            ForecastSummary {
                description: "overcast clouds".to_string(),
                temp_min: 2.0,
                temp_max: 7.0,
                is_raining: false,
            },
            Utc::now() - age,
        );
        self.cache
            .write(CacheKey::Weather, &snapshot)
            .await
            .expect("seeding succeeds");
        snapshot
    }

    /// The snapshot currently persisted under WEATHER
    pub async fn persisted(&self) -> Option<Snapshot> {
        self.cache
            .read(CacheKey::Weather)
            .await
            .expect("persisted snapshot decodes")
    }

    /// Total network-facing calls (position + forecast)
    pub fn network_calls(&self) -> usize {
        self.position.call_count() + self.http.call_count()
    }

    /// All events emitted so far
    pub fn drain_events(&mut self) -> Vec<RefreshEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }
}
