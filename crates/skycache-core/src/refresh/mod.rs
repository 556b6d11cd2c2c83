//! Refresh orchestration
//!
//! The RefreshOrchestrator is responsible for:
//! - Deciding whether the cached snapshot is stale
//! - Fetching position, then forecast, then analyzing it
//! - Committing a complete snapshot, or re-committing the previous one
//!   with the fallback marker when any stage fails
//!
//! ## Architecture
//!
//! ```text
//!                  ┌──────────────────────┐
//!                  │ RefreshOrchestrator  │
//!                  └──────────────────────┘
//!                             │
//!     ┌──────────────┬────────┴───────┬──────────────────┐
//!     ▼              ▼                ▼                  ▼
//! ┌─────────┐ ┌──────────────┐ ┌───────────────┐ ┌──────────────┐
//! │ Cache   │ │ Position     │ │ Weather       │ │ Forecast     │
//! │ Store   │ │ Provider     │ │ Client        │ │ Analyzer     │
//! └─────────┘ └──────────────┘ └───────────────┘ └──────────────┘
//! ```
//!
//! ## Refresh Cycle
//!
//! ```text
//! FRESH_CACHE_HIT → done
//! STALE → FETCHING_POSITION → FETCHING_WEATHER → ANALYZING → COMMIT_NEW
//!              └──────────────────┴────────────────┴──→ COMMIT_FALLBACK
//! ```
//!
//! A failed stage short-circuits every later stage. Nothing is retried
//! within a cycle; the next call is the retry.

use chrono::Utc;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

use crate::cache::{CacheKey, CacheStore, is_decode_error};
use crate::config::RefreshConfig;
use crate::error::Result;
use crate::forecast::{ForecastAnalyzer, ForecastSummary};
use crate::position::PositionProvider;
use crate::snapshot::Snapshot;
use crate::weather::WeatherClient;

/// Stages of a refresh cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefreshStage {
    FreshCacheHit,
    Stale,
    FetchingPosition,
    FetchingWeather,
    Analyzing,
    CommitNew,
    CommitFallback,
}

impl fmt::Display for RefreshStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RefreshStage::FreshCacheHit => "FRESH_CACHE_HIT",
            RefreshStage::Stale => "STALE",
            RefreshStage::FetchingPosition => "FETCHING_POSITION",
            RefreshStage::FetchingWeather => "FETCHING_WEATHER",
            RefreshStage::Analyzing => "ANALYZING",
            RefreshStage::CommitNew => "COMMIT_NEW",
            RefreshStage::CommitFallback => "COMMIT_FALLBACK",
        };
        f.write_str(name)
    }
}

/// Events emitted by the RefreshOrchestrator
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshEvent {
    /// Cached snapshot is inside the refresh window
    CacheHit { age_secs: i64 },

    /// A refresh stage started
    StageEntered { stage: RefreshStage },

    /// A refresh stage failed
    StageFailed { stage: RefreshStage, reason: String },

    /// A new complete snapshot was persisted
    Committed { summary: ForecastSummary },

    /// The previous snapshot was re-persisted with the fallback marker
    FallbackCommitted { reason: String },

    /// No cached snapshot existed and the initial fetch failed
    BootstrapFailed { reason: String },

    /// Run loop started
    Started,

    /// Run loop stopped
    Stopped { reason: String },
}

/// Why a fetch attempt stopped short
#[derive(Debug, Clone)]
struct StageFailure {
    stage: RefreshStage,
    reason: String,
}

impl StageFailure {
    fn new(stage: RefreshStage, reason: impl Into<String>) -> Self {
        Self {
            stage,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for StageFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}", self.stage, self.reason)
    }
}

/// TTL-gated refresh of the cached weather snapshot
///
/// The orchestrator is the only writer of [`CacheKey::Weather`]. Calls must
/// not overlap: callers invoke it from a single task (the run loop or one
/// UI event at a time).
///
/// ## Lifecycle
///
/// 1. Create with [`RefreshOrchestrator::new()`]
/// 2. Call [`refresh_if_stale()`](Self::refresh_if_stale) on demand, or
///    [`run()`](Self::run) to refresh on a fixed interval
/// 3. Drop to cleanup
pub struct RefreshOrchestrator {
    position: PositionProvider,
    weather: WeatherClient,
    analyzer: ForecastAnalyzer,
    cache: CacheStore,

    /// Age beyond which the cached snapshot is refreshed
    refresh_threshold: chrono::Duration,

    /// Interval between cycles in the run loop
    poll_interval: Duration,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<RefreshEvent>,
}

impl RefreshOrchestrator {
    /// Create a new orchestrator
    ///
    /// # Returns
    ///
    /// A tuple of (orchestrator, event_receiver) where event_receiver yields
    /// refresh events
    pub fn new(
        position: PositionProvider,
        weather: WeatherClient,
        analyzer: ForecastAnalyzer,
        cache: CacheStore,
        config: &RefreshConfig,
    ) -> Result<(Self, mpsc::Receiver<RefreshEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.event_channel_capacity);

        let orchestrator = Self {
            position,
            weather,
            analyzer,
            cache,
            refresh_threshold: config.refresh_threshold(),
            poll_interval: config.poll_interval(),
            event_tx: tx,
        };

        Ok((orchestrator, rx))
    }

    /// Age beyond which the cached snapshot is refreshed
    pub fn refresh_threshold(&self) -> chrono::Duration {
        self.refresh_threshold
    }

    /// Read the cached snapshot, bootstrapping one if none exists
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Snapshot))`: The cached snapshot, or a freshly bootstrapped one
    /// - `Ok(None)`: Nothing cached and the bootstrap fetch failed; nothing
    ///   was persisted
    /// - `Err(Error)`: Persistence failure
    pub async fn get_cached_snapshot(&self) -> Result<Option<Snapshot>> {
        match self.cache.read::<Snapshot>(CacheKey::Weather).await {
            Ok(Some(snapshot)) => return Ok(Some(snapshot)),
            Ok(None) => debug!("No cached snapshot, bootstrapping"),
            Err(e) if is_decode_error(&e) => {
                warn!("Cached snapshot is unreadable ({}), bootstrapping", e)
            }
            Err(e) => return Err(e),
        }

        match self.fetch_fresh().await {
            Ok(snapshot) => {
                self.commit(&snapshot).await?;
                Ok(Some(snapshot))
            }
            Err(failure) => {
                warn!("Bootstrap fetch failed: {}", failure);
                self.emit_event(RefreshEvent::BootstrapFailed {
                    reason: failure.to_string(),
                });
                Ok(None)
            }
        }
    }

    /// Refresh the cached snapshot if it is older than the threshold
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Snapshot))` with `is_stale_fallback = false`: a new
    ///   snapshot was fetched and persisted
    /// - `Ok(Some(Snapshot))` with `is_stale_fallback = true`: the cached
    ///   snapshot was still fresh, or the refresh failed and the cached
    ///   snapshot was re-persisted unchanged apart from the marker
    /// - `Ok(None)`: Nothing cached and the bootstrap fetch failed
    /// - `Err(Error)`: Persistence failure
    pub async fn refresh_if_stale(&self) -> Result<Option<Snapshot>> {
        let Some(old) = self.get_cached_snapshot().await? else {
            return Ok(None);
        };

        let now = Utc::now();
        if !old.is_stale(self.refresh_threshold, now) {
            let age = old.age(now);
            debug!("Cache hit ({}s old)", age.num_seconds());
            self.emit_event(RefreshEvent::CacheHit {
                age_secs: age.num_seconds(),
            });
            return Ok(Some(old.into_fallback()));
        }

        self.enter(RefreshStage::Stale);
        match self.fetch_fresh().await {
            Ok(snapshot) => {
                self.commit(&snapshot).await?;
                Ok(Some(snapshot))
            }
            Err(failure) => {
                self.enter(RefreshStage::CommitFallback);
                let fallback = old.into_fallback();
                self.cache.write(CacheKey::Weather, &fallback).await.inspect_err(|e| {
                    error!("Failed to persist fallback snapshot: {}", e);
                })?;
                warn!("Refresh failed, keeping previous snapshot: {}", failure);
                self.emit_event(RefreshEvent::FallbackCommitted {
                    reason: failure.to_string(),
                });
                Ok(Some(fallback))
            }
        }
    }

    /// Position → weather → analysis, in order, stopping at the first failure
    async fn fetch_fresh(&self) -> std::result::Result<Snapshot, StageFailure> {
        self.enter(RefreshStage::FetchingPosition);
        let position = self
            .position
            .get_position()
            .await
            .map_err(|e| self.fail(RefreshStage::FetchingPosition, e.to_string()))?;

        self.enter(RefreshStage::FetchingWeather);
        let raw_weather = self
            .weather
            .get_weather(&position)
            .await
            .map_err(|e| self.fail(RefreshStage::FetchingWeather, e.to_string()))?;

        self.enter(RefreshStage::Analyzing);
        let summary = self.analyzer.analyze(&raw_weather);

        Ok(Snapshot::complete(position, raw_weather, summary, Utc::now()))
    }

    async fn commit(&self, snapshot: &Snapshot) -> Result<()> {
        self.enter(RefreshStage::CommitNew);
        self.cache
            .write(CacheKey::Weather, snapshot)
            .await
            .inspect_err(|e| error!("Failed to persist snapshot: {}", e))?;

        if let Some(summary) = &snapshot.summary {
            info!(
                "Snapshot committed: {:?} ({} to {}, raining: {})",
                summary.description, summary.temp_min, summary.temp_max, summary.is_raining
            );
            self.emit_event(RefreshEvent::Committed {
                summary: summary.clone(),
            });
        }
        Ok(())
    }

    fn enter(&self, stage: RefreshStage) {
        debug!("Refresh stage: {}", stage);
        self.emit_event(RefreshEvent::StageEntered { stage });
    }

    fn fail(&self, stage: RefreshStage, reason: impl Into<String>) -> StageFailure {
        let failure = StageFailure::new(stage, reason);
        self.emit_event(RefreshEvent::StageFailed {
            stage,
            reason: failure.reason.clone(),
        });
        failure
    }

    /// Run refresh cycles every poll interval until Ctrl-C
    ///
    /// A failing cycle is logged and the loop continues.
    pub async fn run(&self) -> Result<()> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
            }
        })
        .await
    }

    /// Run refresh cycles until `shutdown_rx` fires or its sender is dropped
    pub async fn run_with_shutdown(&self, shutdown_rx: oneshot::Receiver<()>) -> Result<()> {
        self.run_until(async {
            let _ = shutdown_rx.await;
        })
        .await
    }

    async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        self.emit_event(RefreshEvent::Started);

        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.refresh_if_stale().await {
                        Ok(Some(snapshot)) => {
                            debug!("Cycle done (fallback: {})", snapshot.is_stale_fallback);
                        }
                        Ok(None) => warn!("No snapshot available yet; retrying next cycle"),
                        Err(e) => error!("Refresh cycle failed: {}", e),
                    }
                }

                _ = &mut shutdown => {
                    info!("Shutdown signal received");
                    self.emit_event(RefreshEvent::Stopped {
                        reason: "Shutdown signal".to_string(),
                    });
                    break;
                }
            }
        }

        self.cache.flush().await?;
        info!("Cache flushed, refresh loop stopped");
        Ok(())
    }

    fn emit_event(&self, event: RefreshEvent) {
        // Dropped rather than awaited so a slow consumer never stalls a refresh
        if self.event_tx.try_send(event).is_err() {
            warn!("Event channel full, dropping event. Consider increasing event_channel_capacity.");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_names_match_cycle_diagram() {
        assert_eq!(RefreshStage::FreshCacheHit.to_string(), "FRESH_CACHE_HIT");
        assert_eq!(RefreshStage::CommitFallback.to_string(), "COMMIT_FALLBACK");
    }

    #[test]
    fn stage_failure_display_names_stage() {
        let failure = StageFailure::new(RefreshStage::FetchingWeather, "unexpected status 500");
        assert_eq!(
            failure.to_string(),
            "FETCHING_WEATHER failed: unexpected status 500"
        );
    }
}
