// # skycache-core
//
// Core library for the TTL-gated weather cache and same-day forecast summarizer.
//
// ## Architecture Overview
//
// This library provides the core functionality for keeping a weather snapshot fresh:
// - **PositionSource**: Trait for acquiring the device position
// - **HttpClient**: Trait for the GET transport used by the forecast client
// - **Persistence**: Trait for the key-value store behind the cache
// - **Alerter**: Trait for surfacing failures to the user
// - **RefreshOrchestrator**: Decides staleness and runs position → weather → analysis → commit
// - **ForecastAnalyzer**: Pure reduction of a forecast payload to a same-day summary
// - **SettingsManager**: User preferences with defaults on first use
//
// ## Design Principles
//
// 1. **Last good value wins**: A failed refresh never replaces a complete snapshot
// 2. **Single writer per key**: The orchestrator owns `WEATHER`, the settings manager owns `SETTINGS`
// 3. **Library-First**: Transports and stores are injected through traits
// 4. **Idempotency**: Repeated calls inside the refresh window touch no network

pub mod cache;
pub mod config;
pub mod error;
pub mod forecast;
pub mod position;
pub mod refresh;
pub mod settings;
pub mod snapshot;
pub mod store;
pub mod traits;
pub mod weather;

// Re-export core types for convenience
pub use cache::{CacheKey, CacheStore};
pub use config::{CacheConfig, PositionSourceConfig, RefreshConfig, SkycacheConfig, WeatherApiConfig};
pub use error::{Error, PositionError, PositionErrorCode, Result, WeatherFetchError};
pub use forecast::{ForecastAnalyzer, ForecastInterval, ForecastPayload, ForecastSummary};
pub use position::{FixedPositionSource, PositionProvider};
pub use refresh::{RefreshEvent, RefreshOrchestrator, RefreshStage};
pub use settings::{Settings, SettingsManager};
pub use snapshot::Snapshot;
pub use store::{FilePersistence, MemoryPersistence};
pub use traits::{Alert, Alerter, HttpClient, LogAlerter, NullAlerter, Persistence, Position, PositionSource};
pub use weather::WeatherClient;
