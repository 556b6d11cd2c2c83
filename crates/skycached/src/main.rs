// # skycached - Weather Snapshot Daemon
//
// The skycached daemon is a thin integration layer. It is responsible for:
// 1. Reading configuration from environment variables
// 2. Initializing logging and the runtime
// 3. Wiring the position source, HTTP transport and cache backend
// 4. Running the refresh orchestrator, once or on an interval
//
// All refresh, fallback and forecast logic lives in skycache-core.
//
// ## Configuration
//
// All configuration is done via environment variables:
//
// ### Forecast API
// - `SKYCACHE_API_KEY`: API key (required)
// - `SKYCACHE_WEATHER_ENDPOINT`: Forecast endpoint (default: OpenWeatherMap 2.5 forecast)
//
// ### Position
// - `SKYCACHE_POSITION_SOURCE`: Type of position source (fixed, http)
// - `SKYCACHE_LATITUDE` / `SKYCACHE_LONGITUDE`: Coordinates (for fixed)
// - `SKYCACHE_POSITION_URL`: Geolocation URL (for http)
//
// ### Cache
// - `SKYCACHE_CACHE`: Type of cache backend (file, memory)
// - `SKYCACHE_CACHE_PATH`: Path to the cache document (for file)
//
// ### Refresh
// - `SKYCACHE_REFRESH_THRESHOLD_SECS`: Snapshot age that triggers a refresh
// - `SKYCACHE_POLL_INTERVAL_SECS`: Interval between refresh cycles
// - `SKYCACHE_ONESHOT`: Refresh once, print the summary and exit
//
// ## Example
//
// ```bash
// export SKYCACHE_API_KEY=your_key
// export SKYCACHE_POSITION_SOURCE=fixed
// export SKYCACHE_LATITUDE=35.68
// export SKYCACHE_LONGITUDE=139.69
// export SKYCACHE_CACHE=file
// export SKYCACHE_CACHE_PATH=/var/lib/skycache/cache.json
//
// skycached
// ```

use anyhow::Result;
use skycache_core::config::{
    CacheConfig, PositionSourceConfig, RefreshConfig, SkycacheConfig, WeatherApiConfig,
};
use skycache_core::refresh::RefreshEvent;
use skycache_core::traits::{Alerter, LogAlerter, Persistence, PositionSource};
use skycache_core::{
    CacheStore, FilePersistence, FixedPositionSource, ForecastAnalyzer, MemoryPersistence,
    PositionProvider, RefreshOrchestrator, Snapshot, WeatherClient,
};
use skycache_http::ReqwestHttpClient;
use std::env;
use std::fmt::Display;
use std::process::ExitCode;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum SkycacheExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<SkycacheExitCode> for ExitCode {
    fn from(code: SkycacheExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
struct Config {
    api_key: String,
    weather_endpoint: Option<String>,
    position_source: String,
    latitude: Option<f64>,
    longitude: Option<f64>,
    position_url: Option<String>,
    cache: String,
    cache_path: Option<String>,
    refresh_threshold_secs: Option<u64>,
    poll_interval_secs: Option<u64>,
    oneshot: bool,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        Ok(Self {
            api_key: lookup("SKYCACHE_API_KEY").unwrap_or_default(),
            weather_endpoint: lookup("SKYCACHE_WEATHER_ENDPOINT"),
            position_source: lookup("SKYCACHE_POSITION_SOURCE")
                .unwrap_or_else(|| "fixed".to_string()),
            latitude: parse_var(&lookup, "SKYCACHE_LATITUDE")?,
            longitude: parse_var(&lookup, "SKYCACHE_LONGITUDE")?,
            position_url: lookup("SKYCACHE_POSITION_URL"),
            cache: lookup("SKYCACHE_CACHE").unwrap_or_else(|| "file".to_string()),
            cache_path: lookup("SKYCACHE_CACHE_PATH"),
            refresh_threshold_secs: parse_var(&lookup, "SKYCACHE_REFRESH_THRESHOLD_SECS")?,
            poll_interval_secs: parse_var(&lookup, "SKYCACHE_POLL_INTERVAL_SECS")?,
            oneshot: lookup("SKYCACHE_ONESHOT")
                .is_some_and(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes")),
            log_level: lookup("SKYCACHE_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        if self.api_key.is_empty() {
            anyhow::bail!(
                "SKYCACHE_API_KEY is required. \
                Set it via: export SKYCACHE_API_KEY=your_key"
            );
        }

        match self.position_source.as_str() {
            "fixed" => {
                if self.latitude.is_none() || self.longitude.is_none() {
                    anyhow::bail!(
                        "SKYCACHE_LATITUDE and SKYCACHE_LONGITUDE are required \
                        when SKYCACHE_POSITION_SOURCE=fixed"
                    );
                }
            }
            "http" => {
                if !cfg!(feature = "geo-http") {
                    anyhow::bail!(
                        "SKYCACHE_POSITION_SOURCE=http requires the 'geo-http' feature"
                    );
                }
                if self.position_url.as_ref().is_none_or(|u| u.is_empty()) {
                    anyhow::bail!("SKYCACHE_POSITION_URL is required when SKYCACHE_POSITION_SOURCE=http");
                }
            }
            other => anyhow::bail!(
                "SKYCACHE_POSITION_SOURCE '{}' is not supported. \
                Supported types: fixed, http",
                other
            ),
        }

        match self.cache.as_str() {
            "memory" => {}
            "file" => {
                let Some(path) = self.cache_path.as_deref().filter(|p| !p.is_empty()) else {
                    anyhow::bail!(
                        "SKYCACHE_CACHE_PATH is required when SKYCACHE_CACHE=file. \
                        Set it via: export SKYCACHE_CACHE_PATH=/var/lib/skycache/cache.json"
                    );
                };
                if let Some(parent) = std::path::Path::new(path).parent()
                    && !parent.as_os_str().is_empty()
                    && !parent.exists()
                {
                    anyhow::bail!(
                        "SKYCACHE_CACHE_PATH parent directory does not exist: {}. \
                        Create it first: sudo mkdir -p {}",
                        parent.display(),
                        parent.display()
                    );
                }
            }
            other => anyhow::bail!(
                "SKYCACHE_CACHE '{}' is not supported. \
                Supported types: file, memory",
                other
            ),
        }

        if let Some(ref url) = self.weather_endpoint
            && url.starts_with("http://")
        {
            eprintln!(
                "WARNING: SKYCACHE_WEATHER_ENDPOINT uses HTTP (not HTTPS). \
                The API key is sent in the query string."
            );
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "SKYCACHE_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        self.to_core_config()?.validate()?;
        Ok(())
    }

    /// Build the typed core configuration
    fn to_core_config(&self) -> Result<SkycacheConfig> {
        let position_source = match self.position_source.as_str() {
            "http" => PositionSourceConfig::Http {
                url: self.position_url.clone().unwrap_or_default(),
            },
            _ => PositionSourceConfig::Fixed {
                latitude: self.latitude.unwrap_or_default(),
                longitude: self.longitude.unwrap_or_default(),
            },
        };

        let mut weather = WeatherApiConfig::new(self.api_key.clone());
        if let Some(ref endpoint) = self.weather_endpoint {
            weather.endpoint = endpoint.clone();
        }

        let cache = match self.cache.as_str() {
            "file" => CacheConfig::File {
                path: self.cache_path.clone().unwrap_or_default(),
            },
            _ => CacheConfig::Memory,
        };

        let mut refresh = RefreshConfig::default();
        if let Some(secs) = self.refresh_threshold_secs {
            refresh.refresh_threshold_secs = secs;
        }
        if let Some(secs) = self.poll_interval_secs {
            refresh.poll_interval_secs = secs;
        }

        Ok(SkycacheConfig {
            position_source,
            weather,
            cache,
            refresh,
        })
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| anyhow::anyhow!("{} has an invalid value '{}': {}", key, raw, e)),
        None => Ok(None),
    }
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return SkycacheExitCode::ConfigError.into();
        }
    };

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return SkycacheExitCode::ConfigError.into();
    }

    // Initialize tracing
    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return SkycacheExitCode::ConfigError.into();
    }

    info!("Starting skycached");

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return SkycacheExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run_daemon(config).await {
            error!("Daemon error: {:#}", e);
            SkycacheExitCode::RuntimeError
        } else {
            SkycacheExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Run the daemon
async fn run_daemon(config: Config) -> Result<()> {
    let core = config.to_core_config()?;

    info!("Position source: {}", core.position_source.type_name());
    info!("Weather endpoint: {}", core.weather.endpoint);
    info!(
        "Refresh threshold: {}s, poll interval: {}s",
        core.refresh.refresh_threshold_secs, core.refresh.poll_interval_secs
    );

    let alerter: Arc<dyn Alerter> = Arc::new(LogAlerter);

    let position = PositionProvider::with_timeout(
        build_position_source(&core.position_source)?,
        Arc::clone(&alerter),
        core.refresh.position_timeout(),
    );

    let http = ReqwestHttpClient::new(core.weather.timeout())?;
    let weather = WeatherClient::new(Arc::new(http), alerter, core.weather.clone());

    let backend: Arc<dyn Persistence> = match &core.cache {
        CacheConfig::File { path } => {
            let file = FilePersistence::new(path).await?;
            info!("Cache file: {}", file.path().display());
            Arc::new(file)
        }
        CacheConfig::Memory => {
            warn!("Using in-memory cache; the snapshot is lost on exit");
            Arc::new(MemoryPersistence::new())
        }
    };
    let cache = CacheStore::new(backend);

    let analyzer = ForecastAnalyzer::new(core.refresh.forecast_window, core.refresh.rain_threshold);

    let (orchestrator, events) =
        RefreshOrchestrator::new(position, weather, analyzer, cache.clone(), &core.refresh)?;

    if config.oneshot {
        // Receiver stays alive so events are not reported as dropped
        let _events = events;

        let snapshot = orchestrator.refresh_if_stale().await?;
        cache.flush().await?;

        return match snapshot {
            Some(snapshot) => {
                println!("{}", render_summary(&snapshot, &core.weather.units));
                Ok(())
            }
            None => Err(anyhow::anyhow!(
                "No weather snapshot available: nothing cached and the initial fetch failed"
            )),
        };
    }

    let logger = tokio::spawn(log_events(events));

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let signals = tokio::spawn(async move {
        let outcome = wait_for_shutdown().await;
        let _ = shutdown_tx.send(());
        outcome
    });

    info!("Daemon initialized successfully");
    let result = orchestrator.run_with_shutdown(shutdown_rx).await;

    // Closes the event channel so the logger drains and exits
    drop(orchestrator);
    if let Err(e) = logger.await {
        warn!("Event logger task failed: {}", e);
    }

    let signal = signals.await??;
    info!("Received shutdown signal: {}", signal);

    result?;
    info!("Shutting down daemon");
    Ok(())
}

fn build_position_source(config: &PositionSourceConfig) -> Result<Box<dyn PositionSource>> {
    match config {
        PositionSourceConfig::Fixed {
            latitude,
            longitude,
        } => Ok(Box::new(FixedPositionSource::new(*latitude, *longitude))),
        #[cfg(feature = "geo-http")]
        PositionSourceConfig::Http { url } => Ok(Box::new(
            skycache_geo_http::HttpPositionSource::new(url.clone()),
        )),
        #[cfg(not(feature = "geo-http"))]
        PositionSourceConfig::Http { .. } => Err(anyhow::anyhow!(
            "HTTP position source requires the 'geo-http' feature"
        )),
    }
}

/// Log refresh events until the orchestrator is dropped
async fn log_events(events: mpsc::Receiver<RefreshEvent>) {
    let mut stream = ReceiverStream::new(events);
    while let Some(event) = stream.next().await {
        match event {
            RefreshEvent::CacheHit { age_secs } => debug!("Snapshot fresh ({}s old)", age_secs),
            RefreshEvent::StageEntered { stage } => debug!("Entered {}", stage),
            RefreshEvent::StageFailed { stage, reason } => warn!("{} failed: {}", stage, reason),
            RefreshEvent::Committed { summary } => info!(
                "Forecast: {} ({} to {})",
                display_description(&summary.description),
                summary.temp_min,
                summary.temp_max
            ),
            RefreshEvent::FallbackCommitted { reason } => {
                warn!("Kept previous snapshot: {}", reason)
            }
            RefreshEvent::BootstrapFailed { reason } => {
                error!("No snapshot available yet: {}", reason)
            }
            RefreshEvent::Started => info!("Refresh loop started"),
            RefreshEvent::Stopped { reason } => info!("Refresh loop stopped: {}", reason),
        }
    }
}

fn display_description(description: &str) -> &str {
    if description.is_empty() {
        "no rain expected"
    } else {
        description
    }
}

fn unit_suffix(units: &str) -> &'static str {
    match units {
        "metric" => "°C",
        "imperial" => "°F",
        _ => "K",
    }
}

/// One-line human summary of a snapshot
fn render_summary(snapshot: &Snapshot, units: &str) -> String {
    let updated = snapshot.last_updated.format("%Y-%m-%d %H:%M:%S UTC");
    match &snapshot.summary {
        Some(summary) => format!(
            "{} | {:.1}{unit} to {:.1}{unit} | updated {}{}",
            display_description(&summary.description),
            summary.temp_min,
            summary.temp_max,
            updated,
            if snapshot.is_stale_fallback {
                " (cached)"
            } else {
                ""
            },
            unit = unit_suffix(units),
        ),
        None => format!("no summary | updated {}", updated),
    }
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
///
/// # Returns
///
/// Returns the name of the signal received.
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    let signal = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };
    Ok(signal)
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
