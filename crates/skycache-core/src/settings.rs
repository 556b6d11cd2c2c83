//! User preferences with default-on-first-use semantics
//!
//! The settings manager is the only writer of [`CacheKey::Settings`].
//! Updates replace the whole record; there is no field-level merge.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::cache::{CacheKey, CacheStore};
use crate::error::Result;

/// User notification and display preferences
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Time of day for the daily notification, `HH:MM:SS`
    pub notify_time: NaiveTime,
    pub notify_enabled: bool,
    pub notify_persistent: bool,
    pub use_metric: bool,
    pub can_notify: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            notify_time: NaiveTime::from_hms_opt(7, 0, 0).unwrap_or(NaiveTime::MIN),
            notify_enabled: false,
            notify_persistent: false,
            use_metric: true,
            can_notify: true,
        }
    }
}

/// Reads and replaces the persisted [`Settings`]
#[derive(Debug, Clone)]
pub struct SettingsManager {
    cache: CacheStore,
}

impl SettingsManager {
    pub fn new(cache: CacheStore) -> Self {
        Self { cache }
    }

    /// Current settings, creating and persisting defaults on first use
    pub async fn get_settings(&self) -> Result<Settings> {
        if let Some(settings) = self.cache.read::<Settings>(CacheKey::Settings).await? {
            return Ok(settings);
        }

        let defaults = Settings::default();
        self.cache.write(CacheKey::Settings, &defaults).await?;
        tracing::info!("Initialized default settings");
        Ok(defaults)
    }

    /// Replace the persisted settings wholesale
    pub async fn set_settings(&self, settings: &Settings) -> Result<()> {
        self.cache.write(CacheKey::Settings, settings).await?;
        tracing::debug!("Settings replaced");
        Ok(())
    }

    /// Delete the persisted settings; the next read re-creates defaults
    pub async fn reset_settings(&self) -> Result<()> {
        self.cache.delete(CacheKey::Settings).await
    }
}
