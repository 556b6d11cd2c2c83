//! Typed snapshot storage on top of a [`Persistence`] backend
//!
//! `CacheStore` owns the encoding (JSON text) and the key namespace. Each
//! key has exactly one logical writer: the refresh orchestrator writes
//! [`CacheKey::Weather`], the settings manager writes [`CacheKey::Settings`].

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::traits::Persistence;

/// Logical cache domains
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Serialized weather snapshot
    Weather,
    /// Serialized user settings
    Settings,
}

impl CacheKey {
    /// Storage key used by the persistence backend
    pub fn as_str(self) -> &'static str {
        match self {
            CacheKey::Weather => "WEATHER",
            CacheKey::Settings => "SETTINGS",
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Durable read/write/delete of typed values keyed by [`CacheKey`]
///
/// Cheap to clone; clones share the backend.
#[derive(Clone)]
pub struct CacheStore {
    backend: Arc<dyn Persistence>,
}

impl CacheStore {
    pub fn new(backend: Arc<dyn Persistence>) -> Self {
        Self { backend }
    }

    /// Read and decode the value under `key`
    ///
    /// # Returns
    ///
    /// - `Ok(Some(T))`: A decodable value was stored
    /// - `Ok(None)`: Read miss
    /// - `Err(Error::Json)`: A value was stored but does not decode as `T`
    /// - `Err(Error)`: Backend failure
    pub async fn read<T: DeserializeOwned>(&self, key: CacheKey) -> Result<Option<T>> {
        match self.backend.get(key.as_str()).await? {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }

    /// Encode `value` and store it under `key`, replacing any previous value
    pub async fn write<T: Serialize>(&self, key: CacheKey, value: &T) -> Result<()> {
        let text = serde_json::to_string(value)?;
        self.backend.set(key.as_str(), text).await?;
        tracing::trace!("Wrote cache key {}", key);
        Ok(())
    }

    /// Remove the value under `key`
    pub async fn delete(&self, key: CacheKey) -> Result<()> {
        self.backend.delete(key.as_str()).await?;
        tracing::debug!("Deleted cache key {}", key);
        Ok(())
    }

    /// Persist pending backend changes
    pub async fn flush(&self) -> Result<()> {
        self.backend.flush().await
    }
}

impl fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheStore").finish_non_exhaustive()
    }
}

/// Convenience for tests and callers that treat a corrupt value like a miss
pub(crate) fn is_decode_error(err: &Error) -> bool {
    matches!(err, Error::Json(_))
}
