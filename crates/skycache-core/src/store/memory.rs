// # Memory Persistence
//
// In-memory implementation of Persistence.
//
// ## Purpose
//
// Provides a simple, fast backend that doesn't persist across restarts.
// Useful for testing and for deployments where re-fetching the forecast
// on every start is acceptable.
//
// ## Crash Behavior
//
// - All entries are lost on restart/crash
// - First refresh after a restart bootstraps a new snapshot
// - Settings fall back to defaults

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::Error;
use crate::traits::persistence::Persistence;

/// In-memory persistence backend
///
/// Entries live in a HashMap protected by a RwLock. Clones share the same
/// map, so a test can keep a handle while the core owns another.
///
/// # Example
///
/// ```rust,no_run
/// use skycache_core::store::MemoryPersistence;
/// use skycache_core::traits::Persistence;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = MemoryPersistence::new();
///
///     store.set("SETTINGS", "{}".to_string()).await?;
///     assert_eq!(store.get("SETTINGS").await?, Some("{}".to_string()));
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryPersistence {
    inner: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryPersistence {
    /// Create a new empty memory backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of entries
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Check if the backend is empty
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

#[async_trait]
impl Persistence for MemoryPersistence {
    async fn get(&self, key: &str) -> Result<Option<String>, Error> {
        let guard = self.inner.read().await;
        Ok(guard.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        guard.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        guard.remove(key);
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, Error> {
        let guard = self.inner.read().await;
        Ok(guard.keys().cloned().collect())
    }

    async fn flush(&self) -> Result<(), Error> {
        Ok(())
    }
}
