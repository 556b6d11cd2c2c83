// # Persistence Trait
//
// Defines the interface for durable key-value storage of opaque text blobs.
//
// ## Purpose
//
// The persistence backend holds the serialized weather snapshot and the
// user settings between process runs. It knows nothing about what the
// blobs contain; encoding is owned by `CacheStore`.
//
// ## Implementations
//
// - `FilePersistence`: JSON document on disk with backup recovery
// - `MemoryPersistence`: process-local map
//
// ## Usage
//
// ```rust,ignore
// use skycache_core::Persistence;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let store = /* Persistence implementation */;
//
//     store.set("WEATHER", "{...}".to_string()).await?;
//     let blob = store.get("WEATHER").await?;
//     store.delete("WEATHER").await?;
//
//     Ok(())
// }
// ```

use async_trait::async_trait;

/// Trait for persistence backends
///
/// # Semantics
///
/// - `get` returns `Ok(None)` for a missing key. A miss is not an error and
///   is distinct from an empty string.
/// - `set` overwrites (last write wins).
/// - `delete` succeeds when the key does not exist.
///
/// # Thread Safety
///
/// All methods must be safe to call concurrently from multiple tasks.
/// Callers still serialize writes per key: each key has a single logical
/// owner.
#[async_trait]
pub trait Persistence: Send + Sync {
    /// Read the blob stored under `key`
    ///
    /// # Returns
    ///
    /// - `Ok(Some(String))`: The stored blob
    /// - `Ok(None)`: Nothing stored under this key
    /// - `Err(Error)`: Storage error
    async fn get(&self, key: &str) -> Result<Option<String>, crate::Error>;

    /// Store `value` under `key`, replacing any previous blob
    async fn set(&self, key: &str, value: String) -> Result<(), crate::Error>;

    /// Remove `key`
    async fn delete(&self, key: &str) -> Result<(), crate::Error>;

    /// List all keys
    async fn keys(&self) -> Result<Vec<String>, crate::Error>;

    /// Persist any pending changes
    ///
    /// Backends that write through on every `set` implement this as a no-op.
    async fn flush(&self) -> Result<(), crate::Error>;
}
