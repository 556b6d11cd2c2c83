// # File Persistence
//
// File-based implementation of Persistence with crash recovery.
//
// ## Purpose
//
// Keeps the weather snapshot and settings across restarts so that a
// restart inside the refresh window does not trigger network work.
//
// ## Crash Recovery
//
// - Atomic writes: Uses write-then-rename for atomicity
// - Corruption detection: Validates JSON on load
// - Automatic backup: Keeps .backup of last known good document
// - Recovery: Falls back to backup if corruption detected
//
// ## File Format
//
// ```json
// {
//   "version": "1.0",
//   "entries": {
//     "WEATHER": "{\"position\":{...},\"last_updated\":\"2025-01-09T12:00:00Z\",...}",
//     "SETTINGS": "{\"notify_time\":\"07:00:00\",...}"
//   }
// }
// ```

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

use crate::Error;
use crate::traits::persistence::Persistence;

/// Document format version
const DOCUMENT_VERSION: &str = "1.0";

/// File-based persistence backend with crash recovery
///
/// Every mutation is written through to disk before returning.
///
/// # Example
///
/// ```rust,no_run
/// use skycache_core::store::FilePersistence;
/// use skycache_core::traits::Persistence;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = FilePersistence::new("/var/lib/skycache/cache.json").await?;
///
///     store.set("SETTINGS", "{}".to_string()).await?;
///     assert_eq!(store.get("SETTINGS").await?, Some("{}".to_string()));
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct FilePersistence {
    path: PathBuf,
    state: Arc<RwLock<FileState>>,
}

#[derive(Debug)]
struct FileState {
    entries: HashMap<String, String>,
    dirty: bool,
}

/// Serializable document format
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct DocumentFormat {
    version: String,
    entries: HashMap<String, String>,
}

/// Outcome of reading one document from disk
enum LoadError {
    /// The document exists but is not valid JSON in the expected shape
    Corrupt(Error),
    /// The document could not be read at all
    Unreadable(Error),
}

impl FilePersistence {
    /// Create or load a file backend
    ///
    /// This will:
    /// 1. Create parent directories if needed
    /// 2. Try to load the existing document
    /// 3. If corruption is detected, try the backup
    /// 4. If both fail, start empty
    pub async fn new<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).await.map_err(|e| {
                Error::config(format!(
                    "Failed to create cache directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let entries = Self::load_with_recovery(&path).await?;

        Ok(Self {
            path,
            state: Arc::new(RwLock::new(FileState {
                entries,
                dirty: false,
            })),
        })
    }

    /// Path of the main document
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load_with_recovery(path: &Path) -> Result<HashMap<String, String>, Error> {
        match Self::load(path).await {
            Ok(entries) => {
                tracing::debug!("Loaded cache document: {} entries", entries.len());
                Ok(entries)
            }
            Err(LoadError::Unreadable(e)) => Err(e),
            Err(LoadError::Corrupt(e)) => {
                tracing::warn!(
                    "Cache document appears corrupted: {}. Attempting recovery from backup.",
                    e
                );

                let backup_path = Self::backup_path(path);
                if !backup_path.exists() {
                    tracing::warn!("No backup file found. Starting with empty cache.");
                    return Ok(HashMap::new());
                }

                match Self::load(&backup_path).await {
                    Ok(entries) => {
                        tracing::info!("Recovered cache from backup: {} entries", entries.len());
                        if let Err(restore_err) = fs::copy(&backup_path, path).await {
                            tracing::error!(
                                "Failed to restore cache document from backup: {}",
                                restore_err
                            );
                        }
                        Ok(entries)
                    }
                    Err(LoadError::Corrupt(backup_err)) | Err(LoadError::Unreadable(backup_err)) => {
                        tracing::error!(
                            "Backup also unusable: {}. Starting with empty cache.",
                            backup_err
                        );
                        Ok(HashMap::new())
                    }
                }
            }
        }
    }

    async fn load(path: &Path) -> Result<HashMap<String, String>, LoadError> {
        if !path.exists() {
            tracing::debug!("Cache document does not exist: {}", path.display());
            return Ok(HashMap::new());
        }

        let content = fs::read_to_string(path).await.map_err(|e| {
            LoadError::Unreadable(Error::persistence(format!(
                "Failed to read cache document {}: {}",
                path.display(),
                e
            )))
        })?;

        let document: DocumentFormat = serde_json::from_str(&content).map_err(|e| {
            LoadError::Corrupt(Error::persistence(format!(
                "Failed to parse cache document {}: {}",
                path.display(),
                e
            )))
        })?;

        if document.version != DOCUMENT_VERSION {
            tracing::warn!(
                "Cache document version mismatch: expected {}, got {}. Attempting to load anyway.",
                DOCUMENT_VERSION,
                document.version
            );
        }

        Ok(document.entries)
    }

    /// Write the document atomically
    async fn write_document(&self) -> Result<(), Error> {
        let mut guard = self.state.write().await;

        let document = DocumentFormat {
            version: DOCUMENT_VERSION.to_string(),
            entries: guard.entries.clone(),
        };
        let json = serde_json::to_string_pretty(&document)
            .map_err(|e| Error::persistence(format!("Failed to serialize cache: {}", e)))?;

        let temp_path = self.temp_path();
        {
            let mut file = fs::File::create(&temp_path).await.map_err(|e| {
                Error::persistence(format!(
                    "Failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
            file.write_all(json.as_bytes()).await.map_err(|e| {
                Error::persistence(format!(
                    "Failed to write temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
            file.flush().await.map_err(|e| {
                Error::persistence(format!(
                    "Failed to flush temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
        }

        if self.path.exists() {
            let backup_path = Self::backup_path(&self.path);
            if let Err(e) = fs::copy(&self.path, &backup_path).await {
                tracing::warn!("Failed to create backup: {}", e);
            }
        }

        fs::rename(&temp_path, &self.path).await.map_err(|e| {
            Error::persistence(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        guard.dirty = false;
        tracing::trace!("Cache document written: {}", self.path.display());
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut temp = self.path.clone();
        temp.set_extension("tmp");
        temp
    }

    fn backup_path(path: &Path) -> PathBuf {
        let mut backup = path.to_path_buf();
        backup.set_extension("backup");
        backup
    }
}

#[async_trait]
impl Persistence for FilePersistence {
    async fn get(&self, key: &str) -> Result<Option<String>, Error> {
        let guard = self.state.read().await;
        Ok(guard.entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<(), Error> {
        {
            let mut guard = self.state.write().await;
            guard.entries.insert(key.to_string(), value);
            guard.dirty = true;
        }
        self.write_document().await
    }

    async fn delete(&self, key: &str) -> Result<(), Error> {
        {
            let mut guard = self.state.write().await;
            if guard.entries.remove(key).is_none() {
                return Ok(());
            }
            guard.dirty = true;
        }
        self.write_document().await
    }

    async fn keys(&self) -> Result<Vec<String>, Error> {
        let guard = self.state.read().await;
        Ok(guard.entries.keys().cloned().collect())
    }

    async fn flush(&self) -> Result<(), Error> {
        let dirty = self.state.read().await.dirty;
        if dirty {
            self.write_document().await
        } else {
            Ok(())
        }
    }
}
