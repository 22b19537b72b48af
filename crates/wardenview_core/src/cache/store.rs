//! Key-value store backends.

use crate::error::AppError;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use tokio::sync::{Mutex, RwLock};

/// Asynchronous get/set-by-key persistence boundary.
///
/// Absent keys are `Ok(None)`; consumers treat that as "use the default".
/// No locking is promised across handles or processes: overlapping writes are
/// last-write-wins.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<Value>, AppError>> + Send;

    fn set(&self, key: &str, value: Value) -> impl Future<Output = Result<(), AppError>> + Send;

    fn remove(&self, key: &str) -> impl Future<Output = Result<(), AppError>> + Send;
}

/// Volatile store used by tests and short-lived sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, AppError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), AppError> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), AppError> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

/// Store persisted as a single JSON object on disk.
///
/// Every read goes to the file so separate processes sharing the path see
/// each other's writes. Writes replace the file through a temp file + rename.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Open (lazily) a store at `path`. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Map<String, Value>, AppError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(err) => return Err(err.into()),
        };
        if raw.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str::<Value>(&raw)? {
            Value::Object(map) => Ok(map),
            _ => Err(AppError::Storage(format!(
                "store file {} does not contain a JSON object",
                self.path.display()
            ))),
        }
    }

    /// Current contents for a read-modify-write.
    ///
    /// Only undecodable contents are replaced with an empty map; I/O errors
    /// abort the write so a transient failure cannot wipe the other keys.
    async fn load_for_write(&self) -> Result<Map<String, Value>, AppError> {
        match self.load().await {
            Ok(map) => Ok(map),
            Err(err @ AppError::Io(_)) => Err(err),
            Err(err) => {
                tracing::warn!(
                    "Discarding undecodable store file {}: {}",
                    self.path.display(),
                    err
                );
                Ok(Map::new())
            }
        }
    }

    async fn persist(&self, map: Map<String, Value>) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        let encoded = serde_json::to_vec_pretty(&Value::Object(map))?;
        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, encoded).await?;
        tokio::fs::rename(&tmp_path, &self.path).await?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, AppError> {
        Ok(self.load().await?.remove(key))
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), AppError> {
        let _guard = self.write_lock.lock().await;
        let mut map = self.load_for_write().await?;
        map.insert(key.to_string(), value);
        self.persist(map).await
    }

    async fn remove(&self, key: &str) -> Result<(), AppError> {
        let _guard = self.write_lock.lock().await;
        let mut map = self.load_for_write().await?;
        if map.remove(key).is_some() {
            self.persist(map).await?;
        }
        Ok(())
    }
}
