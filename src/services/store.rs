//! Durable key-value storage
//!
//! Whole-value overwrite semantics, no transactions. Values are JSON.
//! Backends: a single JSON document on disk, Redis, or process memory.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

use crate::config::{Config, StoreBackend};
use crate::services::redis::RedisStore;

/// Storage keys shared with the browser side
pub mod keys {
    pub const CONTENT_CACHE: &str = "contentCache";
    pub const SETTINGS: &str = "settings";
    pub const LAST_CLICKED_IMDB_ID: &str = "lastClickedImdbId";
    pub const CURRENT_IMDB_ID: &str = "currentImdbId";
    pub const CONTENT_TYPE: &str = "contentType";
}

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    async fn set(&self, key: &str, value: Value) -> Result<()>;

    async fn remove(&self, key: &str) -> Result<()>;

    /// Remove a key and return its previous value in one step
    async fn take(&self, key: &str) -> Result<Option<Value>>;

    /// Backend liveness (used by health checks)
    async fn ping(&self) -> Result<bool> {
        Ok(true)
    }

    fn backend(&self) -> &'static str;
}

/// Typed, cloneable handle over a storage backend
#[derive(Clone)]
pub struct Store {
    inner: Arc<dyn KeyValueStore>,
}

impl Store {
    pub fn new(inner: Arc<dyn KeyValueStore>) -> Self {
        Self { inner }
    }

    /// Process-local store
    pub fn memory() -> Self {
        Self::new(Arc::new(MemoryStore::default()))
    }

    /// Open the backend selected in configuration
    pub async fn from_config(config: &Config) -> Result<Self> {
        let store = match config.store_backend {
            StoreBackend::File => Self::new(Arc::new(FileStore::open(&config.store_path).await?)),
            StoreBackend::Redis => Self::new(Arc::new(
                RedisStore::new(&config.redis_url, &config.redis_key_prefix).await?,
            )),
            StoreBackend::Memory => Self::memory(),
        };
        Ok(store)
    }

    /// Get a key and deserialize
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.inner.get(key).await? {
            Some(value) => {
                let parsed = serde_json::from_value(value)
                    .with_context(|| format!("Failed to decode stored value for '{}'", key))?;
                Ok(Some(parsed))
            }
            None => Ok(None),
        }
    }

    pub async fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let value = serde_json::to_value(value)?;
        self.inner.set(key, value).await
    }

    pub async fn remove(&self, key: &str) -> Result<()> {
        self.inner.remove(key).await
    }

    /// Read a key and delete it. Concurrent takes of one key see the value once.
    pub async fn take<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.inner.take(key).await? {
            Some(value) => {
                let parsed = serde_json::from_value(value)
                    .with_context(|| format!("Failed to decode stored value for '{}'", key))?;
                Ok(Some(parsed))
            }
            None => Ok(None),
        }
    }

    pub async fn ping(&self) -> bool {
        self.inner.ping().await.unwrap_or(false)
    }

    pub fn backend(&self) -> &'static str {
        self.inner.backend()
    }
}

/// In-memory store
#[derive(Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, Value>>,
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        self.values.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.values.write().await.remove(key);
        Ok(())
    }

    async fn take(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.values.write().await.remove(key))
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

/// All keys in one JSON document, rewritten on every change
pub struct FileStore {
    path: PathBuf,
    values: RwLock<HashMap<String, Value>>,
}

impl FileStore {
    /// Open the store file, creating its directory if needed.
    /// An unreadable or corrupt file starts the store empty.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create store directory {}", parent.display()))?;
        }

        let values = match fs::read_to_string(&path).await {
            Ok(content) => match serde_json::from_str::<HashMap<String, Value>>(&content) {
                Ok(values) => values,
                Err(e) => {
                    tracing::warn!("Failed to parse store file {}: {}", path.display(), e);
                    HashMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                tracing::warn!("Failed to read store file {}: {}", path.display(), e);
                HashMap::new()
            }
        };

        tracing::info!("Store file {} opened with {} keys", path.display(), values.len());

        Ok(Self {
            path,
            values: RwLock::new(values),
        })
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }

    async fn persist(&self, values: &HashMap<String, Value>) -> Result<()> {
        let tmp_path = self.tmp_path();
        let content = serde_json::to_string_pretty(values)?;

        let mut file = File::create(&tmp_path).await?;
        file.write_all(content.as_bytes()).await?;
        file.sync_all().await?;

        // Atomic replace to avoid readers seeing partial writes
        fs::rename(&tmp_path, &self.path)
            .await
            .with_context(|| format!("Failed to replace store file {}", self.path.display()))?;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        // Hold the write lock across the file write so writes land in call order
        let mut values = self.values.write().await;
        values.insert(key.to_string(), value);
        self.persist(&values).await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let mut values = self.values.write().await;
        if values.remove(key).is_some() {
            self.persist(&values).await?;
        }
        Ok(())
    }

    async fn take(&self, key: &str) -> Result<Option<Value>> {
        let mut values = self.values.write().await;
        let previous = values.remove(key);
        if previous.is_some() {
            self.persist(&values).await?;
        }
        Ok(previous)
    }

    async fn ping(&self) -> Result<bool> {
        Ok(self.path.parent().map_or(true, |p| p.as_os_str().is_empty() || p.exists()))
    }

    fn backend(&self) -> &'static str {
        "file"
    }
}

/// Test backends
#[cfg(test)]
pub mod testing {
    use super::*;
    use std::time::Duration;

    /// Memory store that sleeps before every operation
    #[derive(Default)]
    pub struct SlowStore {
        inner: MemoryStore,
        delay: Duration,
    }

    impl SlowStore {
        pub fn new(delay: Duration) -> Self {
            Self {
                inner: MemoryStore::default(),
                delay,
            }
        }
    }

    #[async_trait]
    impl KeyValueStore for SlowStore {
        async fn get(&self, key: &str) -> Result<Option<Value>> {
            tokio::time::sleep(self.delay).await;
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: Value) -> Result<()> {
            tokio::time::sleep(self.delay).await;
            self.inner.set(key, value).await
        }

        async fn remove(&self, key: &str) -> Result<()> {
            tokio::time::sleep(self.delay).await;
            self.inner.remove(key).await
        }

        async fn take(&self, key: &str) -> Result<Option<Value>> {
            tokio::time::sleep(self.delay).await;
            self.inner.take(key).await
        }

        fn backend(&self) -> &'static str {
            "slow"
        }
    }
}
