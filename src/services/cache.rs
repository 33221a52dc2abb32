use anyhow::Result;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::time;

use crate::models::{CacheEntry, ContentDetails, ImdbId};
use crate::services::store::{keys, Store};

/// Expiring classification cache
///
/// In-memory map loaded once from the store at startup and written through
/// on every `set`. Entries older than the TTL read as absent and are dropped
/// on the next prune. The map lock is never held across a storage write.
pub struct ContentCache {
    store: Store,
    entries: Arc<RwLock<HashMap<ImdbId, CacheEntry>>>,
    // Serializes storage writes; each write snapshots the map after acquiring it
    persist_lock: Arc<Mutex<()>>,
    ttl_ms: i64,
}

impl ContentCache {
    /// Create a cache and load existing entries
    pub async fn new(store: Store, ttl_ms: i64) -> Result<Self> {
        let cache = Self {
            store,
            entries: Arc::new(RwLock::new(HashMap::new())),
            persist_lock: Arc::new(Mutex::new(())),
            ttl_ms,
        };
        cache.load().await?;
        Ok(cache)
    }

    /// Read the persisted mapping into memory and evict expired entries
    pub async fn load(&self) -> Result<usize> {
        let stored: HashMap<ImdbId, CacheEntry> =
            match self.store.get(keys::CONTENT_CACHE).await {
                Ok(stored) => stored.unwrap_or_default(),
                Err(e) => {
                    tracing::warn!("Failed to read content cache, starting empty: {}", e);
                    HashMap::new()
                }
            };

        let now = chrono::Utc::now().timestamp_millis();
        let total = stored.len();
        let fresh: HashMap<ImdbId, CacheEntry> = stored
            .into_iter()
            .filter(|(_, entry)| entry.is_fresh(now, self.ttl_ms))
            .collect();
        let expired = total - fresh.len();
        let loaded = fresh.len();

        *self.entries.write().await = fresh;
        if expired > 0 {
            self.persist().await;
        }

        tracing::info!(
            cache_loaded = loaded,
            cache_expired = expired,
            msg = "content cache loaded"
        );
        Ok(loaded)
    }

    /// Cached classification, if present and within the TTL
    pub async fn get(&self, imdb_id: &ImdbId) -> Option<ContentDetails> {
        let entries = self.entries.read().await;
        let entry = entries.get(imdb_id)?;

        // Check if expired
        let now = chrono::Utc::now().timestamp_millis();
        if !entry.is_fresh(now, self.ttl_ms) {
            return None;
        }

        Some(entry.details.clone())
    }

    /// Overwrite the entry for `imdb_id` and persist the whole mapping
    pub async fn set(&self, imdb_id: &ImdbId, details: ContentDetails) {
        let timestamp = chrono::Utc::now().timestamp_millis();
        self.insert(imdb_id, CacheEntry { details, timestamp }).await;
    }

    async fn insert(&self, imdb_id: &ImdbId, entry: CacheEntry) {
        self.entries.write().await.insert(imdb_id.clone(), entry);
        self.persist().await;
    }

    /// Drop expired entries, returning how many were removed
    pub async fn prune_expired(&self) -> usize {
        let now = chrono::Utc::now().timestamp_millis();
        let removed = {
            let mut entries = self.entries.write().await;
            let before = entries.len();
            entries.retain(|_, entry| entry.is_fresh(now, self.ttl_ms));
            before - entries.len()
        };

        if removed > 0 {
            self.persist().await;
            tracing::info!(cache_gc_expired = removed, msg = "expired cache entries removed");
        }
        removed
    }

    /// Number of entries held, expired or not
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Clear all entries
    pub async fn clear(&self) -> usize {
        let count = {
            let mut entries = self.entries.write().await;
            let count = entries.len();
            entries.clear();
            count
        };
        self.persist().await;
        count
    }

    /// Write-through; a failed write is logged and the in-memory state wins
    async fn persist(&self) {
        let _guard = self.persist_lock.lock().await;
        let snapshot = self.entries.read().await.clone();
        if let Err(e) = self.store.set(keys::CONTENT_CACHE, &snapshot).await {
            tracing::error!("Failed to persist content cache: {}", e);
        }
    }
}

impl Clone for ContentCache {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            entries: Arc::clone(&self.entries),
            persist_lock: Arc::clone(&self.persist_lock),
            ttl_ms: self.ttl_ms,
        }
    }
}

/// Prune the cache periodically. Spawn with `tokio::spawn`.
pub async fn start_prune_task(cache: ContentCache, interval_secs: u64) {
    tracing::info!("Starting cache prune task (interval: {}s)", interval_secs);

    let mut interval = time::interval(Duration::from_secs(interval_secs.max(1)));
    // The first tick fires immediately; load() already pruned
    interval.tick().await;

    loop {
        interval.tick().await;
        cache.prune_expired().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ContentType;
    use crate::services::store::testing::SlowStore;
    use tokio::time::Instant;

    const DAY_MS: i64 = 24 * 60 * 60 * 1000;

    fn id(raw: &str) -> ImdbId {
        ImdbId::parse(raw).unwrap()
    }

    fn details(raw: &str, content_type: ContentType) -> ContentDetails {
        ContentDetails {
            imdb_id: id(raw),
            content_type,
            title: format!("Title {}", raw),
            error: None,
        }
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let cache = ContentCache::new(Store::memory(), DAY_MS).await.unwrap();
        let value = details("tt0903747", ContentType::TVSeries);

        assert!(cache.get(&id("tt0903747")).await.is_none());
        cache.set(&id("tt0903747"), value.clone()).await;
        assert_eq!(cache.get(&id("tt0903747")).await, Some(value));
    }

    #[tokio::test]
    async fn test_set_overwrites() {
        let cache = ContentCache::new(Store::memory(), DAY_MS).await.unwrap();
        cache.set(&id("tt1"), details("tt1", ContentType::Movie)).await;
        cache.set(&id("tt1"), details("tt1", ContentType::TVEpisode)).await;

        let cached = cache.get(&id("tt1")).await.unwrap();
        assert_eq!(cached.content_type, ContentType::TVEpisode);
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_expired_entry_reads_absent() {
        let cache = ContentCache::new(Store::memory(), DAY_MS).await.unwrap();
        let old = chrono::Utc::now().timestamp_millis() - DAY_MS - 1;
        cache
            .insert(
                &id("tt1"),
                CacheEntry {
                    details: details("tt1", ContentType::TVSeries),
                    timestamp: old,
                },
            )
            .await;

        assert!(cache.get(&id("tt1")).await.is_none());
        // Still physically present until pruned
        assert_eq!(cache.len().await, 1);
        assert_eq!(cache.prune_expired().await, 1);
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn test_set_writes_through() {
        let store = Store::memory();
        let cache = ContentCache::new(store.clone(), DAY_MS).await.unwrap();
        cache.set(&id("tt1"), details("tt1", ContentType::Movie)).await;

        let stored: HashMap<ImdbId, CacheEntry> =
            store.get(keys::CONTENT_CACHE).await.unwrap().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[&id("tt1")].details.title, "Title tt1");
    }

    #[tokio::test]
    async fn test_load_evicts_expired() {
        let store = Store::memory();
        let now = chrono::Utc::now().timestamp_millis();
        let mut stored = HashMap::new();
        stored.insert(
            id("tt1"),
            CacheEntry {
                details: details("tt1", ContentType::Movie),
                timestamp: now - 1000,
            },
        );
        stored.insert(
            id("tt2"),
            CacheEntry {
                details: details("tt2", ContentType::TVSeries),
                timestamp: now - 2 * DAY_MS,
            },
        );
        store.set(keys::CONTENT_CACHE, &stored).await.unwrap();

        let cache = ContentCache::new(store.clone(), DAY_MS).await.unwrap();
        assert_eq!(cache.len().await, 1);
        assert!(cache.get(&id("tt1")).await.is_some());
        assert!(cache.get(&id("tt2")).await.is_none());

        // The pruned mapping is written back
        let persisted: HashMap<ImdbId, CacheEntry> =
            store.get(keys::CONTENT_CACHE).await.unwrap().unwrap();
        assert!(!persisted.contains_key(&id("tt2")));
    }

    #[tokio::test]
    async fn test_load_survives_corrupt_mapping() {
        let store = Store::memory();
        store.set(keys::CONTENT_CACHE, &"garbage").await.unwrap();

        let cache = ContentCache::new(store, DAY_MS).await.unwrap();
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn test_get_not_blocked_by_slow_write() {
        let store = Store::new(Arc::new(SlowStore::new(Duration::from_millis(300))));
        let cache = ContentCache::new(store, DAY_MS).await.unwrap();
        cache.set(&id("tt1"), details("tt1", ContentType::Movie)).await;

        let writer = cache.clone();
        let pending = tokio::spawn(async move {
            writer.set(&id("tt2"), details("tt2", ContentType::TVSeries)).await;
        });
        // Let the writer reach the storage call
        time::sleep(Duration::from_millis(50)).await;

        let started = Instant::now();
        let hit = cache.get(&id("tt1")).await;
        assert!(hit.is_some());
        assert!(started.elapsed() < Duration::from_millis(100));

        // The new entry is visible before its write completes
        assert!(cache.get(&id("tt2")).await.is_some());
        pending.await.unwrap();
    }

    #[tokio::test]
    async fn test_concurrent_writes_persist_latest_state() {
        let store = Store::new(Arc::new(SlowStore::new(Duration::from_millis(20))));
        let cache = ContentCache::new(store.clone(), DAY_MS).await.unwrap();

        let (id1, id2, id3) = (id("tt1"), id("tt2"), id("tt3"));
        tokio::join!(
            cache.set(&id1, details("tt1", ContentType::Movie)),
            cache.set(&id2, details("tt2", ContentType::Movie)),
            cache.set(&id3, details("tt3", ContentType::Movie)),
        );

        let stored: HashMap<ImdbId, CacheEntry> =
            store.get(keys::CONTENT_CACHE).await.unwrap().unwrap();
        assert_eq!(stored.len(), 3);
    }

    #[tokio::test]
    async fn test_clear() {
        let cache = ContentCache::new(Store::memory(), DAY_MS).await.unwrap();
        cache.set(&id("tt1"), details("tt1", ContentType::Movie)).await;
        cache.set(&id("tt2"), details("tt2", ContentType::Movie)).await;

        assert_eq!(cache.clear().await, 2);
        assert!(cache.get(&id("tt1")).await.is_none());
    }
}
