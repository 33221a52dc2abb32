//! Cached content lookups with in-flight coalescing
//!
//! A cache miss starts one resolution per identifier; concurrent callers for
//! the same identifier await that same resolution instead of re-fetching.

use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use crate::models::{ContentDetails, ImdbId};
use crate::services::cache::ContentCache;
use crate::services::metrics;
use crate::services::resolver::ContentResolver;

type PendingLookup = Shared<BoxFuture<'static, ContentDetails>>;

#[derive(Clone)]
pub struct ContentLookup {
    cache: ContentCache,
    resolver: ContentResolver,
    in_flight: Arc<Mutex<HashMap<ImdbId, PendingLookup>>>,
}

impl ContentLookup {
    pub fn new(cache: ContentCache, resolver: ContentResolver) -> Self {
        Self {
            cache,
            resolver,
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn cache(&self) -> &ContentCache {
        &self.cache
    }

    /// Cached classification, resolving and caching it on a miss
    pub async fn details(&self, imdb_id: &ImdbId) -> ContentDetails {
        if let Some(details) = self.cache.get(imdb_id).await {
            metrics::CACHE_HITS.inc();
            debug!(imdb_id = %imdb_id, "Content cache hit");
            return details;
        }
        metrics::CACHE_MISSES.inc();

        let pending = {
            let mut in_flight = self.in_flight.lock().await;
            match in_flight.get(imdb_id) {
                Some(existing) => {
                    metrics::COALESCED_LOOKUPS.inc();
                    debug!(imdb_id = %imdb_id, "Joining in-flight lookup");
                    existing.clone()
                }
                None => {
                    // A resolution may have finished since the first check;
                    // it caches before leaving the map
                    if let Some(details) = self.cache.get(imdb_id).await {
                        debug!(imdb_id = %imdb_id, "Resolved while waiting");
                        return details;
                    }
                    let pending = self.start_resolution(imdb_id.clone());
                    in_flight.insert(imdb_id.clone(), pending.clone());
                    pending
                }
            }
        };

        pending.await
    }

    fn start_resolution(&self, imdb_id: ImdbId) -> PendingLookup {
        let this = self.clone();
        async move {
            let details = this.resolver.resolve(&imdb_id).await;
            // Cache before leaving the in-flight map so late callers hit the cache
            this.cache.set(&imdb_id, details.clone()).await;
            this.in_flight.lock().await.remove(&imdb_id);
            details
        }
        .boxed()
        .shared()
    }

    #[cfg(test)]
    async fn in_flight_len(&self) -> usize {
        self.in_flight.lock().await.len()
    }
}
