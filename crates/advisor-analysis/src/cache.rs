//! Caching layer for fetched price bars
//!
//! Only raw bars are cached. Everything derived from them is recomputed on
//! each analysis.

use crate::models::{HistoryRange, PriceBar};
use cached::{Cached, TimedCache};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

/// Cache key for a bar request
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BarKey {
    pub symbol: String,
    pub range: HistoryRange,
}

impl BarKey {
    pub fn new(symbol: impl Into<String>, range: HistoryRange) -> Self {
        Self {
            symbol: symbol.into(),
            range,
        }
    }
}

/// Thread-safe TTL cache of price bars per (symbol, range)
#[derive(Clone)]
pub struct BarCache {
    cache: Arc<RwLock<TimedCache<BarKey, Arc<Vec<PriceBar>>>>>,
}

impl BarCache {
    /// Create a new cache with specified TTL
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: Arc::new(RwLock::new(TimedCache::with_lifespan(ttl))),
        }
    }

    pub async fn get(&self, key: &BarKey) -> Option<Arc<Vec<PriceBar>>> {
        // TimedCache evicts on read, so even lookups need the write lock
        let mut cache = self.cache.write().await;
        cache.cache_get(key).cloned()
    }

    pub async fn insert(&self, key: BarKey, bars: Arc<Vec<PriceBar>>) {
        let mut cache = self.cache.write().await;
        let _ = cache.cache_set(key, bars);
    }

    /// Return cached bars, or run `fetcher` and cache its result
    ///
    /// Errors are not cached.
    pub async fn get_or_fetch<F, Fut, E>(&self, key: BarKey, fetcher: F) -> Result<Arc<Vec<PriceBar>>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<PriceBar>, E>>,
    {
        if let Some(bars) = self.get(&key).await {
            debug!(symbol = %key.symbol, range = %key.range, "Bar cache hit");
            return Ok(bars);
        }

        debug!(symbol = %key.symbol, range = %key.range, "Bar cache miss");
        let bars = Arc::new(fetcher().await?);
        self.insert(key, Arc::clone(&bars)).await;
        Ok(bars)
    }

    pub async fn invalidate(&self, key: &BarKey) {
        let mut cache = self.cache.write().await;
        let _ = cache.cache_remove(key);
    }

    pub async fn clear(&self) {
        let mut cache = self.cache.write().await;
        cache.cache_clear();
    }

    pub async fn len(&self) -> usize {
        let cache = self.cache.read().await;
        cache.cache_size()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
