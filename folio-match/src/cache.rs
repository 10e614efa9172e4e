//! In-memory cache for ranked search results.
//!
//! Keyed by the (lowercased query, sorted provider set) pair. Uses [`moka`]
//! for async-friendly caching with TTL and automatic eviction. A TTL of
//! zero disables the cache entirely.

use std::time::Duration;

use moka::future::Cache;

use crate::types::SearchResult;

/// Maximum number of cached result sets.
const MAX_CACHE_ENTRIES: u64 = 100;

/// Composite cache key: normalised query + provider set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    query: String,
    providers: Vec<String>,
}

impl CacheKey {
    /// Build a deterministic key. Provider order does not matter.
    pub fn new(query: &str, providers: &[String]) -> Self {
        let mut providers = providers.to_vec();
        providers.sort();
        providers.dedup();
        Self {
            query: query.trim().to_lowercase(),
            providers,
        }
    }
}

/// TTL-bounded search result cache.
#[derive(Clone)]
pub struct SearchCache {
    inner: Option<Cache<CacheKey, Vec<SearchResult>>>,
}

impl SearchCache {
    pub fn new(ttl_seconds: u64) -> Self {
        let inner = (ttl_seconds > 0).then(|| {
            Cache::builder()
                .max_capacity(MAX_CACHE_ENTRIES)
                .time_to_live(Duration::from_secs(ttl_seconds))
                .build()
        });
        Self { inner }
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }

    pub async fn get(&self, key: &CacheKey) -> Option<Vec<SearchResult>> {
        match &self.inner {
            Some(cache) => cache.get(key).await,
            None => None,
        }
    }

    pub async fn insert(&self, key: CacheKey, results: Vec<SearchResult>) {
        if let Some(cache) = &self.inner {
            cache.insert(key, results).await;
        }
    }

    pub fn invalidate_all(&self) {
        if let Some(cache) = &self.inner {
            cache.invalidate_all();
        }
    }
}

impl std::fmt::Debug for SearchCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchCache")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}
