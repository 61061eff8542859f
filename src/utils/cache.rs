//! In-memory cache for fetched search pages.
//!
//! Pages are keyed by `(query, page number)`. Two time windows govern an
//! entry's life:
//!
//! - **stale time**: how long after fetching a page is served as fresh. A
//!   stale page is still returned (as [`CacheResult::Stale`]) so callers can
//!   decide whether to refetch.
//! - **gc time**: how long a query's pages are kept after the query stops
//!   being observed. Pages of the active query are never evicted.
//!
//! Nothing is persisted. All timestamps are passed in, which keeps the cache
//! deterministic under a paused tokio clock.

use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

use crate::config::CacheConfig;
use crate::models::SearchPage;

/// Cache key: query string plus 1-based page number
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageKey {
    pub query: String,
    pub page: u32,
}

impl PageKey {
    pub fn new(query: impl Into<String>, page: u32) -> Self {
        Self {
            query: query.into(),
            page,
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    page: SearchPage,
    fetched_at: Instant,
}

/// Result of a cache lookup
#[derive(Debug, Clone, PartialEq)]
pub enum CacheResult<T> {
    /// Item was found within the freshness window
    Fresh(T),

    /// Item was found but is older than the freshness window
    Stale(T),

    /// Item was not found
    Miss,
}

impl<T> CacheResult<T> {
    /// The cached value only if it is fresh
    pub fn fresh(self) -> Option<T> {
        match self {
            CacheResult::Fresh(value) => Some(value),
            _ => None,
        }
    }
}

/// Statistics about the cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cached pages
    pub pages: usize,

    /// Number of distinct queries with cached pages
    pub queries: usize,

    /// Number of queries waiting out their gc window
    pub inactive_queries: usize,
}

/// In-memory page cache with freshness and inactivity windows
#[derive(Debug, Clone)]
pub struct QueryCache {
    entries: HashMap<PageKey, CacheEntry>,
    /// Queries no longer observed, with the time they became inactive
    inactive_since: HashMap<String, Instant>,
    stale_time: Duration,
    gc_time: Duration,
}

impl QueryCache {
    /// Create a cache with explicit windows
    pub fn new(stale_time: Duration, gc_time: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            inactive_since: HashMap::new(),
            stale_time,
            gc_time,
        }
    }

    /// Create a cache from configuration
    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.stale_time(), config.gc_time())
    }

    pub fn stale_time(&self) -> Duration {
        self.stale_time
    }

    pub fn gc_time(&self) -> Duration {
        self.gc_time
    }

    /// Look up a page
    pub fn get(&self, key: &PageKey, now: Instant) -> CacheResult<SearchPage> {
        match self.entries.get(key) {
            Some(entry) if now.saturating_duration_since(entry.fetched_at) < self.stale_time => {
                tracing::trace!(query = %key.query, page = key.page, "Cache HIT");
                CacheResult::Fresh(entry.page.clone())
            }
            Some(entry) => {
                tracing::trace!(query = %key.query, page = key.page, "Cache STALE");
                CacheResult::Stale(entry.page.clone())
            }
            None => {
                tracing::trace!(query = %key.query, page = key.page, "Cache MISS");
                CacheResult::Miss
            }
        }
    }

    /// Store a freshly fetched page
    pub fn insert(&mut self, key: PageKey, page: SearchPage, now: Instant) {
        self.entries.insert(
            key,
            CacheEntry {
                page,
                fetched_at: now,
            },
        );
    }

    /// Consecutive fresh pages of a query, starting at page 1
    pub fn fresh_pages(&self, query: &str, now: Instant) -> Vec<SearchPage> {
        let mut pages = Vec::new();
        for page in 1.. {
            match self.get(&PageKey::new(query, page), now) {
                CacheResult::Fresh(p) => pages.push(p),
                _ => break,
            }
        }
        pages
    }

    /// Mark a query as observed again, cancelling any pending eviction
    pub fn activate(&mut self, query: &str) {
        self.inactive_since.remove(query);
    }

    /// Mark a query as no longer observed
    pub fn deactivate(&mut self, query: &str, now: Instant) {
        if self.entries.keys().any(|k| k.query == query) {
            self.inactive_since.entry(query.to_string()).or_insert(now);
        }
    }

    /// Drop every page of queries that have been inactive for the gc window.
    ///
    /// Returns the number of pages evicted.
    pub fn evict_inactive(&mut self, now: Instant) -> usize {
        let gc_time = self.gc_time;
        let expired: Vec<String> = self
            .inactive_since
            .iter()
            .filter(|(_, since)| now.saturating_duration_since(**since) >= gc_time)
            .map(|(query, _)| query.clone())
            .collect();

        if expired.is_empty() {
            return 0;
        }

        let before = self.entries.len();
        self.entries.retain(|key, _| !expired.contains(&key.query));
        for query in &expired {
            self.inactive_since.remove(query);
        }

        let evicted = before - self.entries.len();
        tracing::debug!(queries = expired.len(), pages = evicted, "Evicted inactive queries");
        evicted
    }

    /// Drop every page of one query
    pub fn invalidate(&mut self, query: &str) {
        self.entries.retain(|key, _| key.query != query);
        self.inactive_since.remove(query);
    }

    /// Drop everything
    pub fn clear(&mut self) {
        self.entries.clear();
        self.inactive_since.clear();
    }

    /// Number of cached pages
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        let mut queries: Vec<&str> = self.entries.keys().map(|k| k.query.as_str()).collect();
        queries.sort_unstable();
        queries.dedup();

        CacheStats {
            pages: self.entries.len(),
            queries: queries.len(),
            inactive_queries: self.inactive_since.len(),
        }
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::from_config(&CacheConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Book;

    fn page(n: usize, total: u64) -> SearchPage {
        let docs = (0..n).map(|i| Book::new(format!("/works/{}", i), "t")).collect();
        SearchPage::new(docs, total, 0)
    }

    fn test_cache() -> QueryCache {
        QueryCache::new(Duration::from_secs(60), Duration::from_secs(120))
    }

    #[test]
    fn test_fresh_then_stale() {
        let mut cache = test_cache();
        let t0 = Instant::now();
        let key = PageKey::new("science", 1);

        assert_eq!(cache.get(&key, t0), CacheResult::Miss);

        cache.insert(key.clone(), page(2, 10), t0);
        assert!(matches!(cache.get(&key, t0), CacheResult::Fresh(_)));
        assert!(matches!(
            cache.get(&key, t0 + Duration::from_secs(59)),
            CacheResult::Fresh(_)
        ));
        assert!(matches!(
            cache.get(&key, t0 + Duration::from_secs(60)),
            CacheResult::Stale(_)
        ));
    }

    #[test]
    fn test_keys_are_per_query_and_page() {
        let mut cache = test_cache();
        let t0 = Instant::now();
        cache.insert(PageKey::new("a", 1), page(1, 5), t0);

        assert_eq!(cache.get(&PageKey::new("a", 2), t0), CacheResult::Miss);
        assert_eq!(cache.get(&PageKey::new("b", 1), t0), CacheResult::Miss);
    }

    #[test]
    fn test_fresh_pages_stop_at_gap() {
        let mut cache = test_cache();
        let t0 = Instant::now();
        cache.insert(PageKey::new("q", 1), page(2, 10), t0);
        cache.insert(PageKey::new("q", 2), page(2, 10), t0);
        cache.insert(PageKey::new("q", 4), page(2, 10), t0);

        assert_eq!(cache.fresh_pages("q", t0).len(), 2);
        assert!(cache.fresh_pages("q", t0 + Duration::from_secs(61)).is_empty());
    }

    #[test]
    fn test_active_query_never_evicted() {
        let mut cache = test_cache();
        let t0 = Instant::now();
        cache.insert(PageKey::new("active", 1), page(1, 1), t0);

        assert_eq!(cache.evict_inactive(t0 + Duration::from_secs(10_000)), 0);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_inactive_query_evicted_after_gc_time() {
        let mut cache = test_cache();
        let t0 = Instant::now();
        cache.insert(PageKey::new("old", 1), page(1, 2), t0);
        cache.insert(PageKey::new("old", 2), page(1, 2), t0);
        cache.insert(PageKey::new("new", 1), page(1, 1), t0);

        cache.deactivate("old", t0);
        assert_eq!(cache.evict_inactive(t0 + Duration::from_secs(119)), 0);
        assert_eq!(cache.evict_inactive(t0 + Duration::from_secs(120)), 2);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.stats().inactive_queries, 0);
    }

    #[test]
    fn test_reactivation_cancels_eviction() {
        let mut cache = test_cache();
        let t0 = Instant::now();
        cache.insert(PageKey::new("q", 1), page(1, 1), t0);

        cache.deactivate("q", t0);
        cache.activate("q");
        assert_eq!(cache.evict_inactive(t0 + Duration::from_secs(500)), 0);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_invalidate_and_stats() {
        let mut cache = test_cache();
        let t0 = Instant::now();
        cache.insert(PageKey::new("a", 1), page(1, 2), t0);
        cache.insert(PageKey::new("a", 2), page(1, 2), t0);
        cache.insert(PageKey::new("b", 1), page(1, 1), t0);

        assert_eq!(
            cache.stats(),
            CacheStats {
                pages: 3,
                queries: 2,
                inactive_queries: 0
            }
        );

        cache.invalidate("a");
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.is_empty());
    }
}
