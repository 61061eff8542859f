//! Cursor-accumulating pagination over a [`BookSource`].
//!
//! [`InfiniteBooks`] keeps the pages fetched so far for the active query and
//! exposes them as one flat, ordered list. Page requests run on spawned tokio
//! tasks; their results come back as [`PageOutcome`]s over a channel and are
//! folded in with [`InfiniteBooks::apply`]. Only one request is in flight at
//! a time.
//!
//! Every query change bumps a generation counter. Outcomes from an older
//! generation still land in the cache under their own key, but they never
//! touch the visible state, so a slow response for an abandoned query cannot
//! overwrite newer results.

use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::models::{Book, BookSearchParams, SearchPage, DEFAULT_PAGE_SIZE};
use crate::sources::{BookSource, SourceError};
use crate::utils::{CacheResult, PageKey, QueryCache};

/// The page number to request next, or `None` when everything is loaded.
///
/// There is a next page iff the number of books accumulated so far is below
/// the total reported by the most recent page.
pub fn next_page_param(pages: &[SearchPage]) -> Option<u32> {
    let last = pages.last()?;
    let loaded: u64 = pages.iter().map(|p| p.docs.len() as u64).sum();
    if loaded < last.num_found {
        Some(pages.len() as u32 + 1)
    } else {
        None
    }
}

/// Result of one page request, tagged with the query generation it was
/// issued under
#[derive(Debug)]
pub struct PageOutcome {
    pub generation: u64,
    pub key: PageKey,
    pub result: Result<SearchPage, SourceError>,
}

/// Infinite-scroll pagination state for one active query
#[derive(Debug)]
pub struct InfiniteBooks {
    source: Arc<dyn BookSource>,
    cache: QueryCache,
    page_size: u32,

    query: String,
    generation: u64,
    pages: Vec<SearchPage>,
    books: Vec<Book>,
    in_flight: Option<PageKey>,
    error: Option<SourceError>,

    tx: mpsc::UnboundedSender<PageOutcome>,
    rx: mpsc::UnboundedReceiver<PageOutcome>,
}

impl InfiniteBooks {
    /// Create a controller with no active query
    pub fn new(source: Arc<dyn BookSource>, cache: QueryCache) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            source,
            cache,
            page_size: DEFAULT_PAGE_SIZE,
            query: String::new(),
            generation: 0,
            pages: Vec::new(),
            books: Vec::new(),
            in_flight: None,
            error: None,
            tx,
            rx,
        }
    }

    /// Set the page size used for new requests
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Switch to a new query.
    ///
    /// Resets accumulation and restores any fresh pages cached for `query`.
    /// If nothing fresh is cached, the first page is requested. Blank
    /// queries are disabled and never fetch. Returns `false` if the query
    /// did not change.
    pub fn set_query(&mut self, query: &str, now: Instant) -> bool {
        if query == self.query {
            return false;
        }

        let previous = std::mem::replace(&mut self.query, query.to_string());
        self.cache.deactivate(&previous, now);
        self.cache.activate(query);
        self.reset();

        tracing::debug!(query, generation = self.generation, "Query changed");

        if query.trim().is_empty() {
            return true;
        }

        let cached = self.cache.fresh_pages(query, now);
        if cached.is_empty() {
            self.start_fetch(1);
        } else {
            tracing::debug!(query, pages = cached.len(), "Restored pages from cache");
            for page in cached {
                self.push_page(page);
            }
        }
        true
    }

    /// Request the next page.
    ///
    /// No-op (returns `false`) while a request is in flight, when there is
    /// no next page, or when the query is disabled. After a failed request
    /// only [`InfiniteBooks::refetch`] fetches again. A fresh cached page is
    /// applied immediately without a request.
    pub fn fetch_next(&mut self, now: Instant) -> bool {
        if self.in_flight.is_some() || self.error.is_some() || self.query.trim().is_empty() {
            return false;
        }
        let Some(page) = next_page_param(&self.pages) else {
            return false;
        };

        let key = PageKey::new(self.query.clone(), page);
        if let CacheResult::Fresh(cached) = self.cache.get(&key, now) {
            tracing::debug!(query = %self.query, page, "Next page served from cache");
            self.push_page(cached);
            return true;
        }

        self.start_fetch(page);
        true
    }

    /// Drop the active query's cached pages and start over from page 1
    pub fn refetch(&mut self) {
        self.cache.invalidate(&self.query);
        self.reset();
        if !self.query.trim().is_empty() {
            tracing::info!(query = %self.query, "Refetching");
            self.start_fetch(1);
        }
    }

    /// Fold a finished request into the state.
    ///
    /// Returns `true` if the visible state changed.
    pub fn apply(&mut self, outcome: PageOutcome, now: Instant) -> bool {
        let PageOutcome {
            generation,
            key,
            result,
        } = outcome;

        if let Ok(page) = &result {
            self.cache.insert(key.clone(), page.clone(), now);
        }

        if generation != self.generation {
            tracing::debug!(
                query = %key.query,
                page = key.page,
                generation,
                current = self.generation,
                "Dropping outcome from an earlier query"
            );
            if key.query != self.query {
                self.cache.deactivate(&key.query, now);
            }
            return false;
        }

        if self.in_flight.as_ref() != Some(&key) {
            tracing::warn!(query = %key.query, page = key.page, "Unexpected page outcome");
            return false;
        }
        self.in_flight = None;

        match result {
            Ok(page) if key.page as usize == self.pages.len() + 1 => {
                self.error = None;
                self.push_page(page);
                true
            }
            Ok(_) => {
                tracing::warn!(
                    page = key.page,
                    loaded = self.pages.len(),
                    "Dropping out-of-order page"
                );
                false
            }
            Err(err) => {
                tracing::warn!(query = %key.query, page = key.page, error = %err, "Page fetch failed");
                self.error = Some(err);
                true
            }
        }
    }

    /// Wait for the next finished request
    pub async fn next_outcome(&mut self) -> Option<PageOutcome> {
        self.rx.recv().await
    }

    /// Take a finished request without waiting
    pub fn try_next_outcome(&mut self) -> Option<PageOutcome> {
        self.rx.try_recv().ok()
    }

    /// Apply every finished request that is already waiting.
    ///
    /// Returns `true` if the visible state changed.
    pub fn pump(&mut self, now: Instant) -> bool {
        let mut changed = false;
        while let Some(outcome) = self.try_next_outcome() {
            changed |= self.apply(outcome, now);
        }
        changed
    }

    /// Fetch sequentially until `max_pages` are loaded or nothing is left
    pub async fn load_pages(&mut self, max_pages: usize) -> Result<&[Book], SourceError> {
        loop {
            while self.in_flight.is_some() {
                match self.rx.recv().await {
                    Some(outcome) => {
                        self.apply(outcome, Instant::now());
                    }
                    None => break,
                }
            }

            if let Some(err) = &self.error {
                return Err(err.clone());
            }
            if self.pages.len() >= max_pages || !self.fetch_next(Instant::now()) {
                break;
            }
        }
        Ok(&self.books)
    }

    /// Evict cached pages of queries inactive for the gc window
    pub fn evict_inactive(&mut self, now: Instant) -> usize {
        self.cache.evict_inactive(now)
    }

    fn reset(&mut self) {
        self.generation += 1;
        self.pages.clear();
        self.books.clear();
        self.in_flight = None;
        self.error = None;
    }

    fn push_page(&mut self, page: SearchPage) {
        self.books.extend(page.docs.iter().cloned());
        self.pages.push(page);
    }

    fn start_fetch(&mut self, page: u32) {
        let key = PageKey::new(self.query.clone(), page);
        let params = BookSearchParams::new(self.query.clone())
            .page(page)
            .limit(self.page_size);
        let generation = self.generation;
        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();

        tracing::debug!(query = %self.query, page, generation, source = source.id(), "Fetching page");
        self.in_flight = Some(key.clone());

        tokio::spawn(async move {
            let result = source.search(&params).await;
            let _ = tx.send(PageOutcome {
                generation,
                key,
                result,
            });
        });
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// All books loaded so far, in page order
    pub fn books(&self) -> &[Book] {
        &self.books
    }

    pub fn pages(&self) -> &[SearchPage] {
        &self.pages
    }

    pub fn has_next_page(&self) -> bool {
        next_page_param(&self.pages).is_some()
    }

    /// First page still loading
    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some() && self.pages.is_empty()
    }

    /// A further page is loading
    pub fn is_fetching_next_page(&self) -> bool {
        self.in_flight.is_some() && !self.pages.is_empty()
    }

    pub fn is_fetching(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn error(&self) -> Option<&SourceError> {
        self.error.as_ref()
    }

    /// Total matches reported by the first page
    pub fn total_found(&self) -> u64 {
        self.pages.first().map(|p| p.num_found).unwrap_or(0)
    }

    pub fn loaded_count(&self) -> usize {
        self.books.len()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }
}
