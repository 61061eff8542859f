//! Mock source for testing purposes.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::models::{Book, BookSearchParams, SearchPage};
use crate::sources::{BookSource, SourceError};

/// A mock source for testing that returns predefined responses.
///
/// Responses can be registered per (query, page). Unregistered requests
/// return an empty page, unless a one-shot failure was queued.
#[derive(Debug, Default)]
pub struct MockSource {
    pages: Mutex<HashMap<(String, u32), SearchPage>>,
    failures: Mutex<VecDeque<SourceError>>,
    calls: Mutex<Vec<BookSearchParams>>,
    call_count: AtomicUsize,
    delay: Mutex<Option<Duration>>,
}

impl MockSource {
    /// Create a new mock source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the page returned for a query and page number.
    pub fn set_page(&self, query: &str, page: u32, response: SearchPage) {
        let mut guard = self.pages.lock().unwrap();
        guard.insert((query.to_string(), page), response);
    }

    /// Register a catalog of `total` generated books for a query, served in
    /// pages of `limit`.
    pub fn set_catalog(&self, query: &str, total: usize, limit: usize) {
        let books: Vec<Book> = (0..total)
            .map(|i| make_book(&format!("/works/{}-{}", query, i), &format!("{} #{}", query, i)))
            .collect();

        let mut guard = self.pages.lock().unwrap();
        for (index, chunk) in books.chunks(limit.max(1)).enumerate() {
            let start = (index * limit) as u64;
            guard.insert(
                (query.to_string(), index as u32 + 1),
                SearchPage::new(chunk.to_vec(), total as u64, start),
            );
        }
    }

    /// Make the next search call fail with `error`.
    pub fn fail_next(&self, error: SourceError) {
        self.failures.lock().unwrap().push_back(error);
    }

    /// Delay every response by `delay`.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    /// Number of search calls made so far.
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Parameters of every search call, in order.
    pub fn calls(&self) -> Vec<BookSearchParams> {
        self.calls.lock().unwrap().clone()
    }

    /// Drop queued failures that have not been served yet.
    pub fn clear_failures(&self) {
        self.failures.lock().unwrap().clear();
    }
}

#[async_trait]
impl BookSource for MockSource {
    fn id(&self) -> &str {
        "mock"
    }

    fn name(&self) -> &str {
        "Mock Source"
    }

    async fn search(&self, params: &BookSearchParams) -> Result<SearchPage, SourceError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.calls.lock().unwrap().push(params.clone());

        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(error) = self.failures.lock().unwrap().pop_front() {
            return Err(error);
        }

        let guard = self.pages.lock().unwrap();
        match guard.get(&(params.query.clone(), params.page)) {
            Some(page) => Ok(page.clone()),
            None => Ok(SearchPage::empty()),
        }
    }
}

/// Helper function to create a mock book for testing.
pub fn make_book(key: &str, title: &str) -> Book {
    Book::new(key, title)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_catalog_paging() {
        let source = MockSource::new();
        source.set_catalog("rust", 45, 20);

        let first = source.search(&BookSearchParams::new("rust")).await.unwrap();
        assert_eq!(first.docs.len(), 20);
        assert_eq!(first.num_found, 45);

        let last = source
            .search(&BookSearchParams::new("rust").page(3))
            .await
            .unwrap();
        assert_eq!(last.docs.len(), 5);
        assert_eq!(last.start, 40);

        assert_eq!(source.call_count(), 2);
        assert_eq!(source.calls()[1].page, 3);
    }

    #[tokio::test]
    async fn test_unknown_query_is_empty() {
        let source = MockSource::new();
        let page = source.search(&BookSearchParams::new("nothing")).await.unwrap();
        assert!(page.is_empty());
        assert_eq!(page.num_found, 0);
    }

    #[tokio::test]
    async fn test_fail_next_once() {
        let source = MockSource::new();
        source.fail_next(SourceError::Network("down".to_string()));

        assert!(source.search(&BookSearchParams::new("a")).await.is_err());
        assert!(source.search(&BookSearchParams::new("a")).await.is_ok());
    }
}
