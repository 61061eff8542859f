//! Search request and response models.

use serde::{Deserialize, Serialize};

use super::Book;

/// Default number of books requested per page
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Parameters for one page of a search
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookSearchParams {
    /// Free-text query
    pub query: String,

    /// 1-based page number
    pub page: u32,

    /// Page size
    pub limit: u32,
}

impl BookSearchParams {
    /// Create parameters for the first page of a query
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }

    /// Set page number
    pub fn page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    /// Set page size
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }
}

/// One page of search results
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchPage {
    /// Books on this page, in server order
    #[serde(default)]
    pub docs: Vec<Book>,

    /// Total number of matches reported by the server
    #[serde(rename = "numFound", default)]
    pub num_found: u64,

    /// Offset of the first doc on this page
    #[serde(default)]
    pub start: u64,

    /// Whether `num_found` is exact or an estimate
    #[serde(rename = "numFoundExact", default)]
    pub num_found_exact: bool,
}

impl SearchPage {
    /// Create a page from docs and the reported total
    pub fn new(docs: Vec<Book>, num_found: u64, start: u64) -> Self {
        Self {
            docs,
            num_found,
            start,
            num_found_exact: true,
        }
    }

    /// An empty result
    pub fn empty() -> Self {
        Self::new(Vec::new(), 0, 0)
    }

    /// Number of books on this page
    pub fn len(&self) -> usize {
        self.docs.len()
    }

    /// Whether the page has no books
    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}

/// Flatten accumulated pages into one ordered list of books
pub fn flatten_pages(pages: &[SearchPage]) -> Vec<Book> {
    pages.iter().flat_map(|p| p.docs.iter().cloned()).collect()
}
