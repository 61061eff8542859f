//! Book catalog sources.
//!
//! This module defines the [`BookSource`] trait implemented by the
//! OpenLibrary client and by [`MockSource`] for tests. The pagination
//! controller only ever talks to a `dyn BookSource`, so any catalog that can
//! answer a paged free-text search can be plugged in.

mod open_library;

pub mod mock;

pub use mock::MockSource;
pub use open_library::{cover_url, CoverSize, OpenLibrarySource, QUICK_FILTERS, SEARCH_FIELDS};

use crate::models::{BookSearchParams, SearchPage};
use async_trait::async_trait;

/// A searchable book catalog.
#[async_trait]
pub trait BookSource: Send + Sync + std::fmt::Debug {
    /// Unique identifier for this source
    fn id(&self) -> &str;

    /// Human-readable name of this source
    fn name(&self) -> &str;

    /// Fetch one page of results for a query
    async fn search(&self, params: &BookSearchParams) -> Result<SearchPage, SourceError>;
}

/// Errors that can occur when interacting with a source
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    /// Network or transport error
    #[error("Network error: {0}")]
    Network(String),

    /// Upstream answered with a non-success status
    #[error("Failed to fetch books: {status} {message}")]
    Api { status: u16, message: String },

    /// Response body could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),

    /// Invalid request parameters
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SourceError::Parse(err.to_string())
        } else {
            SourceError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::Parse(format!("JSON: {}", err))
    }
}

impl From<url::ParseError> for SourceError {
    fn from(err: url::ParseError) -> Self {
        SourceError::InvalidRequest(format!("URL: {}", err))
    }
}
