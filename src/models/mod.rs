//! Core data models for books and search pages.

mod book;
mod search;

pub use book::Book;
pub use search::{flatten_pages, BookSearchParams, SearchPage, DEFAULT_PAGE_SIZE};
