//! # Read Sphere
//!
//! A terminal book explorer over the OpenLibrary search API, with debounced
//! search, cached infinite pagination and a virtualized, responsive grid.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`models`]: Core data structures (Book, SearchPage, etc.)
//! - [`sources`]: Book catalogs behind the [`BookSource`] trait
//! - [`pagination`]: Infinite-scroll accumulation of result pages
//! - [`grid`]: Responsive layout and row windowing
//! - [`library`]: The library screen tying input, pages and grid together
//! - [`ui`]: Cards, pages and terminal helpers
//! - [`utils`]: HTTP client, query cache and debouncing
//! - [`config`]: Configuration management

pub mod config;
pub mod grid;
pub mod library;
pub mod models;
pub mod pagination;
pub mod sources;
pub mod ui;
pub mod utils;

// Re-export commonly used types
pub use grid::BookGrid;
pub use library::{Library, LibraryView};
pub use models::{Book, SearchPage};
pub use pagination::InfiniteBooks;
pub use sources::{BookSource, OpenLibrarySource, SourceError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
