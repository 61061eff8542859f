//! Utility modules supporting the book explorer.
//!
//! - [`HttpClient`]: shared reqwest client with timeouts and user agent
//! - [`QueryCache`]: in-memory page cache with freshness and gc windows
//! - [`Debouncer`]: holds back input until it has been stable
//!
//! # Debouncing
//!
//! ```rust
//! use read_sphere::utils::Debouncer;
//! use std::time::Duration;
//! use tokio::time::Instant;
//!
//! let start = Instant::now();
//! let mut input = Debouncer::new(String::new(), Duration::from_millis(400));
//! input.push("dune".to_string(), start);
//! assert_eq!(input.poll(start), None);
//! assert_eq!(input.poll(start + Duration::from_millis(400)).as_deref(), Some("dune"));
//! ```

pub mod cache;
mod debounce;
mod http;

pub use cache::{CacheResult, CacheStats, PageKey, QueryCache};
pub use debounce::{Debouncer, DEFAULT_DEBOUNCE};
pub use http::HttpClient;
