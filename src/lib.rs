//! # Shelf Scout
//!
//! Hybrid book-metadata search: one query goes to Google Books (primary) and
//! Open Library (secondary), and the answers come back as a single
//! deduplicated, merged and ranked list of [`BookRecord`]s.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`models`]: Core data structures (BookRecord, CatalogQuery, SearchKind)
//! - [`catalogs`]: The [`Catalog`] trait and its Google Books, Open Library and mock implementations
//! - [`search`]: Merging, relevance ranking and the [`SearchOrchestrator`]
//! - [`utils`]: HTTP client, retry/timeout wrappers, ISBN and text helpers
//! - [`config`]: Configuration management

pub mod catalogs;
pub mod config;
pub mod models;
pub mod search;
pub mod utils;

// Re-export commonly used types
pub use catalogs::{Catalog, CatalogError};
pub use models::{BookRecord, SearchKind};
pub use search::{SearchCancelled, SearchOrchestrator};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
