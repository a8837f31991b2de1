//! Merging, ranking and the two-catalog search flow.
//!
//! - [`merge`]: deduplicate records across catalogs and merge field by field
//! - [`relevance`]: token-based relevance filter, additive scoring, stable partitions
//! - [`SearchOrchestrator`]: fans queries out to the primary and secondary catalogs
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use shelf_scout::catalogs::{GoogleBooksCatalog, OpenLibraryCatalog};
//! use shelf_scout::models::SearchKind;
//! use shelf_scout::search::SearchOrchestrator;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let orchestrator = SearchOrchestrator::new(
//!     Arc::new(GoogleBooksCatalog::new()?),
//!     Arc::new(OpenLibraryCatalog::new()?),
//! );
//!
//! let books = orchestrator
//!     .search("Kürk Mantolu Madonna", "tr", SearchKind::Title, None)
//!     .await
//!     .unwrap_or_default();
//! for book in books {
//!     println!("{} - {}", book.title, book.author_line());
//! }
//! # Ok(())
//! # }
//! ```

pub mod merge;
mod orchestrator;
pub mod relevance;

pub use merge::{
    merge_books, merge_categories, merge_isbn_results, merge_key, merge_search_results,
    MergeError,
};
pub use orchestrator::{
    SearchCancelled, SearchOrchestrator, SearchSettings, SearchStage,
    DEFAULT_SUPPLEMENT_THRESHOLD,
};
pub use relevance::{
    filter_relevant, matches_query, prioritize_covers, prioritize_language, rank_by_relevance,
    relevance_score, DEFAULT_MATCH_THRESHOLD,
};
