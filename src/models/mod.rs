//! Core data models for books and catalog queries.

mod book;
mod search;

pub use book::{BookRecord, BookRecordBuilder, CatalogKind};
pub use search::{CatalogQuery, QueryField, SearchKind};
