//! Upstream book catalogs behind a common trait.
//!
//! Every catalog implements [`Catalog`]: a free-text search and an ISBN lookup,
//! both returning normalized [`BookRecord`]s. The orchestrator receives its two
//! catalogs by injection, so tests swap in a [`MockCatalog`] without touching
//! the network.
//!
//! Implementations:
//!
//! - [`GoogleBooksCatalog`] - the primary catalog (Google Books volumes API)
//! - [`OpenLibraryCatalog`] - the secondary catalog (Open Library search and ISBN APIs)
//! - [`MockCatalog`] - scripted in-memory catalog

mod google_books;
pub mod mock;
mod open_library;

pub use google_books::{GoogleBooksCatalog, GOOGLE_BOOKS_API_BASE};
pub use mock::MockCatalog;
pub use open_library::{
    marc_to_iso639_1, OpenLibraryCatalog, OPEN_LIBRARY_API_BASE, OPEN_LIBRARY_COVERS_BASE,
};

use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::models::{BookRecord, CatalogKind, CatalogQuery};

bitflags::bitflags! {
    /// Capabilities that a catalog can support
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CatalogCapabilities: u32 {
        const SEARCH = 1 << 0;
        const ISBN_LOOKUP = 1 << 1;
        const TITLE_SEARCH = 1 << 2;
        const AUTHOR_SEARCH = 1 << 3;
        const LANGUAGE_FILTER = 1 << 4;
    }
}

/// A book-metadata provider.
///
/// Implementations own their HTTP plumbing: every request they issue must go
/// through retry and timeout handling and must honour the cancellation token.
#[async_trait]
pub trait Catalog: Send + Sync + std::fmt::Debug {
    /// Unique identifier for this catalog
    fn id(&self) -> &str;

    /// Human-readable name
    fn name(&self) -> &str;

    /// Kind stamped on records produced by this catalog
    fn kind(&self) -> CatalogKind;

    /// Describe the capabilities of this catalog
    fn capabilities(&self) -> CatalogCapabilities {
        CatalogCapabilities::SEARCH | CatalogCapabilities::ISBN_LOOKUP
    }

    /// Search by free text, optionally restricted to a field
    async fn search_by_query(
        &self,
        _query: &CatalogQuery,
        _cancel: &CancellationToken,
    ) -> Result<Vec<BookRecord>, CatalogError> {
        Err(CatalogError::NotImplemented)
    }

    /// Look up a single book by ISBN. `Ok(None)` means the catalog does not know it.
    async fn lookup_by_isbn(
        &self,
        _isbn: &str,
        _cancel: &CancellationToken,
    ) -> Result<Option<BookRecord>, CatalogError> {
        Err(CatalogError::NotImplemented)
    }
}

/// Errors that can occur when talking to a catalog
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CatalogError {
    /// The deadline elapsed before the call settled
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Connectivity-class failure
    #[error("Network error: {0}")]
    Network(String),

    /// HTTP 429
    #[error("HTTP 429")]
    RateLimited,

    /// HTTP 5xx or 408
    #[error("HTTP {status}")]
    Server { status: u16 },

    /// HTTP 4xx other than 408 and 429
    #[error("HTTP {status}")]
    Client { status: u16 },

    /// The catalog returned a body that could not be understood
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// The caller cancelled the operation
    #[error("Operation cancelled")]
    Cancelled,

    /// Invalid request parameters
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The requested operation is not implemented for this catalog
    #[error("Operation not implemented for this catalog")]
    NotImplemented,
}

impl CatalogError {
    /// Classify a non-success HTTP status
    pub fn from_status(status: u16) -> Self {
        match status {
            429 => CatalogError::RateLimited,
            408 | 500..=599 => CatalogError::Server { status },
            _ => CatalogError::Client { status },
        }
    }

    /// HTTP status carried by this error, if it came from a response
    pub fn status(&self) -> Option<u16> {
        match self {
            CatalogError::RateLimited => Some(429),
            CatalogError::Server { status } | CatalogError::Client { status } => Some(*status),
            _ => None,
        }
    }

    /// Transport-level failures worth another attempt regardless of policy
    pub fn is_transient(&self) -> bool {
        matches!(self, CatalogError::Timeout(_) | CatalogError::Network(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, CatalogError::Cancelled)
    }
}

impl From<reqwest::Error> for CatalogError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            CatalogError::Timeout(Duration::ZERO)
        } else if let Some(status) = err.status() {
            CatalogError::from_status(status.as_u16())
        } else if err.is_decode() {
            CatalogError::Malformed(err.to_string())
        } else {
            CatalogError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(err: serde_json::Error) -> Self {
        CatalogError::Malformed(format!("JSON: {}", err))
    }
}

impl From<url::ParseError> for CatalogError {
    fn from(err: url::ParseError) -> Self {
        CatalogError::InvalidRequest(format!("URL: {}", err))
    }
}
