//! Mock catalog for testing purposes.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::catalogs::{Catalog, CatalogCapabilities, CatalogError};
use crate::models::{BookRecord, BookRecordBuilder, CatalogKind, CatalogQuery, QueryField};
use crate::utils::clean_isbn;

type SearchResponse = Result<Vec<BookRecord>, CatalogError>;
type LookupResponse = Result<Option<BookRecord>, CatalogError>;

/// A scripted catalog that returns predefined responses and counts calls.
///
/// Search responses are keyed by [`QueryField`], so a test can answer the
/// title-restricted query differently from the general one. Unscripted
/// searches return the default response (empty unless set); unscripted ISBNs
/// are unknown (`Ok(None)`).
#[derive(Debug)]
pub struct MockCatalog {
    id: String,
    kind: CatalogKind,
    capabilities: CatalogCapabilities,
    latency: Option<Duration>,
    search_responses: Mutex<HashMap<QueryField, SearchResponse>>,
    default_search_response: Mutex<SearchResponse>,
    lookup_responses: Mutex<HashMap<String, LookupResponse>>,
    search_calls: AtomicUsize,
    lookup_calls: AtomicUsize,
    queries: Mutex<Vec<CatalogQuery>>,
    lookups: Mutex<Vec<String>>,
}

impl MockCatalog {
    /// Create a mock catalog; records it is scripted with keep their own `source`
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            kind: CatalogKind::Other(id.clone()),
            id,
            capabilities: CatalogCapabilities::all(),
            latency: None,
            search_responses: Mutex::new(HashMap::new()),
            default_search_response: Mutex::new(Ok(Vec::new())),
            lookup_responses: Mutex::new(HashMap::new()),
            search_calls: AtomicUsize::new(0),
            lookup_calls: AtomicUsize::new(0),
            queries: Mutex::new(Vec::new()),
            lookups: Mutex::new(Vec::new()),
        }
    }

    pub fn with_kind(mut self, kind: CatalogKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_capabilities(mut self, capabilities: CatalogCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Delay every call; the delay is cut short by cancellation
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Answer searches restricted to `field`
    pub fn set_search_response(&self, field: QueryField, response: SearchResponse) {
        lock(&self.search_responses).insert(field, response);
    }

    /// Answer searches whose field has no scripted response
    pub fn set_default_search_response(&self, response: SearchResponse) {
        *lock(&self.default_search_response) = response;
    }

    /// Answer lookups of `isbn` (separators are ignored)
    pub fn set_lookup_response(&self, isbn: &str, response: LookupResponse) {
        lock(&self.lookup_responses).insert(clean_isbn(isbn), response);
    }

    /// Number of `search_by_query` calls received
    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    /// Number of `lookup_by_isbn` calls received
    pub fn lookup_calls(&self) -> usize {
        self.lookup_calls.load(Ordering::SeqCst)
    }

    /// Queries received, in call order
    pub fn recorded_queries(&self) -> Vec<CatalogQuery> {
        lock(&self.queries).clone()
    }

    /// ISBNs looked up, in call order
    pub fn recorded_lookups(&self) -> Vec<String> {
        lock(&self.lookups).clone()
    }

    async fn simulate_latency(&self, cancel: &CancellationToken) -> Result<(), CatalogError> {
        if cancel.is_cancelled() {
            return Err(CatalogError::Cancelled);
        }

        if let Some(latency) = self.latency {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(CatalogError::Cancelled),
                _ = tokio::time::sleep(latency) => {}
            }
        }
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait]
impl Catalog for MockCatalog {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> CatalogKind {
        self.kind.clone()
    }

    fn capabilities(&self) -> CatalogCapabilities {
        self.capabilities
    }

    async fn search_by_query(
        &self,
        query: &CatalogQuery,
        cancel: &CancellationToken,
    ) -> Result<Vec<BookRecord>, CatalogError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.queries).push(query.clone());

        self.simulate_latency(cancel).await?;

        let scripted = lock(&self.search_responses).get(&query.field).cloned();
        match scripted {
            Some(response) => response,
            None => lock(&self.default_search_response).clone(),
        }
    }

    async fn lookup_by_isbn(
        &self,
        isbn: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<BookRecord>, CatalogError> {
        let isbn = clean_isbn(isbn);
        self.lookup_calls.fetch_add(1, Ordering::SeqCst);
        lock(&self.lookups).push(isbn.clone());

        self.simulate_latency(cancel).await?;

        let scripted = lock(&self.lookup_responses).get(&isbn).cloned();
        scripted.unwrap_or(Ok(None))
    }
}

/// Helper function to create a mock book for testing.
pub fn make_book(id: &str, title: &str, author: &str, source: CatalogKind) -> BookRecord {
    BookRecordBuilder::new(id, title, source)
        .author(author)
        .build()
}
