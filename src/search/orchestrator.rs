//! Search orchestration across the primary and secondary catalogs.

use std::collections::{HashMap, HashSet};
use std::iter;
use std::sync::Arc;

use futures_util::future::{join_all, try_join};
use tokio_util::sync::CancellationToken;

use crate::catalogs::{
    Catalog, CatalogCapabilities, CatalogError, GoogleBooksCatalog, OpenLibraryCatalog,
};
use crate::config::Config;
use crate::models::{BookRecord, CatalogQuery, QueryField, SearchKind};
use crate::search::{
    filter_relevant, merge_books, merge_isbn_results, merge_key, merge_search_results,
    prioritize_covers, prioritize_language, rank_by_relevance, DEFAULT_MATCH_THRESHOLD,
};
use crate::utils::{alternate_isbn, clean_isbn, is_isbn, HttpClient};

/// Below this many results the secondary catalog is asked again
pub const DEFAULT_SUPPLEMENT_THRESHOLD: usize = 5;

/// The search was cancelled by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Search cancelled")]
pub struct SearchCancelled;

/// Stages a single search call goes through
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchStage {
    #[default]
    Idle,
    Dispatching,
    IsbnLookup,
    TextSearch,
    Merging,
    Scoring,
    Done,
}

/// Tunables for the orchestrator
#[derive(Debug, Clone, PartialEq)]
pub struct SearchSettings {
    /// Page size requested from each catalog
    pub max_results: usize,
    /// Result count under which the secondary catalog is queried again
    pub supplement_threshold: usize,
    /// Share of query tokens a record must contain to be kept
    pub match_threshold: f64,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            max_results: 20,
            supplement_threshold: DEFAULT_SUPPLEMENT_THRESHOLD,
            match_threshold: DEFAULT_MATCH_THRESHOLD,
        }
    }
}

/// Fans a query out to two catalogs and returns one merged, ranked list.
///
/// Ordinary upstream failures never reach the caller: they are logged and the
/// search yields an empty list. Only cancellation is reported, as
/// [`SearchCancelled`].
#[derive(Debug, Clone)]
pub struct SearchOrchestrator {
    primary: Arc<dyn Catalog>,
    secondary: Arc<dyn Catalog>,
    settings: SearchSettings,
}

impl SearchOrchestrator {
    pub fn new(primary: Arc<dyn Catalog>, secondary: Arc<dyn Catalog>) -> Self {
        Self {
            primary,
            secondary,
            settings: SearchSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: SearchSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Wire Google Books as primary and Open Library as secondary from configuration
    pub fn from_config(config: &Config) -> Result<Self, CatalogError> {
        let client = HttpClient::with_settings(&config.http.user_agent, config.http.connect_timeout())?;
        let retry = config.retry.policy();
        let timeout = config.http.request_timeout();

        let google_books = GoogleBooksCatalog::with_client(client.clone())
            .base_url(&config.google_books.base_url)
            .api_key(config.google_books.resolved_api_key())
            .max_results(config.google_books.max_results)
            .timeout(timeout)
            .retry_policy(retry.clone());

        let open_library = OpenLibraryCatalog::with_client(client)
            .base_url(&config.open_library.base_url)
            .covers_base_url(&config.open_library.covers_base_url)
            .max_results(config.open_library.max_results)
            .max_subjects(config.open_library.max_subjects)
            .timeout(timeout)
            .retry_policy(retry);

        Ok(Self::new(Arc::new(google_books), Arc::new(open_library))
            .with_settings(config.search.settings()))
    }

    pub fn primary(&self) -> &dyn Catalog {
        self.primary.as_ref()
    }

    pub fn secondary(&self) -> &dyn Catalog {
        self.secondary.as_ref()
    }

    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    /// Search both catalogs by title or author.
    ///
    /// A blank query yields nothing; an ISBN-shaped query is routed to
    /// [`search_by_isbn`](Self::search_by_isbn).
    pub async fn search(
        &self,
        query: &str,
        language: &str,
        kind: SearchKind,
        cancel: Option<&CancellationToken>,
    ) -> Result<Vec<BookRecord>, SearchCancelled> {
        let token = cancel.cloned().unwrap_or_default();
        let query = query.trim();
        tracing::trace!(stage = ?SearchStage::Idle, "Search requested for {:?}", query);

        if token.is_cancelled() {
            tracing::debug!("Search for {:?} cancelled before dispatch", query);
            return Err(SearchCancelled);
        }
        if query.is_empty() {
            return Ok(Vec::new());
        }
        if is_isbn(query) {
            return self.search_by_isbn(query, language, Some(&token)).await;
        }

        tracing::debug!(stage = ?SearchStage::Dispatching, "Searching {:?} by {:?} (language {:?})", query, kind, language);
        let outcome = self.text_search(query, language, kind, &token).await;
        settle(outcome, query)
    }

    /// Look an ISBN up in both catalogs, trying its ISBN-10/13 counterpart too
    pub async fn search_by_isbn(
        &self,
        isbn: &str,
        language: &str,
        cancel: Option<&CancellationToken>,
    ) -> Result<Vec<BookRecord>, SearchCancelled> {
        let token = cancel.cloned().unwrap_or_default();
        tracing::trace!(stage = ?SearchStage::Idle, "ISBN lookup requested for {:?}", isbn);

        if token.is_cancelled() {
            tracing::debug!("ISBN lookup for {:?} cancelled before dispatch", isbn);
            return Err(SearchCancelled);
        }
        if !is_isbn(isbn) {
            tracing::debug!("{:?} is not an ISBN, nothing to look up", isbn);
            return Ok(Vec::new());
        }

        tracing::debug!(stage = ?SearchStage::Dispatching, "Looking up ISBN {} (language {:?})", isbn, language);
        let outcome = self.isbn_search(isbn, &token).await;
        settle(outcome, isbn)
    }

    async fn isbn_search(
        &self,
        isbn: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<BookRecord>, CatalogError> {
        let original = clean_isbn(isbn);
        let converted = alternate_isbn(&original);
        let candidates: Vec<String> = iter::once(original).chain(converted).collect();

        tracing::debug!(stage = ?SearchStage::IsbnLookup, "Trying ISBNs {:?}", candidates);
        let (primary_hit, secondary_hit) = tokio::join!(
            first_isbn_hit(self.primary.as_ref(), &candidates, cancel),
            first_isbn_hit(self.secondary.as_ref(), &candidates, cancel),
        );

        if cancel.is_cancelled() {
            return Err(CatalogError::Cancelled);
        }

        tracing::debug!(
            stage = ?SearchStage::Merging,
            "ISBN hits: primary {}, secondary {}",
            primary_hit.is_some(),
            secondary_hit.is_some()
        );
        let results = merge_isbn_results(primary_hit, secondary_hit);

        tracing::debug!(stage = ?SearchStage::Done, "ISBN lookup produced {} records", results.len());
        Ok(results)
    }

    async fn text_search(
        &self,
        query: &str,
        language: &str,
        kind: SearchKind,
        cancel: &CancellationToken,
    ) -> Result<Vec<BookRecord>, CatalogError> {
        let general = CatalogQuery::new(query)
            .language(language)
            .max_results(self.settings.max_results);
        let specific = general.clone().field(supported_field(self.primary.as_ref(), kind));

        tracing::debug!(stage = ?SearchStage::TextSearch, "Querying {} and {}", self.primary.name(), self.secondary.name());
        let (mut primary_hits, secondary_hits) = try_join(
            self.primary.search_by_query(&specific, cancel),
            self.secondary.search_by_query(&general, cancel),
        )
        .await?;

        if primary_hits.is_empty() && specific.field != QueryField::Any {
            tracing::debug!("{} had no field matches, retrying as free text", self.primary.name());
            primary_hits = self.primary.search_by_query(&general, cancel).await?;
        }

        tracing::debug!(
            stage = ?SearchStage::Merging,
            "{} primary and {} secondary records",
            primary_hits.len(),
            secondary_hits.len()
        );
        let merged = merge_search_results(primary_hits, secondary_hits);

        tracing::debug!(stage = ?SearchStage::Scoring, "Scoring {} records", merged.len());
        let relevant = filter_relevant(merged, query, kind, self.settings.match_threshold);
        let ranked = rank_by_relevance(relevant, query, language);
        let mut results = prioritize_language(prioritize_covers(ranked), language);

        if results.len() < self.settings.supplement_threshold {
            self.supplement(&mut results, query, language, kind, cancel)
                .await?;
        }

        tracing::debug!(stage = ?SearchStage::Done, "Search produced {} records", results.len());
        Ok(results)
    }

    /// Top up a short result list from the secondary catalog.
    ///
    /// A record sharing a merge key with an existing result is folded into
    /// it; one whose lowercase title is already present is skipped. Failures
    /// are logged and ignored; only cancellation is returned.
    async fn supplement(
        &self,
        results: &mut Vec<BookRecord>,
        query: &str,
        language: &str,
        kind: SearchKind,
        cancel: &CancellationToken,
    ) -> Result<(), CatalogError> {
        let supplemental = CatalogQuery::new(query)
            .field(supported_field(self.secondary.as_ref(), kind))
            .language(language)
            .max_results(self.settings.max_results);

        match self.secondary.search_by_query(&supplemental, cancel).await {
            Ok(extra) => {
                let mut titles: HashSet<String> =
                    results.iter().map(|r| r.title.to_lowercase()).collect();
                let mut keys: HashMap<String, usize> = results
                    .iter()
                    .enumerate()
                    .map(|(index, r)| (merge_key(r), index))
                    .collect();
                let before = results.len();

                for record in extra {
                    let key = merge_key(&record);
                    if let Some(&index) = keys.get(&key) {
                        if let Ok(merged) = merge_books(Some(results[index].clone()), Some(record)) {
                            results[index] = merged;
                        }
                        continue;
                    }
                    if !titles.insert(record.title.to_lowercase()) {
                        continue;
                    }
                    keys.insert(key, results.len());
                    results.push(record);
                }

                tracing::debug!(
                    "Supplemented {} records from {}",
                    results.len() - before,
                    self.secondary.name()
                );
                Ok(())
            }
            Err(CatalogError::Cancelled) => Err(CatalogError::Cancelled),
            Err(e) => {
                tracing::warn!("Supplemental search on {} failed: {}", self.secondary.name(), e);
                Ok(())
            }
        }
    }
}

/// The field restriction for `kind`, or free text when the catalog cannot restrict
fn supported_field(catalog: &dyn Catalog, kind: SearchKind) -> QueryField {
    let needed = match kind {
        SearchKind::Title => CatalogCapabilities::TITLE_SEARCH,
        SearchKind::Author => CatalogCapabilities::AUTHOR_SEARCH,
    };

    if catalog.capabilities().contains(needed) {
        kind.field()
    } else {
        QueryField::Any
    }
}

/// Look up every candidate ISBN concurrently; the earliest candidate with a hit wins.
///
/// Failures are logged and treated as misses.
async fn first_isbn_hit(
    catalog: &dyn Catalog,
    candidates: &[String],
    cancel: &CancellationToken,
) -> Option<BookRecord> {
    if !catalog.capabilities().contains(CatalogCapabilities::ISBN_LOOKUP) {
        return None;
    }

    let lookups = candidates
        .iter()
        .map(|isbn| catalog.lookup_by_isbn(isbn, cancel));
    let outcomes = join_all(lookups).await;

    let mut hit = None;
    for (isbn, outcome) in candidates.iter().zip(outcomes) {
        match outcome {
            Ok(Some(record)) => {
                if hit.is_none() {
                    hit = Some(record);
                }
            }
            Ok(None) => {}
            Err(CatalogError::Cancelled) => {}
            Err(e) => tracing::warn!("{} lookup of ISBN {} failed: {}", catalog.name(), isbn, e),
        }
    }
    hit
}

/// Turn an internal outcome into the public one
fn settle(
    outcome: Result<Vec<BookRecord>, CatalogError>,
    query: &str,
) -> Result<Vec<BookRecord>, SearchCancelled> {
    match outcome {
        Ok(results) => Ok(results),
        Err(CatalogError::Cancelled) => {
            tracing::debug!("Search for {:?} cancelled", query);
            Err(SearchCancelled)
        }
        Err(e) => {
            tracing::warn!("Search for {:?} failed: {}", query, e);
            Ok(Vec::new())
        }
    }
}
