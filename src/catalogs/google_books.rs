//! Google Books catalog implementation (primary catalog).

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::catalogs::{Catalog, CatalogCapabilities, CatalogError};
use crate::models::{BookRecord, BookRecordBuilder, CatalogKind, CatalogQuery, QueryField};
use crate::search::merge_categories;
use crate::utils::{
    clean_isbn, to_isbn10, to_isbn13, HttpClient, RetryPolicy, DEFAULT_REQUEST_TIMEOUT,
};

pub const GOOGLE_BOOKS_API_BASE: &str = "https://www.googleapis.com/books/v1";

/// Largest page the volumes endpoint accepts
const MAX_PAGE_SIZE: usize = 40;

/// Google Books catalog
///
/// Uses the public volumes endpoint. Field-restricted searches are expressed
/// with the `intitle:` / `inauthor:` query prefixes and ISBN lookups with `isbn:`.
#[derive(Debug, Clone)]
pub struct GoogleBooksCatalog {
    client: HttpClient,
    base_url: String,
    api_key: Option<String>,
    max_results: usize,
    timeout: Duration,
    retry: RetryPolicy,
}

impl GoogleBooksCatalog {
    /// Create a catalog pointed at the public API
    pub fn new() -> Result<Self, CatalogError> {
        Ok(Self::with_client(HttpClient::new()?))
    }

    /// Create a catalog sharing an existing HTTP client
    pub fn with_client(client: HttpClient) -> Self {
        Self {
            client,
            base_url: GOOGLE_BOOKS_API_BASE.to_string(),
            api_key: std::env::var("GOOGLE_BOOKS_API_KEY").ok(),
            max_results: MAX_PAGE_SIZE,
            timeout: DEFAULT_REQUEST_TIMEOUT,
            retry: RetryPolicy::default(),
        }
    }

    /// Override the API base URL
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the API key sent as the `key` parameter
    pub fn api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|k| !k.trim().is_empty());
        self
    }

    /// Upper bound on the page size, whatever the query asks for
    pub fn max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    /// Set the per-attempt deadline
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    /// Query text with the field prefix applied
    fn query_text(query: &CatalogQuery) -> String {
        let text = query.text.trim();
        match query.field {
            QueryField::Any => text.to_string(),
            QueryField::Title => format!("intitle:{}", text),
            QueryField::Author => format!("inauthor:{}", text),
        }
    }

    /// Build the volumes URL
    fn volumes_url(
        &self,
        q: &str,
        language: Option<&str>,
        max_results: usize,
    ) -> Result<String, CatalogError> {
        let mut url = Url::parse(&format!("{}/volumes", self.base_url))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("q", q);
            pairs.append_pair(
                "maxResults",
                &max_results.clamp(1, MAX_PAGE_SIZE).to_string(),
            );
            pairs.append_pair("printType", "books");
            if let Some(language) = language {
                pairs.append_pair("langRestrict", language);
            }
            if let Some(ref key) = self.api_key {
                pairs.append_pair("key", key);
            }
        }
        Ok(url.into())
    }

    async fn fetch_volumes(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<BookRecord>, CatalogError> {
        let data: GbVolumesResponse = self
            .client
            .get_json(url, self.timeout, &self.retry, cancel)
            .await?;

        let received = data.items.len();
        let books: Vec<BookRecord> = data.items.into_iter().filter_map(Self::normalize).collect();

        tracing::debug!(
            "Google Books returned {} items ({} usable, {} total matches)",
            received,
            books.len(),
            data.total_items
        );
        Ok(books)
    }

    /// Map a volume into a BookRecord; volumes without a title are dropped
    fn normalize(volume: GbVolume) -> Option<BookRecord> {
        let info = volume.volume_info;
        let title = match info.title.as_deref().map(str::trim) {
            Some(title) if !title.is_empty() => title.to_string(),
            _ => {
                tracing::debug!("Dropping Google Books volume {} without a title", volume.id);
                return None;
            }
        };

        let mut isbn10 = None;
        let mut isbn13 = None;
        for identifier in &info.industry_identifiers {
            match identifier.kind.as_str() {
                "ISBN_10" if isbn10.is_none() => isbn10 = Some(clean_isbn(&identifier.identifier)),
                "ISBN_13" if isbn13.is_none() => isbn13 = Some(clean_isbn(&identifier.identifier)),
                _ => {}
            }
        }
        if isbn13.is_none() {
            isbn13 = isbn10.as_deref().and_then(to_isbn13);
        }
        if isbn10.is_none() {
            isbn10 = isbn13.as_deref().and_then(to_isbn10);
        }

        let mut builder = BookRecordBuilder::new(volume.id, title, CatalogKind::GoogleBooks)
            .authors(
                info.authors
                    .iter()
                    .map(|a| a.trim())
                    .filter(|a| !a.is_empty()),
            )
            .categories(merge_categories(&info.categories, &[]));

        if let Some(subtitle) = non_empty(info.subtitle) {
            builder = builder.subtitle(subtitle);
        }
        if let Some(language) = non_empty(info.language) {
            builder = builder.language(language.to_lowercase());
        }
        if let Some(cover) = info
            .image_links
            .and_then(|links| links.thumbnail.or(links.small_thumbnail))
        {
            builder = builder.cover_url(secure_url(&cover));
        }
        if let Some(pages) = info.page_count.filter(|p| *p > 0) {
            builder = builder.page_count(pages);
        }
        if let Some(isbn) = isbn10 {
            builder = builder.isbn10(isbn);
        }
        if let Some(isbn) = isbn13 {
            builder = builder.isbn13(isbn);
        }
        if let Some(publisher) = non_empty(info.publisher) {
            builder = builder.publisher(publisher);
        }
        if let Some(date) = non_empty(info.published_date) {
            builder = builder.published_date(date);
        }
        if let Some(description) = non_empty(info.description) {
            builder = builder.description(description);
        }

        Some(builder.build())
    }
}

/// Google serves thumbnails over http; the app only loads https
fn secure_url(url: &str) -> String {
    match url.strip_prefix("http://") {
        Some(rest) => format!("https://{}", rest),
        None => url.to_string(),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[async_trait]
impl Catalog for GoogleBooksCatalog {
    fn id(&self) -> &str {
        "google_books"
    }

    fn name(&self) -> &str {
        "Google Books"
    }

    fn kind(&self) -> CatalogKind {
        CatalogKind::GoogleBooks
    }

    fn capabilities(&self) -> CatalogCapabilities {
        CatalogCapabilities::SEARCH
            | CatalogCapabilities::ISBN_LOOKUP
            | CatalogCapabilities::TITLE_SEARCH
            | CatalogCapabilities::AUTHOR_SEARCH
            | CatalogCapabilities::LANGUAGE_FILTER
    }

    async fn search_by_query(
        &self,
        query: &CatalogQuery,
        cancel: &CancellationToken,
    ) -> Result<Vec<BookRecord>, CatalogError> {
        if query.text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let url = self.volumes_url(
            &Self::query_text(query),
            query.language.as_deref(),
            query.max_results.min(self.max_results),
        )?;
        self.fetch_volumes(&url, cancel).await
    }

    async fn lookup_by_isbn(
        &self,
        isbn: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<BookRecord>, CatalogError> {
        let isbn = clean_isbn(isbn);
        if isbn.is_empty() {
            return Err(CatalogError::InvalidRequest("empty ISBN".to_string()));
        }

        let url = self.volumes_url(&format!("isbn:{}", isbn), None, 1)?;
        Ok(self.fetch_volumes(&url, cancel).await?.into_iter().next())
    }
}

// ===== Google Books API Types =====

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GbVolumesResponse {
    #[serde(default)]
    total_items: u64,
    #[serde(default)]
    items: Vec<GbVolume>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GbVolume {
    #[serde(default)]
    id: String,
    #[serde(default)]
    volume_info: GbVolumeInfo,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GbVolumeInfo {
    title: Option<String>,
    subtitle: Option<String>,
    #[serde(default)]
    authors: Vec<String>,
    publisher: Option<String>,
    published_date: Option<String>,
    description: Option<String>,
    language: Option<String>,
    page_count: Option<u32>,
    #[serde(default)]
    categories: Vec<String>,
    image_links: Option<GbImageLinks>,
    #[serde(default)]
    industry_identifiers: Vec<GbIdentifier>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GbImageLinks {
    thumbnail: Option<String>,
    small_thumbnail: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GbIdentifier {
    #[serde(rename = "type")]
    kind: String,
    identifier: String,
}
