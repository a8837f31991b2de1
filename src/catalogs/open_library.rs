//! Open Library catalog implementation (secondary catalog).

use std::time::Duration;

use async_trait::async_trait;
use futures_util::future::join_all;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::catalogs::{Catalog, CatalogCapabilities, CatalogError};
use crate::models::{BookRecord, BookRecordBuilder, CatalogKind, CatalogQuery, QueryField};
use crate::search::merge_categories;
use crate::utils::{
    clean_isbn, to_isbn10, to_isbn13, HttpClient, RetryPolicy, DEFAULT_REQUEST_TIMEOUT,
};

pub const OPEN_LIBRARY_API_BASE: &str = "https://openlibrary.org";
pub const OPEN_LIBRARY_COVERS_BASE: &str = "https://covers.openlibrary.org";

/// Fields requested from search.json
const SEARCH_FIELDS: &str = "key,title,subtitle,author_name,language,cover_i,subject,\
number_of_pages_median,isbn,publisher,first_publish_year";

const DEFAULT_MAX_RESULTS: usize = 20;
const DEFAULT_MAX_SUBJECTS: usize = 5;

/// MARC 21 language codes to ISO 639-1
const MARC_LANGUAGES: &[(&str, &str)] = &[
    ("ara", "ar"),
    ("chi", "zh"),
    ("cze", "cs"),
    ("dan", "da"),
    ("dut", "nl"),
    ("eng", "en"),
    ("fin", "fi"),
    ("fre", "fr"),
    ("ger", "de"),
    ("gre", "el"),
    ("heb", "he"),
    ("hin", "hi"),
    ("hun", "hu"),
    ("ita", "it"),
    ("jpn", "ja"),
    ("kor", "ko"),
    ("lat", "la"),
    ("nor", "no"),
    ("per", "fa"),
    ("pol", "pl"),
    ("por", "pt"),
    ("rus", "ru"),
    ("spa", "es"),
    ("swe", "sv"),
    ("tur", "tr"),
    ("ukr", "uk"),
];

/// Map a MARC code (`eng`, or a `/languages/eng` key) to ISO 639-1.
///
/// Codes without a mapping are returned lowercased as-is.
pub fn marc_to_iso639_1(code: &str) -> String {
    let code = code
        .trim()
        .trim_start_matches("/languages/")
        .to_ascii_lowercase();
    MARC_LANGUAGES
        .iter()
        .find(|(marc, _)| *marc == code)
        .map(|(_, iso)| iso.to_string())
        .unwrap_or(code)
}

/// Open Library catalog
#[derive(Debug, Clone)]
pub struct OpenLibraryCatalog {
    client: HttpClient,
    base_url: String,
    covers_base_url: String,
    max_results: usize,
    max_subjects: usize,
    timeout: Duration,
    retry: RetryPolicy,
}

impl OpenLibraryCatalog {
    /// Create a catalog pointed at openlibrary.org
    pub fn new() -> Result<Self, CatalogError> {
        Ok(Self::with_client(HttpClient::new()?))
    }

    /// Create a catalog sharing an existing HTTP client
    pub fn with_client(client: HttpClient) -> Self {
        Self {
            client,
            base_url: OPEN_LIBRARY_API_BASE.to_string(),
            covers_base_url: OPEN_LIBRARY_COVERS_BASE.to_string(),
            max_results: DEFAULT_MAX_RESULTS,
            max_subjects: DEFAULT_MAX_SUBJECTS,
            timeout: DEFAULT_REQUEST_TIMEOUT,
            retry: RetryPolicy::default(),
        }
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn covers_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.covers_base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Upper bound on `limit`, whatever the query asks for
    pub fn max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    /// Number of subjects kept per record
    pub fn max_subjects(mut self, max_subjects: usize) -> Self {
        self.max_subjects = max_subjects;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    fn search_url(&self, query: &CatalogQuery) -> Result<String, CatalogError> {
        let param = match query.field {
            QueryField::Any => "q",
            QueryField::Title => "title",
            QueryField::Author => "author",
        };

        let mut url = Url::parse(&format!("{}/search.json", self.base_url))?;
        url.query_pairs_mut()
            .append_pair(param, query.text.trim())
            .append_pair("limit", &query.max_results.min(self.max_results).max(1).to_string())
            .append_pair("fields", SEARCH_FIELDS);
        Ok(url.into())
    }

    fn cover_url(&self, cover_id: i64) -> String {
        format!("{}/b/id/{}-M.jpg", self.covers_base_url, cover_id)
    }

    fn capped_subjects(&self, subjects: &[String]) -> Vec<String> {
        merge_categories(subjects, &[])
            .into_iter()
            .take(self.max_subjects)
            .collect()
    }

    /// Map a search document into a BookRecord.
    ///
    /// Works list every language they were published in; the requested one is
    /// kept when present, otherwise the first.
    fn normalize_doc(&self, doc: OlSearchDoc, preferred_language: Option<&str>) -> Option<BookRecord> {
        let title = match non_empty(doc.title) {
            Some(title) => title,
            None => {
                tracing::debug!("Dropping Open Library document {:?} without a title", doc.key);
                return None;
            }
        };

        let id = doc
            .key
            .as_deref()
            .map(|k| k.trim_start_matches("/works/").to_string())
            .unwrap_or_default();

        let languages: Vec<String> = doc.language.iter().map(|l| marc_to_iso639_1(l)).collect();
        let language = preferred_language
            .and_then(|wanted| languages.iter().find(|l| l.eq_ignore_ascii_case(wanted)))
            .or_else(|| languages.first())
            .cloned();

        let isbn13 = doc
            .isbn
            .iter()
            .map(|i| clean_isbn(i))
            .find(|i| i.len() == 13);
        let isbn10 = doc
            .isbn
            .iter()
            .map(|i| clean_isbn(i))
            .find(|i| i.len() == 10);
        let (isbn10, isbn13) = complete_isbns(isbn10, isbn13);

        let mut builder = BookRecordBuilder::new(id, title, CatalogKind::OpenLibrary)
            .authors(doc.author_name.iter().map(|a| a.trim()).filter(|a| !a.is_empty()))
            .categories(self.capped_subjects(&doc.subject));

        if let Some(subtitle) = non_empty(doc.subtitle) {
            builder = builder.subtitle(subtitle);
        }
        if let Some(language) = language {
            builder = builder.language(language);
        }
        if let Some(cover) = doc.cover_i.filter(|id| *id > 0) {
            builder = builder.cover_url(self.cover_url(cover));
        }
        if let Some(pages) = doc.number_of_pages_median.filter(|p| *p > 0) {
            builder = builder.page_count(pages);
        }
        if let Some(isbn) = isbn10 {
            builder = builder.isbn10(isbn);
        }
        if let Some(isbn) = isbn13 {
            builder = builder.isbn13(isbn);
        }
        if let Some(publisher) = doc.publisher.into_iter().find(|p| !p.trim().is_empty()) {
            builder = builder.publisher(publisher.trim());
        }
        if let Some(year) = doc.first_publish_year {
            builder = builder.published_date(year.to_string());
        }

        Some(builder.build())
    }

    /// Map an edition into a BookRecord, with authors already resolved
    fn normalize_edition(
        &self,
        edition: OlEdition,
        authors: Vec<String>,
        requested_isbn: &str,
    ) -> Option<BookRecord> {
        let title = match non_empty(edition.title) {
            Some(title) => title,
            None => {
                tracing::debug!("Dropping Open Library edition {:?} without a title", edition.key);
                return None;
            }
        };

        let id = edition
            .key
            .as_deref()
            .map(|k| k.trim_start_matches("/books/").to_string())
            .unwrap_or_default();

        let isbn13 = edition
            .isbn_13
            .iter()
            .map(|i| clean_isbn(i))
            .next()
            .or_else(|| (requested_isbn.len() == 13).then(|| requested_isbn.to_string()));
        let isbn10 = edition
            .isbn_10
            .iter()
            .map(|i| clean_isbn(i))
            .next()
            .or_else(|| (requested_isbn.len() == 10).then(|| requested_isbn.to_string()));
        let (isbn10, isbn13) = complete_isbns(isbn10, isbn13);

        let subjects: Vec<String> = edition
            .subjects
            .iter()
            .filter_map(|s| s.name())
            .map(str::to_string)
            .collect();

        let mut builder = BookRecordBuilder::new(id, title, CatalogKind::OpenLibrary)
            .authors(authors)
            .categories(self.capped_subjects(&subjects));

        if let Some(subtitle) = non_empty(edition.subtitle) {
            builder = builder.subtitle(subtitle);
        }
        if let Some(language) = edition.languages.first() {
            builder = builder.language(marc_to_iso639_1(&language.key));
        }
        if let Some(cover) = edition.covers.iter().copied().find(|id| *id > 0) {
            builder = builder.cover_url(self.cover_url(cover));
        }
        if let Some(pages) = edition.number_of_pages.filter(|p| *p > 0) {
            builder = builder.page_count(pages);
        }
        if let Some(isbn) = isbn10 {
            builder = builder.isbn10(isbn);
        }
        if let Some(isbn) = isbn13 {
            builder = builder.isbn13(isbn);
        }
        if let Some(publisher) = edition.publishers.into_iter().find(|p| !p.trim().is_empty()) {
            builder = builder.publisher(publisher.trim());
        }
        if let Some(date) = non_empty(edition.publish_date) {
            builder = builder.published_date(date);
        }
        if let Some(description) = edition.description.and_then(|d| non_empty(Some(d.into_text()))) {
            builder = builder.description(description);
        }

        Some(builder.build())
    }

    /// Resolve author references to names.
    ///
    /// Failures drop that author; only cancellation aborts.
    async fn resolve_authors(
        &self,
        refs: &[OlKeyRef],
        cancel: &CancellationToken,
    ) -> Result<Vec<String>, CatalogError> {
        let lookups = refs.iter().map(|r| async move {
            let url = format!("{}{}.json", self.base_url, r.key);
            let outcome: Result<OlAuthor, CatalogError> = self
                .client
                .get_json(&url, self.timeout, &self.retry, cancel)
                .await;
            (r.key.as_str(), outcome)
        });

        let mut names = Vec::with_capacity(refs.len());
        for (key, outcome) in join_all(lookups).await {
            match outcome {
                Ok(author) => {
                    if let Some(name) = non_empty(author.name.or(author.personal_name)) {
                        names.push(name);
                    }
                }
                Err(CatalogError::Cancelled) => return Err(CatalogError::Cancelled),
                Err(e) => tracing::debug!("Skipping Open Library author {}: {}", key, e),
            }
        }
        Ok(names)
    }
}

/// Fill whichever ISBN side is missing
fn complete_isbns(
    isbn10: Option<String>,
    isbn13: Option<String>,
) -> (Option<String>, Option<String>) {
    let isbn13 = isbn13.or_else(|| isbn10.as_deref().and_then(to_isbn13));
    let isbn10 = isbn10.or_else(|| isbn13.as_deref().and_then(to_isbn10));
    (isbn10, isbn13)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[async_trait]
impl Catalog for OpenLibraryCatalog {
    fn id(&self) -> &str {
        "open_library"
    }

    fn name(&self) -> &str {
        "Open Library"
    }

    fn kind(&self) -> CatalogKind {
        CatalogKind::OpenLibrary
    }

    fn capabilities(&self) -> CatalogCapabilities {
        CatalogCapabilities::SEARCH
            | CatalogCapabilities::ISBN_LOOKUP
            | CatalogCapabilities::TITLE_SEARCH
            | CatalogCapabilities::AUTHOR_SEARCH
    }

    async fn search_by_query(
        &self,
        query: &CatalogQuery,
        cancel: &CancellationToken,
    ) -> Result<Vec<BookRecord>, CatalogError> {
        if query.text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let url = self.search_url(query)?;
        let data: OlSearchResponse = self
            .client
            .get_json(&url, self.timeout, &self.retry, cancel)
            .await?;

        let received = data.docs.len();
        let books: Vec<BookRecord> = data
            .docs
            .into_iter()
            .filter_map(|doc| self.normalize_doc(doc, query.language.as_deref()))
            .collect();

        tracing::debug!(
            "Open Library returned {} documents ({} usable, {} total matches)",
            received,
            books.len(),
            data.num_found
        );
        Ok(books)
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

        let url = format!("{}/isbn/{}.json", self.base_url, isbn);
        let edition: OlEdition = match self
            .client
            .get_json(&url, self.timeout, &self.retry, cancel)
            .await
        {
            Ok(edition) => edition,
            Err(CatalogError::Client { status: 404 }) => {
                tracing::debug!("Open Library has no edition for ISBN {}", isbn);
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let authors = self.resolve_authors(&edition.authors, cancel).await?;
        Ok(self.normalize_edition(edition, authors, &isbn))
    }
}

// ===== Open Library API Types =====

#[derive(Debug, Deserialize)]
struct OlSearchResponse {
    #[serde(default, rename = "numFound")]
    num_found: u64,
    #[serde(default)]
    docs: Vec<OlSearchDoc>,
}

#[derive(Debug, Deserialize)]
struct OlSearchDoc {
    key: Option<String>,
    title: Option<String>,
    subtitle: Option<String>,
    #[serde(default)]
    author_name: Vec<String>,
    #[serde(default)]
    language: Vec<String>,
    cover_i: Option<i64>,
    #[serde(default)]
    subject: Vec<String>,
    number_of_pages_median: Option<u32>,
    #[serde(default)]
    isbn: Vec<String>,
    #[serde(default)]
    publisher: Vec<String>,
    first_publish_year: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct OlEdition {
    key: Option<String>,
    title: Option<String>,
    subtitle: Option<String>,
    #[serde(default)]
    authors: Vec<OlKeyRef>,
    #[serde(default)]
    covers: Vec<i64>,
    number_of_pages: Option<u32>,
    #[serde(default)]
    subjects: Vec<OlSubject>,
    #[serde(default)]
    isbn_10: Vec<String>,
    #[serde(default)]
    isbn_13: Vec<String>,
    #[serde(default)]
    languages: Vec<OlKeyRef>,
    #[serde(default)]
    publishers: Vec<String>,
    publish_date: Option<String>,
    description: Option<OlText>,
}

#[derive(Debug, Deserialize)]
struct OlKeyRef {
    key: String,
}

#[derive(Debug, Deserialize)]
struct OlAuthor {
    name: Option<String>,
    personal_name: Option<String>,
}

/// Subjects are plain strings on most editions and `{key, name}` objects on some
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OlSubject {
    Name(String),
    Ref { name: Option<String> },
}

impl OlSubject {
    fn name(&self) -> Option<&str> {
        match self {
            OlSubject::Name(name) => Some(name),
            OlSubject::Ref { name } => name.as_deref(),
        }
    }
}

/// Text fields come either as a string or as `{"type": "/type/text", "value": ...}`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OlText {
    Plain(String),
    Typed { value: String },
}

impl OlText {
    fn into_text(self) -> String {
        match self {
            OlText::Plain(text) | OlText::Typed { value: text } => text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::no_retry_policy;
    use mockito::Matcher;

    const SEARCH_BODY: &str = r#"{
        "numFound": 2,
        "docs": [
            {
                "key": "/works/OL45804W",
                "title": "Fantastic Mr Fox",
                "author_name": ["Roald Dahl"],
                "language": ["eng", "tur", "ger"],
                "cover_i": 6498519,
                "subject": ["Animals", "animals", "Foxes", "Farmers", "Fiction", "Humor", "Juvenile"],
                "number_of_pages_median": 96,
                "isbn": ["0140328726", "9780140328721"],
                "publisher": ["Puffin"],
                "first_publish_year": 1970
            },
            {
                "key": "/works/OL0W",
                "author_name": ["Untitled Author"]
            }
        ]
    }"#;

    const EDITION_BODY: &str = r#"{
        "key": "/books/OL7353617M",
        "title": "Fantastic Mr. Fox",
        "authors": [{"key": "/authors/OL34184A"}, {"key": "/authors/OL_MISSING_A"}],
        "covers": [-1, 8739161],
        "number_of_pages": 96,
        "subjects": ["Foxes", {"key": "/subjects/farmers", "name": "Farmers"}],
        "isbn_10": ["0140328726"],
        "languages": [{"key": "/languages/eng"}],
        "publishers": ["Puffin"],
        "publish_date": "October 1, 1988",
        "description": {"type": "/type/text", "value": "The Fox family outwits three farmers."}
    }"#;

    fn catalog_for(server: &mockito::Server) -> OpenLibraryCatalog {
        OpenLibraryCatalog::with_client(HttpClient::new().unwrap())
            .base_url(server.url())
            .retry_policy(no_retry_policy())
    }

    #[test]
    fn test_marc_language_mapping() {
        assert_eq!(marc_to_iso639_1("eng"), "en");
        assert_eq!(marc_to_iso639_1("/languages/tur"), "tr");
        assert_eq!(marc_to_iso639_1("GER"), "de");
        assert_eq!(marc_to_iso639_1("xyz"), "xyz");
    }

    #[test]
    fn test_search_url_uses_field_parameter() {
        let catalog = OpenLibraryCatalog::with_client(HttpClient::new().unwrap())
            .base_url("https://ol.example/")
            .max_results(10);

        let url = catalog
            .search_url(&CatalogQuery::new("roald dahl").field(QueryField::Author).max_results(50))
            .unwrap();
        let parsed = Url::parse(&url).unwrap();
        let pairs: Vec<(String, String)> = parsed
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        assert_eq!(parsed.path(), "/search.json");
        assert!(pairs.contains(&("author".to_string(), "roald dahl".to_string())));
        assert!(pairs.contains(&("limit".to_string(), "10".to_string())));
        assert!(pairs.iter().any(|(k, _)| k == "fields"));
        assert!(!pairs.iter().any(|(k, _)| k == "q"));
    }

    #[tokio::test]
    async fn test_search_normalizes_documents() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/search.json")
            .match_query(Matcher::UrlEncoded("q".into(), "fantastic mr fox".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(SEARCH_BODY)
            .create_async()
            .await;

        let catalog = catalog_for(&server).max_subjects(3);
        let query = CatalogQuery::new("fantastic mr fox").language("tr");
        let books = catalog
            .search_by_query(&query, &CancellationToken::new())
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(books.len(), 1);

        let fox = &books[0];
        assert_eq!(fox.id, "OL45804W");
        assert_eq!(fox.authors, vec!["Roald Dahl"]);
        assert_eq!(fox.language.as_deref(), Some("tr"));
        assert_eq!(
            fox.cover_url.as_deref(),
            Some("https://covers.openlibrary.org/b/id/6498519-M.jpg")
        );
        assert_eq!(fox.categories, vec!["Animals", "Foxes", "Farmers"]);
        assert_eq!(fox.page_count, Some(96));
        assert_eq!(fox.isbn10.as_deref(), Some("0140328726"));
        assert_eq!(fox.isbn13.as_deref(), Some("9780140328721"));
        assert_eq!(fox.published_date.as_deref(), Some("1970"));
        assert_eq!(fox.source, CatalogKind::OpenLibrary);
    }

    #[tokio::test]
    async fn test_search_language_defaults_to_first_listed() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/search.json")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(SEARCH_BODY)
            .create_async()
            .await;

        let catalog = catalog_for(&server);
        let books = catalog
            .search_by_query(&CatalogQuery::new("fox").language("ja"), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(books[0].language.as_deref(), Some("en"));
    }

    #[tokio::test]
    async fn test_lookup_resolves_edition_and_authors() {
        let mut server = mockito::Server::new_async().await;
        let edition = server
            .mock("GET", "/isbn/0140328726.json")
            .with_status(200)
            .with_body(EDITION_BODY)
            .create_async()
            .await;
        let author = server
            .mock("GET", "/authors/OL34184A.json")
            .with_status(200)
            .with_body(r#"{"name": "Roald Dahl"}"#)
            .create_async()
            .await;
        let missing_author = server
            .mock("GET", "/authors/OL_MISSING_A.json")
            .with_status(404)
            .create_async()
            .await;

        let catalog = catalog_for(&server);
        let book = catalog
            .lookup_by_isbn("0-14-032872-6", &CancellationToken::new())
            .await
            .unwrap()
            .unwrap();

        edition.assert_async().await;
        author.assert_async().await;
        missing_author.assert_async().await;

        assert_eq!(book.id, "OL7353617M");
        assert_eq!(book.title, "Fantastic Mr. Fox");
        assert_eq!(book.authors, vec!["Roald Dahl"]);
        assert_eq!(book.language.as_deref(), Some("en"));
        assert_eq!(
            book.cover_url.as_deref(),
            Some("https://covers.openlibrary.org/b/id/8739161-M.jpg")
        );
        assert_eq!(book.categories, vec!["Foxes", "Farmers"]);
        assert_eq!(book.isbn10.as_deref(), Some("0140328726"));
        assert_eq!(book.isbn13.as_deref(), Some("9780140328721"));
        assert_eq!(
            book.description.as_deref(),
            Some("The Fox family outwits three farmers.")
        );
    }

    #[tokio::test]
    async fn test_lookup_not_found_is_absence() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/isbn/9799999999990.json")
            .with_status(404)
            .expect(1)
            .create_async()
            .await;

        let catalog = catalog_for(&server).retry_policy(RetryPolicy {
            max_retries: 3,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            ..RetryPolicy::default()
        });
        let book = catalog
            .lookup_by_isbn("9799999999990", &CancellationToken::new())
            .await
            .unwrap();

        assert!(book.is_none());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_lookup_retries_server_errors() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/isbn/9780140328721.json")
            .with_status(500)
            .expect(3)
            .create_async()
            .await;

        let catalog = catalog_for(&server).retry_policy(RetryPolicy {
            max_retries: 2,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            ..RetryPolicy::default()
        });
        let result = catalog
            .lookup_by_isbn("9780140328721", &CancellationToken::new())
            .await;

        assert_eq!(result.unwrap_err(), CatalogError::Server { status: 500 });
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_lookup_cancelled_before_request() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", Matcher::Any)
            .with_status(200)
            .with_body(EDITION_BODY)
            .expect(0)
            .create_async()
            .await;

        let cancel = CancellationToken::new();
        cancel.cancel();

        let catalog = catalog_for(&server);
        let result = catalog.lookup_by_isbn("0140328726", &cancel).await;

        assert_eq!(result.unwrap_err(), CatalogError::Cancelled);
        mock.assert_async().await;
    }
}
