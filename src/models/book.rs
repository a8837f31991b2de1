//! Book model shared by every catalog and the merge/ranking pipeline.

use serde::{Deserialize, Serialize};

use crate::search::merge_categories;

/// The catalog a record was read from
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogKind {
    GoogleBooks,
    OpenLibrary,
    #[serde(untagged)]
    Other(String),
}

impl CatalogKind {
    /// Returns the display name of the catalog
    pub fn name(&self) -> &str {
        match self {
            CatalogKind::GoogleBooks => "Google Books",
            CatalogKind::OpenLibrary => "Open Library",
            CatalogKind::Other(s) => s,
        }
    }

    /// Returns the catalog identifier
    pub fn id(&self) -> &str {
        match self {
            CatalogKind::GoogleBooks => "google_books",
            CatalogKind::OpenLibrary => "open_library",
            CatalogKind::Other(s) => s,
        }
    }
}

impl std::fmt::Display for CatalogKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A book as seen by the rest of the application, independent of which
/// catalog produced it.
///
/// Records are transient: they are built while answering one search and
/// dropped once the ranked list has been handed back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookRecord {
    /// Catalog-assigned identifier (the primary catalog's id wins on merge)
    pub id: String,

    /// Title, never empty
    pub title: String,

    /// Subtitle, when the catalog separates it from the title
    pub subtitle: Option<String>,

    /// Authors in catalog order
    pub authors: Vec<String>,

    /// ISO 639-1 language code
    pub language: Option<String>,

    /// Cover image URL
    pub cover_url: Option<String>,

    /// Subjects/genres, case-insensitively unique
    pub categories: Vec<String>,

    /// Number of pages
    pub page_count: Option<u32>,

    pub isbn10: Option<String>,

    pub isbn13: Option<String>,

    pub publisher: Option<String>,

    /// Publication date as reported upstream (free-form, often just a year)
    pub published_date: Option<String>,

    pub description: Option<String>,

    /// Catalog the record came from
    pub source: CatalogKind,
}

impl BookRecord {
    /// Create a record with the required fields
    pub fn new(id: impl Into<String>, title: impl Into<String>, source: CatalogKind) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            subtitle: None,
            authors: Vec::new(),
            language: None,
            cover_url: None,
            categories: Vec::new(),
            page_count: None,
            isbn10: None,
            isbn13: None,
            publisher: None,
            published_date: None,
            description: None,
            source,
        }
    }

    /// First listed author, if any
    pub fn first_author(&self) -> Option<&str> {
        self.authors.first().map(|s| s.as_str())
    }

    /// Authors joined for display and matching
    pub fn author_line(&self) -> String {
        self.authors.join(", ")
    }

    pub fn has_cover(&self) -> bool {
        self.cover_url.as_deref().is_some_and(|url| !url.is_empty())
    }

    /// Whether the record carries at least one ISBN
    pub fn has_identifier(&self) -> bool {
        self.isbn10.is_some() || self.isbn13.is_some()
    }
}

/// Builder for constructing BookRecord values
#[derive(Debug, Clone)]
pub struct BookRecordBuilder {
    record: BookRecord,
}

impl BookRecordBuilder {
    /// Create a new builder with required fields
    pub fn new(id: impl Into<String>, title: impl Into<String>, source: CatalogKind) -> Self {
        Self {
            record: BookRecord::new(id, title, source),
        }
    }

    pub fn subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.record.subtitle = Some(subtitle.into());
        self
    }

    /// Append one author
    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.record.authors.push(author.into());
        self
    }

    /// Replace the author list
    pub fn authors<I, S>(mut self, authors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.record.authors = authors.into_iter().map(Into::into).collect();
        self
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.record.language = Some(language.into());
        self
    }

    pub fn cover_url(mut self, url: impl Into<String>) -> Self {
        self.record.cover_url = Some(url.into());
        self
    }

    /// Replace the category list, dropping blanks and case-insensitive repeats
    pub fn categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let categories: Vec<String> = categories.into_iter().map(Into::into).collect();
        self.record.categories = merge_categories(&categories, &[]);
        self
    }

    pub fn page_count(mut self, pages: u32) -> Self {
        self.record.page_count = Some(pages);
        self
    }

    pub fn isbn10(mut self, isbn: impl Into<String>) -> Self {
        self.record.isbn10 = Some(isbn.into());
        self
    }

    pub fn isbn13(mut self, isbn: impl Into<String>) -> Self {
        self.record.isbn13 = Some(isbn.into());
        self
    }

    pub fn publisher(mut self, publisher: impl Into<String>) -> Self {
        self.record.publisher = Some(publisher.into());
        self
    }

    pub fn published_date(mut self, date: impl Into<String>) -> Self {
        self.record.published_date = Some(date.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.record.description = Some(description.into());
        self
    }

    /// Build the BookRecord
    pub fn build(self) -> BookRecord {
        self.record
    }
}
