//! Search request models.

use serde::{Deserialize, Serialize};

/// What the user is searching by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchKind {
    #[default]
    Title,
    Author,
}

impl SearchKind {
    /// The field restriction a catalog should apply for this kind
    pub fn field(self) -> QueryField {
        match self {
            SearchKind::Title => QueryField::Title,
            SearchKind::Author => QueryField::Author,
        }
    }
}

/// Field restriction sent to a catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryField {
    /// Free text across all fields
    #[default]
    Any,
    Title,
    Author,
}

/// A single query against one catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogQuery {
    /// Query text as typed by the user
    pub text: String,

    /// Field restriction
    pub field: QueryField,

    /// Preferred language (ISO 639-1), used as a filter where the catalog supports one
    pub language: Option<String>,

    /// Maximum number of results to request
    pub max_results: usize,
}

impl CatalogQuery {
    /// Create a free-text query
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            field: QueryField::Any,
            language: None,
            max_results: 20,
        }
    }

    /// Restrict the query to a field
    pub fn field(mut self, field: QueryField) -> Self {
        self.field = field;
        self
    }

    /// Set the language restriction
    pub fn language(mut self, language: impl Into<String>) -> Self {
        let language = language.into();
        self.language = if language.trim().is_empty() {
            None
        } else {
            Some(language)
        };
        self
    }

    /// Set maximum results
    pub fn max_results(mut self, max: usize) -> Self {
        self.max_results = max;
        self
    }

    /// Same query without a field restriction
    pub fn unrestricted(&self) -> Self {
        Self {
            field: QueryField::Any,
            ..self.clone()
        }
    }
}
