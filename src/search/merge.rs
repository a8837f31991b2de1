//! Cross-catalog deduplication and record merging.

use std::collections::{HashMap, HashSet};

use crate::models::BookRecord;
use crate::search::prioritize_covers;
use crate::utils::extract_isbn13;
use crate::utils::text::normalize_key;

/// Errors that can occur while merging records
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MergeError {
    #[error("At least one source record is required")]
    AtLeastOneSourceRequired,
}

/// Key under which two records are considered the same book.
///
/// The ISBN-13 (derived from the ISBN-10 if needed) when there is one,
/// otherwise normalized title and first author.
pub fn merge_key(record: &BookRecord) -> String {
    if let Some(isbn) = extract_isbn13(record) {
        return isbn;
    }

    format!(
        "{}|{}",
        normalize_key(&record.title),
        normalize_key(record.first_author().unwrap_or_default())
    )
}

/// Case-insensitive union of two category lists, first-seen casing kept
pub fn merge_categories(primary: &[String], secondary: &[String]) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut merged = Vec::new();

    for category in primary.iter().chain(secondary) {
        let category = category.trim();
        if category.is_empty() {
            continue;
        }
        if seen.insert(category.to_lowercase()) {
            merged.push(category.to_string());
        }
    }

    merged
}

/// Merge two versions of the same book.
///
/// Fields present on the primary win; categories are unioned. A single
/// present record is returned unchanged.
pub fn merge_books(
    primary: Option<BookRecord>,
    secondary: Option<BookRecord>,
) -> Result<BookRecord, MergeError> {
    match (primary, secondary) {
        (Some(primary), Some(secondary)) => Ok(combine(primary, secondary)),
        (Some(only), None) | (None, Some(only)) => Ok(only),
        (None, None) => Err(MergeError::AtLeastOneSourceRequired),
    }
}

fn combine(primary: BookRecord, secondary: BookRecord) -> BookRecord {
    let categories = merge_categories(&primary.categories, &secondary.categories);

    BookRecord {
        id: if primary.id.is_empty() {
            secondary.id
        } else {
            primary.id
        },
        title: if primary.title.trim().is_empty() {
            secondary.title
        } else {
            primary.title
        },
        subtitle: prefer(primary.subtitle, secondary.subtitle),
        authors: if primary.authors.is_empty() {
            secondary.authors
        } else {
            primary.authors
        },
        language: prefer(primary.language, secondary.language),
        cover_url: prefer(primary.cover_url, secondary.cover_url),
        categories,
        page_count: primary
            .page_count
            .filter(|p| *p > 0)
            .or(secondary.page_count),
        isbn10: prefer(primary.isbn10, secondary.isbn10),
        isbn13: prefer(primary.isbn13, secondary.isbn13),
        publisher: prefer(primary.publisher, secondary.publisher),
        published_date: prefer(primary.published_date, secondary.published_date),
        description: prefer(primary.description, secondary.description),
        source: primary.source,
    }
}

/// Blank strings count as absent
fn prefer(primary: Option<String>, secondary: Option<String>) -> Option<String> {
    primary.filter(|v| !v.trim().is_empty()).or(secondary)
}

/// Merge two result lists.
///
/// Primary records come first in their own order, first-seen winning within
/// the list. Secondary records merge into an existing entry with the same
/// key or are appended after the primary ones.
pub fn merge_search_results(
    primary: Vec<BookRecord>,
    secondary: Vec<BookRecord>,
) -> Vec<BookRecord> {
    let mut merged: Vec<BookRecord> = Vec::with_capacity(primary.len() + secondary.len());
    let mut index: HashMap<String, usize> = HashMap::new();

    for record in primary {
        let key = merge_key(&record);
        if index.contains_key(&key) {
            tracing::debug!("Dropping duplicate primary record {:?}", record.title);
            continue;
        }
        index.insert(key, merged.len());
        merged.push(record);
    }

    let mut folded = 0;
    for record in secondary {
        let key = merge_key(&record);
        match index.get(&key) {
            Some(&position) => {
                merged[position] = combine(merged[position].clone(), record);
                folded += 1;
            }
            None => {
                index.insert(key, merged.len());
                merged.push(record);
            }
        }
    }

    tracing::debug!(
        "Merged results: {} records ({} secondary records folded into existing ones)",
        merged.len(),
        folded
    );
    merged
}

/// Combine the two ISBN lookup hits.
///
/// Hits sharing an ISBN-13 become one record; otherwise both are returned
/// with the cover-bearing one first.
pub fn merge_isbn_results(
    primary: Option<BookRecord>,
    secondary: Option<BookRecord>,
) -> Vec<BookRecord> {
    match (primary, secondary) {
        (Some(primary), Some(secondary)) => {
            match (extract_isbn13(&primary), extract_isbn13(&secondary)) {
                (Some(a), Some(b)) if a == b => vec![combine(primary, secondary)],
                _ => prioritize_covers(vec![primary, secondary]),
            }
        }
        (primary, secondary) => primary.into_iter().chain(secondary).collect(),
    }
}
