//! Relevance filtering, scoring and result ordering.

use crate::models::{BookRecord, SearchKind};
use crate::utils::text::{fold, tokens};

/// Share of query tokens that must appear in the target field
pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.7;

const COVER_POINTS: u32 = 20;
const EXACT_TITLE_POINTS: u32 = 30;
const PARTIAL_TITLE_POINTS: u32 = 15;
const AUTHOR_POINTS: u32 = 20;
const LANGUAGE_POINTS: u32 = 15;
const PAGE_COUNT_POINTS: u32 = 5;
const IDENTIFIER_POINTS: u32 = 5;

/// Whether a record matches the query closely enough to be shown.
///
/// The target is the title (with subtitle) for title searches and the joined
/// authors for author searches. A record passes when at least `threshold` of
/// the folded query tokens occur as substrings of the folded target. An empty
/// query passes everything.
pub fn matches_query(record: &BookRecord, query: &str, kind: SearchKind, threshold: f64) -> bool {
    let query_tokens = tokens(query);
    if query_tokens.is_empty() {
        return true;
    }

    let target = match kind {
        SearchKind::Title => match record.subtitle {
            Some(ref subtitle) => fold(&format!("{} {}", record.title, subtitle)),
            None => fold(&record.title),
        },
        SearchKind::Author => fold(&record.author_line()),
    };

    let matched = query_tokens
        .iter()
        .filter(|token| target.contains(token.as_str()))
        .count();

    matched as f64 / query_tokens.len() as f64 >= threshold
}

/// Keep only the records that match the query
pub fn filter_relevant(
    records: Vec<BookRecord>,
    query: &str,
    kind: SearchKind,
    threshold: f64,
) -> Vec<BookRecord> {
    let before = records.len();
    let kept: Vec<BookRecord> = records
        .into_iter()
        .filter(|record| matches_query(record, query, kind, threshold))
        .collect();

    if kept.len() < before {
        tracing::debug!(
            "Relevance filter dropped {} of {} records",
            before - kept.len(),
            before
        );
    }
    kept
}

/// Additive relevance score of a record for a query and preferred language
pub fn relevance_score(record: &BookRecord, query: &str, language: &str) -> u32 {
    let mut score = 0;
    let query = fold(query);

    if record.has_cover() {
        score += COVER_POINTS;
    }

    if !query.is_empty() {
        let title = fold(&record.title);
        if title == query {
            score += EXACT_TITLE_POINTS;
        } else if title.contains(&query) {
            score += PARTIAL_TITLE_POINTS;
        }

        if fold(&record.author_line()).contains(&query) {
            score += AUTHOR_POINTS;
        }
    }

    if record
        .language
        .as_deref()
        .is_some_and(|lang| same_language(lang, language))
    {
        score += LANGUAGE_POINTS;
    }

    if record.page_count.is_some_and(|p| p > 0) {
        score += PAGE_COUNT_POINTS;
    }

    if record.has_identifier() {
        score += IDENTIFIER_POINTS;
    }

    score
}

/// Sort by descending score; equal scores keep their order
pub fn rank_by_relevance(records: Vec<BookRecord>, query: &str, language: &str) -> Vec<BookRecord> {
    let mut scored: Vec<(u32, BookRecord)> = records
        .into_iter()
        .map(|record| (relevance_score(&record, query, language), record))
        .collect();

    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.into_iter().map(|(_, record)| record).collect()
}

/// Records with a cover first, order otherwise kept
pub fn prioritize_covers(records: Vec<BookRecord>) -> Vec<BookRecord> {
    stable_partition(records, BookRecord::has_cover)
}

/// Records in the requested language first, order otherwise kept
pub fn prioritize_language(records: Vec<BookRecord>, language: &str) -> Vec<BookRecord> {
    stable_partition(records, |record| {
        record
            .language
            .as_deref()
            .is_some_and(|lang| same_language(lang, language))
    })
}

fn stable_partition<F>(records: Vec<BookRecord>, predicate: F) -> Vec<BookRecord>
where
    F: Fn(&BookRecord) -> bool,
{
    let (mut front, back): (Vec<_>, Vec<_>) = records.into_iter().partition(|r| predicate(r));
    front.extend(back);
    front
}

/// Compare primary language subtags, so `en-US` matches `en`
fn same_language(record_language: &str, requested: &str) -> bool {
    let primary = |code: &str| code.trim().split(['-', '_']).next().unwrap_or_default().to_string();
    let requested = primary(requested);
    !requested.is_empty() && primary(record_language).eq_ignore_ascii_case(&requested)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BookRecordBuilder, CatalogKind};

    fn book(id: &str, title: &str) -> BookRecordBuilder {
        BookRecordBuilder::new(id, title, CatalogKind::GoogleBooks)
    }

    fn ids(records: &[BookRecord]) -> Vec<&str> {
        records.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn test_matches_query_folds_diacritics() {
        let record = book("1", "Kürk Mantolu Madonna").author("Sabahattin Ali").build();

        assert!(matches_query(&record, "kurk mantolu", SearchKind::Title, 0.7));
        assert!(matches_query(&record, "KÜRK madonna", SearchKind::Title, 0.7));
        assert!(matches_query(&record, "sabahattin", SearchKind::Author, 0.7));
        assert!(!matches_query(&record, "sabahattin", SearchKind::Title, 0.7));
    }

    #[test]
    fn test_matches_query_threshold() {
        let record = book("1", "The Name of the Rose").build();

        // 3 of 4 tokens
        assert!(matches_query(&record, "name of rose eco", SearchKind::Title, 0.7));
        // 2 of 4 tokens
        assert!(!matches_query(&record, "name rose umberto eco", SearchKind::Title, 0.7));
    }

    #[test]
    fn test_matches_query_uses_subtitle() {
        let record = book("1", "Dune").subtitle("Messiah").build();
        assert!(matches_query(&record, "dune messiah", SearchKind::Title, 0.7));
    }

    #[test]
    fn test_empty_query_keeps_everything() {
        let records = vec![book("1", "A").build(), book("2", "B").build()];
        assert_eq!(filter_relevant(records, "  ", SearchKind::Title, 0.7).len(), 2);
    }

    #[test]
    fn test_relevance_score_weights() {
        let full = book("1", "Dune")
            .author("Frank Herbert")
            .cover_url("https://x.test/dune.jpg")
            .language("en")
            .page_count(412)
            .isbn13("9780441013593")
            .build();
        assert_eq!(relevance_score(&full, "dune", "en"), 20 + 30 + 15 + 5 + 5);

        let partial = book("2", "Dune Messiah").build();
        assert_eq!(relevance_score(&partial, "Dune", "en"), 15);

        let by_author = book("3", "Children of Dune").author("Frank Herbert").build();
        assert_eq!(relevance_score(&by_author, "herbert", "en"), 20);

        let bare = book("4", "Unrelated").page_count(0).build();
        assert_eq!(relevance_score(&bare, "dune", "en"), 0);
    }

    #[test]
    fn test_ranking_scenario() {
        let partial = book("partial", "Dune Messiah").language("en").build();
        let no_cover = book("no-cover", "Dune").language("en").build();
        let wrong_language = book("cover-wrong-lang", "Dune")
            .cover_url("https://x.test/1.jpg")
            .language("de")
            .build();
        let best = book("cover-lang", "Dune")
            .cover_url("https://x.test/2.jpg")
            .language("en")
            .build();

        let ranked = rank_by_relevance(vec![partial, no_cover, wrong_language, best], "Dune", "en");
        assert_eq!(
            ids(&ranked),
            vec!["cover-lang", "cover-wrong-lang", "no-cover", "partial"]
        );
    }

    #[test]
    fn test_rank_is_stable_for_ties() {
        let records = vec![book("a", "Dune").build(), book("b", "Dune").build(), book("c", "Dune").build()];
        assert_eq!(ids(&rank_by_relevance(records, "dune", "en")), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_prioritize_covers_is_stable() {
        let records = vec![
            book("a", "A").build(),
            book("b", "B").cover_url("https://x.test/b.jpg").build(),
            book("c", "C").build(),
            book("d", "D").cover_url("https://x.test/d.jpg").build(),
        ];
        assert_eq!(ids(&prioritize_covers(records)), vec!["b", "d", "a", "c"]);
    }

    #[test]
    fn test_prioritize_language() {
        let records = vec![
            book("a", "A").language("en").build(),
            book("b", "B").language("TR").build(),
            book("c", "C").build(),
            book("d", "D").language("tr-TR").build(),
        ];
        assert_eq!(ids(&prioritize_language(records, "tr")), vec!["b", "d", "a", "c"]);
    }

    #[test]
    fn test_blank_language_matches_nothing() {
        let record = book("a", "A").language("en").build();
        assert_eq!(relevance_score(&record, "zzz", ""), 0);
    }
}
