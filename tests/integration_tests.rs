//! Integration tests for Shelf Scout
//!
//! These tests drive the search orchestrator end to end, with scripted mock
//! catalogs and with the real catalog clients against a local HTTP server.

use shelf_scout::catalogs::mock::make_book;
use shelf_scout::catalogs::{CatalogError, MockCatalog};
use shelf_scout::config::Config;
use shelf_scout::models::{BookRecordBuilder, CatalogKind, QueryField, SearchKind};
use shelf_scout::search::{SearchCancelled, SearchOrchestrator};
use std::sync::Arc;
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};
use tokio_util::sync::CancellationToken;

fn catalogs() -> (Arc<MockCatalog>, Arc<MockCatalog>) {
    (
        Arc::new(MockCatalog::new("primary").with_kind(CatalogKind::GoogleBooks)),
        Arc::new(MockCatalog::new("secondary").with_kind(CatalogKind::OpenLibrary)),
    )
}

fn orchestrator(primary: &Arc<MockCatalog>, secondary: &Arc<MockCatalog>) -> SearchOrchestrator {
    SearchOrchestrator::new(primary.clone(), secondary.clone())
}

// ===== ISBN path =====

#[tokio::test]
async fn test_isbn_lookup_is_fail_soft() {
    let (primary, secondary) = catalogs();
    primary.set_lookup_response("9780306406157", Err(CatalogError::Server { status: 503 }));
    primary.set_lookup_response("0306406152", Err(CatalogError::Timeout(Duration::from_secs(8))));
    secondary.set_lookup_response(
        "9780306406157",
        Ok(Some(
            BookRecordBuilder::new("OL1M", "Signal Processing", CatalogKind::OpenLibrary)
                .isbn13("9780306406157")
                .build(),
        )),
    );

    let results = assert_ok!(
        orchestrator(&primary, &secondary)
            .search_by_isbn("9780306406157", "en", None)
            .await
    );

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, "OL1M");
    assert_eq!(primary.lookup_calls(), 2);
    assert_eq!(secondary.lookup_calls(), 2);
}

#[tokio::test]
async fn test_isbn_lookup_finds_converted_form() {
    let (primary, secondary) = catalogs();
    secondary.set_lookup_response(
        "9780140449136",
        Ok(Some(make_book("OL2M", "Crime and Punishment", "Fyodor Dostoevsky", CatalogKind::OpenLibrary))),
    );

    let results = assert_ok!(
        orchestrator(&primary, &secondary)
            .search_by_isbn("0-14-044913-X", "en", None)
            .await
    );

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].title, "Crime and Punishment");
    assert_eq!(secondary.recorded_lookups(), vec!["014044913X", "9780140449136"]);
}

#[tokio::test]
async fn test_isbn_hits_for_same_book_are_merged() {
    let (primary, secondary) = catalogs();
    primary.set_lookup_response(
        "9786053609421",
        Ok(Some(
            BookRecordBuilder::new("g1", "Tutunamayanlar", CatalogKind::GoogleBooks)
                .author("Oğuz Atay")
                .isbn13("9786053609421")
                .language("tr")
                .build(),
        )),
    );
    secondary.set_lookup_response(
        "9786053609421",
        Ok(Some(
            BookRecordBuilder::new("OL3M", "Tutunamayanlar", CatalogKind::OpenLibrary)
                .isbn13("9786053609421")
                .cover_url("https://covers.openlibrary.org/b/id/5-M.jpg")
                .page_count(724)
                .build(),
        )),
    );

    let results = assert_ok!(
        orchestrator(&primary, &secondary)
            .search("978-605-360-942-1", "tr", SearchKind::Title, None)
            .await
    );

    assert_eq!(results.len(), 1);
    let book = &results[0];
    assert_eq!(book.id, "g1");
    assert_eq!(book.source, CatalogKind::GoogleBooks);
    assert!(book.has_cover());
    assert_eq!(book.page_count, Some(724));
    assert_eq!(primary.search_calls() + secondary.search_calls(), 0);
}

#[tokio::test]
async fn test_isbn_979_has_no_converted_lookup() {
    let (primary, secondary) = catalogs();

    let results = assert_ok!(
        orchestrator(&primary, &secondary)
            .search_by_isbn("9791032305690", "fr", None)
            .await
    );

    assert!(results.is_empty());
    assert_eq!(primary.recorded_lookups(), vec!["9791032305690"]);
    assert_eq!(secondary.lookup_calls(), 1);
}

// ===== Text path =====

#[tokio::test]
async fn test_text_search_merges_and_ranks() {
    let (primary, secondary) = catalogs();
    primary.set_search_response(
        QueryField::Title,
        Ok(vec![
            BookRecordBuilder::new("g1", "Dune Messiah", CatalogKind::GoogleBooks)
                .author("Frank Herbert")
                .build(),
            BookRecordBuilder::new("g2", "Dune", CatalogKind::GoogleBooks)
                .author("Frank Herbert")
                .isbn13("9780441013593")
                .language("en")
                .build(),
            BookRecordBuilder::new("g3", "The Dosadi Experiment", CatalogKind::GoogleBooks)
                .author("Frank Herbert")
                .build(),
        ]),
    );
    secondary.set_search_response(
        QueryField::Any,
        Ok(vec![
            BookRecordBuilder::new("OL1W", "Dune", CatalogKind::OpenLibrary)
                .author("Frank Herbert")
                .isbn10("0441013597")
                .cover_url("https://covers.openlibrary.org/b/id/6-M.jpg")
                .categories(["Science fiction"])
                .build(),
        ]),
    );

    let results = assert_ok!(
        orchestrator(&primary, &secondary)
            .search("Dune", "en", SearchKind::Title, None)
            .await
    );
    let ids: Vec<&str> = results.iter().map(|r| r.id.as_str()).collect();

    // g3 fails the relevance filter; g2 absorbed OL1W's cover
    assert_eq!(ids, vec!["g2", "g1"]);
    assert!(results[0].has_cover());
    assert_eq!(results[0].categories, vec!["Science fiction"]);
}

#[tokio::test]
async fn test_text_search_is_fail_fast() {
    let (primary, secondary) = catalogs();
    primary.set_search_response(
        QueryField::Title,
        Ok(vec![make_book("g1", "Dune", "Frank Herbert", CatalogKind::GoogleBooks)]),
    );
    secondary.set_search_response(QueryField::Any, Err(CatalogError::Server { status: 500 }));

    let results = assert_ok!(
        orchestrator(&primary, &secondary)
            .search("dune", "en", SearchKind::Title, None)
            .await
    );

    assert!(results.is_empty());
    assert_eq!(secondary.search_calls(), 1);
}

#[tokio::test]
async fn test_empty_field_search_falls_back_to_free_text() {
    let (primary, secondary) = catalogs();
    primary.set_search_response(QueryField::Author, Ok(Vec::new()));
    primary.set_search_response(
        QueryField::Any,
        Ok(vec![make_book("g1", "İnce Memed", "Yaşar Kemal", CatalogKind::GoogleBooks)]),
    );

    let results = assert_ok!(
        orchestrator(&primary, &secondary)
            .search("yasar kemal", "tr", SearchKind::Author, None)
            .await
    );

    assert_eq!(results.len(), 1);
    let fields: Vec<QueryField> = primary.recorded_queries().iter().map(|q| q.field).collect();
    assert_eq!(fields, vec![QueryField::Author, QueryField::Any]);
}

#[tokio::test]
async fn test_supplemental_failure_is_isolated() {
    let (primary, secondary) = catalogs();
    primary.set_search_response(
        QueryField::Title,
        Ok(vec![make_book("g1", "Dune", "Frank Herbert", CatalogKind::GoogleBooks)]),
    );
    secondary.set_search_response(QueryField::Any, Ok(Vec::new()));
    secondary.set_search_response(QueryField::Title, Err(CatalogError::RateLimited));

    let results = assert_ok!(
        orchestrator(&primary, &secondary)
            .search("dune", "en", SearchKind::Title, None)
            .await
    );

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, "g1");
    assert_eq!(secondary.search_calls(), 2);
}

#[tokio::test]
async fn test_supplemental_results_skip_known_titles() {
    let (primary, secondary) = catalogs();
    primary.set_search_response(
        QueryField::Title,
        Ok(vec![make_book("g1", "Dune", "Frank Herbert", CatalogKind::GoogleBooks)]),
    );
    secondary.set_search_response(
        QueryField::Title,
        Ok(vec![
            make_book("OL1W", "DUNE", "Herbert", CatalogKind::OpenLibrary),
            make_book("OL2W", "Dune Messiah", "Frank Herbert", CatalogKind::OpenLibrary),
        ]),
    );

    let results = assert_ok!(
        orchestrator(&primary, &secondary)
            .search("dune", "en", SearchKind::Title, None)
            .await
    );
    let ids: Vec<&str> = results.iter().map(|r| r.id.as_str()).collect();

    assert_eq!(ids, vec!["g1", "OL2W"]);
}

#[tokio::test]
async fn test_supplemental_edition_of_known_book_is_merged() {
    let (primary, secondary) = catalogs();
    primary.set_search_response(
        QueryField::Title,
        Ok(vec![BookRecordBuilder::new("g1", "Dune", CatalogKind::GoogleBooks)
            .author("Frank Herbert")
            .isbn13("9780441013593")
            .build()]),
    );
    secondary.set_search_response(QueryField::Any, Ok(Vec::new()));
    secondary.set_search_response(
        QueryField::Title,
        Ok(vec![BookRecordBuilder::new(
            "OL1W",
            "Dune: Deluxe Edition",
            CatalogKind::OpenLibrary,
        )
        .author("Frank Herbert")
        .isbn13("9780441013593")
        .cover_url("https://covers.openlibrary.org/b/id/1-M.jpg")
        .categories(["Science Fiction"])
        .build()]),
    );

    let results = assert_ok!(
        orchestrator(&primary, &secondary)
            .search("dune", "en", SearchKind::Title, None)
            .await
    );

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, "g1");
    assert_eq!(results[0].title, "Dune");
    assert_eq!(
        results[0].cover_url.as_deref(),
        Some("https://covers.openlibrary.org/b/id/1-M.jpg")
    );
    assert_eq!(results[0].categories, vec!["Science Fiction"]);
    assert_eq!(secondary.search_calls(), 2);
}

// ===== Cancellation =====

#[tokio::test]
async fn test_cancelled_before_start_makes_no_calls() {
    let (primary, secondary) = catalogs();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let search = orchestrator(&primary, &secondary);
    let text = search.search("dune", "en", SearchKind::Title, Some(&cancel)).await;
    let isbn = search.search_by_isbn("9780306406157", "en", Some(&cancel)).await;

    assert_eq!(text, Err(SearchCancelled));
    assert_eq!(assert_err!(isbn), SearchCancelled);
    assert!(text.unwrap_or_default().is_empty());
    assert_eq!(primary.search_calls() + primary.lookup_calls(), 0);
    assert_eq!(secondary.search_calls() + secondary.lookup_calls(), 0);
}

#[tokio::test]
async fn test_cancel_during_search() {
    let primary = Arc::new(MockCatalog::new("primary").with_latency(Duration::from_secs(30)));
    let secondary = Arc::new(MockCatalog::new("secondary"));

    let cancel = CancellationToken::new();
    let canceller = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        canceller.cancel();
    });

    let outcome = orchestrator(&primary, &secondary)
        .search("dune", "en", SearchKind::Title, Some(&cancel))
        .await;

    assert_eq!(outcome, Err(SearchCancelled));
    assert_eq!(primary.search_calls(), 1);
}

#[tokio::test]
async fn test_cancel_during_isbn_lookup() {
    let primary = Arc::new(MockCatalog::new("primary").with_latency(Duration::from_secs(30)));
    let secondary = Arc::new(MockCatalog::new("secondary").with_latency(Duration::from_secs(30)));

    let cancel = CancellationToken::new();
    let canceller = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        canceller.cancel();
    });

    let outcome = orchestrator(&primary, &secondary)
        .search_by_isbn("0306406152", "en", Some(&cancel))
        .await;

    assert_eq!(outcome, Err(SearchCancelled));
}

// ===== Real catalogs over HTTP =====

#[tokio::test]
async fn test_from_config_against_local_server() {
    use mockito::Matcher;

    let mut server = mockito::Server::new_async().await;

    let google = server
        .mock("GET", "/gb/volumes")
        .match_query(Matcher::UrlEncoded("q".into(), "intitle:dune".into()))
        .with_status(200)
        .with_body(
            r#"{"totalItems": 1, "items": [{
                "id": "B1hSG45JCX4C",
                "volumeInfo": {
                    "title": "Dune",
                    "authors": ["Frank Herbert"],
                    "language": "en",
                    "imageLinks": {"thumbnail": "http://books.google.com/dune.jpg"},
                    "industryIdentifiers": [{"type": "ISBN_13", "identifier": "9780441013593"}]
                }
            }]}"#,
        )
        .expect(1)
        .create_async()
        .await;

    let open_library_general = server
        .mock("GET", "/ol/search.json")
        .match_query(Matcher::UrlEncoded("q".into(), "dune".into()))
        .with_status(200)
        .with_body(
            r#"{"numFound": 1, "docs": [{
                "key": "/works/OL893415W",
                "title": "Dune",
                "author_name": ["Frank Herbert"],
                "language": ["eng"],
                "subject": ["Science fiction", "Desert"],
                "number_of_pages_median": 604,
                "isbn": ["9780441013593"]
            }]}"#,
        )
        .expect(1)
        .create_async()
        .await;

    let open_library_title = server
        .mock("GET", "/ol/search.json")
        .match_query(Matcher::UrlEncoded("title".into(), "dune".into()))
        .with_status(200)
        .with_body(r#"{"numFound": 0, "docs": []}"#)
        .expect(1)
        .create_async()
        .await;

    let mut config = Config::default();
    config.google_books.base_url = format!("{}/gb", server.url());
    config.open_library.base_url = format!("{}/ol", server.url());
    config.retry.preset = "none".to_string();

    let search = SearchOrchestrator::from_config(&config).unwrap();
    let results = assert_ok!(search.search("dune", "en", SearchKind::Title, None).await);

    google.assert_async().await;
    open_library_general.assert_async().await;
    open_library_title.assert_async().await;

    assert_eq!(results.len(), 1);
    let dune = &results[0];
    assert_eq!(dune.id, "B1hSG45JCX4C");
    assert_eq!(dune.cover_url.as_deref(), Some("https://books.google.com/dune.jpg"));
    assert_eq!(dune.page_count, Some(604));
    assert_eq!(dune.categories, vec!["Science fiction", "Desert"]);
    assert_eq!(dune.source, CatalogKind::GoogleBooks);
}
