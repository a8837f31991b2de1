//! Basic usage example for the shelf-scout library
//!
//! This example demonstrates how to:
//! 1. Wire the orchestrator to the live catalogs
//! 2. Search by title and by author
//! 3. Look a book up by ISBN
//! 4. Run the same flow offline with mock catalogs
//!
//! Run with: cargo run --example basic_usage

use shelf_scout::catalogs::mock::make_book;
use shelf_scout::catalogs::{GoogleBooksCatalog, MockCatalog, OpenLibraryCatalog};
use shelf_scout::models::{CatalogKind, QueryField, SearchKind};
use shelf_scout::search::SearchOrchestrator;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Shelf Scout - Basic Usage Example ===\n");

    // Live catalogs
    let orchestrator = SearchOrchestrator::new(
        Arc::new(GoogleBooksCatalog::new()?),
        Arc::new(OpenLibraryCatalog::new()?),
    );

    println!("Searching titles for 'Kürk Mantolu Madonna'...");
    let books = orchestrator
        .search("Kürk Mantolu Madonna", "tr", SearchKind::Title, None)
        .await
        .unwrap_or_default();
    for book in books.iter().take(5) {
        println!(
            "  - {} by {} [{}]",
            book.title,
            book.author_line(),
            book.language.as_deref().unwrap_or("?")
        );
    }

    println!("\nSearching authors for 'Ursula K. Le Guin'...");
    let books = orchestrator
        .search("Ursula K. Le Guin", "en", SearchKind::Author, None)
        .await
        .unwrap_or_default();
    println!("  Found {} books", books.len());

    println!("\nLooking up ISBN 0-14-044913-X...");
    let books = orchestrator
        .search_by_isbn("0-14-044913-X", "en", None)
        .await
        .unwrap_or_default();
    for book in &books {
        println!(
            "  - {} (ISBN-13 {}) from {}",
            book.title,
            book.isbn13.as_deref().unwrap_or("?"),
            book.source
        );
    }

    // Offline: scripted catalogs
    println!("\nOffline search with mock catalogs...");
    let primary = Arc::new(MockCatalog::new("primary").with_kind(CatalogKind::GoogleBooks));
    let secondary = Arc::new(MockCatalog::new("secondary").with_kind(CatalogKind::OpenLibrary));
    primary.set_search_response(
        QueryField::Title,
        Ok(vec![make_book("g1", "Dune", "Frank Herbert", CatalogKind::GoogleBooks)]),
    );
    secondary.set_default_search_response(Ok(vec![make_book(
        "OL1W",
        "Dune Messiah",
        "Frank Herbert",
        CatalogKind::OpenLibrary,
    )]));

    let offline = SearchOrchestrator::new(primary.clone(), secondary.clone());
    let books = offline
        .search("dune", "en", SearchKind::Title, None)
        .await
        .unwrap_or_default();
    for book in &books {
        println!("  - {} ({})", book.title, book.source);
    }
    println!(
        "  Catalog calls: primary {}, secondary {}",
        primary.search_calls(),
        secondary.search_calls()
    );

    Ok(())
}
