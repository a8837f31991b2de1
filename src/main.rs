use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use shelf_scout::config::{find_config_file, load_config, Config};
use shelf_scout::models::{BookRecord, SearchKind};
use shelf_scout::search::{SearchCancelled, SearchOrchestrator};
use std::io::IsTerminal;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Shelf Scout - Search Google Books and Open Library as one catalog
#[derive(Parser, Debug)]
#[command(name = "shelf-scout")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Search Google Books and Open Library as one merged catalog", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (-v for debug, -vv for trace)
    #[arg(long, short, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, short, value_enum, global = true, default_value_t = OutputFormat::Auto)]
    output: OutputFormat,

    /// Log format
    #[arg(long, value_enum, global = true, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Configuration file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Search by title or author
    Search {
        /// Search text
        query: String,

        /// Field to search
        #[arg(long, value_enum, default_value_t = SearchBy::Title)]
        by: SearchBy,

        /// Preferred language (ISO 639-1); defaults to the configured one
        #[arg(long, short)]
        language: Option<String>,
    },

    /// Look a book up by ISBN-10 or ISBN-13
    Isbn {
        /// The ISBN, with or without dashes
        isbn: String,

        /// Preferred language (ISO 639-1); defaults to the configured one
        #[arg(long, short)]
        language: Option<String>,
    },

    /// Print the effective configuration as TOML
    Config,
}

/// Output format for results
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Automatic based on terminal (table if TTY, JSON otherwise)
    Auto,
    /// Table format (human-readable)
    Table,
    /// JSON format (machine-readable)
    Json,
    /// Plain text format
    Plain,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum LogFormat {
    Text,
    Json,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum SearchBy {
    Title,
    Author,
}

impl From<SearchBy> for SearchKind {
    fn from(by: SearchBy) -> Self {
        match by {
            SearchBy::Title => SearchKind::Title,
            SearchBy::Author => SearchKind::Author,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration from file if specified or found in default locations
    let config_path = cli.config.clone().or_else(find_config_file);
    let config = load_config(config_path.as_deref())?;

    init_tracing(&cli, &config);
    if let Some(ref path) = config_path {
        tracing::debug!("Using config file: {}", path.display());
    }

    match cli.command {
        Commands::Search {
            ref query,
            by,
            ref language,
        } => {
            let orchestrator = SearchOrchestrator::from_config(&config)?;
            let language = language
                .clone()
                .unwrap_or_else(|| config.search.default_language.clone());
            let cancel = cancel_on_ctrl_c();

            let outcome = orchestrator
                .search(query, &language, by.into(), Some(&cancel))
                .await;
            report(outcome, &cli)?;
        }
        Commands::Isbn {
            ref isbn,
            ref language,
        } => {
            let orchestrator = SearchOrchestrator::from_config(&config)?;
            let language = language
                .clone()
                .unwrap_or_else(|| config.search.default_language.clone());
            let cancel = cancel_on_ctrl_c();

            let outcome = orchestrator
                .search_by_isbn(isbn, &language, Some(&cancel))
                .await;
            report(outcome, &cli)?;
        }
        Commands::Config => {
            print!("{}", config.to_toml()?);
        }
    }

    Ok(())
}

fn init_tracing(cli: &Cli, config: &Config) {
    let level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => config.logging.level.as_str(),
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| format!("shelf_scout={}", level)),
    );

    let json = cli.log_format == LogFormat::Json
        || config.logging.format.as_deref() == Some("json");

    // Logs go to stderr so results on stdout stay machine-readable
    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

/// A token cancelled by Ctrl-C
fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::debug!("Ctrl-C received, cancelling search");
            token.cancel();
        }
    });
    cancel
}

fn report(outcome: Result<Vec<BookRecord>, SearchCancelled>, cli: &Cli) -> Result<()> {
    match outcome {
        Ok(books) => {
            if books.is_empty() && !cli.quiet {
                eprintln!("No books found");
            }
            output_books(&books, cli.output)
        }
        Err(SearchCancelled) => {
            if !cli.quiet {
                eprintln!("Search cancelled");
            }
            Ok(())
        }
    }
}

fn output_books(books: &[BookRecord], format: OutputFormat) -> Result<()> {
    let actual_format = if format == OutputFormat::Auto {
        if std::io::stdout().is_terminal() {
            OutputFormat::Table
        } else {
            OutputFormat::Json
        }
    } else {
        format
    };

    match actual_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(books)?);
        }
        OutputFormat::Plain => {
            for book in books {
                println!("{} - {} ({})", book.title, book.author_line(), book.source);
                if let Some(ref isbn) = book.isbn13 {
                    println!("  ISBN: {}", isbn);
                }
                if let Some(ref language) = book.language {
                    println!("  Language: {}", language);
                }
                if let Some(ref cover) = book.cover_url {
                    println!("  Cover: {}", cover);
                }
                println!();
            }
        }
        OutputFormat::Table => {
            use comfy_table::{Attribute, Cell, Table};
            let mut table = Table::new();
            table.load_preset(comfy_table::presets::UTF8_FULL);
            table.set_header(vec!["Title", "Authors", "Lang", "ISBN-13", "Source"]);

            for book in books {
                table.add_row(vec![
                    Cell::new(truncate(&book.title, 50)).add_attribute(Attribute::Bold),
                    Cell::new(truncate(&book.author_line(), 30)),
                    Cell::new(book.language.as_deref().unwrap_or("")),
                    Cell::new(book.isbn13.as_deref().unwrap_or("")),
                    Cell::new(book.source.to_string()),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Auto => unreachable!(),
    }

    Ok(())
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let kept: String = text.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", kept)
    } else {
        text.to_string()
    }
}
