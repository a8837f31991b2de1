//! Configuration management.

mod file_config;

pub use file_config::{find_config_file, ConfigFileError, CONFIG_FILE_NAME};

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::catalogs::{GOOGLE_BOOKS_API_BASE, OPEN_LIBRARY_API_BASE, OPEN_LIBRARY_COVERS_BASE};
use crate::search::{SearchSettings, DEFAULT_MATCH_THRESHOLD, DEFAULT_SUPPLEMENT_THRESHOLD};
use crate::utils::{retry_policy_named, standard_retry_policy, RetryPolicy};

/// Prefix of environment overrides, e.g. `SHELF_SCOUT__HTTP__USER_AGENT`
pub const ENV_PREFIX: &str = "SHELF_SCOUT";

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Retry settings shared by both catalogs
    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub google_books: GoogleBooksConfig,

    #[serde(default)]
    pub open_library: OpenLibraryConfig,

    /// Merging and ranking settings
    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub user_agent: String,

    /// Deadline for each request attempt
    pub request_timeout_ms: u64,

    pub connect_timeout_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string(),
            request_timeout_ms: 8_000,
            connect_timeout_ms: 5_000,
        }
    }
}

impl HttpConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

/// Retry configuration: a named preset, optionally with fields overridden
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// `quick`, `standard`, `patient` or `none`
    #[serde(default = "default_retry_preset")]
    pub preset: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_delay_ms: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_delay_ms: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backoff_multiplier: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retryable_status_codes: Option<Vec<u16>>,
}

fn default_retry_preset() -> String {
    "standard".to_string()
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            preset: default_retry_preset(),
            max_retries: None,
            initial_delay_ms: None,
            max_delay_ms: None,
            backoff_multiplier: None,
            retryable_status_codes: None,
        }
    }
}

impl RetryConfig {
    /// Resolve the preset and apply overrides. Unknown presets fall back to `standard`.
    pub fn policy(&self) -> RetryPolicy {
        let mut policy = retry_policy_named(&self.preset).unwrap_or_else(|| {
            tracing::warn!("Unknown retry preset {:?}, using standard", self.preset);
            standard_retry_policy()
        });

        if let Some(max_retries) = self.max_retries {
            policy.max_retries = max_retries;
        }
        if let Some(ms) = self.initial_delay_ms {
            policy.initial_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = self.max_delay_ms {
            policy.max_delay = Duration::from_millis(ms);
        }
        if let Some(multiplier) = self.backoff_multiplier {
            policy.backoff_multiplier = multiplier;
        }
        if let Some(ref codes) = self.retryable_status_codes {
            policy.retryable_status_codes = codes.clone();
        }
        policy
    }
}

/// Google Books configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleBooksConfig {
    pub base_url: String,

    /// API key (optional; falls back to `GOOGLE_BOOKS_API_KEY`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    pub max_results: usize,
}

impl Default for GoogleBooksConfig {
    fn default() -> Self {
        Self {
            base_url: GOOGLE_BOOKS_API_BASE.to_string(),
            api_key: None,
            max_results: 40,
        }
    }
}

impl GoogleBooksConfig {
    /// Configured key, else the `GOOGLE_BOOKS_API_KEY` environment variable
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var("GOOGLE_BOOKS_API_KEY").ok())
    }
}

/// Open Library configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenLibraryConfig {
    pub base_url: String,
    pub covers_base_url: String,
    pub max_results: usize,

    /// Subjects kept per record
    pub max_subjects: usize,
}

impl Default for OpenLibraryConfig {
    fn default() -> Self {
        Self {
            base_url: OPEN_LIBRARY_API_BASE.to_string(),
            covers_base_url: OPEN_LIBRARY_COVERS_BASE.to_string(),
            max_results: 20,
            max_subjects: 5,
        }
    }
}

/// Search configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Language used when the caller does not pass one
    pub default_language: String,

    /// Page size requested from each catalog
    pub max_results: usize,

    pub supplement_threshold: usize,

    pub match_threshold: f64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_language: "en".to_string(),
            max_results: 20,
            supplement_threshold: DEFAULT_SUPPLEMENT_THRESHOLD,
            match_threshold: DEFAULT_MATCH_THRESHOLD,
        }
    }
}

impl SearchConfig {
    pub fn settings(&self) -> SearchSettings {
        SearchSettings {
            max_results: self.max_results,
            supplement_threshold: self.supplement_threshold,
            match_threshold: self.match_threshold,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level when neither `RUST_LOG` nor `-v`/`-q` is given
    pub level: String,

    /// `json` for structured output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: None,
        }
    }
}

/// Load configuration from an optional TOML file plus `SHELF_SCOUT__*` environment overrides
pub fn load_config(path: Option<&Path>) -> Result<Config, config::ConfigError> {
    let mut builder = config::Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(config::File::from(path));
    }

    let settings = builder
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    settings.try_deserialize()
}

/// Get the default configuration
pub fn get_config() -> Config {
    Config::default()
}
