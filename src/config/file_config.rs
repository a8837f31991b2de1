//! Configuration file support for shelf-scout.
//!
//! # Configuration File Format
//!
//! ```toml
//! [http]
//! user_agent = "shelf-scout/0.1.0"
//! request_timeout_ms = 8000
//! connect_timeout_ms = 5000
//!
//! [retry]
//! preset = "standard"      # quick | standard | patient | none
//! max_retries = 3          # optional overrides of the preset
//!
//! [google_books]
//! api_key = "your-api-key"
//! max_results = 40
//!
//! [open_library]
//! max_subjects = 5
//!
//! [search]
//! default_language = "en"
//! supplement_threshold = 5
//! match_threshold = 0.7
//!
//! [logging]
//! level = "info"
//! ```
//!
//! Every key can be overridden from the environment, e.g.
//! `SHELF_SCOUT__SEARCH__DEFAULT_LANGUAGE=tr`.

use std::path::{Path, PathBuf};

use crate::config::Config;

/// File name looked up in the working and platform config directories
pub const CONFIG_FILE_NAME: &str = "shelf-scout.toml";

/// Locate a configuration file.
///
/// Checks `./shelf-scout.toml`, then `<config dir>/shelf-scout/config.toml`.
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.is_file() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join("shelf-scout").join("config.toml"))
        .filter(|path| path.is_file())
}

impl Config {
    /// Load configuration from a TOML file, without environment overrides
    pub fn load(path: &Path) -> Result<Self, ConfigFileError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigFileError::Io(e.to_string()))?;

        toml::from_str(&content).map_err(|e| ConfigFileError::Parse(e.to_string()))
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: &Path) -> Result<(), ConfigFileError> {
        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigFileError::Io(e.to_string()))
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String, ConfigFileError> {
        toml::to_string_pretty(self).map_err(|e| ConfigFileError::Serialize(e.to_string()))
    }
}

/// Configuration file errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Serialize error: {0}")]
    Serialize(String),
}
