//! Cache configuration.
//!
//! Loaded from a JSON file, for example:
//!
//! ```json
//! {
//!   "source_url": "https://example.com/bible.json",
//!   "request_timeout_secs": 30,
//!   "sync": { "min_books": 66 }
//! }
//! ```
//!
//! `VERSECACHE_SOURCE_URL` overrides `source_url`. Without a
//! `database_path` the database lives in the platform data directory.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use versecache_sync::SyncConfig;

use crate::error::{CacheError, Result};

/// Environment variable overriding the source URL.
pub const SOURCE_URL_ENV: &str = "VERSECACHE_SOURCE_URL";

/// Application name used for the data directory.
const APP_NAME: &str = "versecache";

/// Database file name.
const DATABASE_FILE: &str = "versecache.db";

fn default_request_timeout_secs() -> u64 {
    30
}

/// Configuration for a [`VerseCache`](crate::VerseCache).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Where the corpus document is published.
    #[serde(default)]
    pub source_url: String,
    /// SQLite database file. Defaults to the platform data directory.
    #[serde(default)]
    pub database_path: Option<PathBuf>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub sync: SyncConfig,
}

impl CacheConfig {
    pub fn new(source_url: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            database_path: None,
            request_timeout_secs: default_request_timeout_secs(),
            sync: SyncConfig::default(),
        }
    }

    /// Store the database at `path` instead of the data directory.
    pub fn with_database_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.database_path = Some(path.into());
        self
    }

    /// Load from a JSON file, then apply the environment override.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            CacheError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;

        let config = Self::from_json(&contents)?
            .with_source_override(std::env::var(SOURCE_URL_ENV).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parse a JSON document. No environment lookup, no validation.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| CacheError::Config(format!("invalid config: {}", e)))
    }

    fn with_source_override(mut self, url: Option<String>) -> Self {
        if let Some(url) = url.filter(|u| !u.trim().is_empty()) {
            tracing::debug!(url = %url, "source url overridden from environment");
            self.source_url = url;
        }
        self
    }

    /// Check the configuration is usable.
    pub fn validate(&self) -> Result<()> {
        if self.source_url.trim().is_empty() {
            return Err(CacheError::Config(format!(
                "no source url configured (set source_url or {})",
                SOURCE_URL_ENV
            )));
        }
        if self.request_timeout_secs == 0 {
            return Err(CacheError::Config(
                "request_timeout_secs must be positive".into(),
            ));
        }
        Ok(())
    }

    /// The database file to open.
    pub fn database_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.database_path {
            return Ok(path.clone());
        }

        let data_dir = dirs::data_dir()
            .ok_or_else(|| CacheError::Config("could not find data directory".into()))?;
        Ok(data_dir.join(APP_NAME).join(DATABASE_FILE))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
