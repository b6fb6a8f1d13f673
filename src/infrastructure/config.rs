//! Configuration infrastructure
//!
//! Application configuration with serde-backed JSON persistence, default
//! constants, and fixed marketplace endpoints.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::info;

use super::http_client::HttpClientConfig;

/// Complete application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Outbound HTTP behavior: identity, timeout, rate limit.
    pub http: HttpClientConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// SQLite database url for collection storage.
    pub database_url: String,

    /// Path of the deck-list file consumed by the batch import flow.
    pub import_file: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            http: HttpClientConfig::default(),
            logging: LoggingConfig::default(),
            database_url: defaults::DATABASE_URL.to_string(),
            import_file: defaults::IMPORT_FILE.to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a JSON file, falling back to defaults when
    /// the file does not exist.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            info!("No config file at {}; using defaults", path.display());
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Persist configuration as pretty-printed JSON.
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let raw = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, raw)
            .await
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }
}

/// Logging configuration settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub level: String,

    /// Suppress verbose dependency output (sqlx queries, reqwest internals)
    /// unless the level is "trace".
    pub quiet_dependencies: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
            quiet_dependencies: true,
        }
    }
}

/// Default configuration constants.
pub mod defaults {
    /// Browser-like identity; the marketplace serves full markup to browsers.
    pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
        AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

    pub const REQUEST_TIMEOUT_SECONDS: u64 = 30;

    pub const MAX_REQUESTS_PER_SECOND: u32 = 5;

    pub const LOG_LEVEL: &str = "info";

    pub const DATABASE_URL: &str = "sqlite:db/card_database.db";

    pub const IMPORT_FILE: &str = "cards.txt";
}

/// CoolStuffInc endpoint constants.
pub mod coolstuffinc {
    /// Base URL for the marketplace.
    pub const BASE_URL: &str = "https://www.coolstuffinc.com";

    /// Name search endpoint; the encoded query term is appended.
    pub const SEARCH_URL: &str =
        "https://www.coolstuffinc.com/main_search.php?pa=searchOnName&page=1&resultsPerPage=25&q=";
}
