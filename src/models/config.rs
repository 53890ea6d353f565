//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::{Corpus, StatusKind};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Schedule site location
    #[serde(default)]
    pub site: SiteConfig,

    /// HTTP behavior settings
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Update cycle settings
    #[serde(default)]
    pub update: UpdateConfig,

    /// Status labels shown to observers
    #[serde(default)]
    pub messages: StatusMessages,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Write configuration as TOML, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        let base = url::Url::parse(&self.site.base_url)?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(AppError::validation("site.base_url must be http(s)"));
        }
        if !self.site.document_extension.starts_with('.') {
            return Err(AppError::validation(
                "site.document_extension must start with '.'",
            ));
        }
        if self.crawler.user_agent.trim().is_empty() {
            return Err(AppError::validation("crawler.user_agent is empty"));
        }
        if self.crawler.timeout_secs == 0 {
            return Err(AppError::validation("crawler.timeout_secs must be > 0"));
        }
        if self.crawler.connect_timeout_secs == 0 {
            return Err(AppError::validation(
                "crawler.connect_timeout_secs must be > 0",
            ));
        }
        if self.crawler.max_concurrent == 0 {
            return Err(AppError::validation("crawler.max_concurrent must be > 0"));
        }
        if self.update.workers == 0 {
            return Err(AppError::validation("update.workers must be > 0"));
        }
        Ok(())
    }
}

/// Where the schedule listing lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Listing page, also the base for relative document links
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// File extension of schedule documents
    #[serde(default = "defaults::document_extension")]
    pub document_extension: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            document_extension: defaults::document_extension(),
        }
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Connection timeout in seconds
    #[serde(default = "defaults::connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Maximum concurrent document downloads per building
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            connect_timeout_secs: defaults::connect_timeout(),
            max_concurrent: defaults::max_concurrent(),
        }
    }
}

/// Which buildings take part in an update cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadScope {
    #[default]
    All,
    First,
    Second,
    Third,
}

impl DownloadScope {
    /// Buildings selected by this scope.
    pub fn corpora(self) -> Vec<Corpus> {
        match self {
            DownloadScope::All => Corpus::ALL.to_vec(),
            DownloadScope::First => vec![Corpus::First],
            DownloadScope::Second => vec![Corpus::Second],
            DownloadScope::Third => vec![Corpus::Third],
        }
    }
}

/// Update cycle settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateConfig {
    #[serde(default)]
    pub download_scope: DownloadScope,

    /// Building tasks allowed to run at once
    #[serde(default = "defaults::workers")]
    pub workers: usize,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            download_scope: DownloadScope::default(),
            workers: defaults::workers(),
        }
    }
}

/// Status labels published with each progress value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusMessages {
    #[serde(default = "defaults::msg_download_status")]
    pub download_status: String,
    #[serde(default = "defaults::msg_parsing_status")]
    pub parsing_status: String,
    #[serde(default = "defaults::msg_completed")]
    pub completed: String,
    #[serde(default = "defaults::msg_download_error")]
    pub download_error: String,
    #[serde(default = "defaults::msg_parsing_error")]
    pub parsing_error: String,
    #[serde(default = "defaults::msg_saving_error")]
    pub saving_error: String,
}

impl StatusMessages {
    /// Label for a status kind.
    pub fn label(&self, kind: StatusKind) -> &str {
        match kind {
            StatusKind::Idle => "",
            StatusKind::Downloaded => &self.download_status,
            StatusKind::Parsing => &self.parsing_status,
            StatusKind::Completed => &self.completed,
            StatusKind::DownloadError => &self.download_error,
            StatusKind::ParsingError => &self.parsing_error,
            StatusKind::SavingError => &self.saving_error,
        }
    }
}

impl Default for StatusMessages {
    fn default() -> Self {
        Self {
            download_status: defaults::msg_download_status(),
            parsing_status: defaults::msg_parsing_status(),
            completed: defaults::msg_completed(),
            download_error: defaults::msg_download_error(),
            parsing_error: defaults::msg_parsing_error(),
            saving_error: defaults::msg_saving_error(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default log filter when `--verbose` is not given
    #[serde(default = "defaults::log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
        }
    }
}

impl LoggingConfig {
    /// Filter passed to the logger; `verbose` forces `debug`.
    pub fn filter(&self, verbose: bool) -> &str {
        if verbose { "debug" } else { self.level.as_str() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the lesson snapshot
    #[serde(default = "defaults::storage_dir")]
    pub dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: defaults::storage_dir(),
        }
    }
}

mod defaults {
    // Site defaults
    pub fn base_url() -> String {
        "https://patt.karelia.ru/students/schedule/".into()
    }
    pub fn document_extension() -> String {
        ".pdf".into()
    }

    // Crawler defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; patc-schedule/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn connect_timeout() -> u64 {
        10
    }
    pub fn max_concurrent() -> usize {
        4
    }

    // Update defaults
    pub fn workers() -> usize {
        3
    }

    // Status labels
    pub fn msg_download_status() -> String {
        "Downloading schedule".into()
    }
    pub fn msg_parsing_status() -> String {
        "Parsing schedule".into()
    }
    pub fn msg_completed() -> String {
        "Schedule updated".into()
    }
    pub fn msg_download_error() -> String {
        "Schedule download error".into()
    }
    pub fn msg_parsing_error() -> String {
        "Schedule parsing error".into()
    }
    pub fn msg_saving_error() -> String {
        "Schedule saving error".into()
    }

    pub fn log_level() -> String {
        "info".into()
    }
    pub fn storage_dir() -> String {
        "storage".into()
    }
}
