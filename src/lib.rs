//! Archive-Harvest: a polite news archive harvester
//!
//! This crate walks a news site's day-by-day archive over a date range, collects
//! article metadata from paginated listing pages, then fetches every article and
//! extracts its text body. Metadata lands in a single CSV file and each body in
//! its own text file.

pub mod config;
pub mod crawler;
pub mod model;
pub mod output;

use thiserror::Error;

/// Main error type for Archive-Harvest operations
///
/// Only failures that stop the whole run end up here. Per-page and per-article
/// problems are recovered where they happen and counted in the run summary.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),
}

/// Configuration-specific errors
///
/// These are all fatal and are raised before any network activity.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },

    #[error("Invalid date '{0}': expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Output directory {path} is not writable: {source}")]
    OutputDir {
        path: String,
        source: std::io::Error,
    },
}

/// Result type alias for Archive-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{harvest, FetchError};
pub use model::{ArticleContent, DateRange, MetadataRecord};
pub use output::CrawlSummary;
