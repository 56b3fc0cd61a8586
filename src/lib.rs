//! Lead-Ripple: a depth-bounded lead crawler
//!
//! This crate walks business websites breadth-first from a set of seed URLs,
//! follows the child links worth following up to a bounded depth, and turns
//! the page text it collects into deduplicated, validated contact leads.

pub mod config;
pub mod crawler;
pub mod governor;
pub mod leads;
pub mod output;
pub mod url;

use thiserror::Error;

/// Main error type for Lead-Ripple operations
#[derive(Debug, Error)]
pub enum LeadError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Page driver error: {0}")]
    Driver(#[from] crawler::DriverError),

    #[error("Classifier error: {0}")]
    Classifier(#[from] leads::ClassifierError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("A crawl session is already running on this walker")]
    SessionActive,

    #[error("No valid seed URLs were supplied")]
    NoSeeds,
}

/// Configuration-specific errors
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

    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Result type alias for Lead-Ripple operations
pub type Result<T> = std::result::Result<T, LeadError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CrawlNode, CrawlReport, FetchResult, Session};
pub use leads::Lead;
pub use crate::url::{classify_link, normalize_url, LinkDecision};
