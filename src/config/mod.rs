//! Configuration module for Lead-Ripple
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every section and key has a default, so an empty file yields a usable config.
//!
//! # Example
//!
//! ```no_run
//! use lead_ripple::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! println!("Crawler will use max depth: {}", config.crawler.max_depth);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    BackoffKind, ClassifierConfig, Config, CrawlerConfig, ExportFormat, FetchConfig,
    GovernorConfig, LeadConfig, LinkConfig, LinkPolicy, OutputConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::{validate, MAX_CONCURRENT_FETCHES, MAX_DEPTH_LIMIT};
