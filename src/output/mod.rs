//! Output module for exporting leads and reporting crawl statistics
//!
//! This module handles:
//! - Writing the final lead list as JSON or SQLite
//! - Summarizing and printing crawl statistics

mod json;
mod sqlite_output;
pub mod stats;
mod traits;

pub use json::JsonExporter;
pub use sqlite_output::{SqliteExporter, LEADS_SCHEMA_SQL};
pub use stats::{print_statistics, CrawlStats};
pub use traits::{export_file_name, Exporter, OutputError, OutputResult};

use crate::config::ExportFormat;
use crate::leads::Lead;
use std::path::{Path, PathBuf};

/// Returns the exporter for a configured format
pub fn exporter_for(format: ExportFormat) -> Box<dyn Exporter> {
    match format {
        ExportFormat::Json => Box::new(JsonExporter),
        ExportFormat::Sqlite => Box::new(SqliteExporter),
    }
}

/// Writes `leads` in `format` to a new file in `dir`
///
/// # Returns
///
/// * `Ok(PathBuf)` - Path of the written file
/// * `Err(OutputError)` - Failed to write
pub fn export_leads(leads: &[Lead], format: ExportFormat, dir: &Path) -> OutputResult<PathBuf> {
    exporter_for(format).export(leads, dir)
}
