//! Exporter trait and errors
//!
//! An exporter writes the final lead list to one file in the output
//! directory. File names carry a UTC timestamp so repeated runs do not
//! overwrite each other.

use crate::leads::Lead;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to format output: {0}")]
    Format(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Writes leads to a file
pub trait Exporter {
    /// File extension without the dot
    fn extension(&self) -> &'static str;

    /// Writes `leads` to `path`
    fn write_to(&self, leads: &[Lead], path: &Path) -> OutputResult<()>;

    /// Writes `leads` to a new timestamped file in `dir`
    ///
    /// # Arguments
    ///
    /// * `leads` - Final, deduplicated leads
    /// * `dir` - Output directory; created if missing
    ///
    /// # Returns
    ///
    /// * `Ok(PathBuf)` - Path of the written file
    /// * `Err(OutputError)` - The directory or file could not be written
    fn export(&self, leads: &[Lead], dir: &Path) -> OutputResult<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(export_file_name(self.extension(), Utc::now()));
        self.write_to(leads, &path)?;
        tracing::info!("Wrote {} lead(s) to {}", leads.len(), path.display());
        Ok(path)
    }
}

/// `leads_20240131_154502.json`
pub fn export_file_name(extension: &str, at: DateTime<Utc>) -> String {
    format!("leads_{}.{}", at.format("%Y%m%d_%H%M%S"), extension)
}
