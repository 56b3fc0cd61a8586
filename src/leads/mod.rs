//! Lead extraction and assembly
//!
//! This module turns page text into contact leads:
//! - Classifiers (remote LLM or offline regex extraction)
//! - Field cleaning and validation
//! - Cross-page deduplication

mod assemble;
mod classifier;
mod clean;
mod fallback;
mod types;

pub use assemble::{merge_leads, Assembly, AssemblyStats, LeadAssembler};
pub use classifier::{parse_leads, parse_score, ClassifierError, ContentClassifier, LlmClassifier};
pub use clean::{clean_email, clean_name, strip_corporate_suffix, LeadCleaner, Rejection};
pub use fallback::{OfflineClassifier, RegexLeadExtractor};
pub use types::Lead;
