//! Lead assembly
//!
//! Successful fetch results are classified one page at a time through the
//! governor. The candidates from all pages are then cleaned, validated and
//! deduplicated, in that order.

use super::classifier::ContentClassifier;
use super::clean::LeadCleaner;
use super::fallback::RegexLeadExtractor;
use super::types::Lead;
use crate::crawler::FetchResult;
use crate::governor::{Governed, Governor};
use std::collections::HashSet;
use std::sync::Arc;

/// Counters from one assembly run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssemblyStats {
    /// Pages handed to the classifier or the fallback
    pub pages_classified: usize,
    /// Pages handled by the offline extractor because the classifier was
    /// unavailable
    pub fallback_pages: usize,
    /// Candidate leads before cleaning
    pub candidates: usize,
    /// Dropped for lacking a name or any contact channel
    pub rejected: usize,
    /// Dropped as duplicates of an earlier lead
    pub duplicates: usize,
}

/// Final leads plus counters
#[derive(Debug, Clone, Default)]
pub struct Assembly {
    pub leads: Vec<Lead>,
    pub stats: AssemblyStats,
}

/// Classifies pages and merges the resulting leads
pub struct LeadAssembler {
    governor: Arc<Governor>,
    classifier: Arc<dyn ContentClassifier>,
    fallback: RegexLeadExtractor,
    cleaner: LeadCleaner,
    keyword: String,
}

impl LeadAssembler {
    pub fn new(
        governor: Arc<Governor>,
        classifier: Arc<dyn ContentClassifier>,
        cleaner: LeadCleaner,
        keyword: impl Into<String>,
    ) -> Self {
        Self {
            governor,
            classifier,
            fallback: RegexLeadExtractor::new(),
            cleaner,
            keyword: keyword.into(),
        }
    }

    /// Builds the lead list from a crawl's results
    ///
    /// Failed results are skipped. Each lead's `source_url` is the page it
    /// came from.
    pub async fn assemble(&self, results: &[FetchResult]) -> Assembly {
        let mut candidates = Vec::new();
        let mut stats = AssemblyStats::default();

        for result in results.iter().filter(|r| r.success()) {
            let (leads, fell_back) = self.classify_page(result).await;
            stats.pages_classified += 1;
            if fell_back {
                stats.fallback_pages += 1;
            }

            let source = result.node.url.to_string();
            candidates.extend(leads.into_iter().map(|mut lead| {
                lead.source_url = source.clone();
                lead
            }));
        }

        let merged = merge_leads(candidates, &self.cleaner);
        Assembly {
            leads: merged.leads,
            stats: AssemblyStats {
                candidates: merged.stats.candidates,
                rejected: merged.stats.rejected,
                duplicates: merged.stats.duplicates,
                ..stats
            },
        }
    }

    /// Returns the page's candidate leads and whether the fallback ran
    async fn classify_page(&self, result: &FetchResult) -> (Vec<Lead>, bool) {
        let text = result.text_content.as_str();
        let outcome = self
            .governor
            .call_classifier("lead classification", || {
                self.classifier.classify_leads(text, &self.keyword)
            })
            .await;

        match outcome {
            Governed::Done(leads) => {
                tracing::debug!("{}: {} candidate lead(s)", result.node.url, leads.len());
                (leads, false)
            }
            Governed::Failed(_) | Governed::CircuitOpen => {
                let leads = self.fallback.extract(text);
                tracing::debug!(
                    "{}: {} candidate lead(s) from offline extraction",
                    result.node.url,
                    leads.len()
                );
                (leads, true)
            }
        }
    }
}

impl std::fmt::Debug for LeadAssembler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LeadAssembler")
            .field("keyword", &self.keyword)
            .field("cleaner", &self.cleaner)
            .finish_non_exhaustive()
    }
}

/// Cleans, validates and deduplicates candidate leads
///
/// Two leads are duplicates when their names match ignoring case and
/// spacing and their emails match (both absent counts as a match). The
/// first occurrence wins.
pub fn merge_leads(candidates: Vec<Lead>, cleaner: &LeadCleaner) -> Assembly {
    let mut stats = AssemblyStats {
        candidates: candidates.len(),
        ..Default::default()
    };
    let mut seen = HashSet::new();
    let mut leads = Vec::new();

    for candidate in candidates {
        let lead = cleaner.clean(candidate);

        if let Err(reason) = cleaner.validate(&lead) {
            tracing::debug!("Rejected lead '{}' from {}: {:?}", lead.name, lead.source_url, reason);
            stats.rejected += 1;
            continue;
        }

        if !seen.insert(dedup_key(&lead)) {
            tracing::debug!("Duplicate lead '{}' from {}", lead.name, lead.source_url);
            stats.duplicates += 1;
            continue;
        }

        leads.push(lead);
    }

    Assembly { leads, stats }
}

fn dedup_key(lead: &Lead) -> (String, String) {
    let name = lead
        .name
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    (name, lead.email.clone().unwrap_or_default())
}
