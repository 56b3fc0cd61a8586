//! Crawl session
//!
//! A [`Session`] owns everything one prospecting run shares: the page
//! driver, the classifier, the governor, and the walker with its Visited
//! Set. [`Session::run`] takes raw seed URLs and returns the final leads
//! together with every page result and a statistics summary.

use super::driver::{HttpPageDriver, PageDriver};
use super::fetcher::PageFetcher;
use super::node::{CrawlNode, FetchResult};
use super::walker::{AbortHandle, Walker};
use crate::config::{validate, Config, MAX_DEPTH_LIMIT};
use crate::governor::{Governed, Governor};
use crate::leads::{ContentClassifier, Lead, LeadAssembler, LeadCleaner};
use crate::output::CrawlStats;
use crate::url::normalize_url;
use crate::{ConfigError, LeadError};
use std::sync::Arc;
use std::time::Instant;

/// A search result considered as a seed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedCandidate {
    pub url: String,
    pub title: String,
    pub snippet: String,
}

/// Everything a crawl produced
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// Cleaned, validated, deduplicated leads
    pub leads: Vec<Lead>,
    /// Every fetch result, successful or not, in level order
    pub pages: Vec<FetchResult>,
    pub stats: CrawlStats,
}

/// One prospecting session
pub struct Session {
    config: Config,
    driver: Arc<dyn PageDriver>,
    classifier: Arc<dyn ContentClassifier>,
    governor: Arc<Governor>,
    walker: Walker,
    assembler: LeadAssembler,
    abort: AbortHandle,
}

impl Session {
    /// Creates a session over the given driver and classifier
    ///
    /// # Arguments
    ///
    /// * `config` - Configuration; validated here
    /// * `driver` - Loads pages
    /// * `classifier` - Extracts leads and scores seed candidates
    ///
    /// # Returns
    ///
    /// * `Ok(Session)` - Ready to run
    /// * `Err(LeadError::Config)` - The configuration is invalid
    pub fn new(
        config: Config,
        driver: Arc<dyn PageDriver>,
        classifier: Arc<dyn ContentClassifier>,
    ) -> Result<Self, LeadError> {
        validate(&config)?;

        let governor = Arc::new(Governor::from_config(&config));
        let fetcher = PageFetcher::new(&config, driver.clone(), governor.clone())?;
        let walker = Walker::new(
            config.crawler.clone(),
            crate::url::LinkClassifier::from_config(&config),
            fetcher,
            governor.clone(),
        );
        let assembler = LeadAssembler::new(
            governor.clone(),
            classifier.clone(),
            LeadCleaner::new(config.leads.min_phone_digits),
            config.classifier.keyword.clone(),
        );

        Ok(Self {
            config,
            driver,
            classifier,
            governor,
            walker,
            assembler,
            abort: AbortHandle::new(),
        })
    }

    /// Creates a session that loads pages over HTTP
    pub fn with_http_driver(
        config: Config,
        classifier: Arc<dyn ContentClassifier>,
    ) -> Result<Self, LeadError> {
        let driver = Arc::new(HttpPageDriver::new(&config.fetch)?);
        Self::new(config, driver, classifier)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn governor(&self) -> &Governor {
        &self.governor
    }

    /// Handle that stops the running crawl from scheduling more fetches
    ///
    /// An abort applies to the run in progress, or to the next run if none
    /// is active. The flag is cleared once that walk returns.
    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }

    /// Crawls from `seed_urls` and assembles leads
    ///
    /// # Arguments
    ///
    /// * `seed_urls` - Raw URLs; each is canonicalized and invalid ones are
    ///   dropped with a warning
    /// * `max_depth` - Deepest level to fetch, at most 3
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlReport)` - Leads, page results and statistics; partial if
    ///   the crawl was aborted
    /// * `Err(LeadError::NoSeeds)` - No seed URL was valid
    /// * `Err(LeadError::Config)` - `max_depth` is out of range
    /// * `Err(LeadError::SessionActive)` - A crawl is already running
    pub async fn run(&self, seed_urls: &[String], max_depth: u32) -> Result<CrawlReport, LeadError> {
        if max_depth > MAX_DEPTH_LIMIT {
            return Err(ConfigError::Validation(format!(
                "max depth {} exceeds the limit of {}",
                max_depth, MAX_DEPTH_LIMIT
            ))
            .into());
        }

        let seeds = canonical_seeds(seed_urls);
        if seeds.is_empty() {
            return Err(LeadError::NoSeeds);
        }

        let started = Instant::now();
        tracing::info!(
            "Starting crawl of {} seed(s) to depth {}",
            seeds.len(),
            max_depth
        );

        let walk = self.walker.walk(seeds, max_depth, &self.abort).await?;
        self.abort.reset();
        let assembly = self.assembler.assemble(&walk.results).await;

        let stats = CrawlStats::collect(
            &walk.results,
            &walk.stats,
            &assembly.stats,
            assembly.leads.len(),
            started.elapsed(),
        );

        tracing::info!(
            "Crawl finished: {} page(s), {} lead(s) in {:.1}s",
            stats.pages_fetched,
            stats.leads,
            stats.elapsed.as_secs_f64()
        );

        Ok(CrawlReport {
            leads: assembly.leads,
            pages: walk.results,
            stats,
        })
    }

    /// Keeps the candidates the classifier scores at least `min_score`
    ///
    /// Candidates are kept when they cannot be scored because the classifier
    /// failed or its circuit is open.
    pub async fn filter_seeds(
        &self,
        candidates: Vec<SeedCandidate>,
        keyword: &str,
        min_score: u8,
    ) -> Vec<SeedCandidate> {
        let mut kept = Vec::new();

        for candidate in candidates {
            let outcome = self
                .governor
                .call_classifier("relevance scoring", || {
                    self.classifier.score_url_relevance(
                        &candidate.url,
                        &candidate.title,
                        &candidate.snippet,
                        keyword,
                    )
                })
                .await;

            match outcome {
                Governed::Done(score) if score >= min_score => {
                    tracing::debug!("Seed {} scored {}", candidate.url, score);
                    kept.push(candidate);
                }
                Governed::Done(score) => {
                    tracing::debug!("Dropping seed {} (score {})", candidate.url, score);
                }
                Governed::Failed(_) | Governed::CircuitOpen => {
                    kept.push(candidate);
                }
            }
        }

        kept
    }

    /// Releases the page driver
    pub async fn close(&self) {
        self.driver.close().await;
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("walker", &self.walker)
            .field("governor", &self.governor)
            .finish_non_exhaustive()
    }
}

/// Canonicalizes seed URLs, dropping the invalid ones
fn canonical_seeds(seed_urls: &[String]) -> Vec<CrawlNode> {
    seed_urls
        .iter()
        .filter_map(|raw| match normalize_url(raw.trim()) {
            Ok(url) => Some(CrawlNode::seed(url)),
            Err(e) => {
                tracing::warn!("Ignoring seed '{}': {}", raw, e);
                None
            }
        })
        .collect()
}
