//! Breadth-first, depth-bounded walk
//!
//! Each depth level is fetched as a batch with bounded concurrency. Child
//! links from the successful pages of a level become the next level after
//! classification, deduplication and the per-page cap.

use super::fetcher::PageFetcher;
use super::node::{CrawlNode, FetchResult};
use super::visited::VisitedSet;
use crate::config::CrawlerConfig;
use crate::governor::Governor;
use crate::url::{normalize_url, LinkClassifier, LinkDecision, LinkRejection};
use crate::LeadError;
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Cooperative cancellation for a running walk
///
/// Aborting stops new fetches from starting; fetches already in flight run
/// to completion and their results are kept.
#[derive(Debug, Clone, Default)]
pub struct AbortHandle {
    flag: Arc<AtomicBool>,
}

impl AbortHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn abort(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_aborted(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Clears a previous abort so the next walk can run
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

/// Link and depth counters for one walk
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkStats {
    /// Deepest level that was fetched
    pub depth_reached: u32,
    /// Child nodes added to the frontier
    pub links_scheduled: usize,
    /// Links rejected by the classifier, any reason
    pub links_rejected: usize,
    /// Accepted links dropped because the page already had its cap
    pub links_over_cap: usize,
    /// Accepted links found on pages at the maximum depth (never scheduled)
    pub links_seen_at_max_depth: usize,
    pub aborted: bool,
}

/// Pages fetched by one walk, in level order
#[derive(Debug, Default)]
pub struct WalkOutcome {
    pub results: Vec<FetchResult>,
    pub stats: WalkStats,
}

/// Runs the breadth-first walk
pub struct Walker {
    config: CrawlerConfig,
    links: LinkClassifier,
    fetcher: PageFetcher,
    governor: Arc<Governor>,
    visited: Mutex<VisitedSet>,
    active: AtomicBool,
}

/// Clears the walker's active flag when the walk ends, however it ends
struct ActiveWalk<'a>(&'a AtomicBool);

impl Drop for ActiveWalk<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Child nodes taken from one page
struct Children {
    nodes: Vec<CrawlNode>,
    rejected: usize,
    over_cap: usize,
}

impl Walker {
    pub fn new(
        config: CrawlerConfig,
        links: LinkClassifier,
        fetcher: PageFetcher,
        governor: Arc<Governor>,
    ) -> Self {
        Self {
            config,
            links,
            fetcher,
            governor,
            visited: Mutex::new(VisitedSet::new()),
            active: AtomicBool::new(false),
        }
    }

    /// Walks from `seeds` down to `max_depth`
    ///
    /// # Arguments
    ///
    /// * `seeds` - Depth-0 nodes; duplicate URLs are fetched once
    /// * `max_depth` - Deepest level fetched; 0 fetches the seeds only
    /// * `abort` - Checked before each fetch starts
    ///
    /// # Returns
    ///
    /// * `Ok(WalkOutcome)` - Every page fetched, successful or not
    /// * `Err(LeadError::SessionActive)` - Another walk is running on this walker
    pub async fn walk(
        &self,
        seeds: Vec<CrawlNode>,
        max_depth: u32,
        abort: &AbortHandle,
    ) -> Result<WalkOutcome, LeadError> {
        let _active = self.enter()?;
        let mut outcome = WalkOutcome::default();

        let mut frontier = {
            let mut visited = self.visited();
            visited.clear();
            seeds
                .into_iter()
                .filter(|seed| {
                    let fresh = visited.mark(&seed.url);
                    if !fresh {
                        tracing::debug!("Duplicate seed {}", seed.url);
                    }
                    fresh
                })
                .collect::<Vec<_>>()
        };

        let mut depth = 0;
        while !frontier.is_empty() {
            if abort.is_aborted() {
                break;
            }

            tracing::info!("Depth {}: fetching {} page(s)", depth, frontier.len());
            outcome.stats.depth_reached = depth;

            let results = self.fetch_level(frontier, abort).await;
            self.mark_redirect_targets(&results);
            let expand = depth < max_depth;

            let mut next = Vec::new();
            for result in results.iter().filter(|r| r.success()) {
                if expand {
                    let children = self.schedule_children(result);
                    outcome.stats.links_scheduled += children.nodes.len();
                    outcome.stats.links_rejected += children.rejected;
                    outcome.stats.links_over_cap += children.over_cap;
                    next.extend(children.nodes);
                } else if self.config.extract_links_at_max_depth {
                    outcome.stats.links_seen_at_max_depth += self.count_accepted(result);
                }
            }
            outcome.results.extend(results);

            if !expand {
                break;
            }
            if next.is_empty() {
                tracing::info!("No new pages below depth {}", depth);
                break;
            }

            depth += 1;
            frontier = next;

            if !abort.is_aborted() {
                self.governor.pause_between_depths().await;
            }
        }

        outcome.stats.aborted = abort.is_aborted();
        if outcome.stats.aborted {
            tracing::warn!("Crawl aborted after {} page(s)", outcome.results.len());
        }

        Ok(outcome)
    }

    /// Fetches one level with at most `max_concurrent_fetches` in flight
    ///
    /// Results come back in frontier order.
    async fn fetch_level(&self, frontier: Vec<CrawlNode>, abort: &AbortHandle) -> Vec<FetchResult> {
        let limit = self.config.max_concurrent_fetches.max(1);

        stream::iter(frontier)
            .take_while(|_| futures::future::ready(!abort.is_aborted()))
            .map(|node| self.fetcher.fetch_and_extract(node))
            .buffered(limit)
            .collect()
            .await
    }

    /// Marks where redirected fetches ended up, so links to the target are
    /// not fetched a second time
    fn mark_redirect_targets(&self, results: &[FetchResult]) {
        let mut visited = self.visited();
        for result in results {
            let Some(final_url) = &result.final_url else {
                continue;
            };
            if final_url == &result.node.url {
                continue;
            }
            match normalize_url(final_url.as_str()) {
                Ok(target) => {
                    if visited.mark(&target) {
                        tracing::debug!("{} redirected to {}", result.node.url, target);
                    }
                }
                Err(e) => tracing::debug!("Unusable redirect target {}: {}", final_url, e),
            }
        }
    }

    /// Classifies a page's links and marks the accepted ones visited
    ///
    /// Links are considered in document order; the first
    /// `max_child_links_per_page` new URLs are kept.
    fn schedule_children(&self, result: &FetchResult) -> Children {
        let base = result.final_url.as_ref().unwrap_or(&result.node.url);
        let cap = self.config.max_child_links_per_page;
        let mut visited = self.visited();
        let mut on_page = HashSet::new();
        let mut children = Children {
            nodes: Vec::new(),
            rejected: 0,
            over_cap: 0,
        };

        for link in &result.raw_links {
            let label = link.label();
            let url = match self.links.classify(&link.href, label, base) {
                LinkDecision::Accept(url) => url,
                LinkDecision::Reject(reason) => {
                    log_rejection(&link.href, &reason);
                    children.rejected += 1;
                    continue;
                }
            };

            if !on_page.insert(url.as_str().to_string()) || visited.has(&url) {
                continue;
            }
            if children.nodes.len() >= cap {
                children.over_cap += 1;
                continue;
            }

            visited.mark(&url);
            children
                .nodes
                .push(CrawlNode::child(url, &result.node, label));
        }

        if children.over_cap > 0 {
            tracing::debug!(
                "{}: {} link(s) over the per-page cap of {}",
                result.node.url,
                children.over_cap,
                cap
            );
        }

        children
    }

    /// Counts links a max-depth page would have contributed
    fn count_accepted(&self, result: &FetchResult) -> usize {
        let base = result.final_url.as_ref().unwrap_or(&result.node.url);
        result
            .raw_links
            .iter()
            .filter(|link| {
                self.links
                    .classify(&link.href, link.label(), base)
                    .accepted()
                    .is_some()
            })
            .count()
    }

    fn enter(&self) -> Result<ActiveWalk<'_>, LeadError> {
        self.active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| LeadError::SessionActive)?;
        Ok(ActiveWalk(&self.active))
    }

    fn visited(&self) -> MutexGuard<'_, VisitedSet> {
        match self.visited.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

fn log_rejection(href: &str, reason: &LinkRejection) {
    if reason.is_policy() {
        tracing::debug!("Excluded by policy: {} ({:?})", href, reason);
    } else {
        tracing::trace!("Skipped link {} ({:?})", href, reason);
    }
}

impl std::fmt::Debug for Walker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Walker")
            .field("config", &self.config)
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}
