//! Crawl statistics
//!
//! This module provides functions for summarizing a finished crawl and
//! printing the summary.

use crate::crawler::{FetchErrorKind, FetchResult, WalkStats};
use crate::leads::AssemblyStats;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// Summary of one crawl session
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CrawlStats {
    /// Pages the walker attempted
    pub pages_fetched: usize,

    /// Pages that yielded usable content
    pub pages_succeeded: usize,

    /// Failed pages by failure kind
    pub failures: BTreeMap<FetchErrorKind, usize>,

    /// Attempted pages per depth
    pub pages_by_depth: BTreeMap<u32, usize>,

    /// Deepest level fetched
    pub depth_reached: u32,

    pub links_scheduled: usize,
    pub links_rejected: usize,
    pub links_over_cap: usize,
    pub links_seen_at_max_depth: usize,

    /// Leads in the final list
    pub leads: usize,

    pub lead_candidates: usize,
    pub leads_rejected: usize,
    pub duplicate_leads: usize,

    /// Pages whose leads came from offline extraction
    pub fallback_pages: usize,

    pub aborted: bool,

    pub elapsed: Duration,
}

impl CrawlStats {
    /// Builds the summary from the walk and assembly results
    pub fn collect(
        results: &[FetchResult],
        walk: &WalkStats,
        assembly: &AssemblyStats,
        leads: usize,
        elapsed: Duration,
    ) -> Self {
        let mut failures = BTreeMap::new();
        let mut pages_by_depth = BTreeMap::new();

        for result in results {
            *pages_by_depth.entry(result.node.depth).or_insert(0) += 1;
            if let Some(kind) = result.error {
                *failures.entry(kind).or_insert(0) += 1;
            }
        }

        Self {
            pages_fetched: results.len(),
            pages_succeeded: results.iter().filter(|r| r.success()).count(),
            failures,
            pages_by_depth,
            depth_reached: walk.depth_reached,
            links_scheduled: walk.links_scheduled,
            links_rejected: walk.links_rejected,
            links_over_cap: walk.links_over_cap,
            links_seen_at_max_depth: walk.links_seen_at_max_depth,
            leads,
            lead_candidates: assembly.candidates,
            leads_rejected: assembly.rejected,
            duplicate_leads: assembly.duplicates,
            fallback_pages: assembly.fallback_pages,
            aborted: walk.aborted,
            elapsed,
        }
    }

    /// Share of fetched pages that succeeded, as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.pages_fetched == 0 {
            return 0.0;
        }
        (self.pages_succeeded as f64 / self.pages_fetched as f64) * 100.0
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CrawlStats) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Pages fetched: {}", stats.pages_fetched);
    println!("  Depth reached: {}", stats.depth_reached);
    println!("  Elapsed: {:.1}s", stats.elapsed.as_secs_f64());
    if stats.aborted {
        println!("  Aborted before completion");
    }
    println!();

    println!("Pages by Depth:");
    for (depth, count) in &stats.pages_by_depth {
        println!("  {}: {}", depth, count);
    }
    println!();

    if !stats.failures.is_empty() {
        println!("Failures:");
        let mut failures: Vec<_> = stats.failures.iter().collect();
        failures.sort_by(|a, b| b.1.cmp(a.1));
        for (kind, count) in failures {
            println!("  {}: {}", kind, count);
        }
        println!();
    }

    println!("Links:");
    println!("  Scheduled: {}", stats.links_scheduled);
    println!("  Rejected: {}", stats.links_rejected);
    if stats.links_over_cap > 0 {
        println!("  Over per-page cap: {}", stats.links_over_cap);
    }
    if stats.links_seen_at_max_depth > 0 {
        println!("  Seen at max depth: {}", stats.links_seen_at_max_depth);
    }
    println!();

    println!("Leads:");
    println!("  Candidates: {}", stats.lead_candidates);
    println!("  Rejected: {}", stats.leads_rejected);
    println!("  Duplicates: {}", stats.duplicate_leads);
    println!("  Final: {}", stats.leads);
    if stats.fallback_pages > 0 {
        println!("  Pages using offline extraction: {}", stats.fallback_pages);
    }
    println!();

    println!(
        "Success Rate: {:.1}% ({} / {} pages with usable content)",
        stats.success_rate(),
        stats.pages_succeeded,
        stats.pages_fetched
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::CrawlNode;
    use url::Url;

    fn result(depth: u32, error: Option<FetchErrorKind>) -> FetchResult {
        let mut node = CrawlNode::seed(Url::parse("https://example.com/").unwrap());
        node.depth = depth;
        match error {
            Some(kind) => FetchResult::failed(node, kind, "failed", 1),
            None => FetchResult {
                error: None,
                error_message: None,
                ..FetchResult::failed(node, FetchErrorKind::NavigationFailure, "", 1)
            },
        }
    }

    #[test]
    fn test_collect() {
        let results = vec![
            result(0, None),
            result(1, None),
            result(1, Some(FetchErrorKind::InsufficientContent)),
            result(1, Some(FetchErrorKind::NavigationFailure)),
        ];
        let walk = WalkStats {
            depth_reached: 1,
            links_scheduled: 3,
            ..Default::default()
        };
        let assembly = AssemblyStats {
            candidates: 5,
            duplicates: 1,
            ..Default::default()
        };

        let stats = CrawlStats::collect(&results, &walk, &assembly, 4, Duration::from_secs(2));

        assert_eq!(stats.pages_fetched, 4);
        assert_eq!(stats.pages_succeeded, 2);
        assert_eq!(stats.pages_by_depth.get(&1), Some(&3));
        assert_eq!(stats.failures.get(&FetchErrorKind::InsufficientContent), Some(&1));
        assert_eq!(stats.links_scheduled, 3);
        assert_eq!(stats.lead_candidates, 5);
        assert!((stats.success_rate() - 50.0).abs() < 0.01);
    }

    #[test]
    fn test_success_rate_zero_pages() {
        assert_eq!(CrawlStats::default().success_rate(), 0.0);
    }

    #[test]
    fn test_print_does_not_panic() {
        let stats = CrawlStats {
            pages_fetched: 1,
            aborted: true,
            ..Default::default()
        };
        print_statistics(&stats);
    }
}
