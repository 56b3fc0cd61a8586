//! Crawl units and per-page results

use chrono::{DateTime, Utc};
use serde::Serialize;
use url::Url;

/// One page scheduled for fetching
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrawlNode {
    /// Canonical URL; also the Visited Set key
    pub url: Url,
    /// 0 for seeds
    pub depth: u32,
    /// Page this node was discovered on; `None` for seeds
    pub parent_url: Option<Url>,
    /// Anchor text of the discovering link; empty for seeds
    pub anchor_text: String,
    pub discovered_at: DateTime<Utc>,
}

impl CrawlNode {
    pub fn seed(url: Url) -> Self {
        Self {
            url,
            depth: 0,
            parent_url: None,
            anchor_text: String::new(),
            discovered_at: Utc::now(),
        }
    }

    pub fn child(url: Url, parent: &CrawlNode, anchor_text: impl Into<String>) -> Self {
        Self {
            url,
            depth: parent.depth + 1,
            parent_url: Some(parent.url.clone()),
            anchor_text: anchor_text.into(),
            discovered_at: Utc::now(),
        }
    }
}

/// An `<a href>` as it appeared in the page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawLink {
    /// The href attribute, unresolved
    pub href: String,
    /// Visible anchor text with whitespace collapsed
    pub anchor_text: String,
    /// The title attribute, or empty
    pub title_attr: String,
}

impl RawLink {
    /// Text used to judge the link: the anchor text, or the title attribute
    /// when the anchor has no visible text (icon links)
    pub fn label(&self) -> &str {
        if self.anchor_text.trim().is_empty() {
            self.title_attr.trim()
        } else {
            &self.anchor_text
        }
    }
}

/// Why a page produced no usable content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum FetchErrorKind {
    /// Timeout, connection failure, or an error status that outlived retries
    NavigationFailure,
    /// Extracted text shorter than the configured minimum
    InsufficientContent,
    /// The response was not an HTML document
    UnsupportedContent,
}

impl std::fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::NavigationFailure => "navigation failure",
            Self::InsufficientContent => "insufficient content",
            Self::UnsupportedContent => "unsupported content",
        };
        f.write_str(s)
    }
}

/// Outcome of fetching one node
///
/// A failed fetch is data, not an error: the walker records it and moves on.
#[derive(Debug, Clone, Serialize)]
pub struct FetchResult {
    pub node: CrawlNode,
    /// URL after redirects, when navigation got that far
    pub final_url: Option<Url>,
    pub title: Option<String>,
    /// Cleaned page text; empty on failure
    pub text_content: String,
    /// Links in document order, taken before any stripping
    pub raw_links: Vec<RawLink>,
    /// Which extraction strategy produced the text
    pub strategy: Option<String>,
    pub error: Option<FetchErrorKind>,
    pub error_message: Option<String>,
    /// Navigation attempts, including retries
    pub attempts: u32,
}

impl FetchResult {
    pub fn success(&self) -> bool {
        self.error.is_none()
    }

    pub(crate) fn failed(
        node: CrawlNode,
        kind: FetchErrorKind,
        message: impl Into<String>,
        attempts: u32,
    ) -> Self {
        Self {
            node,
            final_url: None,
            title: None,
            text_content: String::new(),
            raw_links: Vec::new(),
            strategy: None,
            error: Some(kind),
            error_message: Some(message.into()),
            attempts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_child_depth_and_parent() {
        let seed = CrawlNode::seed(url("https://example.com/"));
        let child = CrawlNode::child(url("https://example.com/about"), &seed, "About us");

        assert_eq!(seed.depth, 0);
        assert!(seed.parent_url.is_none());
        assert_eq!(child.depth, 1);
        assert_eq!(child.parent_url, Some(seed.url.clone()));
        assert_eq!(child.anchor_text, "About us");
    }

    #[test]
    fn test_label_falls_back_to_title() {
        let link = RawLink {
            href: "/contact".to_string(),
            anchor_text: "  ".to_string(),
            title_attr: "Contact our office".to_string(),
        };
        assert_eq!(link.label(), "Contact our office");

        let link = RawLink {
            anchor_text: "Contact".to_string(),
            ..link
        };
        assert_eq!(link.label(), "Contact");
    }

    #[test]
    fn test_failed_result() {
        let node = CrawlNode::seed(url("https://example.com/"));
        let result = FetchResult::failed(node, FetchErrorKind::NavigationFailure, "timed out", 3);
        assert!(!result.success());
        assert_eq!(result.error, Some(FetchErrorKind::NavigationFailure));
        assert!(result.text_content.is_empty());
    }
}
