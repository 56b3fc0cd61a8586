//! URL handling module for Lead-Ripple
//!
//! This module resolves hrefs found on a page, canonicalizes them, and decides
//! whether a link is worth following. Classification is a pure function of its
//! inputs; the walker owns all visited-set bookkeeping.

mod domain;
mod matcher;
mod normalize;

use crate::config::{Config, LinkConfig, LinkPolicy};
use std::collections::HashSet;
use url::Url;

// Re-export main functions
pub use domain::{extract_domain, same_host};
pub use matcher::{first_excluded_pattern, first_matching_pattern, matches_any, prepare_patterns};
pub use normalize::normalize_url;

/// Anchor texts longer than this count as descriptive under the strict policy
const DESCRIPTIVE_ANCHOR_CHARS: usize = 10;

/// Anchor texts shorter than this are never followed
const MIN_ANCHOR_CHARS: usize = 3;

/// Href prefixes rejected before resolution
const SKIPPED_PREFIXES: &[&str] = &["javascript:", "mailto:", "tel:", "#"];

/// Outcome of classifying a single link
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkDecision {
    /// The link is worth following; carries the canonical absolute URL
    Accept(Url),
    /// The link is dropped
    Reject(LinkRejection),
}

impl LinkDecision {
    /// Returns the accepted URL, if any
    pub fn accepted(&self) -> Option<&Url> {
        match self {
            Self::Accept(url) => Some(url),
            Self::Reject(_) => None,
        }
    }
}

/// Why a link was not followed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkRejection {
    /// The href could not be resolved against the page URL
    InvalidUrl,
    /// `javascript:`, `mailto:`, `tel:`, fragment-only, or a non-HTTP scheme
    UnsupportedScheme,
    /// The URL or anchor text matches an exclude pattern
    ExcludedPattern(String),
    /// Anchor text shorter than three characters
    AnchorTooShort,
    /// Anchor text without a single letter
    AnchorNotAlphabetic,
    /// Anchor text is a generic navigation term
    GenericAnchor,
    /// Strict policy: the link leaves the parent page's host
    OffSite,
    /// Strict policy: no include pattern, keyword, or descriptive anchor
    NotRelevant,
}

impl LinkRejection {
    /// Returns true for rejections caused by policy rather than a broken href
    pub fn is_policy(&self) -> bool {
        !matches!(self, Self::InvalidUrl | Self::UnsupportedScheme)
    }
}

/// Decides which outbound links are worth following
///
/// Patterns are lowercased once at construction so that `classify` does no
/// allocation beyond lowercasing its own inputs.
#[derive(Debug, Clone)]
pub struct LinkClassifier {
    policy: LinkPolicy,
    exclude: Vec<String>,
    include: Vec<String>,
    keywords: Vec<String>,
    generic: HashSet<String>,
}

impl LinkClassifier {
    /// Creates a classifier from the link rules and the chosen policy
    pub fn new(policy: LinkPolicy, links: &LinkConfig) -> Self {
        Self {
            policy,
            exclude: prepare_patterns(&links.exclude_patterns),
            include: prepare_patterns(&links.include_patterns),
            keywords: prepare_patterns(&links.relevance_keywords),
            generic: prepare_patterns(&links.generic_anchor_terms)
                .into_iter()
                .collect(),
        }
    }

    /// Creates a classifier from a full configuration
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.crawler.link_policy, &config.links)
    }

    /// Classifies one link found on the page at `base_url`
    ///
    /// # Rules, in order
    ///
    /// 1. `javascript:`, `mailto:`, `tel:` and fragment-only hrefs are rejected
    /// 2. The href is resolved against `base_url` (relative, protocol-relative
    ///    and absolute forms) and canonicalized; failures are rejected
    /// 3. A URL matching an exclude pattern (extensions against the path
    ///    end, everything else anywhere in the URL) or anchor text containing
    ///    one is rejected
    /// 4. Anchor text shorter than 3 characters, without letters, or equal
    ///    to a generic navigation term is rejected
    /// 5. Open policy: accepted. Strict policy: the link must stay on the
    ///    parent's host and match an include pattern, contain a relevance
    ///    keyword, or carry anchor text longer than 10 characters
    pub fn classify(&self, href: &str, anchor_text: &str, base_url: &Url) -> LinkDecision {
        let href = href.trim();
        if href.is_empty() {
            return LinkDecision::Reject(LinkRejection::InvalidUrl);
        }

        let lowered_href = href.to_lowercase();
        if SKIPPED_PREFIXES
            .iter()
            .any(|prefix| lowered_href.starts_with(prefix))
        {
            return LinkDecision::Reject(LinkRejection::UnsupportedScheme);
        }

        let resolved = match base_url.join(href) {
            Ok(url) => url,
            Err(_) => return LinkDecision::Reject(LinkRejection::InvalidUrl),
        };

        if resolved.scheme() != "http" && resolved.scheme() != "https" {
            return LinkDecision::Reject(LinkRejection::UnsupportedScheme);
        }

        let url = match normalize_url(resolved.as_str()) {
            Ok(url) => url,
            Err(_) => return LinkDecision::Reject(LinkRejection::InvalidUrl),
        };

        let anchor = collapse_whitespace(anchor_text);

        if let Some(pattern) = first_excluded_pattern(&url, &self.exclude)
            .or_else(|| first_matching_pattern(&anchor, &self.exclude))
        {
            return LinkDecision::Reject(LinkRejection::ExcludedPattern(pattern.to_string()));
        }

        if let Some(rejection) = self.check_anchor(&anchor) {
            return LinkDecision::Reject(rejection);
        }

        if self.policy == LinkPolicy::Strict {
            if !same_host(&url, base_url) {
                return LinkDecision::Reject(LinkRejection::OffSite);
            }

            let relevant = matches_any(url.path(), &self.include)
                || matches_any(&anchor, &self.keywords)
                || anchor.chars().count() > DESCRIPTIVE_ANCHOR_CHARS;

            if !relevant {
                return LinkDecision::Reject(LinkRejection::NotRelevant);
            }
        }

        LinkDecision::Accept(url)
    }

    fn check_anchor(&self, anchor: &str) -> Option<LinkRejection> {
        if anchor.chars().count() < MIN_ANCHOR_CHARS {
            return Some(LinkRejection::AnchorTooShort);
        }

        if !anchor.chars().any(char::is_alphabetic) {
            return Some(LinkRejection::AnchorNotAlphabetic);
        }

        if self.generic.contains(&anchor.to_lowercase()) {
            return Some(LinkRejection::GenericAnchor);
        }

        None
    }
}

/// Classifies a link against a base URL given as a string
///
/// Convenience wrapper over [`LinkClassifier::classify`]; an unparseable base
/// URL rejects the link.
pub fn classify_link(href: &str, anchor_text: &str, base_url: &str, config: &Config) -> LinkDecision {
    match Url::parse(base_url) {
        Ok(base) => LinkClassifier::from_config(config).classify(href, anchor_text, &base),
        Err(_) => LinkDecision::Reject(LinkRejection::InvalidUrl),
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
