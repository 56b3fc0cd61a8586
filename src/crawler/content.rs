//! Main-content extraction
//!
//! Text is taken from a cleaned copy of the document: boilerplate regions
//! (scripts, navigation, cookie banners, ...) are detached first, then each
//! [`ExtractionStrategy`] is tried in order until one yields text. Links are
//! read from the document before anything is removed, so navigation menus
//! still contribute child links.

use super::node::RawLink;
use crate::config::FetchConfig;
use crate::ConfigError;
use scraper::{ElementRef, Html, Selector};
use std::fmt;

/// Locates the text worth keeping in a cleaned document
pub trait ExtractionStrategy: Send + Sync + fmt::Debug {
    /// Short name recorded on the fetch result
    fn name(&self) -> &str;

    /// Returns the extracted text, or `None` if this strategy found nothing
    fn extract(&self, document: &Html) -> Option<String>;
}

/// Takes the text of the first element matching a CSS selector
#[derive(Debug)]
pub struct SelectorStrategy {
    source: String,
    selector: Selector,
}

impl SelectorStrategy {
    pub fn new(source: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            source: source.to_string(),
            selector: parse_selector(source)?,
        })
    }
}

impl ExtractionStrategy for SelectorStrategy {
    fn name(&self) -> &str {
        &self.source
    }

    fn extract(&self, document: &Html) -> Option<String> {
        document
            .root_element()
            .select(&self.selector)
            .map(element_text)
            .find(|text| !text.is_empty())
    }
}

/// Falls back to all text in `<body>`
#[derive(Debug, Default)]
pub struct WholeDocumentStrategy;

impl ExtractionStrategy for WholeDocumentStrategy {
    fn name(&self) -> &str {
        "body"
    }

    fn extract(&self, document: &Html) -> Option<String> {
        let root = document.root_element();
        let text = match Selector::parse("body") {
            Ok(body) => root
                .select(&body)
                .next()
                .map(element_text)
                .unwrap_or_else(|| element_text(root)),
            Err(_) => element_text(root),
        };
        Some(text).filter(|t| !t.is_empty())
    }
}

/// What a page yielded
#[derive(Debug, Clone, Default)]
pub struct ExtractedContent {
    pub title: Option<String>,
    pub text: String,
    pub links: Vec<RawLink>,
    /// Name of the strategy that produced `text`, if any did
    pub strategy: Option<String>,
}

/// Strips boilerplate and runs the extraction strategies
#[derive(Debug)]
pub struct ContentExtractor {
    strip: Vec<Selector>,
    strategies: Vec<Box<dyn ExtractionStrategy>>,
}

impl ContentExtractor {
    pub fn new(strip: Vec<Selector>, strategies: Vec<Box<dyn ExtractionStrategy>>) -> Self {
        Self { strip, strategies }
    }

    /// Builds the extractor from the configured selector lists
    ///
    /// Content selectors are tried in configuration order and the whole
    /// document is always the last resort.
    pub fn from_config(config: &FetchConfig) -> Result<Self, ConfigError> {
        let strip = config
            .strip_selectors
            .iter()
            .map(|s| parse_selector(s))
            .collect::<Result<Vec<_>, _>>()?;

        let mut strategies: Vec<Box<dyn ExtractionStrategy>> = Vec::new();
        for source in &config.content_selectors {
            strategies.push(Box::new(SelectorStrategy::new(source)?));
        }
        strategies.push(Box::new(WholeDocumentStrategy));

        Ok(Self::new(strip, strategies))
    }

    /// Parses `html` and extracts title, text and links
    ///
    /// Never fails: malformed markup is parsed leniently and a page with no
    /// text yields an empty string.
    pub fn extract(&self, html: &str) -> ExtractedContent {
        let mut document = Html::parse_document(html);

        let title = extract_title(&document);
        let links = extract_raw_links(&document);

        self.strip_boilerplate(&mut document);

        let found = self
            .strategies
            .iter()
            .find_map(|s| s.extract(&document).map(|text| (s.name().to_string(), text)));

        match found {
            Some((strategy, text)) => ExtractedContent {
                title,
                text,
                links,
                strategy: Some(strategy),
            },
            None => ExtractedContent {
                title,
                links,
                ..Default::default()
            },
        }
    }

    fn strip_boilerplate(&self, document: &mut Html) {
        let ids: Vec<_> = self
            .strip
            .iter()
            .flat_map(|selector| document.select(selector).map(|el| el.id()).collect::<Vec<_>>())
            .collect();

        for id in ids {
            if let Some(mut node) = document.tree.get_mut(id) {
                node.detach();
            }
        }
    }
}

/// Collects every `<a href>` in document order
///
/// Anchor text has its whitespace collapsed; the title attribute is kept
/// separately for links whose only content is an icon.
pub fn extract_raw_links(document: &Html) -> Vec<RawLink> {
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|element| {
            let href = element.value().attr("href")?.trim();
            if href.is_empty() {
                return None;
            }
            Some(RawLink {
                href: href.to_string(),
                anchor_text: element_text(element),
                title_attr: element
                    .value()
                    .attr("title")
                    .map(collapse_whitespace)
                    .unwrap_or_default(),
            })
        })
        .collect()
}

fn extract_title(document: &Html) -> Option<String> {
    let selector = Selector::parse("title").ok()?;
    document
        .select(&selector)
        .next()
        .map(element_text)
        .filter(|s| !s.is_empty())
}

fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn parse_selector(source: &str) -> Result<Selector, ConfigError> {
    Selector::parse(source)
        .map_err(|e| ConfigError::InvalidPattern(format!("selector '{}': {:?}", source, e)))
}
