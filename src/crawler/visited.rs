use std::collections::HashSet;
use url::Url;

/// Canonical URLs already scheduled in the current crawl
///
/// Only the walker mutates it. A URL is marked when it is scheduled, not
/// when it is fetched, so a page linked twice on one level is queued once.
#[derive(Debug, Default)]
pub struct VisitedSet {
    urls: HashSet<String>,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has(&self, url: &Url) -> bool {
        self.urls.contains(url.as_str())
    }

    /// Marks `url` as visited
    ///
    /// Returns `true` if it was not visited before.
    pub fn mark(&mut self, url: &Url) -> bool {
        self.urls.insert(url.as_str().to_string())
    }

    pub fn clear(&mut self) {
        self.urls.clear();
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}
