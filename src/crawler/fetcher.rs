//! Single-page fetch and extraction
//!
//! This module turns one [`CrawlNode`] into one [`FetchResult`]:
//! - Navigation through the page driver, retried on transient failures
//! - Main-content extraction and the minimum-length check
//! - A randomized pause after each successful page

use super::content::ContentExtractor;
use super::driver::{DriverError, PageDriver};
use super::node::{CrawlNode, FetchErrorKind, FetchResult};
use crate::config::Config;
use crate::governor::Governor;
use crate::ConfigError;
use std::sync::Arc;
use std::time::Duration;

/// Fetches nodes and extracts their content
pub struct PageFetcher {
    driver: Arc<dyn PageDriver>,
    governor: Arc<Governor>,
    extractor: ContentExtractor,
    timeout: Duration,
    min_content_length: usize,
    delay_range: (u64, u64),
}

impl PageFetcher {
    /// Builds a fetcher from configuration
    ///
    /// # Arguments
    ///
    /// * `config` - Validated configuration
    /// * `driver` - Page driver shared with the session
    /// * `governor` - Retry policy and pacing shared with the session
    ///
    /// # Returns
    ///
    /// * `Ok(PageFetcher)` - Ready to fetch
    /// * `Err(ConfigError)` - A strip or content selector did not parse
    pub fn new(
        config: &Config,
        driver: Arc<dyn PageDriver>,
        governor: Arc<Governor>,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            driver,
            governor,
            extractor: ContentExtractor::from_config(&config.fetch)?,
            timeout: Duration::from_secs(config.fetch.timeout_secs),
            min_content_length: config.fetch.min_content_length,
            delay_range: (config.fetch.delay_min_ms, config.fetch.delay_max_ms),
        })
    }

    /// Fetches one node
    ///
    /// Never returns an error: every failure is recorded on the result.
    ///
    /// | Condition                          | Result                         |
    /// |------------------------------------|--------------------------------|
    /// | Navigation failed after retries    | `NavigationFailure`            |
    /// | Response is not HTML               | `UnsupportedContent`           |
    /// | Text shorter than the minimum      | `InsufficientContent`          |
    /// | Otherwise                          | success, then a random delay   |
    pub async fn fetch_and_extract(&self, node: CrawlNode) -> FetchResult {
        let url = node.url.clone();
        tracing::debug!("Fetching {} (depth {})", url, node.depth);

        let navigation = self
            .governor
            .retry(
                "navigation",
                || self.driver.navigate(&url, self.timeout),
                DriverError::is_transient,
            )
            .await;
        let attempts = navigation.attempts;

        let page = match navigation.result {
            Ok(page) => page,
            Err(e) => {
                let kind = match e {
                    DriverError::NotHtml { .. } => FetchErrorKind::UnsupportedContent,
                    _ => FetchErrorKind::NavigationFailure,
                };
                tracing::warn!("Failed to fetch {}: {}", url, e);
                return FetchResult::failed(node, kind, e.to_string(), attempts);
            }
        };

        let content = self.extractor.extract(&page.html);
        let length = content.text.chars().count();

        if length < self.min_content_length {
            tracing::info!(
                "Skipping {}: {} characters of content (minimum {})",
                url,
                length,
                self.min_content_length
            );
            let mut result = FetchResult::failed(
                node,
                FetchErrorKind::InsufficientContent,
                format!("{} characters of content", length),
                attempts,
            );
            result.final_url = Some(page.final_url);
            result.title = content.title;
            return result;
        }

        tracing::info!(
            "Fetched {} ({} chars, {} links, via {})",
            url,
            length,
            content.links.len(),
            content.strategy.as_deref().unwrap_or("-")
        );

        self.polite_delay().await;

        FetchResult {
            node,
            final_url: Some(page.final_url),
            title: content.title,
            text_content: content.text,
            raw_links: content.links,
            strategy: content.strategy,
            error: None,
            error_message: None,
            attempts,
        }
    }

    async fn polite_delay(&self) {
        let (min, max) = self.delay_range;
        let millis = if max > min {
            fastrand::u64(min..=max)
        } else {
            min
        };
        if millis > 0 {
            tokio::time::sleep(Duration::from_millis(millis)).await;
        }
    }
}

impl std::fmt::Debug for PageFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageFetcher")
            .field("timeout", &self.timeout)
            .field("min_content_length", &self.min_content_length)
            .field("delay_range", &self.delay_range)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::driver::RenderedPage;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use url::Url;

    /// Serves fixed HTML, failing transiently for the first `failures` calls
    struct FlakyDriver {
        html: String,
        failures: u32,
        calls: AtomicU32,
    }

    #[async_trait]
    impl PageDriver for FlakyDriver {
        async fn navigate(&self, url: &Url, _: Duration) -> Result<RenderedPage, DriverError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                return Err(DriverError::Timeout {
                    url: url.to_string(),
                });
            }
            Ok(RenderedPage {
                final_url: url.clone(),
                html: self.html.clone(),
            })
        }
    }

    fn test_config() -> Config {
        let mut config = Config::default();
        config.fetch.delay_min_ms = 0;
        config.fetch.delay_max_ms = 0;
        config.governor.retry_delay_ms = 0;
        config.governor.max_retry_delay_ms = 0;
        config
    }

    fn fetcher(html: &str, failures: u32) -> (PageFetcher, Arc<FlakyDriver>) {
        fetcher_with(&test_config(), html, failures)
    }

    fn fetcher_with(config: &Config, html: &str, failures: u32) -> (PageFetcher, Arc<FlakyDriver>) {
        let driver = Arc::new(FlakyDriver {
            html: html.to_string(),
            failures,
            calls: AtomicU32::new(0),
        });
        let governor = Arc::new(Governor::from_config(config));
        let fetcher = PageFetcher::new(config, driver.clone(), governor).unwrap();
        (fetcher, driver)
    }

    fn node() -> CrawlNode {
        CrawlNode::seed(Url::parse("https://example.com/").unwrap())
    }

    #[tokio::test]
    async fn test_success() {
        let body = "Acme Roofing has served the valley for forty years. ".repeat(3);
        let html = format!("<main>{}</main><a href='/about'>About</a>", body);
        let (fetcher, _) = fetcher(&html, 0);

        let result = fetcher.fetch_and_extract(node()).await;
        assert!(result.success());
        assert_eq!(result.attempts, 1);
        assert_eq!(result.raw_links.len(), 1);
        assert!(result.text_content.starts_with("Acme Roofing"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_after_successful_page() {
        let mut config = test_config();
        config.fetch.delay_min_ms = 800;
        config.fetch.delay_max_ms = 1200;
        let html = format!("<main>{}</main>", "Acme Roofing crews. ".repeat(10));
        let (fetcher, _) = fetcher_with(&config, &html, 0);

        let start = tokio::time::Instant::now();
        let result = fetcher.fetch_and_extract(node()).await;
        let waited = start.elapsed();

        assert!(result.success());
        assert!(waited >= Duration::from_millis(800), "waited {:?}", waited);
        assert!(waited <= Duration::from_millis(1200), "waited {:?}", waited);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_delay_after_short_page() {
        let mut config = test_config();
        config.fetch.delay_min_ms = 800;
        config.fetch.delay_max_ms = 1200;
        let (fetcher, _) = fetcher_with(&config, "<main>Too short</main>", 0);

        let start = tokio::time::Instant::now();
        let result = fetcher.fetch_and_extract(node()).await;

        assert_eq!(result.error, Some(FetchErrorKind::InsufficientContent));
        assert!(start.elapsed() < Duration::from_millis(800));
    }

    #[tokio::test]
    async fn test_insufficient_content() {
        let html = "<main>Only forty characters of text here..</main>";
        let (fetcher, _) = fetcher(html, 0);

        let result = fetcher.fetch_and_extract(node()).await;
        assert!(!result.success());
        assert_eq!(result.error, Some(FetchErrorKind::InsufficientContent));
        assert!(result.raw_links.is_empty());
    }

    #[tokio::test]
    async fn test_transient_failures_retried() {
        let html = format!("<main>{}</main>", "x ".repeat(100));
        let (fetcher, driver) = fetcher(&html, 2);

        let result = fetcher.fetch_and_extract(node()).await;
        assert!(result.success());
        assert_eq!(result.attempts, 3);
        assert_eq!(driver.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_navigation_failure_after_retries() {
        let (fetcher, driver) = fetcher("<main></main>", 10);

        let result = fetcher.fetch_and_extract(node()).await;
        assert_eq!(result.error, Some(FetchErrorKind::NavigationFailure));
        assert_eq!(result.attempts, 3);
        assert_eq!(driver.calls.load(Ordering::SeqCst), 3);
    }
}
