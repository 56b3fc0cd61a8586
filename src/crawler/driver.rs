//! Page drivers
//!
//! A [`PageDriver`] loads a URL and hands back the document HTML. The crawl
//! logic only depends on the trait; [`HttpPageDriver`] is the reqwest-backed
//! implementation used by the CLI.

use crate::config::FetchConfig;
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client, StatusCode};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Navigation failures
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("Navigation to {url} timed out")]
    Timeout { url: String },

    #[error("Could not connect to {url}: {message}")]
    Connect { url: String, message: String },

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("Expected HTML from {url}, got '{content_type}'")]
    NotHtml { url: String, content_type: String },

    #[error("Failed to read body of {url}: {message}")]
    Body { url: String, message: String },

    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

impl DriverError {
    /// Returns true if the same navigation may succeed on retry
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::Connect { .. } | Self::Body { .. } => true,
            Self::Status { status, .. } => matches!(status, 429 | 500 | 502 | 503 | 504),
            Self::NotHtml { .. } | Self::Client(_) => false,
        }
    }
}

/// A loaded document
#[derive(Debug, Clone)]
pub struct RenderedPage {
    /// URL after redirects
    pub final_url: Url,
    pub html: String,
}

/// Loads pages for the crawler
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Navigates to `url` and returns the document, or fails within `timeout`
    async fn navigate(&self, url: &Url, timeout: Duration) -> Result<RenderedPage, DriverError>;

    /// Releases driver resources; called once when the session ends
    async fn close(&self) {}
}

/// Page driver backed by a reqwest client
#[derive(Debug, Clone)]
pub struct HttpPageDriver {
    client: Client,
}

impl HttpPageDriver {
    /// Builds the driver's HTTP client
    ///
    /// # Arguments
    ///
    /// * `config` - Fetch settings; only the user agent is read here, the
    ///   timeout is passed per navigation
    ///
    /// # Returns
    ///
    /// * `Ok(HttpPageDriver)` - Ready to navigate
    /// * `Err(DriverError::Client)` - reqwest refused the configuration
    pub fn new(config: &FetchConfig) -> Result<Self, DriverError> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .connect_timeout(Duration::from_secs(10))
            .redirect(Policy::limited(10))
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(|e| DriverError::Client(e.to_string()))?;

        Ok(Self { client })
    }

    fn map_request_error(url: &Url, e: reqwest::Error) -> DriverError {
        if e.is_timeout() {
            DriverError::Timeout {
                url: url.to_string(),
            }
        } else {
            DriverError::Connect {
                url: url.to_string(),
                message: e.to_string(),
            }
        }
    }
}

#[async_trait]
impl PageDriver for HttpPageDriver {
    async fn navigate(&self, url: &Url, timeout: Duration) -> Result<RenderedPage, DriverError> {
        let response = self
            .client
            .get(url.clone())
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| Self::map_request_error(url, e))?;

        let status = response.status();
        let final_url = response.url().clone();

        // Error pages often still carry the business's footer, so only the
        // statuses worth retrying fail navigation.
        if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            return Err(DriverError::Status {
                url: final_url.to_string(),
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_lowercase();

        if !content_type.is_empty() && !content_type.contains("html") {
            return Err(DriverError::NotHtml {
                url: final_url.to_string(),
                content_type,
            });
        }

        let html = response.text().await.map_err(|e| {
            if e.is_timeout() {
                DriverError::Timeout {
                    url: final_url.to_string(),
                }
            } else {
                DriverError::Body {
                    url: final_url.to_string(),
                    message: e.to_string(),
                }
            }
        })?;

        tracing::trace!("Loaded {} ({} bytes, HTTP {})", final_url, html.len(), status);

        Ok(RenderedPage { final_url, html })
    }
}
