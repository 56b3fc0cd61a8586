//! Crawler module for depth-bounded page walking
//!
//! This module contains the core crawling logic, including:
//! - Page drivers that load documents
//! - Main-content and link extraction
//! - Per-page fetching with retries and polite delays
//! - The breadth-first walk and the session that ties it to lead assembly

mod content;
mod driver;
mod fetcher;
mod node;
mod session;
mod visited;
mod walker;

pub use content::{
    extract_raw_links, ContentExtractor, ExtractedContent, ExtractionStrategy, SelectorStrategy,
    WholeDocumentStrategy,
};
pub use driver::{DriverError, HttpPageDriver, PageDriver, RenderedPage};
pub use fetcher::PageFetcher;
pub use node::{CrawlNode, FetchErrorKind, FetchResult, RawLink};
pub use session::{CrawlReport, SeedCandidate, Session};
pub use visited::VisitedSet;
pub use walker::{AbortHandle, WalkOutcome, WalkStats, Walker};
