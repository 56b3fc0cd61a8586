use serde::Deserialize;

/// Main configuration structure for Lead-Ripple
///
/// Loaded once per process and handed to each component constructor; nothing
/// mutates it after validation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub fetch: FetchConfig,
    pub links: LinkConfig,
    pub governor: GovernorConfig,
    pub classifier: ClassifierConfig,
    pub leads: LeadConfig,
    pub output: OutputConfig,
}

/// Which child links the classifier lets through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkPolicy {
    /// Cross-domain links allowed; only exclude rules and anchor heuristics apply
    #[default]
    Open,
    /// Same host as the parent page, plus an include-pattern, keyword, or
    /// descriptive anchor text
    Strict,
}

/// Crawl walk configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CrawlerConfig {
    /// Maximum BFS depth from the seed URLs (0 = seeds only)
    pub max_depth: u32,

    /// Maximum number of child links scheduled from any single page
    pub max_child_links_per_page: usize,

    /// Number of pages fetched concurrently within one depth level
    pub max_concurrent_fetches: usize,

    /// Child link filtering variant
    pub link_policy: LinkPolicy,

    /// Whether pages at the last depth still have their links classified
    /// (for statistics only; nothing is scheduled from them)
    pub extract_links_at_max_depth: bool,

    /// Fixed pause between depth levels (milliseconds)
    pub inter_depth_delay_ms: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_depth: 1,
            max_child_links_per_page: 50,
            max_concurrent_fetches: 2,
            link_policy: LinkPolicy::Open,
            extract_links_at_max_depth: true,
            inter_depth_delay_ms: 2000,
        }
    }
}

/// Per-page fetch configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct FetchConfig {
    /// Navigation timeout per page (seconds)
    pub timeout_secs: u64,

    /// Pages whose extracted text is shorter than this are rejected
    pub min_content_length: usize,

    /// Lower bound of the randomized delay after a successful fetch (milliseconds)
    pub delay_min_ms: u64,

    /// Upper bound of the randomized delay after a successful fetch (milliseconds)
    pub delay_max_ms: u64,

    /// User agent sent by the HTTP page driver
    pub user_agent: String,

    /// CSS selectors for regions removed before text extraction
    pub strip_selectors: Vec<String>,

    /// CSS selectors tried in order to locate the main content region
    pub content_selectors: Vec<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            min_content_length: 100,
            delay_min_ms: 1000,
            delay_max_ms: 3000,
            user_agent: "Mozilla/5.0 (compatible; LeadRipple/1.0)".to_string(),
            strip_selectors: to_strings(&[
                "script",
                "style",
                "noscript",
                "template",
                "iframe",
                "svg",
                "nav",
                "header",
                "footer",
                "aside",
                "[role=navigation]",
                "[role=banner]",
                "[role=contentinfo]",
                "[class*=cookie]",
                "[id*=cookie]",
                "[class*=consent]",
                "[class*=modal]",
                "[class*=popup]",
                "[class*=advert]",
                "[class*=ads-]",
                "[id*=ads-]",
            ]),
            content_selectors: to_strings(&[
                "main",
                "[role=main]",
                "article",
                "#content",
                "#main-content",
                ".main-content",
                ".content",
                ".page-content",
                ".entry-content",
            ]),
        }
    }
}

/// Link classification rules
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct LinkConfig {
    /// Patterns that disqualify a link
    ///
    /// Entries starting with `.` are file extensions matched against the end
    /// of the URL path; the rest are substrings of the URL. Every entry is
    /// also a substring check on the anchor text.
    pub exclude_patterns: Vec<String>,

    /// URL substrings marking business pages (strict policy only)
    pub include_patterns: Vec<String>,

    /// Anchor-text keywords marking business pages (strict policy only)
    pub relevance_keywords: Vec<String>,

    /// Anchor texts that are pure navigation and never followed
    pub generic_anchor_terms: Vec<String>,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            exclude_patterns: to_strings(&[
                // Non-HTML resources
                ".pdf", ".zip", ".rar", ".gz", ".jpg", ".jpeg", ".png", ".gif", ".webp",
                ".svg", ".ico", ".mp3", ".mp4", ".avi", ".mov", ".doc", ".docx", ".xls",
                ".xlsx", ".ppt", ".pptx", ".exe", ".dmg", ".css", ".xml", ".rss",
                // Social networks
                "facebook.com", "twitter.com", "instagram.com", "linkedin.com",
                "youtube.com", "tiktok.com", "pinterest.com", "reddit.com",
                // Search engines
                "google.com", "bing.com", "yahoo.com", "duckduckgo.com",
                // Marketplaces
                "amazon.", "ebay.", "etsy.com", "alibaba.com",
                // Scheme prefixes
                "javascript:", "mailto:", "tel:", "ftp:", "data:",
            ]),
            include_patterns: to_strings(&[
                "about", "contact", "team", "staff", "people", "leadership",
                "management", "company", "services", "who-we-are", "our-story",
                "locations", "directory",
            ]),
            relevance_keywords: to_strings(&[
                "about", "contact", "team", "staff", "people", "leadership",
                "management", "company", "services", "who we are", "meet",
            ]),
            generic_anchor_terms: to_strings(&[
                "home", "next", "back", "more", "previous", "prev", "menu",
                "skip", "top", "close", "open", "login", "log in", "sign in",
                "sign up", "register", "search", "cart", "read more", "learn more",
                "click here", "here", "view all", "see all", "page",
            ]),
        }
    }
}

/// Delay shape between retry attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackoffKind {
    Fixed,
    #[default]
    Exponential,
}

/// Retry and circuit breaker configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct GovernorConfig {
    /// Total attempts per governed call (1 = no retry)
    pub retry_attempts: u32,

    /// Base delay between attempts (milliseconds)
    pub retry_delay_ms: u64,

    /// Fixed or exponential backoff
    pub backoff: BackoffKind,

    /// Ceiling for exponential backoff (milliseconds)
    pub max_retry_delay_ms: u64,

    /// Consecutive failed classifier calls before the circuit opens
    pub failure_threshold: u32,

    /// How long the circuit stays open before a trial call (seconds)
    pub cooldown_secs: u64,
}

impl Default for GovernorConfig {
    fn default() -> Self {
        Self {
            retry_attempts: 3,
            retry_delay_ms: 1000,
            backoff: BackoffKind::Exponential,
            max_retry_delay_ms: 30_000,
            failure_threshold: 5,
            cooldown_secs: 60,
        }
    }
}

/// LLM content classifier configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ClassifierConfig {
    /// OpenAI-compatible chat completions endpoint
    pub endpoint: String,

    /// Model name sent with each request
    pub model: String,

    /// Environment variable holding the API key; offline extraction is used
    /// when it is unset
    pub api_key_env: String,

    /// Per-call timeout (seconds)
    pub timeout_secs: u64,

    /// Business keyword the crawl is targeting (e.g. "dentists in Austin")
    pub keyword: String,

    /// Page text is truncated to this many characters before classification
    pub max_text_chars: usize,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_secs: 60,
            keyword: String::new(),
            max_text_chars: 12_000,
        }
    }
}

/// Lead cleanup configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct LeadConfig {
    /// Phone numbers with fewer digits than this are dropped
    pub min_phone_digits: usize,
}

impl Default for LeadConfig {
    fn default() -> Self {
        Self { min_phone_digits: 7 }
    }
}

/// Export file format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Json,
    Sqlite,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct OutputConfig {
    /// Directory export files are written to
    pub directory: String,

    /// Export format
    pub format: ExportFormat,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: "./output".to_string(),
            format: ExportFormat::Json,
        }
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
