use crate::config::types::{
    ClassifierConfig, Config, CrawlerConfig, FetchConfig, GovernorConfig, LinkConfig,
    OutputConfig,
};
use crate::ConfigError;
use scraper::Selector;
use url::Url;

/// Deepest crawl the walker accepts
pub const MAX_DEPTH_LIMIT: u32 = 3;

/// Largest concurrency window within one depth level
pub const MAX_CONCURRENT_FETCHES: usize = 3;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_fetch_config(&config.fetch)?;
    validate_link_config(&config.links)?;
    validate_governor_config(&config.governor)?;
    validate_classifier_config(&config.classifier)?;
    validate_output_config(&config.output)?;

    if config.leads.min_phone_digits == 0 {
        return Err(ConfigError::Validation(
            "min_phone_digits must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_depth > MAX_DEPTH_LIMIT {
        return Err(ConfigError::Validation(format!(
            "max_depth must be between 0 and {}, got {}",
            MAX_DEPTH_LIMIT, config.max_depth
        )));
    }

    if config.max_child_links_per_page < 1 || config.max_child_links_per_page > 500 {
        return Err(ConfigError::Validation(format!(
            "max_child_links_per_page must be between 1 and 500, got {}",
            config.max_child_links_per_page
        )));
    }

    if config.max_concurrent_fetches < 1 || config.max_concurrent_fetches > MAX_CONCURRENT_FETCHES
    {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_fetches must be between 1 and {}, got {}",
            MAX_CONCURRENT_FETCHES, config.max_concurrent_fetches
        )));
    }

    Ok(())
}

/// Validates fetch configuration
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.delay_min_ms > config.delay_max_ms {
        return Err(ConfigError::Validation(format!(
            "delay_min_ms ({}) must not exceed delay_max_ms ({})",
            config.delay_min_ms, config.delay_max_ms
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    for selector in config.strip_selectors.iter().chain(&config.content_selectors) {
        validate_selector(selector)?;
    }

    Ok(())
}

/// Validates link classification patterns
fn validate_link_config(config: &LinkConfig) -> Result<(), ConfigError> {
    let all = config
        .exclude_patterns
        .iter()
        .chain(&config.include_patterns)
        .chain(&config.relevance_keywords)
        .chain(&config.generic_anchor_terms);

    for pattern in all {
        if pattern.trim().is_empty() {
            return Err(ConfigError::InvalidPattern(
                "Link patterns cannot be empty".to_string(),
            ));
        }
    }

    Ok(())
}

/// Validates retry and circuit breaker settings
fn validate_governor_config(config: &GovernorConfig) -> Result<(), ConfigError> {
    if config.retry_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "retry_attempts must be >= 1, got {}",
            config.retry_attempts
        )));
    }

    if config.failure_threshold < 1 {
        return Err(ConfigError::Validation(format!(
            "failure_threshold must be >= 1, got {}",
            config.failure_threshold
        )));
    }

    if config.max_retry_delay_ms < config.retry_delay_ms {
        return Err(ConfigError::Validation(format!(
            "max_retry_delay_ms ({}) must be >= retry_delay_ms ({})",
            config.max_retry_delay_ms, config.retry_delay_ms
        )));
    }

    Ok(())
}

/// Validates classifier configuration
fn validate_classifier_config(config: &ClassifierConfig) -> Result<(), ConfigError> {
    let endpoint = Url::parse(&config.endpoint)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid classifier endpoint: {}", e)))?;

    if endpoint.scheme() != "http" && endpoint.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "Classifier endpoint must be http(s), got '{}'",
            config.endpoint
        )));
    }

    if config.model.trim().is_empty() {
        return Err(ConfigError::Validation("model cannot be empty".to_string()));
    }

    if config.max_text_chars < 100 {
        return Err(ConfigError::Validation(format!(
            "max_text_chars must be >= 100, got {}",
            config.max_text_chars
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.directory.trim().is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Checks that a CSS selector parses
fn validate_selector(selector: &str) -> Result<(), ConfigError> {
    Selector::parse(selector)
        .map(|_| ())
        .map_err(|_| ConfigError::InvalidPattern(format!("Invalid CSS selector '{}'", selector)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_depth_bounds() {
        let mut config = Config::default();
        config.crawler.max_depth = 0;
        assert!(validate(&config).is_ok());
        config.crawler.max_depth = 3;
        assert!(validate(&config).is_ok());
        config.crawler.max_depth = 4;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_child_link_cap_bounds() {
        let mut config = Config::default();
        config.crawler.max_child_links_per_page = 0;
        assert!(validate(&config).is_err());
        config.crawler.max_child_links_per_page = 501;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_concurrency_bounds() {
        let mut config = Config::default();
        config.crawler.max_concurrent_fetches = 0;
        assert!(validate(&config).is_err());
        config.crawler.max_concurrent_fetches = 4;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_delay_window_order() {
        let mut config = Config::default();
        config.fetch.delay_min_ms = 500;
        config.fetch.delay_max_ms = 100;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_invalid_selector() {
        let mut config = Config::default();
        config.fetch.content_selectors.push("div[[".to_string());
        assert!(matches!(
            validate(&config),
            Err(ConfigError::InvalidPattern(_))
        ));
    }

    #[test]
    fn test_empty_pattern_rejected() {
        let mut config = Config::default();
        config.links.exclude_patterns.push("  ".to_string());
        assert!(matches!(
            validate(&config),
            Err(ConfigError::InvalidPattern(_))
        ));
    }

    #[test]
    fn test_governor_bounds() {
        let mut config = Config::default();
        config.governor.retry_attempts = 0;
        assert!(validate(&config).is_err());

        let mut config = Config::default();
        config.governor.failure_threshold = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_classifier_endpoint_must_be_http() {
        let mut config = Config::default();
        config.classifier.endpoint = "ftp://models.example.com".to_string();
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));

        config.classifier.endpoint = "not a url".to_string();
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));
    }
}
