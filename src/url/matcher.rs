use url::Url;

/// Returns the first pattern found as a substring of `haystack`
///
/// Matching is case-insensitive: `patterns` are expected to be lowercase
/// already (the link classifier lowercases them once at construction) and
/// the haystack is lowercased here.
///
/// # Examples
///
/// ```
/// use lead_ripple::url::first_matching_pattern;
///
/// let patterns = vec![".pdf".to_string(), "facebook.com".to_string()];
/// assert_eq!(
///     first_matching_pattern("https://example.com/Brochure.PDF", &patterns),
///     Some(".pdf")
/// );
/// assert_eq!(first_matching_pattern("https://example.com/about", &patterns), None);
/// ```
pub fn first_matching_pattern<'a>(haystack: &str, patterns: &'a [String]) -> Option<&'a str> {
    let haystack = haystack.to_lowercase();
    patterns
        .iter()
        .find(|pattern| haystack.contains(pattern.as_str()))
        .map(String::as_str)
}

/// Returns the first exclude pattern that applies to `url`
///
/// Patterns starting with `.` are file extensions and only match the end of
/// the URL path, so `.exe` rejects `/setup.exe` but not
/// `www.executive-roofing.com`. Every other pattern (domains, scheme
/// prefixes) is a case-insensitive substring of the whole URL.
pub fn first_excluded_pattern<'a>(url: &Url, patterns: &'a [String]) -> Option<&'a str> {
    let full = url.as_str().to_lowercase();
    let path = url.path().to_lowercase();
    patterns
        .iter()
        .find(|pattern| {
            if pattern.starts_with('.') {
                path.ends_with(pattern.as_str())
            } else {
                full.contains(pattern.as_str())
            }
        })
        .map(String::as_str)
}

/// Returns true if any pattern occurs in `haystack` (case-insensitive)
pub fn matches_any(haystack: &str, patterns: &[String]) -> bool {
    first_matching_pattern(haystack, patterns).is_some()
}

/// Lowercases and trims a pattern list, dropping empty entries
pub fn prepare_patterns(patterns: &[String]) -> Vec<String> {
    patterns
        .iter()
        .map(|p| p.trim().to_lowercase())
        .filter(|p| !p.is_empty())
        .collect()
}
