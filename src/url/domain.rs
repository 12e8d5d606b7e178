use url::Url;

/// Extracts the host used as the per-host throttling key
///
/// The host is lowercased and the port is ignored, so every port of one server
/// shares a budget.
///
/// # Returns
///
/// * `Some(String)` - The lowercase host
/// * `None` - If the string is not an absolute URL or has no host
///
/// # Examples
///
/// ```
/// use ripple_crawler::url::extract_host;
///
/// assert_eq!(extract_host("https://EXAMPLE.com/path"), Some("example.com".to_string()));
/// assert_eq!(extract_host("not a url"), None);
/// ```
pub fn extract_host(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()?
        .host_str()
        .map(|h| h.to_lowercase())
}
