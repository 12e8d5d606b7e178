//! HTML documents and link extraction
//!
//! This module provides the bundled [`Document`]: a downloaded HTML page whose
//! links are extracted with `scraper`.

use crate::crawler::traits::Document;
use crate::ParseError;
use async_trait::async_trait;
use scraper::{Html, Selector};
use url::Url;

/// A downloaded page body together with the URL it was served from
#[derive(Debug, Clone)]
pub struct HtmlDocument {
    /// Final URL after redirects, used to resolve relative links
    url: Url,

    /// Content-Type header value (may be empty)
    content_type: String,

    /// Page body
    body: String,
}

impl HtmlDocument {
    /// Creates a document from a response
    pub fn new(url: Url, content_type: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            url,
            content_type: content_type.into(),
            body: body.into(),
        }
    }

    /// Returns the URL the document was served from
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Returns the Content-Type header value
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Returns true if the body should be parsed as HTML
    ///
    /// A missing Content-Type is given the benefit of the doubt.
    pub fn is_html(&self) -> bool {
        let content_type = self.content_type.to_ascii_lowercase();
        content_type.is_empty()
            || content_type.contains("text/html")
            || content_type.contains("application/xhtml+xml")
    }
}

#[async_trait]
impl Document for HtmlDocument {
    async fn extract_links(&self) -> Result<Vec<String>, ParseError> {
        if !self.is_html() {
            return Err(ParseError::UnsupportedContent {
                url: self.url.to_string(),
                content_type: self.content_type.clone(),
            });
        }
        parse_links(&self.body, &self.url)
    }
}

/// Parses HTML content and extracts absolute outbound links
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` tags
/// - `<link rel="canonical" href="...">`
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` links
/// - Data URIs
/// - Fragment-only links
/// - Anything that does not resolve to http(s)
///
/// Links are returned in document order; duplicates are kept.
///
/// # Example
///
/// ```
/// use ripple_crawler::crawler::parse_links;
/// use url::Url;
///
/// let html = r#"<html><body><a href="/page">Link</a></body></html>"#;
/// let base_url = Url::parse("https://example.com/").unwrap();
/// let links = parse_links(html, &base_url).unwrap();
/// assert_eq!(links, vec!["https://example.com/page".to_string()]);
/// ```
pub fn parse_links(html: &str, base_url: &Url) -> Result<Vec<String>, ParseError> {
    let document = Html::parse_document(html);
    let mut links = Vec::new();

    let a_selector = selector("a[href]")?;
    for element in document.select(&a_selector) {
        // Skip if it has the download attribute
        if element.value().attr("download").is_some() {
            continue;
        }

        if let Some(absolute_url) = element
            .value()
            .attr("href")
            .and_then(|href| resolve_link(href, base_url))
        {
            links.push(absolute_url);
        }
    }

    let canonical_selector = selector("link[rel='canonical'][href]")?;
    for element in document.select(&canonical_selector) {
        if let Some(absolute_url) = element
            .value()
            .attr("href")
            .and_then(|href| resolve_link(href, base_url))
        {
            links.push(absolute_url);
        }
    }

    Ok(links)
}

fn selector(css: &str) -> Result<Selector, ParseError> {
    Selector::parse(css).map_err(|e| ParseError::Selector(format!("{}: {:?}", css, e)))
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowercase = href.to_ascii_lowercase();
    if lowercase.starts_with("javascript:")
        || lowercase.starts_with("mailto:")
        || lowercase.starts_with("tel:")
        || lowercase.starts_with("data:")
    {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute_url) if matches!(absolute_url.scheme(), "http" | "https") => {
            Some(absolute_url.to_string())
        }
        _ => None,
    }
}
