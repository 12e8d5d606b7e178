//! HTTP downloader implementation
//!
//! This module provides the bundled [`Downloader`]:
//! - Building an HTTP client with the configured user agent and timeouts
//! - GET requests following redirects
//! - Classifying failures into [`FetchError`]s

use crate::config::HttpConfig;
use crate::crawler::parser::HtmlDocument;
use crate::crawler::traits::{Document, Downloader};
use crate::{CrawlerError, FetchError};
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client};
use std::time::Duration;

/// Maximum redirect hops followed for one download
const MAX_REDIRECTS: usize = 10;

/// Builds an HTTP client from the HTTP configuration
///
/// # Example
///
/// ```no_run
/// use ripple_crawler::config::HttpConfig;
/// use ripple_crawler::crawler::build_http_client;
///
/// let client = build_http_client(&HttpConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Downloads pages over HTTP(S) and wraps them as [`HtmlDocument`]s
#[derive(Debug, Clone)]
pub struct HttpDownloader {
    client: Client,
}

impl HttpDownloader {
    /// Creates a downloader with a client built from `config`
    pub fn new(config: &HttpConfig) -> Result<Self, CrawlerError> {
        Ok(Self::with_client(build_http_client(config)?))
    }

    /// Creates a downloader around an existing client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Downloader for HttpDownloader {
    async fn download(&self, url: &str) -> Result<Box<dyn Document>, FetchError> {
        let document = fetch_document(&self.client, url).await?;
        Ok(Box::new(document))
    }
}

/// Fetches `url` and returns its body as an [`HtmlDocument`]
///
/// # Error Classification
///
/// | Condition | Error |
/// |-----------|-------|
/// | Not an absolute http(s) URL | `InvalidUrl` |
/// | Timeout | `Timeout` |
/// | Connection / redirect failure | `Request` |
/// | Non-2xx status | `Status` |
/// | Body read failure | `Body` |
///
/// Non-HTML responses still count as downloaded; extracting links from them fails
/// later with a [`crate::ParseError`].
pub async fn fetch_document(client: &Client, url: &str) -> Result<HtmlDocument, FetchError> {
    let parsed = reqwest::Url::parse(url).map_err(|e| FetchError::InvalidUrl {
        url: url.to_string(),
        message: e.to_string(),
    })?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(FetchError::InvalidUrl {
            url: url.to_string(),
            message: format!("unsupported scheme '{}'", parsed.scheme()),
        });
    }

    let response = client
        .get(parsed)
        .send()
        .await
        .map_err(|e| classify_error(url, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let final_url = response.url().clone();
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    let body = response.text().await.map_err(|e| FetchError::Body {
        url: url.to_string(),
        message: e.to_string(),
    })?;

    let document = HtmlDocument::new(final_url, content_type, body);
    tracing::trace!("Fetched {} ({})", document.url(), document.content_type());
    Ok(document)
}

/// Maps a transport error onto a [`FetchError`]
fn classify_error(url: &str, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::Request {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}
