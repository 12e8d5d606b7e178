//! Ripple Crawler: a concurrent, depth-bounded web crawler
//!
//! This crate downloads a seed page, extracts its outbound links and follows them
//! breadth-first up to a depth limit. Downloads and link extraction run in two
//! independently bounded worker pools, and downloads to the same host can be capped.

pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for crawler operations
#[derive(Debug, Error)]
pub enum CrawlerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid crawl request: {0}")]
    InvalidRequest(String),

    /// The crawler was closed while this crawl was running; `partial` holds
    /// whatever had settled by then.
    #[error("Crawl cancelled")]
    Cancelled { partial: state::CrawlReport },

    #[error("Crawler is closed")]
    Closed,

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure to download a single URL
///
/// Recorded against the URL in the crawl report; never aborts the crawl.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("Request to {url} failed: {message}")]
    Request { url: String, message: String },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Failed to read body of {url}: {message}")]
    Body { url: String, message: String },

    #[error("Invalid URL {url}: {message}")]
    InvalidUrl { url: String, message: String },
}

impl FetchError {
    /// The URL this error was recorded against
    pub fn url(&self) -> &str {
        match self {
            Self::Request { url, .. }
            | Self::Timeout { url }
            | Self::Status { url, .. }
            | Self::Body { url, .. }
            | Self::InvalidUrl { url, .. } => url,
        }
    }
}

/// Failure to extract links from a downloaded document
///
/// The crawler treats this as a page without outbound links.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Cannot extract links from {url}: unsupported content type '{content_type}'")]
    UnsupportedContent { url: String, content_type: String },

    #[error("Invalid selector: {0}")]
    Selector(String),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias for crawler operations
pub type Result<T> = std::result::Result<T, CrawlerError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::{Config, CrawlerConfig, HttpConfig};
pub use crawler::{Document, Downloader, HtmlDocument, HttpDownloader, WebCrawler};
pub use state::CrawlReport;
