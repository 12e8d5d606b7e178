use serde::Deserialize;

/// Main configuration structure for Ripple Crawler
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub http: HttpConfig,
}

/// Worker pool sizing and per-host admission
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Maximum number of downloads running at once
    #[serde(rename = "download-concurrency")]
    pub download_concurrency: usize,

    /// Maximum number of link extractions running at once
    #[serde(rename = "extract-concurrency")]
    pub extract_concurrency: usize,

    /// Maximum number of downloads in flight to one host (0 = unbounded)
    #[serde(rename = "per-host-limit")]
    pub per_host_limit: usize,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            download_concurrency: 8,
            extract_concurrency: 8,
            per_host_limit: 0,
        }
    }
}

/// HTTP client configuration for the bundled downloader
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// User-Agent header sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Total request timeout (seconds)
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// Connection timeout (seconds)
    #[serde(rename = "connect-timeout-secs")]
    pub connect_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("ripple-crawler/{}", env!("CARGO_PKG_VERSION")),
            timeout_secs: 30,
            connect_timeout_secs: 10,
        }
    }
}
