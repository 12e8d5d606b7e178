//! Crawl summary data shared by the console and markdown outputs

use crate::state::CrawlReport;
use crate::url::extract_host;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt;

/// How a crawl ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlStatus {
    /// Every scheduled task settled
    Completed,
    /// The crawler was closed before the crawl settled
    Cancelled,
}

impl fmt::Display for CrawlStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => write!(f, "completed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Downloads and failures for one host
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HostCounts {
    pub downloaded: usize,
    pub failed: usize,
}

/// A crawl report together with run metadata
#[derive(Debug, Clone)]
pub struct CrawlSummary {
    pub seed_url: String,
    pub max_depth: u32,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub status: CrawlStatus,
    pub report: CrawlReport,
}

impl CrawlSummary {
    /// Wraps a report finished now
    pub fn new(
        seed_url: impl Into<String>,
        max_depth: u32,
        started_at: DateTime<Utc>,
        status: CrawlStatus,
        report: CrawlReport,
    ) -> Self {
        Self {
            seed_url: seed_url.into(),
            max_depth,
            started_at,
            finished_at: Utc::now(),
            status,
            report,
        }
    }

    /// Wall-clock duration of the crawl in seconds
    pub fn duration_seconds(&self) -> f64 {
        (self.finished_at - self.started_at).num_milliseconds() as f64 / 1000.0
    }

    /// Downloads and failures grouped by host, sorted by host name
    ///
    /// URLs without a host are grouped under `(none)`.
    pub fn host_breakdown(&self) -> BTreeMap<String, HostCounts> {
        let mut hosts: BTreeMap<String, HostCounts> = BTreeMap::new();
        for url in &self.report.downloaded {
            hosts.entry(host_key(url)).or_default().downloaded += 1;
        }
        for url in self.report.errors.keys() {
            hosts.entry(host_key(url)).or_default().failed += 1;
        }
        hosts
    }

    /// Failed URLs with their error messages, sorted by URL
    pub fn sorted_errors(&self) -> Vec<(&str, String)> {
        let mut errors: Vec<_> = self
            .report
            .errors
            .iter()
            .map(|(url, error)| (url.as_str(), error.to_string()))
            .collect();
        errors.sort();
        errors
    }
}

fn host_key(url: &str) -> String {
    extract_host(url).unwrap_or_else(|| "(none)".to_string())
}
