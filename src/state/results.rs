use crate::FetchError;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// Final outcome of one crawl
///
/// Every URL the crawl attempted appears either in `downloaded` or as a key of
/// `errors`, never both.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlReport {
    /// Successfully downloaded URLs, in completion order
    pub downloaded: Vec<String>,

    /// URLs whose download failed, with the recorded error
    pub errors: HashMap<String, FetchError>,
}

impl CrawlReport {
    /// Number of successfully downloaded URLs
    pub fn success_count(&self) -> usize {
        self.downloaded.len()
    }

    /// Number of failed URLs
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Number of URLs that reached a terminal outcome
    pub fn total(&self) -> usize {
        self.success_count() + self.error_count()
    }

    /// Calculates the success rate as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.total() == 0 {
            return 0.0;
        }
        (self.success_count() as f64 / self.total() as f64) * 100.0
    }
}

#[derive(Debug, Default)]
struct Outcomes {
    /// Downloaded URLs in completion order
    good: Vec<String>,
    /// Same URLs as `good`, for membership checks
    good_index: HashSet<String>,
    bad: HashMap<String, FetchError>,
}

/// GoodSet and BadMap of a running crawl
///
/// Both collections sit behind one lock so a snapshot never observes a URL in
/// both.
#[derive(Debug, Default)]
pub struct CrawlResults {
    outcomes: Mutex<Outcomes>,
}

impl CrawlResults {
    /// Creates empty results
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a successful download
    pub fn record_success(&self, url: &str) {
        let mut outcomes = self.lock();
        if !outcomes.bad.contains_key(url) && outcomes.good_index.insert(url.to_string()) {
            outcomes.good.push(url.to_string());
        }
    }

    /// Records a failed download
    pub fn record_failure(&self, url: &str, error: FetchError) {
        let mut outcomes = self.lock();
        if !outcomes.good_index.contains(url) {
            outcomes.bad.insert(url.to_string(), error);
        }
    }

    /// Copies the current outcomes into a report
    pub fn snapshot(&self) -> CrawlReport {
        let outcomes = self.lock();
        CrawlReport {
            downloaded: outcomes.good.clone(),
            errors: outcomes.bad.clone(),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Outcomes> {
        self.outcomes.lock().unwrap_or_else(|e| e.into_inner())
    }
}
