use std::collections::HashSet;
use std::sync::Mutex;

/// URLs admitted for download during one crawl
///
/// `insert_if_absent` is the only admission gate: a URL is scheduled for
/// download only by the caller that inserted it. URLs are compared by exact
/// string equality.
#[derive(Debug, Default)]
pub struct VisitedSet {
    urls: Mutex<HashSet<String>>,
}

impl VisitedSet {
    /// Creates a set that already contains the seed URL
    pub fn with_seed(seed: &str) -> Self {
        let set = Self::default();
        set.insert_if_absent(seed);
        set
    }

    /// Inserts `url` and returns true if it was not already present
    pub fn insert_if_absent(&self, url: &str) -> bool {
        let mut urls = self.urls.lock().unwrap_or_else(|e| e.into_inner());
        if urls.contains(url) {
            return false;
        }
        urls.insert(url.to_string())
    }

    /// Returns whether `url` has been admitted
    #[cfg(test)]
    fn contains(&self, url: &str) -> bool {
        self.urls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(url)
    }

    /// Returns the number of admitted URLs
    pub fn len(&self) -> usize {
        self.urls.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Returns true if no URL has been admitted
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
