//! Per-host admission control
//!
//! Each host gets its own semaphore sized to the per-host limit, created the
//! first time the host is seen and kept for the crawler's lifetime. A download
//! holds a [`HostPermit`] for its whole duration; dropping the permit frees the
//! slot on every exit path.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Scoped reservation of one download slot for a host
///
/// Holds nothing when throttling is disabled or the URL had no host.
#[derive(Debug)]
pub struct HostPermit {
    permit: Option<OwnedSemaphorePermit>,
}

impl HostPermit {
    fn unthrottled() -> Self {
        Self { permit: None }
    }

    /// Returns whether this permit occupies a per-host slot
    #[cfg(test)]
    fn is_throttled(&self) -> bool {
        self.permit.is_some()
    }
}

/// Limits concurrent in-flight downloads to the same host
#[derive(Debug)]
pub struct HostThrottle {
    /// Slots per host; 0 disables throttling
    per_host_limit: usize,

    /// Lazily created per-host budgets
    budgets: Mutex<HashMap<String, Arc<Semaphore>>>,

    closed: AtomicBool,
}

impl HostThrottle {
    /// Creates a throttle allowing `per_host_limit` concurrent downloads per host
    ///
    /// A limit of 0 makes every acquisition a no-op.
    pub fn new(per_host_limit: usize) -> Self {
        Self {
            per_host_limit,
            budgets: Mutex::new(HashMap::new()),
            closed: AtomicBool::new(false),
        }
    }

    /// Returns true if acquisition never waits
    pub fn is_unbounded(&self) -> bool {
        self.per_host_limit == 0
    }

    /// Waits for a free slot on `host` and reserves it
    ///
    /// Returns `None` if the throttle was closed while waiting.
    pub async fn acquire(&self, host: Option<&str>) -> Option<HostPermit> {
        if self.closed.load(Ordering::Acquire) {
            return None;
        }

        let host = match host {
            Some(host) if !self.is_unbounded() => host,
            _ => return Some(HostPermit::unthrottled()),
        };

        let budget = self.budget(host);
        tracing::trace!(
            "Waiting for host slot on {} ({} free)",
            host,
            budget.available_permits()
        );

        let permit = budget.acquire_owned().await.ok()?;
        Some(HostPermit {
            permit: Some(permit),
        })
    }

    /// Returns the number of downloads currently holding a slot for `host`
    #[cfg(test)]
    fn in_flight(&self, host: &str) -> usize {
        self.lock()
            .get(host)
            .map(|budget| self.per_host_limit - budget.available_permits())
            .unwrap_or(0)
    }

    /// Returns the number of hosts seen so far
    pub fn known_hosts(&self) -> usize {
        self.lock().len()
    }

    /// Wakes every waiting acquisition with `None` and refuses new ones
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        for budget in self.lock().values() {
            budget.close();
        }
    }

    fn budget(&self, host: &str) -> Arc<Semaphore> {
        let mut budgets = self.lock();
        budgets
            .entry(host.to_string())
            .or_insert_with(|| Arc::new(Semaphore::new(self.per_host_limit)))
            .clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Arc<Semaphore>>> {
        self.budgets.lock().unwrap_or_else(|e| e.into_inner())
    }
}
