//! Outstanding-task accounting for a single crawl
//!
//! Every task is registered before it is handed to a worker pool and settles when
//! its [`TaskGuard`] is dropped. The crawl is complete when the count returns to
//! zero. Because settlement happens on drop, tasks that panic or are cancelled
//! before reaching their terminal action still settle.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

#[derive(Debug, Default)]
struct Inner {
    count: AtomicUsize,
    idle: Notify,
}

/// Reference-counted pending-work counter with an awaitable zero transition
#[derive(Debug, Clone, Default)]
pub struct PendingTasks {
    inner: Arc<Inner>,
}

impl PendingTasks {
    /// Creates a counter with no outstanding tasks
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers one outstanding task
    ///
    /// The returned guard must be moved into the task; dropping it settles the task.
    pub fn register(&self) -> TaskGuard {
        self.inner.count.fetch_add(1, Ordering::AcqRel);
        TaskGuard {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Returns the number of outstanding tasks
    pub fn count(&self) -> usize {
        self.inner.count.load(Ordering::Acquire)
    }

    /// Waits until no task is outstanding
    ///
    /// Returns immediately if nothing is registered.
    pub async fn wait(&self) {
        loop {
            // Created before the check so a concurrent zero transition is not missed
            let notified = self.inner.idle.notified();
            if self.count() == 0 {
                return;
            }
            notified.await;
        }
    }
}

/// Settles one registered task when dropped
#[derive(Debug)]
#[must_use = "dropping the guard settles the task immediately"]
pub struct TaskGuard {
    inner: Arc<Inner>,
}

impl Drop for TaskGuard {
    fn drop(&mut self) {
        let previous = self.inner.count.fetch_sub(1, Ordering::AcqRel);
        debug_assert!(previous > 0, "pending task count underflow");
        if previous == 1 {
            self.inner.idle.notify_waiters();
        }
    }
}
