//! Bounded worker pools for the download and extract stages
//!
//! A pool is a semaphore with a fixed number of worker slots plus a cancellation
//! token. Submitted jobs are spawned immediately and queue on the semaphore until
//! a worker slot frees; the queue itself is unbounded. Closing the pool cancels
//! every queued and running job at its next await point and refuses new ones.
//! Each job also belongs to a scope token, so the jobs of one abandoned crawl can
//! be dropped while the pool keeps serving other crawls.

use std::future::Future;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;

/// A worker slot held for the duration of one job
pub type WorkerPermit = OwnedSemaphorePermit;

/// Fixed-size pool of workers
#[derive(Debug, Clone)]
pub struct WorkerPool {
    /// Pool name used in log messages
    name: &'static str,

    /// Number of worker slots
    size: usize,

    /// Worker slots
    workers: Arc<Semaphore>,

    /// Cancelled when the pool is closed
    shutdown: CancellationToken,
}

impl WorkerPool {
    /// Creates a pool with `size` workers, cancelled together with `shutdown`
    pub fn new(name: &'static str, size: usize, shutdown: CancellationToken) -> Self {
        Self {
            name,
            size,
            workers: Arc::new(Semaphore::new(size)),
            shutdown,
        }
    }

    /// Returns the pool name
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the number of worker slots
    pub fn size(&self) -> usize {
        self.size
    }

    /// Returns the number of workers currently running a job
    pub fn busy(&self) -> usize {
        self.size - self.workers.available_permits()
    }

    /// Returns whether the pool has been closed
    pub fn is_closed(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Spawns `job`, dropping it at its next await point once the pool is closed
    /// or `scope` is cancelled
    ///
    /// The job is expected to call [`WorkerPool::worker`] before doing its work.
    /// Returns false, dropping the job unrun, if either is already cancelled.
    pub fn submit<F>(&self, scope: &CancellationToken, job: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.is_closed() || scope.is_cancelled() {
            tracing::debug!("{} pool or crawl is closed, rejecting job", self.name);
            return false;
        }

        let shutdown = self.shutdown.clone();
        let scope = scope.clone();
        let name = self.name;
        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    tracing::trace!("{} job cancelled", name);
                }
                _ = scope.cancelled() => {
                    tracing::trace!("{} job abandoned", name);
                }
                _ = job => {}
            }
        });
        true
    }

    /// Waits for a free worker slot
    ///
    /// Returns `None` once the pool is closed.
    pub async fn worker(&self) -> Option<WorkerPermit> {
        let permit = Arc::clone(&self.workers).acquire_owned().await.ok()?;
        tracing::trace!(
            "{} worker acquired ({}/{} busy)",
            self.name,
            self.busy(),
            self.size
        );
        Some(permit)
    }

    /// Cancels queued and running jobs and refuses new ones
    ///
    /// Idempotent.
    pub fn close(&self) {
        self.shutdown.cancel();
        self.workers.close();
    }
}
