//! Download and extract stages
//!
//! The two stages feed each other: a successful download below the depth limit
//! submits an extract task, and every newly visited link found by an extract
//! task submits a download one level deeper.
//!
//! Each task is registered with the crawl's [`PendingTasks`] before it is
//! submitted and carries its [`TaskGuard`] until its effects are applied. An
//! extract task therefore registers all of its child downloads before it
//! settles, and the pending count cannot reach zero while work is still being
//! handed out.

use crate::crawler::pool::WorkerPool;
use crate::crawler::throttle::HostThrottle;
use crate::crawler::traits::{Document, Downloader};
use crate::state::{CrawlResults, PendingTasks, TaskGuard, VisitedSet};
use crate::url::extract_host;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Per-crawl shared state
#[derive(Debug)]
pub struct CrawlContext {
    pub visited: VisitedSet,
    pub results: CrawlResults,
    pub pending: PendingTasks,
    /// Cancelled when the crawl is abandoned or the crawler is closed
    pub cancel: CancellationToken,
}

impl CrawlContext {
    /// Creates the state for a crawl starting at `seed`
    ///
    /// Every task of the crawl is dropped once `cancel` is cancelled.
    pub fn new(seed: &str, cancel: CancellationToken) -> Self {
        Self {
            visited: VisitedSet::with_seed(seed),
            results: CrawlResults::new(),
            pending: PendingTasks::new(),
            cancel,
        }
    }
}

/// Both stages and the resources they share across crawls
pub struct Stages {
    downloader: Arc<dyn Downloader>,
    downloads: WorkerPool,
    extracts: WorkerPool,
    throttle: HostThrottle,
}

impl Stages {
    pub fn new(
        downloader: Arc<dyn Downloader>,
        downloads: WorkerPool,
        extracts: WorkerPool,
        throttle: HostThrottle,
    ) -> Self {
        Self {
            downloader,
            downloads,
            extracts,
            throttle,
        }
    }

    pub fn throttle(&self) -> &HostThrottle {
        &self.throttle
    }

    /// Submits a download of `url` with `depth` levels remaining
    ///
    /// `task` must already be registered with `ctx.pending`. If the download pool
    /// is closed or the crawl was abandoned, the task is dropped and settles
    /// immediately.
    pub fn submit_download(
        self: &Arc<Self>,
        ctx: Arc<CrawlContext>,
        url: String,
        depth: u32,
        task: TaskGuard,
    ) {
        let stages = Arc::clone(self);
        let scope = ctx.cancel.clone();
        self.downloads.submit(&scope, async move {
            stages.run_download(ctx, url, depth, task).await;
        });
    }

    /// Submits link extraction for a page downloaded with `depth` levels remaining
    pub fn submit_extract(
        self: &Arc<Self>,
        ctx: Arc<CrawlContext>,
        document: Box<dyn Document>,
        depth: u32,
        task: TaskGuard,
    ) {
        let stages = Arc::clone(self);
        let scope = ctx.cancel.clone();
        self.extracts.submit(&scope, async move {
            stages.run_extract(ctx, document, depth, task).await;
        });
    }

    async fn run_download(
        self: Arc<Self>,
        ctx: Arc<CrawlContext>,
        url: String,
        depth: u32,
        _task: TaskGuard,
    ) {
        // Queue on the host before taking a worker so one slow host does not
        // occupy every download worker
        let host = extract_host(&url);
        let Some(_host_permit) = self.throttle.acquire(host.as_deref()).await else {
            return;
        };
        let Some(_worker) = self.downloads.worker().await else {
            return;
        };

        tracing::debug!("Downloading {} (depth {})", url, depth);
        match self.downloader.download(&url).await {
            Ok(document) => {
                ctx.results.record_success(&url);
                if depth > 1 {
                    let extract = ctx.pending.register();
                    self.submit_extract(Arc::clone(&ctx), document, depth, extract);
                }
            }
            Err(e) => {
                tracing::warn!("Failed to download {}: {}", url, e);
                ctx.results.record_failure(&url, e);
            }
        }
    }

    async fn run_extract(
        self: Arc<Self>,
        ctx: Arc<CrawlContext>,
        document: Box<dyn Document>,
        depth: u32,
        _task: TaskGuard,
    ) {
        let Some(_worker) = self.extracts.worker().await else {
            return;
        };

        let links = match document.extract_links().await {
            Ok(links) => links,
            Err(e) => {
                tracing::debug!("Link extraction failed, treating as no links: {}", e);
                return;
            }
        };

        let mut scheduled = 0;
        for link in links {
            if ctx.visited.insert_if_absent(&link) {
                let download = ctx.pending.register();
                self.submit_download(Arc::clone(&ctx), link, depth - 1, download);
                scheduled += 1;
            }
        }
        tracing::trace!("Scheduled {} new downloads at depth {}", scheduled, depth - 1);
    }
}
