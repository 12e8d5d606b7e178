//! Crawl coordinator
//!
//! [`WebCrawler`] owns the download and extract pools, the per-host throttle and
//! the shutdown token. Each `crawl` call gets its own visited set, results and
//! pending-task counter, so several crawls may share one crawler.

use crate::config::{validate_crawler_config, CrawlerConfig};
use crate::crawler::pool::WorkerPool;
use crate::crawler::stages::{CrawlContext, Stages};
use crate::crawler::throttle::HostThrottle;
use crate::crawler::traits::Downloader;
use crate::state::CrawlReport;
use crate::{ConfigError, CrawlerError};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// Concurrent, depth-bounded web crawler
///
/// # Cancellation
///
/// [`WebCrawler::close`] cancels every queued and running task. A crawl that is
/// still waiting when the crawler is closed returns
/// [`CrawlerError::Cancelled`] carrying the downloads and errors recorded so far.
/// Crawls started after `close` fail with [`CrawlerError::Closed`].
///
/// Dropping a `crawl` future before it resolves (for example under a timeout)
/// cancels that crawl's queued and running tasks without affecting other crawls.
pub struct WebCrawler {
    stages: Arc<Stages>,
    downloads: WorkerPool,
    extracts: WorkerPool,
    shutdown: CancellationToken,
}

impl WebCrawler {
    /// Creates a new crawler
    ///
    /// # Arguments
    ///
    /// * `downloader` - Turns URLs into documents
    /// * `config` - Pool sizes and per-host limit
    ///
    /// # Returns
    ///
    /// * `Ok(WebCrawler)` - Ready to crawl
    /// * `Err(ConfigError)` - The configuration is invalid; nothing was created
    pub fn new(downloader: Arc<dyn Downloader>, config: &CrawlerConfig) -> Result<Self, ConfigError> {
        validate_crawler_config(config)?;

        let shutdown = CancellationToken::new();
        let downloads = WorkerPool::new("download", config.download_concurrency, shutdown.clone());
        let extracts = WorkerPool::new("extract", config.extract_concurrency, shutdown.clone());
        let throttle = HostThrottle::new(config.per_host_limit);

        let stages = Arc::new(Stages::new(
            downloader,
            downloads.clone(),
            extracts.clone(),
            throttle,
        ));

        Ok(Self {
            stages,
            downloads,
            extracts,
            shutdown,
        })
    }

    /// Crawls from `seed_url`, following links up to `max_depth` levels
    ///
    /// `max_depth = 1` downloads only the seed. Each URL is downloaded at most
    /// once per call. Per-URL download failures are reported in
    /// [`CrawlReport::errors`] and never abort the crawl.
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlReport)` - Every scheduled task settled
    /// * `Err(CrawlerError::InvalidRequest)` - Empty seed or zero depth
    /// * `Err(CrawlerError::Cancelled)` - The crawler was closed mid-crawl
    /// * `Err(CrawlerError::Closed)` - The crawler was already closed
    ///
    /// # Example
    ///
    /// ```no_run
    /// use ripple_crawler::{CrawlerConfig, HttpConfig, HttpDownloader, WebCrawler};
    /// use std::sync::Arc;
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let downloader = Arc::new(HttpDownloader::new(&HttpConfig::default())?);
    /// let crawler = WebCrawler::new(downloader, &CrawlerConfig::default())?;
    /// let report = crawler.crawl("https://example.com/", 2).await?;
    /// println!("{} pages downloaded", report.downloaded.len());
    /// # Ok(())
    /// # }
    /// ```
    pub async fn crawl(&self, seed_url: &str, max_depth: u32) -> Result<CrawlReport, CrawlerError> {
        if seed_url.is_empty() {
            return Err(CrawlerError::InvalidRequest(
                "seed URL cannot be empty".to_string(),
            ));
        }
        if max_depth < 1 {
            return Err(CrawlerError::InvalidRequest(format!(
                "max depth must be >= 1, got {}",
                max_depth
            )));
        }
        if self.is_closed() {
            return Err(CrawlerError::Closed);
        }

        tracing::info!("Starting crawl of {} (max depth {})", seed_url, max_depth);
        let start_time = Instant::now();

        let ctx = Arc::new(CrawlContext::new(seed_url, self.shutdown.child_token()));
        // Dropping this future before it resolves abandons every task of the crawl
        let _abandon = ctx.cancel.clone().drop_guard();

        let seed = ctx.pending.register();
        self.stages
            .submit_download(Arc::clone(&ctx), seed_url.to_string(), max_depth, seed);

        tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => {
                let partial = ctx.results.snapshot();
                tracing::warn!(
                    "Crawl of {} cancelled: {} downloaded, {} failed, {} tasks abandoned",
                    seed_url,
                    partial.success_count(),
                    partial.error_count(),
                    ctx.pending.count()
                );
                return Err(CrawlerError::Cancelled { partial });
            }
            _ = ctx.pending.wait() => {}
        }

        let report = ctx.results.snapshot();
        tracing::info!(
            "Crawl of {} completed: {} downloaded, {} failed, {} URLs visited in {:?}",
            seed_url,
            report.success_count(),
            report.error_count(),
            ctx.visited.len(),
            start_time.elapsed()
        );

        Ok(report)
    }

    /// Stops both pools and cancels all queued and in-flight work
    ///
    /// Idempotent; also called on drop.
    pub fn close(&self) {
        if self.shutdown.is_cancelled() {
            return;
        }
        tracing::info!(
            "Closing crawler ({}: {}/{} busy, {}: {}/{} busy, {} hosts seen)",
            self.downloads.name(),
            self.downloads.busy(),
            self.downloads.size(),
            self.extracts.name(),
            self.extracts.busy(),
            self.extracts.size(),
            self.stages.throttle().known_hosts()
        );
        self.downloads.close();
        self.extracts.close();
        self.stages.throttle().close();
    }

    /// Returns whether [`WebCrawler::close`] has been called
    pub fn is_closed(&self) -> bool {
        self.shutdown.is_cancelled()
    }
}

impl Drop for WebCrawler {
    fn drop(&mut self) {
        self.close();
    }
}
