//! Ripple Crawler main entry point
//!
//! This is the command-line interface for the Ripple web crawler.

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use ripple_crawler::config::{load_config_with_hash, validate, Config};
use ripple_crawler::output::{generate_markdown_summary, print_statistics, CrawlStatus, CrawlSummary};
use ripple_crawler::{CrawlerError, HttpDownloader, WebCrawler};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Ripple Crawler: a concurrent, depth-bounded web crawler
///
/// Downloads the seed page, follows its links breadth-first up to DEPTH levels,
/// and reports every downloaded URL and every failure.
#[derive(Parser, Debug)]
#[command(name = "ripple-crawler")]
#[command(version)]
#[command(about = "A concurrent, depth-bounded web crawler", long_about = None)]
struct Cli {
    /// Seed URL
    #[arg(value_name = "URL")]
    url: String,

    /// Maximum link-following depth (1 = seed only)
    #[arg(value_name = "DEPTH", default_value_t = 2)]
    depth: u32,

    /// Number of concurrent downloads
    #[arg(value_name = "DOWNLOADS")]
    downloads: Option<usize>,

    /// Number of concurrent link extractions
    #[arg(value_name = "EXTRACTORS")]
    extractors: Option<usize>,

    /// Maximum concurrent downloads per host (0 = unbounded)
    #[arg(value_name = "PER_HOST")]
    per_host: Option<usize>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Write a markdown summary to this path
    #[arg(long, value_name = "PATH")]
    summary: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = load_effective_config(&cli)?;
    tracing::info!(
        "Download workers: {}, extract workers: {}, per-host limit: {}",
        config.crawler.download_concurrency,
        config.crawler.extract_concurrency,
        per_host_label(config.crawler.per_host_limit)
    );

    let downloader = Arc::new(
        HttpDownloader::new(&config.http).context("Failed to build HTTP client")?,
    );
    let crawler = Arc::new(
        WebCrawler::new(downloader, &config.crawler).context("Invalid crawler configuration")?,
    );

    // Ctrl-C closes the crawler; the running crawl returns what it has so far
    {
        let crawler = Arc::clone(&crawler);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupt received, shutting down");
                crawler.close();
            }
        });
    }

    let started_at = Utc::now();
    let (status, report) = match crawler.crawl(&cli.url, cli.depth).await {
        Ok(report) => (CrawlStatus::Completed, report),
        Err(CrawlerError::Cancelled { partial }) => (CrawlStatus::Cancelled, partial),
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            return Err(e.into());
        }
    };
    crawler.close();

    let summary = CrawlSummary::new(cli.url.clone(), cli.depth, started_at, status, report);
    if !cli.quiet {
        print_statistics(&summary);
    }

    if let Some(path) = &cli.summary {
        generate_markdown_summary(&summary, path)
            .with_context(|| format!("Failed to write summary to {}", path.display()))?;
        tracing::info!("Summary written to: {}", path.display());
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("ripple_crawler=info,warn"),
            1 => EnvFilter::new("ripple_crawler=debug,info"),
            2 => EnvFilter::new("ripple_crawler=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the config file (if any) and applies positional overrides
fn load_effective_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    if let Some(downloads) = cli.downloads {
        config.crawler.download_concurrency = downloads;
    }
    if let Some(extractors) = cli.extractors {
        config.crawler.extract_concurrency = extractors;
    }
    if let Some(per_host) = cli.per_host {
        config.crawler.per_host_limit = per_host;
    }

    validate(&config).context("Invalid configuration")?;
    Ok(config)
}

fn per_host_label(limit: usize) -> String {
    if limit == 0 {
        "unbounded".to_string()
    } else {
        limit.to_string()
    }
}
