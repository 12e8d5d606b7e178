//! Output module for crawl summaries and reports
//!
//! This module handles:
//! - Wrapping a crawl report with run metadata
//! - Printing crawl statistics to the console
//! - Generating markdown summaries of crawl results

mod markdown;
pub mod stats;
mod summary;

pub use markdown::{format_markdown_summary, generate_markdown_summary};
pub use stats::{format_statistics, print_statistics};
pub use summary::{CrawlStatus, CrawlSummary, HostCounts};
