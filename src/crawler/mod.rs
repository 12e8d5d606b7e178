//! Crawler module
//!
//! This module contains the crawling machinery:
//! - Collaborator traits (`Downloader`, `Document`)
//! - Bounded worker pools and per-host throttling
//! - The download and extract stages that feed each other
//! - Crawl coordination, completion tracking and shutdown
//! - The bundled HTTP downloader and HTML document

mod coordinator;
mod fetcher;
mod parser;
mod pool;
mod stages;
mod throttle;
mod traits;

pub use coordinator::WebCrawler;
pub use fetcher::{build_http_client, fetch_document, HttpDownloader};
pub use parser::{parse_links, HtmlDocument};
pub use pool::{WorkerPermit, WorkerPool};
pub use throttle::{HostPermit, HostThrottle};
pub use traits::{Document, Downloader};
