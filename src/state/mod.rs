//! State module for tracking a running crawl
//!
//! Everything here lives for exactly one `crawl` call and is shared by the
//! download and extract workers of that crawl.
//!
//! # Components
//!
//! - `VisitedSet`: URLs admitted for download (deduplication gate)
//! - `CrawlResults`: downloaded URLs and per-URL failures, frozen into a `CrawlReport`
//! - `PendingTasks`: outstanding-task counter used to detect quiescence

mod pending;
mod results;
mod visited;

pub use pending::{PendingTasks, TaskGuard};
pub use results::{CrawlReport, CrawlResults};
pub use visited::VisitedSet;
