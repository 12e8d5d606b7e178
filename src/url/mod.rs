//! URL helpers for Ripple Crawler
//!
//! URLs are otherwise handled as plain strings and compared by exact equality.

mod domain;

pub use domain::extract_host;
