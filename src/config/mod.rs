//! Configuration module for Ripple Crawler
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every section and key is optional; missing values fall back to defaults.
//!
//! # Example
//!
//! ```no_run
//! use ripple_crawler::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("crawler.toml")).unwrap();
//! println!("Per-host limit: {}", config.crawler.per_host_limit);
//! ```

mod parser;
mod types;
mod validation;

pub use types::{Config, CrawlerConfig, HttpConfig};

pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::{validate, validate_crawler_config};
