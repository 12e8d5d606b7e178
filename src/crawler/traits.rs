//! Collaborator traits consumed by the crawler
//!
//! The crawler never touches the network or HTML itself. It drives a
//! [`Downloader`] that turns URLs into [`Document`]s and asks each document for
//! its outbound links.

use crate::{FetchError, ParseError};
use async_trait::async_trait;

/// A downloaded page that can report its outbound links
#[async_trait]
pub trait Document: Send + Sync {
    /// Returns the links found in the document
    ///
    /// An error is treated by the crawler as "no links".
    async fn extract_links(&self) -> Result<Vec<String>, ParseError>;
}

/// Turns a URL into a [`Document`]
///
/// Implementations may be slow or unreliable. The crawler runs every call on a
/// download worker and records a returned error verbatim against the URL.
#[async_trait]
pub trait Downloader: Send + Sync {
    /// Downloads `url`
    async fn download(&self, url: &str) -> Result<Box<dyn Document>, FetchError>;
}
