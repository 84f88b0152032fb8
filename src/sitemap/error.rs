//! Error types for the sitemap module

use crate::error::Error as CrateError;
use crate::http::FetchError;
use thiserror::Error;

/// Error type for sitemap operations
#[derive(Debug, Error)]
pub enum SitemapError {
    /// Transport failure after retries
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// Server answered with a non-success status
    #[error("{url} returned HTTP {status}")]
    Status {
        /// Requested sitemap URL
        url: String,
        /// Status code received
        status: u16,
    },

    /// XML tokenizer error
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Well-formed XML that is not a sitemap, or a truncated/empty body
    #[error("malformed sitemap: {0}")]
    Malformed(String),

    /// Body looked gzip-compressed but could not be inflated
    #[error("decompression failed: {0}")]
    Decompress(#[source] std::io::Error),

    /// URL parsing error
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// No sitemap document could be read under the site root
    #[error("no reachable sitemap under {0}")]
    NotFound(String),
}

impl From<SitemapError> for CrateError {
    fn from(err: SitemapError) -> Self {
        match err {
            SitemapError::UrlParse(e) => CrateError::UrlParse(e),
            _ => CrateError::Sitemap(err.to_string()),
        }
    }
}
