//! Error types for the harvester crate

use thiserror::Error;

/// Result type for harvester operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for harvester operations
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A fetch failed after exhausting the retry policy
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// Sitemap discovery or parsing failed
    #[error("Sitemap error: {0}")]
    Sitemap(String),

    /// Extractor could not be built or a page could not be extracted
    #[error("Extract error: {0}")]
    Extract(String),

    /// Neither the entry sitemaps nor the numbered fallback produced a product URL
    #[error("No product URLs discovered under {site}")]
    NoProductUrls {
        /// Site root that was searched
        site: String,
    },

    /// Writing the dataset failed
    #[error("Export error: {0}")]
    Export(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// URL parsing error
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),
}
