//! # catalog-harvest - Sitemap-driven retail catalog harvester
//!
//! This crate discovers every product page of a retail catalog site through
//! its sitemap hierarchy, extracts structured product data from each page,
//! folds the breadcrumbs into a category tree with stable identifiers, and
//! writes two linked CSV tables.
//!
//! ## Features
//!
//! - Sitemap resolution across nested indexes, gzip bodies and numbered fallbacks
//! - Page extraction through ordered, configurable selector probes
//! - Category tree with content-derived UUIDv5 identifiers, stable across runs
//! - `categories.csv` / `products.csv` export with relational integrity checks
//! - Polite, paced fetching with retries and exponential backoff
//! - Robust error handling and logging
//!
//! ## Example
//!
//! ```rust,no_run
//! use catalog_harvest::harvest::{HarvestConfig, Harvester, Limit};
//! use catalog_harvest::http::HttpFetcher;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = HarvestConfig::builder()
//!         .site("https://cellphones.com.vn")
//!         .limit(Limit(Some(20)))
//!         .outdir("out")
//!         .build();
//!
//!     let fetcher = HttpFetcher::new(&config.fetch)?;
//!     let summary = Harvester::new(fetcher, config)?.run().await?;
//!
//!     println!("{}", summary.line());
//!     Ok(())
//! }
//! ```

mod error;

pub mod catalog;
pub mod export;
pub mod extractor;
pub mod harvest;
pub mod http;
pub mod sitemap;

pub use error::{Error, Result};

/// Re-export of the types most callers need
pub mod prelude {
    pub use crate::catalog::{CategoryNode, CategoryTree, ProductRecord};
    pub use crate::error::Error;
    pub use crate::error::Result;
    pub use crate::harvest::{HarvestConfig, HarvestSummary, Harvester, Limit, Progress};
    pub use crate::http::{Fetcher, HttpFetcher};
}
