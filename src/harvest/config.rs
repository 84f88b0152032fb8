//! # Harvest Configuration Module
//!
//! Run-level settings: which site, how many products, how politely, and
//! where the tables go. Transport, sitemap and extraction settings are
//! nested so the binary can assemble everything from one set of flags.
//!
//! ## Key Components
//!
//! - `HarvestConfig`: The main configuration struct for a run
//! - `HarvestConfigBuilder`: Builder pattern implementation for easier configuration
//! - `Limit`: Upper bound on successfully extracted products

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::catalog::{DEFAULT_FEATURED, DEFAULT_SITE_TAG};
use crate::extractor::ExtractorConfig;
use crate::http::FetchConfig;
use crate::sitemap::SitemapConfig;

/// Site harvested when none is given
pub const DEFAULT_SITE: &str = "https://cellphones.com.vn";

/// Default cap on extracted products
pub const DEFAULT_LIMIT: usize = 200;

/// Default pause between product page fetches, in milliseconds
const DEFAULT_DELAY_MS: u64 = 350;

/// Upper bound on successfully extracted products; `None` is unbounded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limit(pub Option<usize>);

impl Limit {
    pub const UNBOUNDED: Limit = Limit(None);

    /// Whether `count` products already fill the limit
    pub fn reached(&self, count: usize) -> bool {
        self.0.is_some_and(|max| count >= max)
    }
}

impl Default for Limit {
    fn default() -> Self {
        Limit(Some(DEFAULT_LIMIT))
    }
}

impl FromStr for Limit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unbounded" | "none" | "all" => Ok(Limit::UNBOUNDED),
            other => other
                .parse::<usize>()
                .map(|n| Limit(Some(n)))
                .map_err(|_| format!("expected a non-negative integer or 'unbounded', got '{}'", s)),
        }
    }
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(n) => write!(f, "{}", n),
            None => write!(f, "unbounded"),
        }
    }
}

/// Configuration for one harvest run
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    /// Site root, e.g. `https://cellphones.com.vn`
    pub site: String,

    /// Maximum number of products to extract
    pub limit: Limit,

    /// Pause after each product page fetch completes, before the next one
    /// starts; jitter is added on top. Zero disables pacing and jitter.
    pub delay: Duration,

    /// Smallest random extra pause added to `delay`
    pub jitter_min: Duration,

    /// Width of the random extra pause above `jitter_min`
    pub jitter_span: Duration,

    /// Directory the tables are written to
    pub outdir: PathBuf,

    /// Root category names marked popular
    pub featured: Vec<String>,

    /// Site tag identifiers are derived under
    pub site_tag: String,

    /// Transport settings
    pub fetch: FetchConfig,

    /// Sitemap discovery settings
    pub sitemap: SitemapConfig,

    /// Page extraction settings
    pub extractor: ExtractorConfig,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            site: DEFAULT_SITE.to_string(),
            limit: Limit::default(),
            delay: Duration::from_millis(DEFAULT_DELAY_MS),
            jitter_min: Duration::from_millis(50),
            jitter_span: Duration::from_millis(200),
            outdir: PathBuf::from("."),
            featured: DEFAULT_FEATURED.iter().map(|s| s.to_string()).collect(),
            site_tag: DEFAULT_SITE_TAG.to_string(),
            fetch: FetchConfig::default(),
            sitemap: SitemapConfig::default(),
            extractor: ExtractorConfig::default(),
        }
    }
}

impl HarvestConfig {
    /// Create a new builder
    pub fn builder() -> HarvestConfigBuilder {
        HarvestConfigBuilder::new()
    }
}

/// Builder for HarvestConfig
#[derive(Debug, Default)]
pub struct HarvestConfigBuilder {
    config: HarvestConfig,
}

impl HarvestConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: HarvestConfig::default(),
        }
    }

    /// Set the site root
    pub fn site(mut self, site: impl Into<String>) -> Self {
        self.config.site = site.into();
        self
    }

    /// Set the product limit
    pub fn limit(mut self, limit: Limit) -> Self {
        self.config.limit = limit;
        self
    }

    /// Set the pause between product page fetches
    pub fn delay(mut self, delay: Duration) -> Self {
        self.config.delay = delay;
        self
    }

    /// Set the random extra pause range
    pub fn jitter(mut self, min: Duration, span: Duration) -> Self {
        self.config.jitter_min = min;
        self.config.jitter_span = span;
        self
    }

    /// Set the output directory
    pub fn outdir(mut self, outdir: impl Into<PathBuf>) -> Self {
        self.config.outdir = outdir.into();
        self
    }

    /// Set the featured root categories
    pub fn featured(mut self, featured: Vec<String>) -> Self {
        self.config.featured = featured;
        self
    }

    /// Set the identity site tag
    pub fn site_tag(mut self, site_tag: impl Into<String>) -> Self {
        self.config.site_tag = site_tag.into();
        self
    }

    /// Set the transport configuration
    pub fn fetch(mut self, fetch: FetchConfig) -> Self {
        self.config.fetch = fetch;
        self
    }

    /// Set the sitemap configuration
    pub fn sitemap(mut self, sitemap: SitemapConfig) -> Self {
        self.config.sitemap = sitemap;
        self
    }

    /// Set the extractor configuration
    pub fn extractor(mut self, extractor: ExtractorConfig) -> Self {
        self.config.extractor = extractor;
        self
    }

    /// Build the configuration
    pub fn build(self) -> HarvestConfig {
        self.config
    }
}
