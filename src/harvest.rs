//! # Harvest Run
//!
//! Drives one whole run through its phases:
//!
//! ```text
//! DISCOVER -> FETCH_AND_EXTRACT (bounded by the limit, tree built per record) -> EXPORT -> DONE
//! ```
//!
//! Everything runs on one task with one request in flight. Each product page
//! fetch is followed by a pause of the configured delay plus random jitter
//! before the next one starts; sitemap fetches are not paced. A page that
//! fails to fetch or extract is recorded as a [`SkippedPage`] and the run
//! moves on. Only discovering nothing at all, or failing to write the
//! tables, ends the run with an error.

mod config;

pub use config::{DEFAULT_LIMIT, DEFAULT_SITE, HarvestConfig, HarvestConfigBuilder, Limit};

use std::collections::HashSet;
use std::time::Duration;

use rand::Rng;
use tokio::sync::mpsc::Sender;
use tracing::{Instrument, debug, debug_span, info, instrument, warn};
use url::Url;
use uuid::Uuid;

use crate::catalog::{CategoryTree, EntityKind, IdentityScheme, ProductRecord};
use crate::error::{Error, Result};
use crate::export::{ExportSummary, export};
use crate::extractor::{Extractor, ProductPage};
use crate::http::Fetcher;
use crate::sitemap::{SitemapError, SitemapResolver};

/// A product URL that produced no record, and why
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedPage {
    pub url: String,
    pub reason: String,
}

/// Events emitted while a run progresses
#[derive(Debug, Clone, PartialEq)]
pub enum Progress {
    /// Discovery finished; `target` is how many products the run will try for
    Discovered { urls: usize, target: usize },

    /// A page became a product record
    Extracted { url: String, products: usize },

    /// A page was skipped
    Skipped { url: String, reason: String },

    /// Writing the tables
    Exporting,
}

/// State owned by a single run
#[derive(Debug, Default)]
pub struct RunContext {
    /// Sitemap URLs already fetched
    pub visited_sitemaps: HashSet<String>,

    pub tree: CategoryTree,

    /// Records in extraction order
    pub products: Vec<ProductRecord>,

    pub skipped: Vec<SkippedPage>,
}

impl RunContext {
    pub fn new(tree: CategoryTree) -> Self {
        Self {
            tree,
            ..Self::default()
        }
    }

    /// Route a page through the tree and keep the resulting record
    pub fn accept(&mut self, page: ProductPage) -> &ProductRecord {
        let category_id = self.tree.ensure(&page.category_path, false);
        let id = self.tree.scheme().identify(EntityKind::Product, &page.url);
        self.products.push(ProductRecord {
            id,
            url: page.url,
            name: page.name,
            price: page.price,
            description: page.description,
            image_url: page.image_url,
            is_available: page.is_available,
            category_id,
        });
        &self.products[self.products.len() - 1]
    }

    pub fn skip(&mut self, url: &str, reason: impl Into<String>) {
        self.skipped.push(SkippedPage {
            url: url.to_string(),
            reason: reason.into(),
        });
    }
}

/// Outcome of a completed run
#[derive(Debug, Clone)]
pub struct HarvestSummary {
    /// Product URLs the sitemaps listed
    pub discovered: usize,

    pub skipped: Vec<SkippedPage>,

    pub export: ExportSummary,
}

impl HarvestSummary {
    /// One-line report of what was written
    pub fn line(&self) -> String {
        format!(
            "Categories: {} | Products: {} | Skipped: {}",
            self.export.categories,
            self.export.products,
            self.skipped.len()
        )
    }
}

/// Runs the harvest against one site
pub struct Harvester<F: Fetcher> {
    fetcher: F,
    config: HarvestConfig,
    site_root: Url,
    resolver: SitemapResolver,
    extractor: Extractor,
    progress: Option<Sender<Progress>>,
}

impl<F: Fetcher> Harvester<F> {
    /// Validate `config` and compile the extractor
    pub fn new(fetcher: F, config: HarvestConfig) -> Result<Self> {
        let site_root = Url::parse(&config.site)?;
        if !matches!(site_root.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "site must be an http(s) URL, got {}",
                config.site
            )));
        }

        let extractor = Extractor::new(config.extractor.clone())?;

        Ok(Self {
            fetcher,
            resolver: SitemapResolver::new(config.sitemap.clone()),
            config,
            site_root,
            extractor,
            progress: None,
        })
    }

    /// Send [`Progress`] events to `sender` while running
    pub fn with_progress(mut self, sender: Sender<Progress>) -> Self {
        self.progress = Some(sender);
        self
    }

    async fn emit(&self, event: Progress) {
        if let Some(sender) = &self.progress {
            // A dropped receiver only means nobody is watching
            let _ = sender.send(event).await;
        }
    }

    fn new_context(&self) -> RunContext {
        let scheme = IdentityScheme::new(Uuid::NAMESPACE_URL, self.config.site_tag.as_str());
        RunContext::new(CategoryTree::new(scheme, &self.config.featured))
    }

    /// Run every phase and write the tables
    #[instrument(skip(self), fields(site = %self.site_root, limit = %self.config.limit))]
    pub async fn run(&self) -> Result<HarvestSummary> {
        let mut ctx = self.new_context();

        let urls = self.discover(&mut ctx).await?;
        let target = self.config.limit.0.map_or(urls.len(), |max| max.min(urls.len()));
        info!("Discovered {} product URLs, harvesting up to {}", urls.len(), target);
        self.emit(Progress::Discovered {
            urls: urls.len(),
            target,
        })
        .await;

        self.fetch_and_extract(&urls, &mut ctx).await;

        self.emit(Progress::Exporting).await;
        let export = export(&ctx.tree, &ctx.products, &self.config.outdir)?;

        Ok(HarvestSummary {
            discovered: urls.len(),
            skipped: ctx.skipped,
            export,
        })
    }

    async fn discover(&self, ctx: &mut RunContext) -> Result<Vec<String>> {
        let no_urls = || Error::NoProductUrls {
            site: self.site_root.to_string(),
        };

        match self
            .resolver
            .resolve(&self.fetcher, &self.site_root, &mut ctx.visited_sitemaps)
            .await
        {
            Ok(urls) if urls.is_empty() => Err(no_urls()),
            Ok(urls) => Ok(urls),
            Err(SitemapError::NotFound(_)) => Err(no_urls()),
            Err(e) => Err(e.into()),
        }
    }

    /// Visit URLs in order until the limit is met or the list runs out
    async fn fetch_and_extract(&self, urls: &[String], ctx: &mut RunContext) {
        for (n, url) in urls.iter().enumerate() {
            if self.config.limit.reached(ctx.products.len()) {
                debug!("Limit of {} products reached", self.config.limit);
                break;
            }

            if n > 0 {
                self.pace().instrument(debug_span!("pause")).await;
            }
            match self.harvest_page(url).await {
                Ok(page) => {
                    let record = ctx.accept(page);
                    debug!(url = %url, id = %record.id, "Harvested {}", record.name);
                    let products = ctx.products.len();
                    self.emit(Progress::Extracted {
                        url: url.clone(),
                        products,
                    })
                    .await;
                }
                Err(e) => {
                    let reason = e.to_string();
                    warn!(url = %url, reason = %reason, "Skipped page");
                    ctx.skip(url, reason.as_str());
                    self.emit(Progress::Skipped {
                        url: url.clone(),
                        reason,
                    })
                    .await;
                }
            }
        }
        info!(
            "Extracted {} products, skipped {} pages, {} categories",
            ctx.products.len(),
            ctx.skipped.len(),
            ctx.tree.len()
        );
    }

    /// Delay plus a random extra in `[jitter_min, jitter_min + jitter_span]`;
    /// zero when pacing is disabled
    fn pause(&self) -> Duration {
        if self.config.delay.is_zero() {
            return Duration::ZERO;
        }
        let span = u64::try_from(self.config.jitter_span.as_millis()).unwrap_or(u64::MAX);
        let extra = Duration::from_millis(rand::rng().random_range(0..=span));
        self.config.delay + self.config.jitter_min + extra
    }

    /// Wait between the end of one page fetch and the start of the next
    async fn pace(&self) {
        let pause = self.pause();
        if !pause.is_zero() {
            debug!("Pausing {:?} before the next page", pause);
            tokio::time::sleep(pause).await;
        }
    }

    async fn harvest_page(&self, url: &str) -> Result<ProductPage> {
        let response = self.fetcher.fetch(url).await?;
        if !response.is_success() {
            return Err(Error::Fetch(format!("HTTP {}", response.status)));
        }
        let markup = String::from_utf8_lossy(&response.body);
        Ok(self.extractor.extract(&markup, url)?)
    }
}
