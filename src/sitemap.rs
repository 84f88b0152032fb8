//! # Sitemap Resolver
//!
//! Turns a site root into the flat, deduplicated list of product page URLs by
//! walking the site's sitemap hierarchy.
//!
//! ## Algorithm
//!
//! 1. Probe the conventional entry locations (`/sitemap.xml`, `/sitemap_index.xml`
//!    and their `.gz` variants); the first one that parses is the entry.
//! 2. Walk breadth-first: a `<sitemapindex>` queues its children, a `<urlset>`
//!    contributes leaf URLs. Entries of the entry document itself (child
//!    sitemaps of an index, or pages of a flat urlset) are kept only if they
//!    match the configured filter.
//! 3. If nothing was found, probe numbered product sitemaps until the first miss.
//!
//! Every sitemap URL is recorded in the caller's visited set before it is
//! fetched, so a document referenced twice (or a cycle between two indexes) is
//! fetched once and the walk always terminates. Empty, malformed or corrupt
//! sitemaps are logged and skipped.

mod decode;
mod document;
mod error;

pub use decode::{decode_body, is_gzip};
pub use document::{SitemapDocument, SitemapKind, parse_sitemap};
pub use error::SitemapError;

use std::collections::{HashSet, VecDeque};

use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::http::Fetcher;

/// Upper bound on numbered-sitemap probes
const DEFAULT_MAX_NUMBERED: usize = 64;

/// Configuration for sitemap discovery
#[derive(Debug, Clone)]
pub struct SitemapConfig {
    /// Entry locations tried in order, relative to the site root
    pub entry_candidates: Vec<String>,

    /// Substring an entry of the entry document must contain to be kept
    pub child_filter: Option<String>,

    /// Numbered fallback pattern; `{n}` is replaced by 1, 2, ...
    pub numbered_pattern: Option<String>,

    /// Maximum number of numbered sitemaps to probe
    pub max_numbered: usize,
}

impl Default for SitemapConfig {
    fn default() -> Self {
        Self {
            entry_candidates: vec![
                "/sitemap.xml".to_string(),
                "/sitemap_index.xml".to_string(),
                "/sitemap.xml.gz".to_string(),
                "/sitemap_index.xml.gz".to_string(),
            ],
            child_filter: Some("product".to_string()),
            numbered_pattern: Some("/sitemap/product-sitemap{n}.xml".to_string()),
            max_numbered: DEFAULT_MAX_NUMBERED,
        }
    }
}

/// Insertion-ordered set of leaf URLs
#[derive(Debug, Default)]
struct LeafSet {
    seen: HashSet<String>,
    urls: Vec<String>,
}

impl LeafSet {
    fn insert(&mut self, url: String) {
        if self.seen.insert(url.clone()) {
            self.urls.push(url);
        }
    }
}

/// A sitemap waiting to be fetched, with its distance from the entry
type Pending = (String, usize);

/// Resolves a site root to its product page URLs
#[derive(Debug, Clone, Default)]
pub struct SitemapResolver {
    config: SitemapConfig,
}

impl SitemapResolver {
    /// Create a resolver with custom configuration
    pub fn new(config: SitemapConfig) -> Self {
        Self { config }
    }

    /// Resolve `site_root` into leaf page URLs, in discovery order, each once.
    ///
    /// `visited` is the run's record of sitemap URLs already fetched; it is
    /// extended in place so repeated calls in the same run never refetch.
    /// Fails only when no sitemap document at all could be read.
    #[instrument(skip(self, fetcher, visited), fields(site = %site_root))]
    pub async fn resolve<F: Fetcher>(
        &self,
        fetcher: &F,
        site_root: &Url,
        visited: &mut HashSet<String>,
    ) -> Result<Vec<String>, SitemapError> {
        let mut leaves = LeafSet::default();
        let mut queue: VecDeque<Pending> = VecDeque::new();
        let mut documents = 0usize;

        for candidate in &self.config.entry_candidates {
            let url = site_root.join(candidate)?.to_string();
            if !visited.insert(url.clone()) {
                continue;
            }
            match self.load(fetcher, &url).await {
                Ok(doc) => {
                    info!("Entry sitemap: {} ({:?}, {} entries)", url, doc.kind, doc.locations.len());
                    documents += 1;
                    self.absorb(doc, 0, &mut queue, &mut leaves);
                    break;
                }
                Err(SitemapError::Status { status, .. }) => {
                    debug!("No entry sitemap at {} (HTTP {})", url, status);
                }
                Err(e) => warn!(url = %url, reason = %e, "skipping entry sitemap candidate"),
            }
        }
        documents += self.walk(fetcher, &mut queue, visited, &mut leaves).await;

        if leaves.urls.is_empty() {
            documents += self.probe_numbered(fetcher, site_root, visited, &mut leaves).await?;
        }

        if documents == 0 {
            return Err(SitemapError::NotFound(site_root.to_string()));
        }

        info!(
            "Resolved {} page URLs from {} sitemap documents",
            leaves.urls.len(),
            documents
        );
        Ok(leaves.urls)
    }

    /// Fetch, inflate and parse a single sitemap
    async fn load<F: Fetcher>(&self, fetcher: &F, url: &str) -> Result<SitemapDocument, SitemapError> {
        let response = fetcher.fetch(url).await?;
        if !response.is_success() {
            return Err(SitemapError::Status {
                url: url.to_string(),
                status: response.status,
            });
        }
        let body = decode_body(url, &response.body)?;
        parse_sitemap(&body)
    }

    /// Route a parsed document's entries into the queue or the leaf set
    fn absorb(
        &self,
        doc: SitemapDocument,
        depth: usize,
        queue: &mut VecDeque<Pending>,
        leaves: &mut LeafSet,
    ) {
        match doc.kind {
            SitemapKind::UrlSet => {
                let total = doc.locations.len();
                let mut ignored = 0usize;
                for url in doc.locations {
                    if depth == 0 && !self.follows(&url) {
                        ignored += 1;
                        continue;
                    }
                    leaves.insert(url);
                }
                if ignored > 0 {
                    debug!("Ignored {} of {} entry urlset pages outside the filter", ignored, total);
                }
            }
            SitemapKind::Index => {
                for child in doc.locations {
                    if depth == 0 && !self.follows(&child) {
                        debug!("Ignoring child sitemap {}", child);
                        continue;
                    }
                    queue.push_back((child, depth + 1));
                }
            }
        }
    }

    fn follows(&self, child: &str) -> bool {
        match &self.config.child_filter {
            Some(filter) => child.contains(filter.as_str()),
            None => true,
        }
    }

    /// Drain the queue; returns how many documents were read successfully
    async fn walk<F: Fetcher>(
        &self,
        fetcher: &F,
        queue: &mut VecDeque<Pending>,
        visited: &mut HashSet<String>,
        leaves: &mut LeafSet,
    ) -> usize {
        let mut documents = 0;
        while let Some((url, depth)) = queue.pop_front() {
            if !visited.insert(url.clone()) {
                debug!("Already visited {}", url);
                continue;
            }
            match self.load(fetcher, &url).await {
                Ok(doc) => {
                    debug!("{} ({:?}, {} entries)", url, doc.kind, doc.locations.len());
                    documents += 1;
                    self.absorb(doc, depth, queue, leaves);
                }
                Err(e) => warn!(url = %url, reason = %e, "skipping sitemap"),
            }
        }
        documents
    }

    /// Probe numbered product sitemaps until the first miss
    async fn probe_numbered<F: Fetcher>(
        &self,
        fetcher: &F,
        site_root: &Url,
        visited: &mut HashSet<String>,
        leaves: &mut LeafSet,
    ) -> Result<usize, SitemapError> {
        let Some(pattern) = &self.config.numbered_pattern else {
            return Ok(0);
        };

        let mut documents = 0;
        let mut queue = VecDeque::new();
        for n in 1..=self.config.max_numbered {
            let url = site_root.join(&pattern.replace("{n}", &n.to_string()))?.to_string();
            if !visited.insert(url.clone()) {
                continue;
            }
            match self.load(fetcher, &url).await {
                Ok(doc) => {
                    info!("Numbered sitemap: {}", url);
                    documents += 1;
                    // already past the entry level, so children are not filtered
                    self.absorb(doc, 1, &mut queue, leaves);
                    documents += self.walk(fetcher, &mut queue, visited, leaves).await;
                }
                Err(SitemapError::Status { status, .. }) => {
                    debug!("Numbered probing stopped at {} (HTTP {})", url, status);
                    break;
                }
                Err(e) => {
                    warn!(url = %url, reason = %e, "numbered probing stopped");
                    break;
                }
            }
        }
        Ok(documents)
    }
}
