//! # Extractor Configuration Module
//!
//! This module describes where each product field lives on a page. Every
//! field is an ordered list of [`ProbeSpec`]s, tried first to last, so the
//! selectors can be retargeted at another storefront without touching the
//! extraction logic.
//!
//! ## Key Components
//!
//! - `ExtractorConfig`: probes per field plus the breadcrumb and availability rules
//! - `ExtractorConfigBuilder`: Builder pattern implementation for easier configuration
//!
//! ## Defaults
//!
//! The defaults target a Vietnamese electronics storefront: price labelled
//! "Giá sản phẩm", key features under "Tính năng nổi bật", purchase buttons
//! labelled "Mua ngay" / "Thêm vào giỏ".

use super::breadcrumb::BreadcrumbRules;
use super::probe::ProbeSpec;

/// Configuration for the page extractor
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Probes for the product name
    pub name: Vec<ProbeSpec>,

    /// Probes for the price text; a candidate is accepted once it parses as an amount
    pub price: Vec<ProbeSpec>,

    /// Probes for the description
    pub description: Vec<ProbeSpec>,

    /// Probes for the main image; a candidate is accepted once it resolves to an http(s) URL
    pub image: Vec<ProbeSpec>,

    /// Selectors for the breadcrumb container, first match wins
    pub breadcrumb_containers: Vec<String>,

    /// Rules turning raw crumbs into a category path
    pub breadcrumb: BreadcrumbRules,

    /// Selector for elements that may be purchase controls
    pub purchase_controls: String,

    /// Visible labels that identify a purchase control
    pub purchase_labels: Vec<String>,

    /// Labels or classes that mark a control as unusable
    pub sold_out_labels: Vec<String>,

    /// Description length cap, in characters
    pub description_max_chars: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            name: vec![
                ProbeSpec::text("h1"),
                ProbeSpec::attr(r#"meta[property="og:title"]"#, &["content"]),
            ],
            price: vec![
                ProbeSpec::text(".product__price--show"),
                ProbeSpec::text(".box-product-price .sale-price"),
                ProbeSpec::text(".box-info__box-price .product__price--show"),
                ProbeSpec::Labelled {
                    label: "Giá sản phẩm".to_string(),
                    levels: 3,
                },
                ProbeSpec::Body,
            ],
            description: vec![
                ProbeSpec::Section {
                    label: "Tính năng nổi bật".to_string(),
                    items: "li, p".to_string(),
                    max_items: 8,
                    separator: " • ".to_string(),
                },
                ProbeSpec::attr(r#"meta[name="description"]"#, &["content"]),
                ProbeSpec::attr(r#"meta[property="og:description"]"#, &["content"]),
            ],
            image: vec![
                ProbeSpec::attr(
                    ".gallery-product-detail img, .box-gallery img, .product-image img",
                    &["src", "data-src"],
                ),
                ProbeSpec::attr(r#"meta[property="og:image"]"#, &["content"]),
                ProbeSpec::attr("img", &["src", "data-src"]),
            ],
            breadcrumb_containers: vec![
                r#"[aria-label*="breadcrumb"]"#.to_string(),
                r#"[aria-label*="Breadcrumb"]"#.to_string(),
                ".breadcrumb, .breadcrumbs, nav.breadcrumb".to_string(),
            ],
            breadcrumb: BreadcrumbRules::default(),
            purchase_controls: r#"button, a, input[type="submit"], [role="button"]"#.to_string(),
            purchase_labels: vec![
                "Mua ngay".to_string(),
                "Thêm vào giỏ".to_string(),
                "Buy now".to_string(),
                "Add to cart".to_string(),
            ],
            sold_out_labels: vec![
                "Hết hàng".to_string(),
                "Tạm hết".to_string(),
                "out-of-stock".to_string(),
                "sold out".to_string(),
                "disabled".to_string(),
            ],
            description_max_chars: 1000,
        }
    }
}

/// Builder for ExtractorConfig
#[derive(Debug, Default)]
pub struct ExtractorConfigBuilder {
    config: ExtractorConfig,
}

impl ExtractorConfigBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: ExtractorConfig::default(),
        }
    }

    /// Set the name probes
    pub fn name(mut self, probes: Vec<ProbeSpec>) -> Self {
        self.config.name = probes;
        self
    }

    /// Set the price probes
    pub fn price(mut self, probes: Vec<ProbeSpec>) -> Self {
        self.config.price = probes;
        self
    }

    /// Set the description probes
    pub fn description(mut self, probes: Vec<ProbeSpec>) -> Self {
        self.config.description = probes;
        self
    }

    /// Set the image probes
    pub fn image(mut self, probes: Vec<ProbeSpec>) -> Self {
        self.config.image = probes;
        self
    }

    /// Set the breadcrumb rules
    pub fn breadcrumb(mut self, rules: BreadcrumbRules) -> Self {
        self.config.breadcrumb = rules;
        self
    }

    /// Set the purchase control labels
    pub fn purchase_labels(mut self, labels: Vec<String>) -> Self {
        self.config.purchase_labels = labels;
        self
    }

    /// Build the configuration
    pub fn build(self) -> ExtractorConfig {
        self.config
    }
}

impl ExtractorConfig {
    /// Create a new builder
    pub fn builder() -> ExtractorConfigBuilder {
        ExtractorConfigBuilder::new()
    }
}
