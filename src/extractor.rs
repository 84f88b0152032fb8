//! # Page Extractor
//!
//! Parses one fetched product page into a [`ProductPage`]: name, price,
//! description, image, availability and the breadcrumb path that later
//! becomes the product's category.
//!
//! Every field is read through an ordered list of probes from
//! [`ExtractorConfig`]; the first candidate that passes the field's check
//! wins and exhausting the list leaves the field at its default. Only the
//! name is required, a page without one is rejected with
//! [`ExtractError::MissingField`].
//!
//! Prices read from broad probes (whole-page text or a label's surroundings)
//! must carry a currency suffix; dedicated price elements may be bare numbers.

mod breadcrumb;
mod config;
mod error;
mod price;
mod probe;

pub use breadcrumb::{BreadcrumbRules, DEFAULT_NOISE_LABELS};
pub use config::{ExtractorConfig, ExtractorConfigBuilder};
pub use error::ExtractError;
pub use price::{format_price, parse_price, parse_price_strict};
pub use probe::{Probe, ProbeSpec, collapsed_text, first_match, parse_selector};

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, instrument};
use url::Url;

use crate::catalog::fold;

/// Fields read from one product page, before category resolution
#[derive(Debug, Clone, PartialEq)]
pub struct ProductPage {
    /// URL the page was fetched from
    pub url: String,

    pub name: String,

    pub price: Option<f64>,

    /// Empty when the page has neither a feature list nor a meta description
    pub description: String,

    /// Absolute http(s) URL, or empty
    pub image_url: String,

    pub is_available: bool,

    /// Cleaned breadcrumb labels, root first; empty when the page has none
    pub category_path: Vec<String>,
}

/// Compiled form of an [`ExtractorConfig`], reusable across pages
#[derive(Debug, Clone)]
pub struct Extractor {
    name: Vec<Probe>,
    price: Vec<Probe>,
    description: Vec<Probe>,
    image: Vec<Probe>,
    breadcrumb_containers: Vec<Selector>,
    crumb_items: Selector,
    crumb_fallback: Selector,
    rules: BreadcrumbRules,
    purchase_controls: Selector,
    purchase_labels: Vec<String>,
    sold_out_labels: Vec<String>,
    description_max_chars: usize,
}

fn compile_all(specs: &[ProbeSpec]) -> Result<Vec<Probe>, ExtractError> {
    specs.iter().map(ProbeSpec::compile).collect()
}

/// Fold a marker so that `sold-out`, `Sold out` and `SOLD OUT` compare equal
fn marker(text: &str) -> String {
    fold(text).replace('-', " ")
}

fn non_empty(candidate: &str) -> Option<String> {
    let trimmed = candidate.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Resolve an image reference against the page URL, keeping only http(s)
fn resolve_image(base: Option<&Url>, candidate: &str) -> Option<String> {
    let url = match base {
        Some(base) => base.join(candidate).ok()?,
        None => Url::parse(candidate).ok()?,
    };
    matches!(url.scheme(), "http" | "https").then(|| url.to_string())
}

impl Extractor {
    /// Compile every selector in `config`
    pub fn new(config: ExtractorConfig) -> Result<Self, ExtractError> {
        Ok(Self {
            name: compile_all(&config.name)?,
            price: compile_all(&config.price)?,
            description: compile_all(&config.description)?,
            image: compile_all(&config.image)?,
            breadcrumb_containers: config
                .breadcrumb_containers
                .iter()
                .map(|s| parse_selector(s))
                .collect::<Result<_, _>>()?,
            crumb_items: parse_selector("li")?,
            crumb_fallback: parse_selector("a, span")?,
            rules: config.breadcrumb,
            purchase_controls: parse_selector(&config.purchase_controls)?,
            purchase_labels: config.purchase_labels.iter().map(|l| marker(l)).collect(),
            sold_out_labels: config.sold_out_labels.iter().map(|l| marker(l)).collect(),
            description_max_chars: config.description_max_chars,
        })
    }

    /// Parse one product page.
    ///
    /// Missing optional fields degrade to their defaults; only a page with
    /// no product name is an error.
    #[instrument(level = "debug", skip(self, markup))]
    pub fn extract(&self, markup: &str, page_url: &str) -> Result<ProductPage, ExtractError> {
        let doc = Html::parse_document(markup);
        let base = Url::parse(page_url).ok();

        let name = first_match(&self.name, &doc, non_empty).ok_or(ExtractError::MissingField("name"))?;
        let price = self.price(&doc);
        let description = first_match(&self.description, &doc, non_empty)
            .map(|text| self.truncate(&text))
            .unwrap_or_default();
        let image_url = first_match(&self.image, &doc, |c| resolve_image(base.as_ref(), c))
            .unwrap_or_default();
        let category_path = self.category_path(&doc, &name);
        let is_available = self.is_available(&doc);

        debug!(
            name = %name,
            price = ?price,
            available = is_available,
            path = ?category_path,
            "Extracted product page"
        );

        Ok(ProductPage {
            url: page_url.to_string(),
            name,
            price,
            description,
            image_url,
            is_available,
            category_path,
        })
    }

    fn price(&self, doc: &Html) -> Option<f64> {
        self.price.iter().find_map(|probe| {
            if probe.is_broad() {
                probe.first(doc, parse_price_strict)
            } else {
                probe.first(doc, parse_price)
            }
        })
    }

    fn truncate(&self, text: &str) -> String {
        if text.chars().count() <= self.description_max_chars {
            return text.to_string();
        }
        text.chars()
            .take(self.description_max_chars)
            .collect::<String>()
            .trim_end()
            .to_string()
    }

    /// Raw crumb labels from the first breadcrumb container that has any
    fn crumbs(&self, doc: &Html) -> Vec<String> {
        for selector in &self.breadcrumb_containers {
            for container in doc.select(selector) {
                let mut labels = Self::labels(container, &self.crumb_items);
                if labels.is_empty() {
                    labels = Self::labels(container, &self.crumb_fallback);
                }
                if !labels.is_empty() {
                    return labels;
                }
            }
        }
        Vec::new()
    }

    fn labels(container: ElementRef<'_>, items: &Selector) -> Vec<String> {
        container
            .select(items)
            .map(collapsed_text)
            .filter(|label| !label.is_empty())
            .collect()
    }

    fn category_path(&self, doc: &Html, name: &str) -> Vec<String> {
        let mut crumbs = self.crumbs(doc);
        if crumbs.last().is_some_and(|last| fold(last) == fold(name)) {
            crumbs.pop();
        }
        self.rules.clean(&crumbs)
    }

    /// True when some purchase control is present and usable
    fn is_available(&self, doc: &Html) -> bool {
        doc.select(&self.purchase_controls).any(|control| {
            let element = control.value();
            let label = match element.name() {
                "input" => element.attr("value").unwrap_or_default().to_string(),
                _ => collapsed_text(control),
            };
            let label = marker(&label);
            if !self.purchase_labels.iter().any(|l| label.contains(l.as_str())) {
                return false;
            }

            let disabled = element.attr("disabled").is_some()
                || element
                    .attr("aria-disabled")
                    .is_some_and(|v| v.eq_ignore_ascii_case("true"));
            let markers = marker(&format!("{} {}", element.attr("class").unwrap_or_default(), label));
            let sold_out = self
                .sold_out_labels
                .iter()
                .any(|l| markers.contains(l.as_str()));
            !disabled && !sold_out
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE_URL: &str = "https://cellphones.com.vn/iphone-15.html";

    fn extractor() -> Extractor {
        Extractor::new(ExtractorConfig::default()).unwrap()
    }

    fn product_page() -> String {
        r#"<html><head>
            <meta property="og:title" content="iPhone 15 | Chính hãng">
            <meta property="og:image" content="https://cdn.test/og.jpg">
            <meta name="description" content="Meta description">
        </head><body>
            <div class="breadcrumb"><ul>
                <li><a href="/">Trang chủ</a></li>
                <li><a href="/mobile.html">Điện thoại</a></li>
                <li><a href="/mobile/apple.html">Apple</a></li>
                <li><span>iPhone 15 128GB</span></li>
            </ul></div>
            <h1> iPhone 15
                 128GB </h1>
            <div class="box-gallery"><img data-src="/media/iphone-15.jpg"></div>
            <div class="product__price--show">27.280.000đ</div>
            <section>
                <h2>Tính năng nổi bật</h2>
                <ul><li>Chip A16 Bionic</li><li>Camera 48MP</li><li>Cổng USB-C</li></ul>
            </section>
            <button class="btn-buy">Mua ngay <small>Giao nhanh 2h</small></button>
        </body></html>"#
            .to_string()
    }

    #[test]
    fn test_full_page() {
        let page = extractor().extract(&product_page(), PAGE_URL).unwrap();

        assert_eq!(page.url, PAGE_URL);
        assert_eq!(page.name, "iPhone 15 128GB");
        assert_eq!(page.price, Some(27280000.0));
        assert_eq!(page.description, "Chip A16 Bionic • Camera 48MP • Cổng USB-C");
        assert_eq!(page.image_url, "https://cellphones.com.vn/media/iphone-15.jpg");
        assert!(page.is_available);
        assert_eq!(page.category_path, vec!["Điện thoại", "Apple"]);
    }

    #[test]
    fn test_missing_name_is_rejected() {
        let result = extractor().extract("<html><body><p>Nothing here</p></body></html>", PAGE_URL);
        assert!(matches!(result, Err(ExtractError::MissingField("name"))));
    }

    #[test]
    fn test_meta_fallbacks() {
        let markup = r#"<html><head>
            <meta property="og:title" content="Galaxy S24">
            <meta property="og:image" content="https://cdn.test/s24.jpg">
            <meta name="description" content="Flagship phone">
        </head><body></body></html>"#;
        let page = extractor().extract(markup, PAGE_URL).unwrap();

        assert_eq!(page.name, "Galaxy S24");
        assert_eq!(page.description, "Flagship phone");
        assert_eq!(page.image_url, "https://cdn.test/s24.jpg");
        assert_eq!(page.price, None);
        assert!(!page.is_available);
        assert!(page.category_path.is_empty());
    }

    #[test]
    fn test_price_from_labelled_container() {
        let markup = r#"<body><h1>Laptop X</h1>
            <div class="box"><span>Giá sản phẩm</span><p>31.990.000đ</p></div></body>"#;
        let page = extractor().extract(markup, PAGE_URL).unwrap();
        assert_eq!(page.price, Some(31990000.0));
    }

    #[test]
    fn test_price_from_page_text() {
        let markup = "<body><h1>Tai nghe</h1><p>Chỉ còn 990.000 VND hôm nay</p></body>";
        let page = extractor().extract(markup, PAGE_URL).unwrap();
        assert_eq!(page.price, Some(990000.0));
    }

    #[test]
    fn test_no_recognizable_price() {
        let markup = "<body><h1>Sản phẩm</h1><p>Liên hệ</p></body>";
        let page = extractor().extract(markup, PAGE_URL).unwrap();
        assert_eq!(page.price, None);
    }

    #[test]
    fn test_model_numbers_are_not_prices() {
        let markup = r#"<body><h1>iPhone 15 Pro Max 256GB</h1>
            <div class="product__price--show">Liên hệ</div>
            <p>Bảo hành 12 tháng, ra mắt 2023</p></body>"#;
        let page = extractor().extract(markup, PAGE_URL).unwrap();
        assert_eq!(page.price, None);
    }

    #[test]
    fn test_bare_amount_in_price_element() {
        let markup = r#"<body><h1>Ốp lưng</h1><div class="product__price--show">150.000</div></body>"#;
        let page = extractor().extract(markup, PAGE_URL).unwrap();
        assert_eq!(page.price, Some(150000.0));
    }

    #[test]
    fn test_inline_scripts_are_ignored() {
        let markup = r#"<html><head>
            <meta name="description" content="Meta description">
            <script>window.__DATA__ = {"label": "Giá sản phẩm 12.000.000đ"};</script>
        </head><body><h1>Galaxy A15</h1>
            <script>var section = "Tính năng nổi bật"; var items = "<li>Fake</li>";</script>
            <p>Liên hệ</p></body></html>"#;
        let page = extractor().extract(markup, PAGE_URL).unwrap();

        assert_eq!(page.name, "Galaxy A15");
        assert_eq!(page.price, None);
        assert_eq!(page.description, "Meta description");
    }

    #[test]
    fn test_description_is_truncated() {
        let config = ExtractorConfig {
            description_max_chars: 10,
            ..ExtractorConfig::default()
        };
        let markup = r#"<head><meta name="description" content="Điện thoại thông minh"></head><body><h1>P</h1></body>"#;
        let page = Extractor::new(config).unwrap().extract(markup, PAGE_URL).unwrap();
        assert_eq!(page.description, "Điện thoại");
    }

    #[test]
    fn test_disabled_control_is_unavailable() {
        let ex = extractor();
        for control in [
            "<button disabled>Mua ngay</button>",
            r#"<button aria-disabled="true">Mua ngay</button>"#,
            r#"<a class="btn out-of-stock" href="/cart">Thêm vào giỏ</a>"#,
            r#"<button class="btn sold-out">Add to cart</button>"#,
            "<button>Đăng ký nhận tin</button>",
        ] {
            let markup = format!("<body><h1>P</h1>{}</body>", control);
            let page = ex.extract(&markup, PAGE_URL).unwrap();
            assert!(!page.is_available, "{} should not be available", control);
        }
    }

    #[test]
    fn test_usable_control_is_available() {
        let ex = extractor();
        for control in [
            r#"<input type="submit" value="Add to cart">"#,
            r#"<a role="button" href="/cart">THÊM VÀO GIỎ</a>"#,
            r#"<div role="button">Buy now</div>"#,
        ] {
            let markup = format!("<body><h1>P</h1>{}</body>", control);
            let page = ex.extract(&markup, PAGE_URL).unwrap();
            assert!(page.is_available, "{} should be available", control);
        }
    }

    #[test]
    fn test_breadcrumb_without_list_items() {
        let markup = r#"<body>
            <nav aria-label="breadcrumb"><a href="/">Home</a> › <a>Laptop</a> › <span>Gaming</span></nav>
            <h1>ROG Strix</h1></body>"#;
        let page = extractor().extract(markup, PAGE_URL).unwrap();
        assert_eq!(page.category_path, vec!["Laptop", "Gaming"]);
    }

    #[test]
    fn test_image_rejects_non_http_references() {
        let markup = r#"<body><h1>P</h1><div class="box-gallery"><img src="data:image/png;base64,AAAA"></div>
            <img src="//cdn.test/p.png"></body>"#;
        let page = extractor().extract(markup, PAGE_URL).unwrap();
        assert_eq!(page.image_url, "https://cdn.test/p.png");
    }

    #[test]
    fn test_resolve_image() {
        let base = Url::parse(PAGE_URL).unwrap();
        assert_eq!(
            resolve_image(Some(&base), "/a.jpg").as_deref(),
            Some("https://cellphones.com.vn/a.jpg")
        );
        assert_eq!(resolve_image(None, "/a.jpg"), None);
        assert_eq!(resolve_image(Some(&base), "javascript:void(0)"), None);
    }
}
