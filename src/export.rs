//! # Dataset Exporter
//!
//! Writes the run's categories and products as two CSV tables:
//!
//! - `categories.csv`: `id, name, parent_id, is_popular`, parents before children
//! - `products.csv`: `id, name, price, description, image_url, is_available, category_id`
//!
//! Empty optional values are written as empty cells. Every product's
//! `category_id` is checked against the tree before anything is written, so
//! the two tables are always relationally consistent.

use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::catalog::{CategoryNode, CategoryTree, ProductRecord};
use crate::error::Error as CrateError;
use crate::extractor::format_price;

/// File name of the categories table
pub const CATEGORIES_FILE: &str = "categories.csv";

/// File name of the products table
pub const PRODUCTS_FILE: &str = "products.csv";

/// Error type for export operations
#[derive(Debug, Error)]
pub enum ExportError {
    /// The output directory could not be created
    #[error("cannot create output directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A table could not be written
    #[error("cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// A product refers to a category the tree does not hold
    #[error("product {product} refers to unknown category {category_id}")]
    DanglingCategory { product: String, category_id: Uuid },
}

impl From<ExportError> for CrateError {
    fn from(err: ExportError) -> Self {
        CrateError::Export(err.to_string())
    }
}

/// What was written, and where
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub categories: usize,
    pub products: usize,
    pub categories_path: PathBuf,
    pub products_path: PathBuf,
}

#[derive(Debug, Serialize)]
struct CategoryRow<'a> {
    id: Uuid,
    name: &'a str,
    parent_id: Option<Uuid>,
    is_popular: bool,
}

impl<'a> From<&'a CategoryNode> for CategoryRow<'a> {
    fn from(node: &'a CategoryNode) -> Self {
        Self {
            id: node.id,
            name: node.name(),
            parent_id: node.parent_id,
            is_popular: node.is_popular,
        }
    }
}

#[derive(Debug, Serialize)]
struct ProductRow<'a> {
    id: Uuid,
    name: &'a str,
    price: String,
    description: &'a str,
    image_url: &'a str,
    is_available: bool,
    category_id: Option<Uuid>,
}

impl<'a> From<&'a ProductRecord> for ProductRow<'a> {
    fn from(product: &'a ProductRecord) -> Self {
        Self {
            id: product.id,
            name: &product.name,
            price: product.price.map(format_price).unwrap_or_default(),
            description: &product.description,
            image_url: &product.image_url,
            is_available: product.is_available,
            category_id: product.category_id,
        }
    }
}

/// Write both tables into `outdir`, creating it if needed.
///
/// Runs after every product has been routed through the tree. Fails without
/// writing anything if a product refers to a category missing from `tree`.
#[instrument(skip(tree, products), fields(categories = tree.len(), products = products.len()))]
pub fn export(
    tree: &CategoryTree,
    products: &[ProductRecord],
    outdir: &Path,
) -> Result<ExportSummary, ExportError> {
    if let Some(product) = products
        .iter()
        .find(|p| p.category_id.is_some_and(|id| !tree.contains(&id)))
    {
        return Err(ExportError::DanglingCategory {
            product: product.url.clone(),
            category_id: product.category_id.unwrap_or_default(),
        });
    }

    std::fs::create_dir_all(outdir).map_err(|source| ExportError::CreateDir {
        path: outdir.to_path_buf(),
        source,
    })?;

    let categories_path = outdir.join(CATEGORIES_FILE);
    let products_path = outdir.join(PRODUCTS_FILE);

    let categories = tree.sorted();
    write_table(&categories_path, categories.iter().map(|node| CategoryRow::from(*node)))?;
    write_table(&products_path, products.iter().map(ProductRow::from))?;

    info!(
        "Wrote {} categories to {} and {} products to {}",
        categories.len(),
        categories_path.display(),
        products.len(),
        products_path.display()
    );

    Ok(ExportSummary {
        categories: categories.len(),
        products: products.len(),
        categories_path,
        products_path,
    })
}

fn write_table<R, I>(path: &Path, rows: I) -> Result<(), ExportError>
where
    R: Serialize,
    I: IntoIterator<Item = R>,
{
    let wrap = |source: csv::Error| ExportError::Write {
        path: path.to_path_buf(),
        source,
    };

    let mut writer = csv::Writer::from_path(path).map_err(wrap)?;
    for row in rows {
        writer.serialize(row).map_err(wrap)?;
    }
    writer.flush().map_err(|e| wrap(e.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{EntityKind, IdentityScheme};
    use tempfile::tempdir;

    fn product(tree: &mut CategoryTree, url: &str, path: &[&str], price: Option<f64>) -> ProductRecord {
        ProductRecord {
            id: IdentityScheme::default().identify(EntityKind::Product, url),
            url: url.to_string(),
            name: format!("Product {}", url.len()),
            price,
            description: "A • B".to_string(),
            image_url: "https://cdn.test/p.jpg".to_string(),
            is_available: true,
            category_id: tree.ensure(path, false),
        }
    }

    fn lines(path: &Path) -> Vec<String> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_tables_are_written() {
        let dir = tempdir().unwrap();
        let mut tree = CategoryTree::with_defaults();
        let products = vec![
            product(&mut tree, "https://shop.test/a.html", &["Điện thoại", "Apple"], Some(27280000.0)),
            product(&mut tree, "https://shop.test/b.html", &["Điện thoại", "Apple"], None),
        ];

        let summary = export(&tree, &products, dir.path()).unwrap();
        assert_eq!(summary.categories, 2);
        assert_eq!(summary.products, 2);

        let categories = lines(&summary.categories_path);
        assert_eq!(categories[0], "id,name,parent_id,is_popular");
        let root = &tree.sorted()[0];
        assert_eq!(categories[1], format!("{},Điện thoại,,true", root.id));
        assert_eq!(categories[2], format!("{},Apple,{},false", tree.sorted()[1].id, root.id));

        let rows = lines(&summary.products_path);
        assert_eq!(
            rows[0],
            "id,name,price,description,image_url,is_available,category_id"
        );
        let leaf = products[0].category_id.unwrap();
        assert_eq!(
            rows[1],
            format!(
                "{},Product 24,27280000.0,A • B,https://cdn.test/p.jpg,true,{}",
                products[0].id, leaf
            )
        );
        assert!(rows[2].contains(",Product 24,,A • B,"));
        assert!(rows[2].ends_with(&leaf.to_string()));
    }

    #[test]
    fn test_parents_written_first() {
        let dir = tempdir().unwrap();
        let mut tree = CategoryTree::with_defaults();
        tree.ensure(&["Z", "Deep", "Deeper"], false);
        tree.ensure(&["A"], false);

        let summary = export(&tree, &[], dir.path()).unwrap();
        let names: Vec<String> = lines(&summary.categories_path)
            .iter()
            .skip(1)
            .map(|l| l.split(',').nth(1).unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["A", "Z", "Deep", "Deeper"]);
    }

    #[test]
    fn test_missing_outdir_is_created() {
        let dir = tempdir().unwrap();
        let outdir = dir.path().join("nested").join("out");
        let summary = export(&CategoryTree::with_defaults(), &[], &outdir).unwrap();

        assert!(summary.categories_path.exists());
        assert!(summary.products_path.exists());
    }

    #[test]
    fn test_fields_with_commas_are_quoted() {
        let dir = tempdir().unwrap();
        let mut tree = CategoryTree::with_defaults();
        let mut record = product(&mut tree, "https://shop.test/c.html", &["Laptop"], None);
        record.name = "Laptop, 16GB".to_string();

        let summary = export(&tree, &[record], dir.path()).unwrap();
        let rows = lines(&summary.products_path);
        assert!(rows[1].contains(",\"Laptop, 16GB\","));
    }

    #[test]
    fn test_product_without_category() {
        let dir = tempdir().unwrap();
        let mut tree = CategoryTree::with_defaults();
        let record = product(&mut tree, "https://shop.test/d.html", &[], None);
        assert_eq!(record.category_id, None);

        let summary = export(&tree, &[record], dir.path()).unwrap();
        let rows = lines(&summary.products_path);
        assert!(rows[1].ends_with(",true,"));
    }

    #[test]
    fn test_dangling_category_is_rejected() {
        let dir = tempdir().unwrap();
        let mut other = CategoryTree::with_defaults();
        let record = product(&mut other, "https://shop.test/e.html", &["Elsewhere"], None);

        let result = export(&CategoryTree::with_defaults(), &[record], dir.path());
        assert!(matches!(result, Err(ExportError::DanglingCategory { .. })));
        assert!(!dir.path().join(PRODUCTS_FILE).exists());
    }

    #[test]
    fn test_unwritable_outdir_fails() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let result = export(&CategoryTree::with_defaults(), &[], &blocker.join("out"));
        assert!(matches!(result, Err(ExportError::CreateDir { .. })));
    }
}
