//! # Category Tree and Product Records
//!
//! Breadcrumb paths are folded into a tree of [`CategoryNode`]s. Each distinct
//! path (compared by its slugged canonical key, so case and accents do not
//! matter) becomes exactly one node whose identifier is derived from that key.
//! Nodes are created lazily, prefix by prefix, and never removed; the only
//! mutation after creation is the one-way upgrade of `is_popular`.

mod identity;
mod slug;

pub use identity::{DEFAULT_SITE_TAG, EntityKind, IdentityScheme};
pub use slug::{fold, slug};

use std::collections::{HashMap, HashSet};

use tracing::debug;
use uuid::Uuid;

/// Delimiter between slugged segments in a canonical category key
pub const KEY_DELIMITER: &str = "/";

/// Root categories treated as featured navigation entries by default
pub const DEFAULT_FEATURED: &[&str] = &[
    "điện thoại",
    "tablet",
    "laptop",
    "âm thanh",
    "đồng hồ",
    "phụ kiện",
    "tivi",
    "pc",
    "màn hình",
    "gia dụng",
    "camera",
    "điện máy",
];

/// One category in the tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryNode {
    /// Display names from the root down to this node
    pub path: Vec<String>,

    /// Canonical key the identifier is derived from
    pub key: String,

    pub id: Uuid,

    /// Identifier of the node one segment shorter; `None` for roots
    pub parent_id: Option<Uuid>,

    /// Reached through the featured navigation source
    pub is_popular: bool,
}

impl CategoryNode {
    /// Last segment of the path
    pub fn name(&self) -> &str {
        self.path.last().map(String::as_str).unwrap_or_default()
    }

    pub fn depth(&self) -> usize {
        self.path.len()
    }
}

/// A product ready for export, with its category resolved to an identifier
#[derive(Debug, Clone, PartialEq)]
pub struct ProductRecord {
    /// Derived from `url`
    pub id: Uuid,

    /// Canonical page URL
    pub url: String,

    pub name: String,

    /// Normalized price; `None` when the page showed no recognizable amount
    pub price: Option<f64>,

    pub description: String,

    pub image_url: String,

    pub is_available: bool,

    /// Category whose path equals the product's breadcrumb; `None` without one
    pub category_id: Option<Uuid>,
}

/// Growing set of categories, owned by a single run
#[derive(Debug, Clone, Default)]
pub struct CategoryTree {
    scheme: IdentityScheme,
    featured: HashSet<String>,
    nodes: Vec<CategoryNode>,
    by_key: HashMap<String, usize>,
    by_id: HashMap<Uuid, usize>,
}

impl CategoryTree {
    /// Create an empty tree.
    ///
    /// Root categories whose folded name appears in `featured` are marked
    /// popular when they are created or next seen.
    pub fn new<I, S>(scheme: IdentityScheme, featured: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            scheme,
            featured: featured.into_iter().map(|s| fold(s.as_ref())).collect(),
            ..Self::default()
        }
    }

    /// Tree with the default identity scheme and featured roots
    pub fn with_defaults() -> Self {
        Self::new(IdentityScheme::default(), DEFAULT_FEATURED.iter())
    }

    pub fn scheme(&self) -> &IdentityScheme {
        &self.scheme
    }

    /// Canonical key for a path, or `None` if no segment survives slugging
    pub fn key_for<S: AsRef<str>>(path: &[S]) -> Option<String> {
        let key = path
            .iter()
            .map(|s| slug(s.as_ref()))
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(KEY_DELIMITER);
        (!key.is_empty()).then_some(key)
    }

    /// Look up or create the node for `path` and every prefix of it.
    ///
    /// Returns the identifier of the full-path node, or `None` for an empty
    /// path. Idempotent: the same path always yields the same identifier and
    /// never a second node. `is_popular_hint` marks the full-path node popular;
    /// a popular node stays popular.
    pub fn ensure<S: AsRef<str>>(&mut self, path: &[S], is_popular_hint: bool) -> Option<Uuid> {
        let segments: Vec<(&str, String)> = path
            .iter()
            .map(|s| s.as_ref().trim())
            .map(|s| (s, slug(s)))
            .filter(|(_, key)| !key.is_empty())
            .collect();

        let mut key = String::new();
        let mut parent = None;
        for (depth, (_, segment_slug)) in segments.iter().enumerate() {
            if depth > 0 {
                key.push_str(KEY_DELIMITER);
            }
            key.push_str(segment_slug);

            let index = match self.by_key.get(&key) {
                Some(&index) => index,
                None => self.insert(&segments[..=depth], key.clone(), parent),
            };

            let featured = depth == 0 && self.featured.contains(&fold(segments[0].0));
            let hinted = is_popular_hint && depth + 1 == segments.len();
            if featured || hinted {
                self.nodes[index].is_popular = true;
            }
            parent = Some(self.nodes[index].id);
        }
        parent
    }

    fn insert(&mut self, segments: &[(&str, String)], key: String, parent_id: Option<Uuid>) -> usize {
        let id = self.scheme.identify(EntityKind::Category, &key);
        debug!("New category {} ({})", key, id);

        let index = self.nodes.len();
        self.nodes.push(CategoryNode {
            path: segments.iter().map(|(name, _)| name.to_string()).collect(),
            key: key.clone(),
            id,
            parent_id,
            is_popular: false,
        });
        self.by_key.insert(key, index);
        self.by_id.insert(id, index);
        index
    }

    pub fn get(&self, id: &Uuid) -> Option<&CategoryNode> {
        self.by_id.get(id).map(|&index| &self.nodes[index])
    }

    pub fn contains(&self, id: &Uuid) -> bool {
        self.by_id.contains_key(id)
    }

    /// Nodes in creation order
    pub fn nodes(&self) -> &[CategoryNode] {
        &self.nodes
    }

    /// Nodes ordered parents-first: by depth, then by key
    pub fn sorted(&self) -> Vec<&CategoryNode> {
        let mut nodes: Vec<&CategoryNode> = self.nodes.iter().collect();
        nodes.sort_by(|a, b| a.depth().cmp(&b.depth()).then_with(|| a.key.cmp(&b.key)));
        nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> CategoryTree {
        CategoryTree::with_defaults()
    }

    #[test]
    fn test_prefix_integrity() {
        let mut tree = tree();
        let leaf = tree.ensure(&["A", "B", "C"], false).unwrap();

        assert_eq!(tree.len(), 3);
        let a = &tree.nodes()[0];
        let b = &tree.nodes()[1];
        let c = &tree.nodes()[2];

        assert_eq!(a.path, vec!["A"]);
        assert_eq!(b.path, vec!["A", "B"]);
        assert_eq!(c.path, vec!["A", "B", "C"]);
        assert_eq!(a.parent_id, None);
        assert_eq!(b.parent_id, Some(a.id));
        assert_eq!(c.parent_id, Some(b.id));
        assert_eq!(c.id, leaf);
        assert_eq!(c.key, "a/b/c");
        assert_eq!(c.name(), "C");
    }

    #[test]
    fn test_ensure_is_idempotent() {
        let mut tree = tree();
        let first = tree.ensure(&["Smartphones", "Samsung Galaxy"], false);
        for _ in 0..10 {
            assert_eq!(tree.ensure(&["Smartphones", "Samsung Galaxy"], false), first);
        }
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn test_paths_match_ignoring_case_and_accents() {
        let mut tree = tree();
        let a = tree.ensure(&["Điện thoại", "Apple"], false);
        let b = tree.ensure(&["ĐIỆN THOẠI", " apple "], false);

        assert_eq!(a, b);
        assert_eq!(tree.len(), 2);
        // first-seen display names are kept
        assert_eq!(tree.nodes()[0].name(), "Điện thoại");
    }

    #[test]
    fn test_identifier_follows_key_not_order() {
        let mut forward = tree();
        forward.ensure(&["Laptop"], false);
        let x = forward.ensure(&["Tablet", "iPad"], false);

        let mut backward = tree();
        let y = backward.ensure(&["Tablet", "iPad"], false);

        assert_eq!(x, y);
        assert_eq!(
            x,
            Some(IdentityScheme::default().identify(EntityKind::Category, "tablet/ipad"))
        );
    }

    #[test]
    fn test_popular_hint_is_monotonic() {
        let mut tree = tree();
        let id = tree.ensure(&["Gaming Gear"], true).unwrap();
        tree.ensure(&["Gaming Gear"], false);

        assert!(tree.get(&id).unwrap().is_popular);
    }

    #[test]
    fn test_hint_applies_to_full_path_only() {
        let mut tree = tree();
        let leaf = tree.ensure(&["Gaming Gear", "Mice"], true).unwrap();
        let root = tree.get(&leaf).unwrap().parent_id.unwrap();

        assert!(tree.get(&leaf).unwrap().is_popular);
        assert!(!tree.get(&root).unwrap().is_popular);
    }

    #[test]
    fn test_featured_roots_are_popular() {
        let mut tree = tree();
        let leaf = tree.ensure(&["Điện thoại", "Samsung"], false).unwrap();
        let root = tree.get(&leaf).unwrap().parent_id.unwrap();

        assert!(tree.get(&root).unwrap().is_popular);
        assert!(!tree.get(&leaf).unwrap().is_popular);

        let other = tree.ensure(&["Sim thẻ"], false).unwrap();
        assert!(!tree.get(&other).unwrap().is_popular);
    }

    #[test]
    fn test_empty_path_has_no_node() {
        let mut tree = tree();
        assert_eq!(tree.ensure::<&str>(&[], false), None);
        assert_eq!(tree.ensure(&["»", " "], false), None);
        assert!(tree.is_empty());
    }

    #[test]
    fn test_sorted_is_parents_first() {
        let mut tree = tree();
        tree.ensure(&["B", "Y"], false);
        tree.ensure(&["A", "X", "Z"], false);

        let keys: Vec<&str> = tree.sorted().iter().map(|n| n.key.as_str()).collect();
        assert_eq!(keys, vec!["a", "b", "a/x", "b/y", "a/x/z"]);
    }

    #[test]
    fn test_key_for() {
        assert_eq!(
            CategoryTree::key_for(&["Điện thoại", "Samsung Galaxy"]),
            Some("dien-thoai/samsung-galaxy".to_string())
        );
        assert_eq!(CategoryTree::key_for::<&str>(&[]), None);
    }
}
