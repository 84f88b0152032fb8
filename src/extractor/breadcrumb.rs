//! Breadcrumb cleanup rules

use std::collections::HashSet;

use crate::catalog::{fold, slug};

/// Default labels that are navigation chrome rather than categories
pub const DEFAULT_NOISE_LABELS: &[&str] = &["Trang chủ", "Home", "Tin tức", "News", "Blog"];

/// How a raw breadcrumb trail becomes a category path
#[derive(Debug, Clone)]
pub struct BreadcrumbRules {
    /// Labels dropped wherever they appear, compared accent- and case-insensitively
    pub noise_labels: Vec<String>,

    /// Maximum number of levels kept
    pub max_depth: usize,

    /// A label longer than this is taken to be the product title; the path ends before it
    pub max_label_chars: usize,
}

impl Default for BreadcrumbRules {
    fn default() -> Self {
        Self {
            noise_labels: DEFAULT_NOISE_LABELS.iter().map(|s| s.to_string()).collect(),
            max_depth: 3,
            max_label_chars: 60,
        }
    }
}

impl BreadcrumbRules {
    /// Turn raw crumb labels into a category path.
    ///
    /// Whitespace is collapsed; noise labels, one-character separators and
    /// labels without any letter or digit are dropped; repeats are removed
    /// (first one wins); the path stops at the first overlong label and is
    /// capped at `max_depth`.
    pub fn clean<S: AsRef<str>>(&self, crumbs: &[S]) -> Vec<String> {
        let noise: HashSet<String> = self.noise_labels.iter().map(|l| fold(l)).collect();
        let mut seen = HashSet::new();
        let mut path = Vec::new();

        for crumb in crumbs {
            let label = crumb.as_ref().split_whitespace().collect::<Vec<_>>().join(" ");
            if label.chars().count() <= 1 || slug(&label).is_empty() {
                continue;
            }
            let folded = fold(&label);
            if noise.contains(&folded) {
                continue;
            }
            if label.chars().count() > self.max_label_chars {
                break;
            }
            if !seen.insert(folded) {
                continue;
            }
            path.push(label);
            if path.len() >= self.max_depth {
                break;
            }
        }
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_home_marker_is_dropped() {
        let rules = BreadcrumbRules::default();
        assert_eq!(
            rules.clean(&["Trang chủ", "Smartphones", "Samsung Galaxy"]),
            vec!["Smartphones", "Samsung Galaxy"]
        );
    }

    #[test]
    fn test_noise_matching_ignores_case_and_accents() {
        let rules = BreadcrumbRules::default();
        assert_eq!(
            rules.clean(&["TRANG CHU", "tin tức", "Laptop", "blog"]),
            vec!["Laptop"]
        );
    }

    #[test]
    fn test_separators_and_repeats_are_dropped() {
        let rules = BreadcrumbRules::default();
        assert_eq!(
            rules.clean(&["Điện thoại", "›", "Điện thoại", "  Apple   iPhone "]),
            vec!["Điện thoại", "Apple iPhone"]
        );
    }

    #[test]
    fn test_product_title_ends_the_path() {
        let rules = BreadcrumbRules::default();
        let title = "iPhone 15 Pro Max 256GB | Chính hãng VN/A - bản mới nhất với nhiều màu";
        assert!(title.chars().count() > 60);
        assert_eq!(
            rules.clean(&["Điện thoại", "Apple", title, "Extra"]),
            vec!["Điện thoại", "Apple"]
        );
    }

    #[test]
    fn test_depth_is_capped() {
        let rules = BreadcrumbRules {
            max_depth: 2,
            ..BreadcrumbRules::default()
        };
        assert_eq!(rules.clean(&["A1", "B2", "C3"]), vec!["A1", "B2"]);
    }

    #[test]
    fn test_empty_trail() {
        let rules = BreadcrumbRules::default();
        assert!(rules.clean::<&str>(&[]).is_empty());
        assert!(rules.clean(&["Trang chủ"]).is_empty());
    }
}
