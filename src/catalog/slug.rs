//! Canonical slugs for category names

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Fold a label to plain lowercase ASCII words separated by single spaces.
///
/// Accents are removed by canonical decomposition, `đ`/`Đ` fold to `d`, and
/// anything that is not an ASCII letter, digit, `-` or `|` becomes a space.
pub fn fold(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    for ch in label.nfd().filter(|c| !is_combining_mark(*c)) {
        let ch = match ch {
            'đ' | 'Đ' => 'd',
            c => c,
        };
        if ch.is_ascii_alphanumeric() || ch == '-' || ch == '|' {
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(' ');
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Slug for one path segment: `"Điện thoại"` becomes `"dien-thoai"`
pub fn slug(label: &str) -> String {
    fold(label)
        .replace(' ', "-")
        .trim_matches(|c| c == '-' || c == '|')
        .to_string()
}
