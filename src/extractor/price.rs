//! Normalization of localized price text
//!
//! Grammar, applied to free text (case-insensitive):
//!
//! ```text
//! amount  := grouped | digits
//! grouped := digit{1,3} ( sep digit{3} )+      sep := "." | ","
//! digits  := digit+
//! suffix  := ws* ( "₫" | "đ" | "vnđ" | "vnd" )
//! price   := amount suffix?
//! ```
//!
//! Grouping separators are thousands separators; the currency has no minor
//! unit, so `27.280.000đ` and `27,280,000 VND` both read as `27280000.0`.
//! The first amount carrying a currency suffix wins; without one, the first
//! amount in the text is used. Text with no digits has no price.
//!
//! [`parse_price_strict`] accepts suffixed amounts only. It is meant for
//! broad sources such as whole-page text, where a bare number is more likely
//! a model name, a storage size or a year than a price.

use std::sync::OnceLock;

use regex::Regex;

fn amount_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)([0-9]{1,3}(?:[.,][0-9]{3})+|[0-9]+)\s*(₫|(?:vnđ|vnd|đ)\b)?")
            .expect("price pattern is valid")
    })
}

/// Parse the first price in `text`, or `None` if there is no amount
pub fn parse_price(text: &str) -> Option<f64> {
    let mut first = None;
    for caps in amount_pattern().captures_iter(text) {
        let amount = caps.get(1)?.as_str();
        if caps.get(2).is_some() {
            return to_number(amount);
        }
        if first.is_none() {
            first = Some(amount);
        }
    }
    first.and_then(to_number)
}

/// Parse the first amount in `text` that carries a currency suffix
pub fn parse_price_strict(text: &str) -> Option<f64> {
    amount_pattern()
        .captures_iter(text)
        .find(|caps| caps.get(2).is_some())
        .and_then(|caps| caps.get(1))
        .and_then(|amount| to_number(amount.as_str()))
}

fn to_number(amount: &str) -> Option<f64> {
    amount.replace(['.', ','], "").parse::<f64>().ok()
}

/// Render a price the way the products table expects: a plain decimal
pub fn format_price(price: f64) -> String {
    if price.fract() == 0.0 {
        format!("{:.1}", price)
    } else {
        price.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dot_grouped_with_suffix() {
        assert_eq!(parse_price("27.280.000đ"), Some(27280000.0));
        assert_eq!(parse_price("27.280.000 đ"), Some(27280000.0));
        assert_eq!(parse_price("27.280.000₫"), Some(27280000.0));
    }

    #[test]
    fn test_comma_grouped_and_word_suffix() {
        assert_eq!(parse_price("27,280,000 VND"), Some(27280000.0));
        assert_eq!(parse_price("Giá: 990.000 vnđ"), Some(990000.0));
    }

    #[test]
    fn test_suffixed_amount_preferred() {
        assert_eq!(
            parse_price("Trả góp 0% - 12 tháng | Giá sản phẩm 31.990.000đ"),
            Some(31990000.0)
        );
    }

    #[test]
    fn test_suffix_must_end_a_word() {
        // "đ" starting "điểm" (points) is not a currency suffix
        assert_eq!(parse_price("Tích 12 điểm, giá 5.000.000đ"), Some(5000000.0));
    }

    #[test]
    fn test_bare_amount_used_without_suffix() {
        assert_eq!(parse_price("Price 1.250.000"), Some(1250000.0));
        assert_eq!(parse_price("450000"), Some(450000.0));
    }

    #[test]
    fn test_no_digits_is_none() {
        assert_eq!(parse_price("Liên hệ"), None);
        assert_eq!(parse_price(""), None);
        assert_eq!(parse_price("đ"), None);
    }

    #[test]
    fn test_strict_requires_suffix() {
        assert_eq!(parse_price_strict("iPhone 15 Pro Max 256GB Liên hệ"), None);
        assert_eq!(parse_price_strict("Price 1.250.000"), None);
        assert_eq!(
            parse_price_strict("iPhone 15 256GB, giá 27.280.000đ"),
            Some(27280000.0)
        );
        assert_eq!(parse_price_strict("990.000 VND"), Some(990000.0));
    }

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(27280000.0), "27280000.0");
        assert_eq!(format_price(19.5), "19.5");
    }
}
