//! Parsing of sitemap XML into index or urlset documents

use quick_xml::Reader;
use quick_xml::events::Event;

use super::error::SitemapError;

/// Which of the two sitemap shapes a document has
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SitemapKind {
    /// `<sitemapindex>` listing further sitemaps
    Index,
    /// `<urlset>` listing pages
    UrlSet,
}

/// A parsed sitemap: its kind and every `<loc>` in document order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitemapDocument {
    pub kind: SitemapKind,
    pub locations: Vec<String>,
}

fn root_kind(name: &[u8]) -> Result<SitemapKind, SitemapError> {
    match name {
        b"sitemapindex" => Ok(SitemapKind::Index),
        b"urlset" => Ok(SitemapKind::UrlSet),
        other => Err(SitemapError::Malformed(format!(
            "unexpected root element <{}>",
            String::from_utf8_lossy(other)
        ))),
    }
}

fn entry_tag(kind: SitemapKind) -> &'static [u8] {
    match kind {
        SitemapKind::Index => b"sitemap",
        SitemapKind::UrlSet => b"url",
    }
}

/// Parse a decompressed sitemap body.
///
/// Only `<loc>` elements directly inside `<sitemap>` (for an index) or `<url>`
/// (for a urlset) are collected; image and video extension `<loc>`s nested
/// deeper are ignored. Namespace prefixes are ignored.
pub fn parse_sitemap(bytes: &[u8]) -> Result<SitemapDocument, SitemapError> {
    let mut reader = Reader::from_reader(bytes);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut kind = None;
    let mut locations = Vec::new();
    let mut depth = 0usize;
    let mut in_entry = false;
    let mut in_loc = false;
    let mut loc = String::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                let name = e.local_name();
                match kind {
                    None => kind = Some(root_kind(name.as_ref())?),
                    Some(k) if depth == 1 => in_entry = name.as_ref() == entry_tag(k),
                    Some(_) if depth == 2 && in_entry && name.as_ref() == b"loc" => {
                        in_loc = true;
                        loc.clear();
                    }
                    Some(_) => {}
                }
                depth += 1;
            }
            Event::Empty(e) => {
                if kind.is_none() {
                    // self-closing root: an empty but valid sitemap
                    let kind = root_kind(e.local_name().as_ref())?;
                    return Ok(SitemapDocument {
                        kind,
                        locations,
                    });
                }
            }
            Event::Text(e) if in_loc => {
                loc.push_str(&e.unescape()?);
            }
            Event::CData(e) if in_loc => {
                loc.push_str(&String::from_utf8_lossy(&e.into_inner()));
            }
            Event::End(e) => {
                depth = depth.saturating_sub(1);
                if in_loc && e.local_name().as_ref() == b"loc" {
                    in_loc = false;
                    let value = loc.trim();
                    if !value.is_empty() {
                        locations.push(value.to_string());
                    }
                }
                if depth <= 1 {
                    in_entry = false;
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    match kind {
        None => Err(SitemapError::Malformed("empty document".to_string())),
        Some(_) if depth != 0 => Err(SitemapError::Malformed("truncated document".to_string())),
        Some(kind) => Ok(SitemapDocument { kind, locations }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_urlset() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
            <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9"
                    xmlns:image="http://www.google.com/schemas/sitemap-image/1.1">
              <url>
                <loc>https://example.com/a.html</loc>
                <image:image><image:loc>https://cdn.example.com/a.png</image:loc></image:image>
              </url>
              <url><loc> https://example.com/b.html?x=1&amp;y=2 </loc></url>
            </urlset>"#;

        let doc = parse_sitemap(xml.as_bytes()).unwrap();
        assert_eq!(doc.kind, SitemapKind::UrlSet);
        assert_eq!(
            doc.locations,
            vec![
                "https://example.com/a.html".to_string(),
                "https://example.com/b.html?x=1&y=2".to_string(),
            ]
        );
    }

    #[test]
    fn test_parse_index() {
        let xml = r#"<sitemapindex>
              <sitemap><loc>https://example.com/product-sitemap1.xml</loc></sitemap>
              <sitemap><loc><![CDATA[https://example.com/product-sitemap2.xml.gz]]></loc></sitemap>
            </sitemapindex>"#;

        let doc = parse_sitemap(xml.as_bytes()).unwrap();
        assert_eq!(doc.kind, SitemapKind::Index);
        assert_eq!(doc.locations.len(), 2);
        assert_eq!(doc.locations[1], "https://example.com/product-sitemap2.xml.gz");
    }

    #[test]
    fn test_self_closing_root_is_empty() {
        let doc = parse_sitemap(b"<?xml version=\"1.0\"?><urlset/>").unwrap();
        assert_eq!(doc.kind, SitemapKind::UrlSet);
        assert!(doc.locations.is_empty());
    }

    #[test]
    fn test_empty_body_is_malformed() {
        assert!(matches!(parse_sitemap(b""), Err(SitemapError::Malformed(_))));
        assert!(matches!(parse_sitemap(b"   "), Err(SitemapError::Malformed(_))));
    }

    #[test]
    fn test_html_soft_404_is_malformed() {
        let result = parse_sitemap(b"<html><body>Not found</body></html>");
        assert!(matches!(result, Err(SitemapError::Malformed(_))));
    }

    #[test]
    fn test_truncated_document_is_rejected() {
        let result = parse_sitemap(b"<urlset><url><loc>https://example.com/a</loc>");
        assert!(result.is_err());
    }

    #[test]
    fn test_mismatched_tags_are_rejected() {
        let result = parse_sitemap(b"<urlset><url><loc>x</url></loc></urlset>");
        assert!(result.is_err());
    }
}
