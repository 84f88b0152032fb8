//! Compression handling for sitemap bodies

use std::borrow::Cow;
use std::io::Read;

use flate2::read::GzDecoder;
use tracing::debug;

use super::error::SitemapError;

const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];

/// Whether the body starts with the gzip magic bytes
pub fn is_gzip(body: &[u8]) -> bool {
    body.starts_with(&GZIP_MAGIC)
}

/// Inflate a sitemap body if it is gzip-compressed.
///
/// Detection is by content. A `.gz` URL whose body is already plain XML is
/// passed through, since some servers decode on the fly.
pub fn decode_body<'a>(url: &str, body: &'a [u8]) -> Result<Cow<'a, [u8]>, SitemapError> {
    if !is_gzip(body) {
        if url.ends_with(".gz") {
            debug!("{} has a .gz suffix but a plain body", url);
        }
        return Ok(Cow::Borrowed(body));
    }

    let mut inflated = Vec::with_capacity(body.len() * 4);
    GzDecoder::new(body)
        .read_to_end(&mut inflated)
        .map_err(SitemapError::Decompress)?;
    debug!("inflated {} from {} to {} bytes", url, body.len(), inflated.len());
    Ok(Cow::Owned(inflated))
}
