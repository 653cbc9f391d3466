//! Size resolution: HTTP HEAD probe of the source, or range arithmetic.
//!
//! Uses the curl crate (libcurl) to fetch response headers and read the
//! source's `Content-Length`.

mod parse;

pub(crate) use parse::parse_status_line;

use std::str;

use crate::client::HttpClient;
use crate::error::{Phase, ReplicateError, Result};
use crate::range::ByteRange;
use crate::request::Endpoint;

/// Metadata returned by a HEAD request on the source.
#[derive(Debug, Clone, Default)]
pub struct ProbeResult {
    /// Status of the final response (after redirects).
    pub status: Option<u32>,
    /// Total size in bytes, if `Content-Length` is present and numeric.
    pub content_length: Option<u64>,
    /// True if server sent `Accept-Ranges: bytes`.
    pub accept_ranges: bool,
    pub etag: Option<String>,
    pub last_modified: Option<String>,
}

/// Performs a HEAD request against `source` and returns parsed metadata.
/// Any status other than 200 is an error.
pub fn probe(client: &HttpClient, source: &Endpoint) -> Result<ProbeResult> {
    let url = source.url();
    let fail = |e| ReplicateError::transport(Phase::Probe, url, e);
    let mut headers: Vec<String> = Vec::new();

    let mut easy = client.easy(source, &[]).map_err(fail)?;
    easy.nobody(true).map_err(fail)?; // HEAD request

    {
        let mut transfer = easy.transfer();
        transfer
            .header_function(|data| {
                if let Ok(s) = str::from_utf8(data) {
                    headers.push(s.trim_end().to_string());
                }
                true
            })
            .map_err(fail)?;
        transfer.perform().map_err(fail)?;
    }

    let code = easy.response_code().map_err(fail)?;
    if code != 200 {
        return Err(ReplicateError::status(Phase::Probe, url, code));
    }

    Ok(parse::parse_headers(&headers))
}

/// Number of bytes that will be replicated.
///
/// With a range the size is `end - start + 1` and no request is made;
/// otherwise the source is probed and its `Content-Length` is used.
pub fn resolve_size(
    client: &HttpClient,
    source: &Endpoint,
    range: Option<&ByteRange>,
) -> Result<u64> {
    if let Some(r) = range {
        return Ok(r.len());
    }
    let meta = probe(client, source)?;
    tracing::debug!(
        url = source.url(),
        accept_ranges = meta.accept_ranges,
        etag = ?meta.etag,
        last_modified = ?meta.last_modified,
        "source probed"
    );
    meta.content_length.ok_or_else(|| ReplicateError::MissingLength {
        url: source.url().to_string(),
    })
}
