//! Destination writer: HTTP PUT with a pre-declared `Content-Length`,
//! body pulled from a reader as libcurl asks for it.

mod exact;

use std::io::{self, Read};

use curl::easy::ReadError;

use crate::client::HttpClient;
use crate::error::{Phase, ReplicateError, Result};
use crate::request::Endpoint;

use exact::ExactLength;

/// Keep this much of an error response body for the log.
const ERROR_BODY_LIMIT: usize = 512;

/// PUTs exactly `declared_len` bytes from `body` to `destination`.
///
/// The body is consumed once, in order, and never buffered as a whole.
/// Only 201 Created counts as success.
pub fn upload<R: Read>(
    client: &HttpClient,
    destination: &Endpoint,
    body: R,
    declared_len: u64,
) -> Result<()> {
    let url = destination.url();
    let fail = |e| ReplicateError::transport(Phase::Upload, url, e);

    let mut body = ExactLength::new(body, declared_len);
    if declared_len == 0 {
        // libcurl may never ask for an empty body; check the source up front.
        body.ensure_drained().map_err(ReplicateError::from_io)?;
    }

    // Empty `Expect:` stops libcurl waiting for 100-continue before streaming.
    let mut easy = client.easy(destination, &["Expect:"]).map_err(fail)?;
    // A redirect would need the body again.
    easy.follow_location(false).map_err(fail)?;
    easy.upload(true).map_err(fail)?; // PUT
    easy.in_filesize(declared_len).map_err(fail)?;

    let mut read_error: Option<io::Error> = None;
    let mut response_body: Vec<u8> = Vec::new();

    tracing::info!("starting upload to {} ({} bytes)", url, declared_len);
    let performed = {
        let mut transfer = easy.transfer();
        transfer
            .read_function(|buf| match body.read(buf) {
                Ok(n) => Ok(n),
                Err(e) => {
                    read_error = Some(e);
                    Err(ReadError::Abort)
                }
            })
            .map_err(fail)?;
        transfer
            .write_function(|data| {
                let room = ERROR_BODY_LIMIT.saturating_sub(response_body.len());
                response_body.extend_from_slice(&data[..data.len().min(room)]);
                Ok(data.len())
            })
            .map_err(fail)?;
        transfer.perform()
    };

    // A source failure aborts the PUT; report the cause, not curl's abort.
    if let Some(e) = read_error {
        return Err(ReplicateError::from_io(e));
    }
    performed.map_err(fail)?;

    let code = easy.response_code().map_err(fail)?;
    if code != 201 {
        tracing::debug!(
            status = code,
            body = %String::from_utf8_lossy(&response_body),
            "destination rejected upload"
        );
        return Err(ReplicateError::status(Phase::Upload, url, code));
    }

    let streamed = body.streamed();
    if streamed != declared_len {
        return Err(ReplicateError::SourceTruncated {
            declared: declared_len,
            streamed,
        });
    }
    Ok(())
}
