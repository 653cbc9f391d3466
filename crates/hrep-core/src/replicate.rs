//! Transfer orchestration: open source, resolve size, upload, release.
//!
//! Strictly linear, single pass, no retries. The first error ends the run;
//! the source stream is still released exactly once on the way out.

use crate::client::HttpClient;
use crate::config::HrepConfig;
use crate::error::Result;
use crate::guard::StreamGuard;
use crate::request::TransferRequest;
use crate::{probe, source, upload};

/// Result of a successful run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    /// Bytes written to the destination (always the declared length).
    pub bytes: u64,
}

/// Runs replication requests with one shared, configured client.
#[derive(Debug, Clone, Default)]
pub struct Replicator {
    client: HttpClient,
}

impl Replicator {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }

    pub fn from_config(cfg: &HrepConfig) -> Self {
        Self::new(HttpClient::new(cfg))
    }

    pub fn client(&self) -> &HttpClient {
        &self.client
    }

    pub fn run(&self, request: &TransferRequest) -> Result<Outcome> {
        let range = request.range.as_ref();

        let stream = source::open(&self.client, &request.source, range)?;
        let mut stream = StreamGuard::new(stream);

        let size = probe::resolve_size(&self.client, &request.source, range)?;
        tracing::info!("{} bytes will be replicated", size);

        upload::upload(&self.client, &request.destination, &mut *stream, size)?;
        tracing::debug!(received = stream.received(), "source drained");

        stream.close()?;
        tracing::info!("replication succeeded");
        Ok(Outcome { bytes: size })
    }
}
