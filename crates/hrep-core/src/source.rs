//! Source reader: streamed HTTP GET exposed as `std::io::Read`.
//!
//! The GET runs on its own `curl::multi` handle and is driven from `read`,
//! so there is a single thread of control. Body bytes land in a bounded
//! window; when the window is full the transfer is paused until the consumer
//! drains it.

use std::io::{self, Read};
use std::str;
use std::time::Duration;

use curl::easy::{Handler, WriteError};
use curl::multi::{Easy2Handle, Multi};

use crate::client::HttpClient;
use crate::error::{Phase, ReplicateError, Result};
use crate::guard::Release;
use crate::probe::parse_status_line;
use crate::range::ByteRange;
use crate::request::Endpoint;

const WAIT: Duration = Duration::from_millis(100);

fn accepted(status: u32) -> bool {
    status == 200 || status == 206
}

/// Easy2 handler: records the final status line and buffers body bytes.
pub(crate) struct SourceSink {
    status: Option<u32>,
    /// Set when body bytes arrived under a status other than 200/206.
    rejected: Option<u32>,
    window: Vec<u8>,
    pos: usize,
    capacity: usize,
    paused: bool,
    received: u64,
}

impl SourceSink {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            status: None,
            rejected: None,
            window: Vec::new(),
            pos: 0,
            capacity: capacity.max(1),
            paused: false,
            received: 0,
        }
    }

    fn pending(&self) -> usize {
        self.window.len() - self.pos
    }

    /// Copy buffered bytes into `out`; returns how many were copied.
    fn take_into(&mut self, out: &mut [u8]) -> usize {
        let n = self.pending().min(out.len());
        out[..n].copy_from_slice(&self.window[self.pos..self.pos + n]);
        self.pos += n;
        if self.pos == self.window.len() {
            self.window.clear();
            self.pos = 0;
        }
        n
    }
}

impl Handler for SourceSink {
    fn header(&mut self, data: &[u8]) -> bool {
        if let Ok(s) = str::from_utf8(data) {
            // A new status line starts a new response (redirect, 100-continue).
            if let Some(code) = parse_status_line(s) {
                self.status = Some(code);
            }
        }
        true
    }

    fn write(&mut self, data: &[u8]) -> std::result::Result<usize, WriteError> {
        match self.status {
            Some(code) if accepted(code) => {}
            other => {
                self.rejected = Some(other.unwrap_or(0));
                return Ok(0); // abort transfer
            }
        }
        if self.pending() >= self.capacity {
            self.paused = true;
            return Err(WriteError::Pause);
        }
        self.window.extend_from_slice(data);
        self.received += data.len() as u64;
        Ok(data.len())
    }
}

/// Live source body. Exclusively owned by the caller until released.
pub struct SourceStream {
    url: String,
    // Dropped before `multi`.
    handle: Option<Easy2Handle<SourceSink>>,
    multi: Multi,
    finished: Option<std::result::Result<(), curl::Error>>,
}

/// Opens a GET on `source`, restricted to `range` if given, and returns once
/// the final response status is known. Only 200 and 206 are accepted.
pub fn open(client: &HttpClient, source: &Endpoint, range: Option<&ByteRange>) -> Result<SourceStream> {
    let url = source.url();
    let fail = |e| ReplicateError::transport(Phase::Download, url, e);

    let sink = SourceSink::new(client.stream_buffer_bytes());
    let mut easy = client.easy2(sink, source).map_err(fail)?;
    easy.get(true).map_err(fail)?;
    if let Some(r) = range {
        tracing::info!("apply range: {}", r.header_value());
        easy.range(&r.curl_range()).map_err(fail)?;
    }

    tracing::info!("starting download from {}", url);
    let multi = Multi::new();
    let handle = multi.add2(easy).map_err(|e| ReplicateError::Multi {
        phase: Phase::Download,
        url: url.to_string(),
        source: e,
    })?;

    let mut stream = SourceStream {
        url: url.to_string(),
        handle: Some(handle),
        multi,
        finished: None,
    };
    stream.await_response()?;
    Ok(stream)
}

impl SourceStream {
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Body bytes received from the network so far.
    pub fn received(&self) -> u64 {
        self.handle.as_ref().map(|h| h.get_ref().received).unwrap_or(0)
    }

    fn multi_err(&self, e: curl::MultiError) -> ReplicateError {
        ReplicateError::Multi {
            phase: Phase::Download,
            url: self.url.clone(),
            source: e,
        }
    }

    /// Drive the transfer until body bytes are buffered, a status was
    /// rejected, or the transfer ended; then check the status.
    fn await_response(&mut self) -> Result<()> {
        loop {
            let sink = match self.handle.as_ref() {
                Some(h) => h.get_ref(),
                None => break,
            };
            if sink.rejected.is_some() || sink.pending() > 0 || self.finished.is_some() {
                break;
            }
            self.pump()?;
        }

        let (status, rejected) = match self.handle.as_ref() {
            Some(h) => (h.get_ref().status, h.get_ref().rejected),
            None => (None, None),
        };
        if let Some(code) = rejected {
            return Err(ReplicateError::status(Phase::Download, &self.url, code));
        }
        match self.finished.take() {
            Some(Err(e)) => return Err(ReplicateError::transport(Phase::Download, &self.url, e)),
            other => self.finished = other,
        }
        match status {
            Some(code) if accepted(code) => {
                tracing::debug!(status = code, url = %self.url, "source responded");
                Ok(())
            }
            other => Err(ReplicateError::status(
                Phase::Download,
                &self.url,
                other.unwrap_or(0),
            )),
        }
    }

    /// One step of the multi loop: resume a paused transfer, perform, collect
    /// completion, and wait for socket activity if nothing arrived.
    fn pump(&mut self) -> Result<()> {
        let handle = match self.handle.as_mut() {
            Some(h) => h,
            None => return Ok(()),
        };
        if handle.get_ref().paused && handle.get_ref().pending() < handle.get_ref().capacity {
            handle.get_mut().paused = false;
            handle
                .unpause_write()
                .map_err(|e| ReplicateError::transport(Phase::Download, &self.url, e))?;
        }

        let running = self.multi.perform().map_err(|e| self.multi_err(e))?;

        let mut done = None;
        let handle = match self.handle.as_ref() {
            Some(h) => h,
            None => return Ok(()),
        };
        self.multi.messages(|msg| {
            if let Some(result) = msg.result_for2(handle) {
                done = Some(result);
            }
        });
        if let Some(result) = done {
            self.finished = Some(result);
            return Ok(());
        }

        if running > 0 && handle.get_ref().pending() == 0 {
            self.multi
                .wait(&mut [], WAIT)
                .map_err(|e| self.multi_err(e))?;
        }
        Ok(())
    }
}

impl Read for SourceStream {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        if out.is_empty() {
            return Ok(0);
        }
        loop {
            let handle = self.handle.as_mut().ok_or_else(|| {
                io::Error::new(io::ErrorKind::Other, "source stream already released")
            })?;
            let n = handle.get_mut().take_into(out);
            if n > 0 {
                return Ok(n);
            }
            if let Some(rejected) = handle.get_ref().rejected {
                return Err(ReplicateError::status(Phase::Download, &self.url, rejected).into_io());
            }
            match &self.finished {
                Some(Ok(())) => return Ok(0),
                Some(Err(e)) => {
                    // curl::Error is not Clone; rebuild it from its code.
                    let e = curl::Error::new(e.code());
                    return Err(ReplicateError::transport(Phase::Download, &self.url, e).into_io());
                }
                None => self.pump().map_err(ReplicateError::into_io)?,
            }
        }
    }
}

impl Release for SourceStream {
    /// Detach the transfer from the multi handle and drop it, closing the
    /// connection. Idempotent.
    fn release(&mut self) -> Result<()> {
        if let Some(handle) = self.handle.take() {
            let easy = self.multi.remove2(handle).map_err(|e| ReplicateError::Release {
                url: self.url.clone(),
                source: e,
            })?;
            let received = easy.get_ref().received;
            drop(easy);
            tracing::debug!(url = %self.url, received, "source stream released");
        }
        Ok(())
    }
}
