//! Reader adapter that enforces an exact body length.

use std::io::{self, Read};

use crate::error::ReplicateError;

/// Yields exactly `declared` bytes from `inner`.
///
/// Fails if `inner` ends early, or if `inner` still has data once `declared`
/// bytes were read. The excess check runs before the final chunk is returned,
/// so a consumer never sees a complete body of the wrong length.
pub(crate) struct ExactLength<R> {
    inner: R,
    declared: u64,
    remaining: u64,
    drained: bool,
}

impl<R: Read> ExactLength<R> {
    pub(crate) fn new(inner: R, declared: u64) -> Self {
        Self {
            inner,
            declared,
            remaining: declared,
            drained: false,
        }
    }

    /// Bytes handed out so far.
    pub(crate) fn streamed(&self) -> u64 {
        self.declared - self.remaining
    }

    /// Confirm the inner reader has nothing past the declared length.
    pub(crate) fn ensure_drained(&mut self) -> io::Result<()> {
        if self.drained {
            return Ok(());
        }
        let mut probe = [0u8; 1];
        if read_retrying(&mut self.inner, &mut probe)? > 0 {
            return Err(ReplicateError::SourceOverrun {
                declared: self.declared,
            }
            .into_io());
        }
        self.drained = true;
        Ok(())
    }
}

fn read_retrying<R: Read>(r: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    loop {
        match r.read(buf) {
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            other => return other,
        }
    }
}

impl<R: Read> Read for ExactLength<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.remaining == 0 {
            self.ensure_drained()?;
            return Ok(0);
        }
        if buf.is_empty() {
            return Ok(0);
        }
        let max = (buf.len() as u64).min(self.remaining) as usize;
        let n = read_retrying(&mut self.inner, &mut buf[..max])?;
        if n == 0 {
            return Err(ReplicateError::SourceTruncated {
                declared: self.declared,
                streamed: self.streamed(),
            }
            .into_io());
        }
        self.remaining -= n as u64;
        if self.remaining == 0 {
            self.ensure_drained()?;
        }
        Ok(n)
    }
}
