//! RAII guard that releases the source stream exactly once.

use std::ops::{Deref, DerefMut};

use crate::error::Result;

/// A resource with an explicit, fallible release step.
pub trait Release {
    fn release(&mut self) -> Result<()>;
}

/// Owns a stream and releases it on `close` or, failing that, on drop.
pub struct StreamGuard<S: Release> {
    stream: S,
    released: bool,
}

impl<S: Release> StreamGuard<S> {
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            released: false,
        }
    }

    /// Release now and report the outcome. Drop will not release again.
    pub fn close(mut self) -> Result<()> {
        self.released = true;
        self.stream.release()
    }
}

impl<S: Release> Deref for StreamGuard<S> {
    type Target = S;

    fn deref(&self) -> &S {
        &self.stream
    }
}

impl<S: Release> DerefMut for StreamGuard<S> {
    fn deref_mut(&mut self) -> &mut S {
        &mut self.stream
    }
}

impl<S: Release> Drop for StreamGuard<S> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if let Err(e) = self.stream.release() {
            tracing::warn!("release after failed run: {}", e);
        }
    }
}
