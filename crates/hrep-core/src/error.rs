//! Error taxonomy for a replication run.
//!
//! Every variant is fatal; there is no retry. Each message names the phase
//! that failed so a single line on stderr tells the operator where to look.

use std::fmt;
use std::io;

/// Step of the replication protocol an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Probe,
    Download,
    Upload,
    Close,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Probe => "probe",
            Phase::Download => "download",
            Phase::Upload => "upload",
            Phase::Close => "close",
        };
        f.write_str(s)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReplicateError {
    /// Invalid input detected before any network activity.
    #[error("usage: {0}")]
    Usage(String),

    /// libcurl reported a network-layer failure (connect, DNS, reset...).
    #[error("{phase} {url}: {source}")]
    Transport {
        phase: Phase,
        url: String,
        #[source]
        source: curl::Error,
    },

    /// The curl multi handle driving the source stream failed.
    #[error("{phase} {url}: {source}")]
    Multi {
        phase: Phase,
        url: String,
        #[source]
        source: curl::MultiError,
    },

    #[error("{phase}: unexpected response code {code} from {url}")]
    UnexpectedStatus { phase: Phase, url: String, code: u32 },

    #[error("probe: {url} did not report a content length")]
    MissingLength { url: String },

    /// Source body ended before the declared length was streamed.
    #[error("upload: source ended after {streamed} of {declared} declared bytes")]
    SourceTruncated { declared: u64, streamed: u64 },

    /// Source body has bytes beyond the declared length.
    #[error("upload: source has more than the {declared} declared bytes")]
    SourceOverrun { declared: u64 },

    /// Reading the source body failed for a reason other than the above.
    #[error("download: reading source body failed: {0}")]
    SourceRead(#[source] io::Error),

    #[error("close: releasing source stream from {url} failed: {source}")]
    Release {
        url: String,
        #[source]
        source: curl::MultiError,
    },
}

pub type Result<T> = std::result::Result<T, ReplicateError>;

impl ReplicateError {
    pub(crate) fn transport(phase: Phase, url: &str, source: curl::Error) -> Self {
        ReplicateError::Transport {
            phase,
            url: url.to_string(),
            source,
        }
    }

    pub(crate) fn status(phase: Phase, url: &str, code: u32) -> Self {
        ReplicateError::UnexpectedStatus {
            phase,
            url: url.to_string(),
            code,
        }
    }

    /// Phase the error belongs to; `None` for usage errors.
    pub fn phase(&self) -> Option<Phase> {
        match self {
            ReplicateError::Usage(_) => None,
            ReplicateError::Transport { phase, .. }
            | ReplicateError::Multi { phase, .. }
            | ReplicateError::UnexpectedStatus { phase, .. } => Some(*phase),
            ReplicateError::MissingLength { .. } => Some(Phase::Probe),
            ReplicateError::SourceTruncated { .. } | ReplicateError::SourceOverrun { .. } => {
                Some(Phase::Upload)
            }
            ReplicateError::SourceRead(_) => Some(Phase::Download),
            ReplicateError::Release { .. } => Some(Phase::Close),
        }
    }

    pub fn is_usage(&self) -> bool {
        matches!(self, ReplicateError::Usage(_))
    }

    /// Wrap into an `io::Error` so it can cross a `Read` boundary.
    pub(crate) fn into_io(self) -> io::Error {
        io::Error::new(io::ErrorKind::Other, self)
    }

    /// Recover a `ReplicateError` that crossed a `Read` boundary, or classify
    /// a plain I/O failure as a source read error.
    pub(crate) fn from_io(err: io::Error) -> Self {
        let kind = err.kind();
        match err.into_inner() {
            Some(inner) => match inner.downcast::<ReplicateError>() {
                Ok(e) => *e,
                Err(inner) => ReplicateError::SourceRead(io::Error::new(kind, inner)),
            },
            None => ReplicateError::SourceRead(io::Error::from(kind)),
        }
    }
}
