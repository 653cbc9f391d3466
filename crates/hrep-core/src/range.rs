//! Inclusive byte range requested from the source.

use std::fmt;

use crate::error::{ReplicateError, Result};

/// A byte range `[start, end]` (both inclusive), as sent in `Range: bytes=start-end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    /// First byte offset (inclusive).
    pub start: u64,
    /// Last byte offset (inclusive).
    pub end: u64,
}

impl ByteRange {
    pub fn new(start: u64, end: u64) -> Result<Self> {
        if start > end {
            return Err(ReplicateError::Usage(format!(
                "from-byte ({}) must not exceed to-byte ({})",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// Build a range from the raw `--from-byte` / `--to-byte` values.
    ///
    /// A range only exists when both bounds are given; a lone bound is ignored
    /// and the whole resource is replicated.
    pub fn from_bounds(from: Option<i64>, to: Option<i64>) -> Result<Option<Self>> {
        let from = from.map(|v| non_negative("from-byte", v)).transpose()?;
        let to = to.map(|v| non_negative("to-byte", v)).transpose()?;
        match (from, to) {
            (Some(start), Some(end)) => Ok(Some(Self::new(start, end)?)),
            (None, None) => Ok(None),
            (start, end) => {
                tracing::warn!(
                    ?start,
                    ?end,
                    "both from-byte and to-byte are needed for a range; replicating the whole resource"
                );
                Ok(None)
            }
        }
    }

    /// Number of bytes covered by the range.
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// Value for curl's `CURLOPT_RANGE` (`start-end`, no unit).
    pub(crate) fn curl_range(&self) -> String {
        format!("{}-{}", self.start, self.end)
    }

    /// HTTP `Range` header value: `bytes=start-end`.
    pub fn header_value(&self) -> String {
        format!("bytes={}", self.curl_range())
    }
}

impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

fn non_negative(flag: &str, value: i64) -> Result<u64> {
    u64::try_from(value)
        .map_err(|_| ReplicateError::Usage(format!("{} must be non-negative, got {}", flag, value)))
}
