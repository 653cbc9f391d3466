//! Validated transfer request: two endpoints and an optional byte range.

use crate::error::{ReplicateError, Result};
use crate::range::ByteRange;

/// An HTTP resource plus the optional token sent in the auth header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    url: String,
    token: Option<String>,
}

impl Endpoint {
    /// `role` is used in error messages only ("source", "destination").
    /// An empty token is treated as no token.
    pub fn new(role: &str, url: &str, token: Option<&str>) -> Result<Self> {
        let url = url.trim();
        if url.is_empty() {
            return Err(ReplicateError::Usage(format!("{} URL is required", role)));
        }
        let parsed = url::Url::parse(url)
            .map_err(|e| ReplicateError::Usage(format!("invalid {} URL {:?}: {}", role, url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ReplicateError::Usage(format!(
                "{} URL must be http or https, got {:?}",
                role,
                parsed.scheme()
            )));
        }
        let token = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string);
        Ok(Self {
            url: url.to_string(),
            token,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }
}

/// Everything one replication run needs. Built once from CLI input.
#[derive(Debug, Clone)]
pub struct TransferRequest {
    pub source: Endpoint,
    pub destination: Endpoint,
    pub range: Option<ByteRange>,
}

impl TransferRequest {
    pub fn new(source: Endpoint, destination: Endpoint, range: Option<ByteRange>) -> Self {
        Self {
            source,
            destination,
            range,
        }
    }

    /// Validate raw CLI values into a request. Fails with a usage error
    /// before any network activity.
    pub fn from_args(
        source: &str,
        source_token: Option<&str>,
        destination: &str,
        destination_token: Option<&str>,
        from_byte: Option<i64>,
        to_byte: Option<i64>,
    ) -> Result<Self> {
        if source.trim().is_empty() || destination.trim().is_empty() {
            return Err(ReplicateError::Usage(
                "source and destination are required".to_string(),
            ));
        }
        let source = Endpoint::new("source", source, source_token)?;
        let destination = Endpoint::new("destination", destination, destination_token)?;
        let range = ByteRange::from_bounds(from_byte, to_byte)?;
        Ok(Self::new(source, destination, range))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_args_full() {
        let req = TransferRequest::from_args(
            "http://src.example/a",
            Some("s3cret"),
            "https://dst.example/b",
            None,
            Some(100),
            Some(199),
        )
        .unwrap();
        assert_eq!(req.source.url(), "http://src.example/a");
        assert_eq!(req.source.token(), Some("s3cret"));
        assert_eq!(req.destination.token(), None);
        assert_eq!(req.range.unwrap().len(), 100);
    }

    #[test]
    fn empty_urls_rejected() {
        let err = TransferRequest::from_args("", None, "http://dst/b", None, None, None)
            .unwrap_err();
        assert!(err.is_usage());
        let err = TransferRequest::from_args("http://src/a", None, "  ", None, None, None)
            .unwrap_err();
        assert!(err.is_usage());
    }

    #[test]
    fn empty_token_is_none() {
        let ep = Endpoint::new("source", "http://src/a", Some("")).unwrap();
        assert!(ep.token().is_none());
    }

    #[test]
    fn non_http_scheme_rejected() {
        let err = Endpoint::new("source", "ftp://src/a", None).unwrap_err();
        assert!(err.is_usage());
        let err = Endpoint::new("source", "not a url", None).unwrap_err();
        assert!(err.is_usage());
    }

    #[test]
    fn inverted_range_rejected() {
        let err = TransferRequest::from_args(
            "http://src/a",
            None,
            "http://dst/b",
            None,
            Some(200),
            Some(100),
        )
        .unwrap_err();
        assert!(err.is_usage());
    }
}
