//! Shared HTTP client settings.
//!
//! One `HttpClient` is built from the config at startup and passed by
//! reference to the probe, the source reader and the upload. It hands out
//! libcurl handles that already carry the common options.

use std::time::Duration;

use curl::easy::{Easy, Easy2, Handler, List};

use crate::config::HrepConfig;
use crate::request::Endpoint;

#[derive(Debug, Clone)]
pub struct HttpClient {
    auth_header: String,
    connect_timeout: Option<Duration>,
    follow_redirects: bool,
    max_redirections: u32,
    stream_buffer_bytes: usize,
    user_agent: Option<String>,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new(&HrepConfig::default())
    }
}

/// Options shared by `Easy` and `Easy2`; they expose the same setters but no common trait.
macro_rules! apply_common {
    ($client:expr, $easy:expr, $endpoint:expr, $headers:expr) => {{
        $easy.url($endpoint.url())?;
        if let Some(t) = $client.connect_timeout {
            $easy.connect_timeout(t)?;
        }
        // No overall timeout: bodies may be arbitrarily large or slow.
        $easy.follow_location($client.follow_redirects)?;
        $easy.max_redirections($client.max_redirections)?;
        if let Some(ua) = &$client.user_agent {
            $easy.useragent(ua)?;
        }
        $easy.http_headers($headers)?;
    }};
}

impl HttpClient {
    pub fn new(cfg: &HrepConfig) -> Self {
        let connect_timeout = match cfg.connect_timeout_secs {
            0 => None,
            s => Some(Duration::from_secs(s)),
        };
        Self {
            auth_header: cfg.auth_header.trim().to_string(),
            connect_timeout,
            follow_redirects: cfg.follow_redirects,
            max_redirections: cfg.max_redirections,
            stream_buffer_bytes: cfg.stream_buffer_bytes.max(1),
            user_agent: cfg.user_agent.clone(),
        }
    }

    /// In-memory window of the source stream.
    pub fn stream_buffer_bytes(&self) -> usize {
        self.stream_buffer_bytes
    }

    /// `Name: token` line for the auth header, or None when no token is set.
    pub(crate) fn auth_line(&self, token: Option<&str>) -> Option<String> {
        token.map(|t| format!("{}: {}", self.auth_header, t))
    }

    fn header_list(&self, endpoint: &Endpoint, extra: &[&str]) -> Result<List, curl::Error> {
        let mut list = List::new();
        if let Some(line) = self.auth_line(endpoint.token()) {
            list.append(&line)?;
        }
        for h in extra {
            list.append(h)?;
        }
        Ok(list)
    }

    /// Easy handle for callback-scoped transfers (probe, upload).
    pub(crate) fn easy(&self, endpoint: &Endpoint, extra_headers: &[&str]) -> Result<Easy, curl::Error> {
        let mut easy = Easy::new();
        let headers = self.header_list(endpoint, extra_headers)?;
        apply_common!(self, easy, endpoint, headers);
        Ok(easy)
    }

    /// Easy2 handle owning `handler`, for transfers driven on a multi handle.
    pub(crate) fn easy2<H: Handler>(&self, handler: H, endpoint: &Endpoint) -> Result<Easy2<H>, curl::Error> {
        let mut easy = Easy2::new(handler);
        let headers = self.header_list(endpoint, &[])?;
        apply_common!(self, easy, endpoint, headers);
        Ok(easy)
    }
}
