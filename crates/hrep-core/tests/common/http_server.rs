//! Minimal HTTP/1.1 server for integration tests, acting as both source and
//! destination.
//!
//! Serves a single static body on HEAD/GET (with Range support) and accepts
//! PUT bodies, recording every request it sees. One request per connection.

#![allow(dead_code)]

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct ServerOptions {
    /// Status for HEAD.
    pub head_status: u16,
    /// If false, HEAD omits Content-Length.
    pub head_length: bool,
    /// Status for GET; None = 200, or 206 when a Range is honoured.
    pub get_status: Option<u16>,
    /// If false, GET ignores Range and always returns the full body.
    pub support_ranges: bool,
    /// Status for PUT.
    pub put_status: u16,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            head_status: 200,
            head_length: true,
            get_status: None,
            support_ranges: true,
            put_status: 201,
        }
    }
}

/// One request as seen by the server.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    /// False if the client went away before sending the declared body.
    pub complete: bool,
}

impl Recorded {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

pub struct TestServer {
    base: String,
    log: Arc<Mutex<Vec<Recorded>>>,
}

impl TestServer {
    /// URL of `path` on this server (path without leading slash).
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.log.lock().unwrap().clone()
    }

    pub fn requests_with_method(&self, method: &str) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method)
            .collect()
    }

    /// Polls until at least `count` requests with `method` were recorded
    /// (e.g. a PUT the client abandoned, logged once the socket closes).
    pub fn wait_for(&self, method: &str, count: usize) -> Vec<Recorded> {
        for _ in 0..100 {
            let found = self.requests_with_method(method);
            if found.len() >= count {
                return found;
            }
            thread::sleep(Duration::from_millis(50));
        }
        self.requests_with_method(method)
    }
}

pub fn start(body: Vec<u8>) -> TestServer {
    start_with_options(body, ServerOptions::default())
}

/// Starts the server in a background thread. Runs until the process exits.
pub fn start_with_options(body: Vec<u8>, opts: ServerOptions) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let body = Arc::new(body);
    let log = Arc::new(Mutex::new(Vec::new()));
    let log_srv = Arc::clone(&log);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let body = Arc::clone(&body);
            let log = Arc::clone(&log_srv);
            thread::spawn(move || handle(stream, &body, opts, &log));
        }
    });
    TestServer {
        base: format!("http://127.0.0.1:{}/", port),
        log,
    }
}

/// Reads the request head (up to the blank line) and any bytes after it.
fn read_head(stream: &mut TcpStream) -> Option<(String, Vec<u8>)> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 8192];
    loop {
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            let head = String::from_utf8_lossy(&buf[..pos]).into_owned();
            let rest = buf[pos + 4..].to_vec();
            return Some((head, rest));
        }
        match stream.read(&mut chunk) {
            Ok(0) | Err(_) => return None,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
}

fn handle(mut stream: TcpStream, body: &[u8], opts: ServerOptions, log: &Mutex<Vec<Recorded>>) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(10)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(10)));
    let (head, mut rest) = match read_head(&mut stream) {
        Some(v) => v,
        None => return,
    };
    let mut lines = head.lines();
    let request_line = lines.next().unwrap_or("");
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or("").to_string();
    let path = parts.next().unwrap_or("").to_string();
    let headers: Vec<(String, String)> = lines
        .filter_map(|l| l.split_once(':'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect();
    let mut recorded = Recorded {
        method: method.clone(),
        path,
        headers,
        body: Vec::new(),
        complete: true,
    };

    match method.as_str() {
        "HEAD" => {
            let length = if opts.head_length {
                format!("Content-Length: {}\r\n", body.len())
            } else {
                String::new()
            };
            let response = format!(
                "HTTP/1.1 {}\r\n{}Accept-Ranges: bytes\r\nConnection: close\r\n\r\n",
                status_text(opts.head_status),
                length
            );
            log.lock().unwrap().push(recorded);
            let _ = stream.write_all(response.as_bytes());
        }
        "GET" => {
            let range = recorded.header("range").and_then(parse_range);
            log.lock().unwrap().push(recorded);
            let total = body.len() as u64;
            let (mut status, slice) = match range {
                Some((start, end_incl)) if opts.support_ranges && start < total => {
                    let end_excl = (end_incl + 1).min(total) as usize;
                    (206, &body[start as usize..end_excl])
                }
                _ => (200, body),
            };
            if let Some(s) = opts.get_status {
                status = s;
            }
            let response = format!(
                "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                status_text(status),
                slice.len()
            );
            let _ = stream.write_all(response.as_bytes());
            let _ = stream.write_all(slice);
        }
        "PUT" => {
            let declared: usize = recorded
                .header("content-length")
                .and_then(|v| v.parse().ok())
                .unwrap_or(0);
            let mut chunk = [0u8; 8192];
            while rest.len() < declared {
                match stream.read(&mut chunk) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => rest.extend_from_slice(&chunk[..n]),
                }
            }
            recorded.complete = rest.len() == declared;
            recorded.body = rest;
            let complete = recorded.complete;
            log.lock().unwrap().push(recorded);
            if complete {
                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                    status_text(opts.put_status)
                );
                let _ = stream.write_all(response.as_bytes());
            }
        }
        _ => {
            log.lock().unwrap().push(recorded);
            let _ = stream
                .write_all(b"HTTP/1.1 405 Method Not Allowed\r\nContent-Length: 0\r\nConnection: close\r\n\r\n");
        }
    }
}

fn status_text(code: u16) -> String {
    let reason = match code {
        200 => "OK",
        201 => "Created",
        206 => "Partial Content",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        500 => "Internal Server Error",
        _ => "Status",
    };
    format!("{} {}", code, reason)
}

/// `bytes=X-Y` -> (X, Y).
fn parse_range(value: &str) -> Option<(u64, u64)> {
    let spec = value.trim().strip_prefix("bytes=")?;
    let (a, b) = spec.split_once('-')?;
    Some((a.trim().parse().ok()?, b.trim().parse().ok()?))
}
