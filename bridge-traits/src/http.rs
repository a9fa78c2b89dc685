//! HTTP Transport Abstraction
//!
//! Blocking, streaming HTTP exchange used by the token manager and the fetch
//! engine. One call to [`HttpTransport::perform`] is one physical request;
//! retry policy lives in the caller.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::time::Duration;

use crate::error::Result;

/// HTTP method types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// HTTP request builder
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: HashMap<String, String>,
    pub body: Option<Bytes>,
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HashMap::new(),
            body: None,
            timeout: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, url)
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn bearer_token(self, token: impl Into<String>) -> Self {
        self.header("Authorization", format!("Bearer {}", token.into()))
    }

    /// Attach an `Authorization: Basic` header built from `user:password`.
    pub fn basic_auth(self, user: &str, password: &str) -> Self {
        let encoded = STANDARD.encode(format!("{}:{}", user, password));
        self.header("Authorization", format!("Basic {}", encoded))
    }

    pub fn body(mut self, body: Bytes) -> Self {
        self.body = Some(body);
        self
    }

    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }
}

/// Status line and headers of a completed exchange.
///
/// Header names are stored lowercased; lookups through [`ResponseHead::header`]
/// are case-insensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseHead {
    pub status: u16,
    pub headers: HashMap<String, String>,
}

impl ResponseHead {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: HashMap::new(),
        }
    }

    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(|v| v.trim())
    }

    /// Parse a header as an unsigned integer, ignoring surrounding whitespace.
    pub fn header_u64(&self, name: &str) -> Option<u64> {
        self.header(name).and_then(|v| v.parse().ok())
    }

    /// Check if response status is successful (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Delay requested by the `Retry-After` header.
    ///
    /// Accepts both delta-seconds and an HTTP-date; a date in the past yields
    /// a zero delay.
    pub fn retry_after(&self, now: DateTime<Utc>) -> Option<Duration> {
        let raw = self.header("retry-after")?;
        if let Ok(seconds) = raw.parse::<u64>() {
            return Some(Duration::from_secs(seconds));
        }
        let at = DateTime::parse_from_rfc2822(raw).ok()?.with_timezone(&Utc);
        Some((at - now).to_std().unwrap_or(Duration::ZERO))
    }
}

/// Destination for response body bytes.
///
/// Returning an error aborts the transfer; the transport reports it as a
/// failed exchange.
pub trait BodySink {
    fn write_chunk(&mut self, chunk: &[u8]) -> Result<()>;
}

impl BodySink for Vec<u8> {
    fn write_chunk(&mut self, chunk: &[u8]) -> Result<()> {
        self.extend_from_slice(chunk);
        Ok(())
    }
}

/// Blocking HTTP transport.
///
/// Implementations perform exactly one physical request per call and must:
/// - stream the body into `sink` in arrival order, only for 2xx statuses
/// - drain and discard non-2xx bodies without touching `sink`
/// - return `Ok` with the status whenever a response was received, including
///   4xx/5xx; `Err` is reserved for transfer-level failures
///
/// # Example
///
/// ```ignore
/// use bridge_traits::http::{HttpRequest, HttpTransport};
///
/// fn fetch(transport: &dyn HttpTransport) -> bridge_traits::error::Result<Vec<u8>> {
///     let mut body = Vec::new();
///     let request = HttpRequest::get("https://api.example.com/data").bearer_token("token");
///     let head = transport.perform(&request, &mut body)?;
///     assert!(head.is_success());
///     Ok(body)
/// }
/// ```
pub trait HttpTransport: Send + Sync {
    /// Execute one HTTP exchange
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Network connection fails
    /// - TLS validation fails
    /// - Request times out
    /// - The sink rejects a chunk
    fn perform(&self, request: &HttpRequest, sink: &mut dyn BodySink) -> Result<ResponseHead>;
}
