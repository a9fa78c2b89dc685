//! HTTP Transport Implementation using Reqwest

use bridge_traits::{
    error::{BridgeError, Result},
    http::{BodySink, HttpMethod, HttpRequest, HttpTransport, ResponseHead},
};
use reqwest::blocking::Client;
use std::io::Read;
use std::time::Duration;
use tracing::{debug, trace, warn};

/// Size of the read buffer used to stream response bodies into a sink.
const CHUNK_SIZE: usize = 16 * 1024;

const USER_AGENT: &str = concat!("ringex-extract/", env!("CARGO_PKG_VERSION"));

/// Blocking reqwest-based transport
///
/// Provides:
/// - Connection pooling via reqwest
/// - TLS through rustls
/// - Chunked body delivery into a [`BodySink`]
///
/// Retrying is left to the caller; every `perform` is one physical request.
pub struct ReqwestHttpClient {
    client: Client,
}

impl ReqwestHttpClient {
    /// Create a new HTTP client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_options(None, USER_AGENT)
    }

    /// Create a new HTTP client with a whole-request timeout
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        Self::with_options(Some(timeout), USER_AGENT)
    }

    /// Create a new HTTP client with an optional timeout and custom user agent
    pub fn with_options(timeout: Option<Duration>, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .pool_max_idle_per_host(4)
            .user_agent(user_agent)
            .build()
            .map_err(|e| {
                BridgeError::NotAvailable(format!("HTTP client initialization failed: {}", e))
            })?;

        Ok(Self { client })
    }

    /// Convert bridge HttpMethod to reqwest Method
    fn convert_method(method: HttpMethod) -> reqwest::Method {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
        }
    }

    /// Build reqwest request from bridge request
    fn build_request(&self, request: &HttpRequest) -> reqwest::blocking::RequestBuilder {
        let method = Self::convert_method(request.method);
        let mut req = self.client.request(method, &request.url);

        for (key, value) in &request.headers {
            req = req.header(key.as_str(), value.as_str());
        }

        if let Some(body) = &request.body {
            req = req.body(body.to_vec());
        }

        if let Some(timeout) = request.timeout {
            req = req.timeout(timeout);
        }

        req
    }

    fn map_send_error(e: reqwest::Error) -> BridgeError {
        if e.is_timeout() {
            BridgeError::OperationFailed("Request timed out".to_string())
        } else if e.is_connect() {
            BridgeError::OperationFailed(format!("Connection failed: {}", e))
        } else {
            BridgeError::OperationFailed(e.to_string())
        }
    }
}

/// Copy a response body into `sink` in fixed-size chunks.
///
/// Returns the number of bytes delivered. A sink error stops the copy.
fn stream_body<R: Read>(reader: &mut R, sink: &mut dyn BodySink) -> Result<u64> {
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut total = 0u64;
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => return Ok(total),
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(BridgeError::Io(e)),
        };
        sink.write_chunk(&buf[..n])?;
        total += n as u64;
        trace!(chunk = n, total, "Delivered body chunk");
    }
}

impl HttpTransport for ReqwestHttpClient {
    fn perform(&self, request: &HttpRequest, sink: &mut dyn BodySink) -> Result<ResponseHead> {
        debug!(method = ?request.method, url = %request.url, "Executing HTTP request");

        let mut response = self
            .build_request(request)
            .send()
            .map_err(Self::map_send_error)?;

        let mut head = ResponseHead::new(response.status().as_u16());
        for (name, value) in response.headers() {
            if let Ok(v) = value.to_str() {
                head = head.with_header(name.as_str(), v);
            }
        }

        if head.is_success() {
            let received = stream_body(&mut response, sink)?;
            debug!(status = head.status, bytes = received, "HTTP request completed");
        } else {
            // Error bodies never reach the sink.
            if let Err(e) = std::io::copy(&mut response, &mut std::io::sink()) {
                warn!(error = %e, "Failed to drain error response body");
            }
            debug!(status = head.status, "HTTP request returned non-success status");
        }

        Ok(head)
    }
}
