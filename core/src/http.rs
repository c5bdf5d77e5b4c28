//! HTTP transport types and the blocking GET seam.
//!
//! # Design
//! Requests and responses are plain data. The fetcher builds an `HttpRequest`,
//! hands it to a `Transport`, and validates the returned `HttpResponse`
//! without caring how the bytes moved. `UreqTransport` is the production
//! implementation; tests plug in canned transports.
//!
//! Any status code is a valid response here. Only failures that prevent an
//! exchange from completing (DNS, refused connection, timeout, bad URL) are
//! `TransportError`s.

use crate::error::TransportError;

/// A GET request described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Executes one blocking GET.
pub trait Transport {
    fn get(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// `Transport` backed by a `ureq` agent using the library's default timeouts
/// and headers.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        // 4xx/5xx come back as data so the fetcher can report the status.
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    #[tracing::instrument(level = "trace", skip(self))]
    fn get(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut response = self.agent.get(&request.url).call()?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        // Invalid UTF-8 still completes the exchange; the JSON check reports it.
        let bytes = response.body_mut().read_to_vec()?;
        let body = String::from_utf8_lossy(&bytes).into_owned();

        tracing::trace!(status, bytes = body.len(), "received response");

        Ok(HttpResponse { status, headers, body })
    }
}
