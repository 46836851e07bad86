//! HTTP transport types and the executor seam.
//!
//! # Design
//! Requests and responses are plain data. Protocol adapters build
//! `HttpRequest` values and the response mapper consumes `HttpResponse`
//! values without touching the network; an `HttpExecutor` performs the
//! round-trip in between. The default executor lives in `transport`, tests
//! plug in their own.
//!
//! All fields use owned types (`String`, `Vec`) so requests can be moved onto
//! a blocking task for the async operations.

use std::time::Duration;

use crate::error::TransportError;
use crate::types::ProxySettings;

/// Default per-request timeout applied by every client.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP method for a request. The upstream gateway only uses these two.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// An HTTP request described as plain data.
///
/// `url` is absolute, including any query string. `headers` already carry
/// the `authorization` and `content-type` values the gateway expects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
    pub timeout: Duration,
}

impl HttpRequest {
    /// First header value whose name matches `name`, ignoring ASCII case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// An HTTP response described as plain data.
///
/// Non-2xx statuses are still responses: the gateway reports failures in
/// the JSON body, so classification happens in `response`, not here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

/// Executes an `HttpRequest` against the network.
///
/// Implementations must return HTTP error statuses as `Ok(HttpResponse)`
/// and reserve `Err` for failures where no response was obtained.
pub trait HttpExecutor: Send + Sync + 'static {
    fn execute(
        &self,
        request: &HttpRequest,
        proxy: Option<&ProxySettings>,
    ) -> Result<HttpResponse, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lookup_ignores_case() {
        let req = HttpRequest {
            method: HttpMethod::Get,
            url: "http://localhost:10000/v2/received".to_string(),
            headers: vec![("Authorization".to_string(), "Basic abc".to_string())],
            body: None,
            timeout: DEFAULT_TIMEOUT,
        };
        assert_eq!(req.header("authorization"), Some("Basic abc"));
        assert_eq!(req.header("content-type"), None);
    }
}
