//! Protocol adapters: one request builder per gateway generation.
//!
//! # Design
//! `ProtocolAdapter` is the contract the client facade is generic over.
//! Each adapter validates its own message type and turns it into an
//! `HttpRequest` under its API path, using the shared codec and auth
//! helpers. Status queries are identical across generations and always go
//! to the report host under `/v2/`, even for V3 clients.

mod form;
mod v3;

pub use form::{Legacy, V2};
pub use v3::V3;

use std::time::Duration;

use url::form_urlencoded;

use crate::auth;
use crate::error::ValidationError;
use crate::http::{HttpMethod, HttpRequest};

/// Largest number of ids the gateway answers in one status query.
pub const MAX_QUERY_IDS: usize = 100;

/// Path prefix of the report host, shared by every generation.
pub const REPORT_PATH: &str = "/v2/";

/// Application credentials issued by the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub app_key: String,
    pub master_secret: String,
}

impl Credentials {
    pub fn new(app_key: impl Into<String>, master_secret: impl Into<String>) -> Self {
        Self {
            app_key: app_key.into(),
            master_secret: master_secret.into(),
        }
    }

    pub fn authorization(&self) -> String {
        auth::basic_auth_token(&self.app_key, &self.master_secret)
    }
}

/// Scheme-qualified host and port, e.g. `https://api.jpush.cn` and 443.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// `{host}:{port}{path}`; `path` starts and ends with `/`.
    pub fn base_url(&self, path: &str) -> String {
        format!("{}:{}{}", self.host.trim_end_matches('/'), self.port, path)
    }
}

/// Everything an adapter needs besides the message itself.
#[derive(Debug, Clone)]
pub struct RequestContext<'a> {
    pub endpoint: &'a Endpoint,
    pub credentials: &'a Credentials,
    pub send_identity: i32,
    pub timeout: Duration,
}

impl RequestContext<'_> {
    fn auth_header(&self) -> (String, String) {
        ("authorization".to_string(), self.credentials.authorization())
    }
}

pub trait ProtocolAdapter: Send + Sync + 'static {
    /// What a caller hands to `send_push_message` for this generation.
    type Message: Send + Sync + 'static;

    /// Short name used in log fields.
    const NAME: &'static str;

    /// Path prefix on the API host, e.g. `/v3/`.
    fn api_path(&self) -> &'static str;

    /// Path prefix on the report host.
    fn report_path(&self) -> &'static str {
        REPORT_PATH
    }

    /// Check generation-specific constraints before any I/O.
    fn validate(&self, message: &Self::Message) -> Result<(), ValidationError>;

    /// Build the `POST push` request. `ctx.endpoint` is the API host.
    fn build_send_request(
        &self,
        ctx: &RequestContext<'_>,
        message: &Self::Message,
    ) -> Result<HttpRequest, ValidationError>;

    /// Build the `GET received` request for at most `max_ids` ids; extra ids
    /// are dropped, order is kept. `ctx.endpoint` is the report host.
    fn build_status_request<S: AsRef<str>>(
        &self,
        ctx: &RequestContext<'_>,
        message_ids: &[S],
        max_ids: usize,
    ) -> HttpRequest {
        let joined = message_ids
            .iter()
            .take(max_ids)
            .map(AsRef::as_ref)
            .collect::<Vec<_>>()
            .join(",");
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("msg_ids", &joined)
            .finish();
        HttpRequest {
            method: HttpMethod::Get,
            url: format!("{}received?{query}", ctx.endpoint.base_url(self.report_path())),
            headers: vec![ctx.auth_header()],
            body: None,
            timeout: ctx.timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> Credentials {
        Credentials::new("app", "secret")
    }

    fn query_ids(req: &HttpRequest) -> Vec<String> {
        let (_, query) = req.url.split_once('?').unwrap();
        let (_, ids) = form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == "msg_ids")
            .unwrap();
        ids.split(',').map(str::to_string).collect()
    }

    #[test]
    fn base_url_joins_host_port_and_path() {
        let endpoint = Endpoint::new("https://api.jpush.cn/", 443);
        assert_eq!(endpoint.base_url("/v3/"), "https://api.jpush.cn:443/v3/");
    }

    #[test]
    fn status_request_uses_report_path_for_every_generation() {
        let endpoint = Endpoint::new("https://report.jpush.cn", 443);
        let creds = credentials();
        let ctx = RequestContext {
            endpoint: &endpoint,
            credentials: &creds,
            send_identity: 1,
            timeout: Duration::from_secs(5),
        };
        for req in [
            Legacy.build_status_request(&ctx, &["1", "2"], MAX_QUERY_IDS),
            V2.build_status_request(&ctx, &["1", "2"], MAX_QUERY_IDS),
            V3.build_status_request(&ctx, &["1", "2"], MAX_QUERY_IDS),
        ] {
            assert_eq!(req.method, HttpMethod::Get);
            assert!(req.url.starts_with("https://report.jpush.cn:443/v2/received?msg_ids="));
            assert_eq!(query_ids(&req), vec!["1", "2"]);
            assert_eq!(req.header("authorization"), Some("Basic YXBwOnNlY3JldA=="));
            assert_eq!(req.timeout, Duration::from_secs(5));
            assert!(req.body.is_none());
        }
    }

    #[test]
    fn status_request_truncates_to_first_hundred() {
        let endpoint = Endpoint::new("http://localhost", 10000);
        let creds = credentials();
        let ctx = RequestContext {
            endpoint: &endpoint,
            credentials: &creds,
            send_identity: 1,
            timeout: Duration::from_secs(30),
        };
        let ids: Vec<String> = (0..150).map(|i| format!("id{i}")).collect();
        let req = V3.build_status_request(&ctx, &ids, MAX_QUERY_IDS);
        let sent = query_ids(&req);
        assert_eq!(sent.len(), 100);
        assert_eq!(sent, ids[..100].to_vec());
    }
}
