//! Blocking `HttpExecutor` backed by ureq.
//!
//! # Design
//! An agent is built per request so each call honours its own timeout and
//! proxy. HTTP error statuses come back as data (`http_status_as_error` is
//! off); only failures without a response become `TransportError`.

use tracing::{debug, warn};
use ureq::{Agent, Proxy, RequestBuilder};

use crate::error::TransportError;
use crate::http::{HttpExecutor, HttpMethod, HttpRequest, HttpResponse};
use crate::types::ProxySettings;

/// Default executor used by every client unless replaced with
/// `JPushClient::with_executor`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UreqExecutor;

impl HttpExecutor for UreqExecutor {
    fn execute(&self, request: &HttpRequest, proxy: Option<&ProxySettings>) -> Result<HttpResponse, TransportError> {
        let agent = agent_for(request, proxy)?;

        let result = match (request.method, request.body.as_deref()) {
            (HttpMethod::Get, _) => with_headers(agent.get(&request.url), request).call(),
            (HttpMethod::Post, Some(body)) => with_headers(agent.post(&request.url), request).send(body.as_bytes()),
            (HttpMethod::Post, None) => with_headers(agent.post(&request.url), request).send_empty(),
        };
        let mut response = result.map_err(|e| {
            warn!(url = %request.url, error = %e, "request failed");
            TransportError::from(e)
        })?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| Some((name.as_str().to_string(), value.to_str().ok()?.to_string())))
            .collect();
        let body = response.body_mut().read_to_string()?;
        debug!(url = %request.url, status, bytes = body.len(), "response received");

        Ok(HttpResponse { status, headers, body })
    }
}

fn agent_for(request: &HttpRequest, proxy: Option<&ProxySettings>) -> Result<Agent, TransportError> {
    let proxy = match proxy.filter(|p| p.enabled) {
        Some(settings) => resolve_proxy(settings)?,
        None => None,
    };
    Ok(Agent::config_builder()
        .http_status_as_error(false)
        .timeout_global(Some(request.timeout))
        .proxy(proxy)
        .build()
        .new_agent())
}

/// An empty proxy URL means "whatever the environment says".
fn resolve_proxy(settings: &ProxySettings) -> Result<Option<Proxy>, TransportError> {
    if settings.url.trim().is_empty() {
        return Ok(Proxy::try_from_env());
    }
    let uri = match settings.credentials() {
        Some((user, password)) => {
            let mut url = url::Url::parse(&settings.url).map_err(|e| TransportError::Proxy(e.to_string()))?;
            url.set_username(user)
                .and_then(|()| url.set_password(Some(password)))
                .map_err(|()| TransportError::Proxy(format!("{} cannot carry credentials", settings.url)))?;
            url.to_string()
        }
        None => settings.url.clone(),
    };
    if !settings.domain.is_empty() {
        debug!(domain = %settings.domain, "proxy domain is not used by this transport");
    }
    Proxy::new(&uri).map(Some).map_err(|e| TransportError::Proxy(e.to_string()))
}

fn with_headers<B>(mut builder: RequestBuilder<B>, request: &HttpRequest) -> RequestBuilder<B> {
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}

impl From<ureq::Error> for TransportError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Timeout(_) => TransportError::Timeout(err.to_string()),
            ureq::Error::HostNotFound | ureq::Error::ConnectionFailed | ureq::Error::Io(_) => {
                TransportError::Connect(err.to_string())
            }
            ureq::Error::InvalidProxyUrl => TransportError::Proxy(err.to_string()),
            other => TransportError::Io(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proxy_credentials_are_embedded_in_the_uri() {
        let settings = ProxySettings::new("http://proxy.local:8888").with_credentials("bob", "s3cret");
        assert!(resolve_proxy(&settings).unwrap().is_some());
    }

    #[test]
    fn unparseable_proxy_is_rejected() {
        let settings = ProxySettings::new("not a url").with_credentials("bob", "pw");
        assert!(matches!(resolve_proxy(&settings), Err(TransportError::Proxy(_))));
    }

    #[test]
    fn timeout_error_maps_to_timeout() {
        let err = TransportError::from(ureq::Error::Timeout(ureq::Timeout::Global));
        assert!(matches!(err, TransportError::Timeout(_)));
        let err = TransportError::from(ureq::Error::ConnectionFailed);
        assert!(matches!(err, TransportError::Connect(_)));
    }
}
