//! Client facade: validate, build, execute, map.
//!
//! # Design
//! `JPushClient` is generic over the protocol generation and the executor.
//! The protocol decides what a message looks like on the wire; the executor
//! performs the round-trip; `response` turns the result into domain values.
//! Building and mapping never touch the network, so `build_push_request` and
//! `build_status_request` are public for hosts that run their own I/O.
//!
//! Synchronous sends fold transport failures into a `ServiceError`
//! response. The async variants hand transport failures back as `Err` from
//! the returned future. Validation always happens up front, before any
//! request is started.
//!
//! Host, port and proxy live in the client's own `ClientConfig`. Overrides
//! take `&mut self`, so a client shared across threads has to be wrapped in
//! a lock by the caller before it can be reconfigured.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use crate::auth;
use crate::error::{TransportError, ValidationError};
use crate::http::{HttpExecutor, HttpRequest, HttpResponse, DEFAULT_TIMEOUT};
use crate::protocol::{Credentials, Endpoint, Legacy, ProtocolAdapter, RequestContext, MAX_QUERY_IDS, V2, V3};
use crate::response::{map_push_response, map_status_list};
use crate::transport::UreqExecutor;
use crate::types::{PushMessageStatus, PushResponse, ProxySettings};

const API_HOST_SSL: &str = "https://api.jpush.cn";
const API_HOST_PLAIN: &str = "http://api.jpush.cn";
const API_PORT_SSL: u16 = 443;
const API_PORT_PLAIN: u16 = 8800;
const REPORT_HOST: &str = "https://report.jpush.cn";
const REPORT_PORT: u16 = 443;

/// Where and how a client talks to the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api: Endpoint,
    pub report: Endpoint,
    pub proxy: Option<ProxySettings>,
    pub timeout: Duration,
}

impl ClientConfig {
    /// Production hosts. `use_ssl` only affects the API host; the report host
    /// is always HTTPS.
    pub fn new(use_ssl: bool) -> Self {
        let api = if use_ssl {
            Endpoint::new(API_HOST_SSL, API_PORT_SSL)
        } else {
            Endpoint::new(API_HOST_PLAIN, API_PORT_PLAIN)
        };
        Self {
            api,
            report: Endpoint::new(REPORT_HOST, REPORT_PORT),
            proxy: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(true)
    }
}

/// Outcome of a queued send, delivered once per `queue_push_message` call.
#[derive(Debug)]
pub enum PushDelivery<M> {
    /// The gateway answered. The response may still carry a failure code.
    Sent { message: M, response: PushResponse },
    /// No response was obtained.
    Failed { message: M, error: TransportError },
}

pub struct JPushClient<P: ProtocolAdapter, E: HttpExecutor = UreqExecutor> {
    protocol: P,
    credentials: Credentials,
    config: ClientConfig,
    executor: Arc<E>,
}

impl JPushClient<Legacy> {
    pub fn legacy(app_key: impl Into<String>, master_secret: impl Into<String>, use_ssl: bool) -> Self {
        Self::new(Legacy, Credentials::new(app_key, master_secret), ClientConfig::new(use_ssl))
    }
}

impl JPushClient<V2> {
    pub fn v2(app_key: impl Into<String>, master_secret: impl Into<String>, use_ssl: bool) -> Self {
        Self::new(V2, Credentials::new(app_key, master_secret), ClientConfig::new(use_ssl))
    }
}

impl JPushClient<V3> {
    /// V3 is only offered over HTTPS.
    pub fn v3(app_key: impl Into<String>, master_secret: impl Into<String>) -> Self {
        Self::new(V3, Credentials::new(app_key, master_secret), ClientConfig::new(true))
    }
}

impl<P: ProtocolAdapter> JPushClient<P> {
    pub fn new(protocol: P, credentials: Credentials, config: ClientConfig) -> Self {
        Self {
            protocol,
            credentials,
            config,
            executor: Arc::new(UreqExecutor),
        }
    }
}

impl<P: ProtocolAdapter, E: HttpExecutor> JPushClient<P, E> {
    /// Replace the executor, e.g. with a test double.
    pub fn with_executor<X: HttpExecutor>(self, executor: X) -> JPushClient<P, X> {
        JPushClient {
            protocol: self.protocol,
            credentials: self.credentials,
            config: self.config,
            executor: Arc::new(executor),
        }
    }

    pub fn with_proxy(mut self, proxy: ProxySettings) -> Self {
        self.config.proxy = Some(proxy);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn api_base_url(&self) -> String {
        self.config.api.base_url(self.protocol.api_path())
    }

    pub fn report_base_url(&self) -> String {
        self.config.report.base_url(self.protocol.report_path())
    }

    /// Point every later send at another API host.
    pub fn override_api_url(&mut self, host: impl Into<String>, port: u16) {
        self.config.api = Endpoint::new(host, port);
    }

    /// Point every later status query at another report host.
    pub fn override_report_url(&mut self, host: impl Into<String>, port: u16) {
        self.config.report = Endpoint::new(host, port);
    }

    pub fn generate_send_identity(&self) -> i32 {
        auth::derive_send_identity(Utc::now())
    }

    /// Validate `message` and build its push request with a fresh send identity.
    pub fn build_push_request(&self, message: &P::Message) -> Result<HttpRequest, ValidationError> {
        self.protocol.validate(message)?;
        let ctx = self.context(&self.config.api);
        self.protocol.build_send_request(&ctx, message)
    }

    /// Build a status query for at most the first 100 ids.
    ///
    /// Fails when `message_ids` is empty or any id is the empty string.
    pub fn build_status_request<S: AsRef<str>>(&self, message_ids: &[S]) -> Result<HttpRequest, ValidationError> {
        if message_ids.is_empty() {
            return Err(ValidationError::EmptyMessageIds);
        }
        if message_ids.iter().any(|id| id.as_ref().is_empty()) {
            return Err(ValidationError::EmptyMessageId);
        }
        if message_ids.len() > MAX_QUERY_IDS {
            debug!(requested = message_ids.len(), max = MAX_QUERY_IDS, "status query truncated");
        }
        let ctx = self.context(&self.config.report);
        Ok(self.protocol.build_status_request(&ctx, message_ids, MAX_QUERY_IDS))
    }

    /// Send and wait. Transport failures come back as a `ServiceError` response.
    pub fn send_push_message(&self, message: &P::Message) -> Result<PushResponse, ValidationError> {
        let request = self.build_push_request(message)?;
        let raw = self.executor.execute(&request, self.config.proxy.as_ref());
        if let Err(err) = &raw {
            warn!(protocol = P::NAME, url = %request.url, error = %err, "push transport failed");
        }
        let response = map_push_response(raw);
        log_push_outcome::<P>(&request, &response);
        Ok(response)
    }

    /// Start a send on the blocking pool and return a handle to its outcome.
    ///
    /// The request is in flight once this returns; dropping the future stops
    /// waiting but does not cancel the call.
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime.
    pub fn send_push_message_async(
        &self,
        message: &P::Message,
    ) -> Result<impl Future<Output = Result<PushResponse, TransportError>> + Send + 'static, ValidationError> {
        let request = self.build_push_request(message)?;
        let url = request.url.clone();
        let pending = self.spawn_execute(request);
        Ok(async move {
            let raw = pending.await.inspect_err(|err| {
                warn!(protocol = P::NAME, %url, error = %err, "push transport failed");
            })?;
            let response = map_push_response(Ok(raw));
            info!(protocol = P::NAME, %url, code = %response.code, "push completed");
            Ok(response)
        })
    }

    /// Send in the background and report the outcome on `deliveries`.
    ///
    /// Exactly one `PushDelivery` is sent per call unless the receiver has
    /// been dropped.
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime.
    pub fn queue_push_message(
        &self,
        message: P::Message,
        deliveries: UnboundedSender<PushDelivery<P::Message>>,
    ) -> Result<(), ValidationError> {
        let request = self.build_push_request(&message)?;
        let pending = self.spawn_execute(request);
        tokio::spawn(async move {
            let delivery = match pending.await {
                Ok(raw) => PushDelivery::Sent {
                    message,
                    response: map_push_response(Ok(raw)),
                },
                Err(error) => PushDelivery::Failed { message, error },
            };
            if deliveries.send(delivery).is_err() {
                debug!(protocol = P::NAME, "delivery receiver dropped");
            }
        });
        Ok(())
    }

    /// Query delivery counts. `None` when the query failed in any way.
    pub fn query_push_message_status<S: AsRef<str>>(
        &self,
        message_ids: &[S],
    ) -> Result<Option<Vec<PushMessageStatus>>, ValidationError> {
        let request = self.build_status_request(message_ids)?;
        let statuses = map_status_list(self.executor.execute(&request, self.config.proxy.as_ref()));
        if statuses.is_none() {
            warn!(protocol = P::NAME, url = %request.url, "status query returned no data");
        }
        Ok(statuses)
    }

    /// Async status query. Transport failures are `Err`; a reply that cannot
    /// be read is `Ok(None)`.
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime.
    pub fn query_push_message_status_async<S: AsRef<str>>(
        &self,
        message_ids: &[S],
    ) -> Result<
        impl Future<Output = Result<Option<Vec<PushMessageStatus>>, TransportError>> + Send + 'static,
        ValidationError,
    > {
        let request = self.build_status_request(message_ids)?;
        let url = request.url.clone();
        let pending = self.spawn_execute(request);
        Ok(async move {
            let raw = pending.await.inspect_err(|err| {
                warn!(protocol = P::NAME, %url, error = %err, "status query transport failed");
            })?;
            let statuses = map_status_list(Ok(raw));
            if statuses.is_none() {
                warn!(protocol = P::NAME, %url, "status query returned no data");
            }
            Ok(statuses)
        })
    }

    fn context<'a>(&'a self, endpoint: &'a Endpoint) -> RequestContext<'a> {
        RequestContext {
            endpoint,
            credentials: &self.credentials,
            send_identity: self.generate_send_identity(),
            timeout: self.config.timeout,
        }
    }

    fn spawn_execute(
        &self,
        request: HttpRequest,
    ) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send + 'static {
        let executor = Arc::clone(&self.executor);
        let proxy = self.config.proxy.clone();
        let task = tokio::task::spawn_blocking(move || executor.execute(&request, proxy.as_ref()));
        async move {
            match task.await {
                Ok(result) => result,
                Err(e) => Err(TransportError::Aborted(e.to_string())),
            }
        }
    }
}

fn log_push_outcome<P: ProtocolAdapter>(request: &HttpRequest, response: &PushResponse) {
    if response.is_success() {
        info!(
            protocol = P::NAME,
            url = %request.url,
            msg_id = response.message_id.as_deref().unwrap_or_default(),
            "push accepted"
        );
    } else {
        info!(
            protocol = P::NAME,
            url = %request.url,
            code = %response.code,
            message = response.message.as_deref().unwrap_or_default(),
            "push rejected"
        );
    }
}
