//! Client core for the JPush push-notification gateway.
//!
//! # Overview
//! Turns typed messages into authenticated HTTP requests for one of three
//! protocol generations (legacy, V2, V3), executes them through a pluggable
//! `HttpExecutor`, and maps gateway replies back into `PushResponse` and
//! `PushMessageStatus` values.
//!
//! # Design
//! - `JPushClient<P, E>` is the facade. `P` picks the protocol generation,
//!   `E` the executor (`UreqExecutor` unless replaced).
//! - Request building (`protocol`, `codec`, `auth`) and reply mapping
//!   (`response`) are pure; only the executor does I/O.
//! - Gateway failure codes are data inside `PushResponse`. `Err` is reserved
//!   for rejected input (`ValidationError`) and, on async paths, for requests
//!   that got no response (`TransportError`).

pub mod auth;
pub mod client;
pub mod codec;
pub mod error;
pub mod http;
pub mod protocol;
pub mod response;
pub mod transport;
pub mod types;

pub use client::{ClientConfig, JPushClient, PushDelivery};
pub use error::{TransportError, ValidationError};
pub use http::{HttpExecutor, HttpMethod, HttpRequest, HttpResponse, DEFAULT_TIMEOUT};
pub use protocol::{Credentials, Endpoint, Legacy, ProtocolAdapter, V2, V3};
pub use transport::UreqExecutor;
pub use types::{Platforms, ProxySettings, PushMessageStatus, PushResponse, PushResponseCode};
