//! Error types for the push client.
//!
//! # Design
//! Only two kinds of failure ever leave the library as `Err`:
//! `ValidationError` is raised before any I/O when caller-supplied data
//! breaks a precondition, and `TransportError` describes a round-trip that
//! produced no usable response. Upstream failures (a non-zero `errcode`)
//! are data and travel inside `PushResponse` instead.

use thiserror::Error;

/// Caller input rejected before a request is sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A status query was given no message ids at all.
    #[error("message id collection is empty")]
    EmptyMessageIds,

    /// A status query contained an empty message id.
    #[error("message id collection has one or more empty values")]
    EmptyMessageId,

    /// A V3 audience selector lists more entries than the gateway accepts.
    #[error("audience {selector} count {count} exceeds {max}")]
    AudienceTooLarge {
        selector: &'static str,
        count: usize,
        max: usize,
    },

    /// The protocol generation has no such receiver type.
    #[error("{protocol} does not support receiver_type {code}")]
    UnsupportedReceiverType { protocol: &'static str, code: u8 },

    /// A V3 `time_to_live` is above the ten day ceiling.
    #[error("time_to_live {ttl} exceeds {max} seconds")]
    TimeToLiveTooLong { ttl: u32, max: u32 },

    /// The request payload could not be serialized.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

/// A request that never produced an HTTP response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The connection could not be established.
    #[error("connection failed: {0}")]
    Connect(String),

    /// The configured timeout elapsed.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// The proxy settings could not be turned into a usable proxy.
    #[error("invalid proxy settings: {0}")]
    Proxy(String),

    /// Any other I/O or protocol failure.
    #[error("transport failure: {0}")]
    Io(String),

    /// The executor returned without a response.
    #[error("no response received")]
    NoResponse,

    /// The background task running the request was cancelled or panicked.
    #[error("request task aborted: {0}")]
    Aborted(String),
}
