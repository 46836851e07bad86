//! Response mapping from raw HTTP results to domain results.
//!
//! # Design
//! Neither mapper returns an error or panics. A push that failed in transport
//! or came back unparseable becomes a `ServiceError` response carrying the
//! cause as its message; the gateway's own `errcode` decides the rest. A
//! reply without `errcode` is never a success: the V3 gateway reports
//! rejections as `{"error":{"code":..,"message":..}}`, which is classified by
//! that code instead, and anything else is a `ServiceError`. A status query that failed in any way maps to `None`, so callers only see
//! "no data", never why.

use serde::{Deserialize, Deserializer};

use crate::error::TransportError;
use crate::http::HttpResponse;
use crate::types::{PushMessageStatus, PushResponse, PushResponseCode};

/// Wire shape of `POST push` replies.
#[derive(Debug, Deserialize)]
struct PushReply {
    #[serde(default, deserialize_with = "string_or_number")]
    sendno: Option<String>,
    #[serde(default)]
    errcode: Option<i64>,
    #[serde(default)]
    errmsg: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    msg_id: Option<String>,
    #[serde(default)]
    error: Option<ErrorReply>,
}

/// V3 rejection body.
#[derive(Debug, Deserialize)]
struct ErrorReply {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    message: Option<String>,
}

/// Wire shape of one `GET received` entry.
#[derive(Debug, Deserialize)]
struct StatusReply {
    #[serde(default, deserialize_with = "string_or_number")]
    msg_id: Option<String>,
    #[serde(default)]
    android_received: Option<u64>,
    #[serde(default)]
    ios_apns_sent: Option<u64>,
}

pub fn map_push_response(raw: Result<HttpResponse, TransportError>) -> PushResponse {
    let response = match raw {
        Ok(response) => response,
        Err(err) => return PushResponse::service_error(err.to_string()),
    };

    let reply: PushReply = match serde_json::from_str(&response.body) {
        Ok(reply) => reply,
        Err(e) => {
            return PushResponse::service_error(format!(
                "HTTP {}: malformed push reply: {e}",
                response.status
            ))
        }
    };

    let Some(errcode) = reply.errcode else {
        return rejection(response.status, reply.error);
    };

    let code = PushResponseCode::from_code(errcode);
    let mut result = PushResponse {
        code,
        message: reply.errmsg,
        message_id: None,
        send_identity: None,
    };
    if code == PushResponseCode::Succeed {
        result.message_id = reply.msg_id;
        result.send_identity = reply.sendno;
    }
    result
}

fn rejection(status: u16, error: Option<ErrorReply>) -> PushResponse {
    let Some(error) = error else {
        return PushResponse::service_error(format!("HTTP {status}: push reply has no errcode"));
    };
    let code = match error.code.map(PushResponseCode::from_code) {
        Some(PushResponseCode::Succeed) | None => PushResponseCode::ServiceError,
        Some(code) => code,
    };
    PushResponse {
        code,
        message: Some(error.message.unwrap_or_else(|| format!("HTTP {status}: push rejected"))),
        message_id: None,
        send_identity: None,
    }
}

pub fn map_status_list(raw: Result<HttpResponse, TransportError>) -> Option<Vec<PushMessageStatus>> {
    let response = raw.ok()?;
    let replies: Vec<StatusReply> = serde_json::from_str(&response.body).ok()?;
    Some(
        replies
            .into_iter()
            .map(|reply| PushMessageStatus {
                message_id: reply.msg_id.unwrap_or_default(),
                android_delivered_count: reply.android_received,
                apple_push_notification_delivered_count: reply.ios_apns_sent,
            })
            .collect(),
    )
}

/// The gateway sends ids as strings on some endpoints and numbers on others.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(Option::<Raw>::deserialize(deserializer)?.map(|raw| match raw {
        Raw::Text(text) => text,
        Raw::Number(number) => number.to_string(),
    }))
}
