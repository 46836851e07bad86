//! In-process stand-in for the JPush gateway.
//!
//! Serves `POST /v2/push` (form body), `POST /v3/push` (JSON body) and
//! `GET /v2/received`. Every push is accepted with a fresh numeric `msg_id`
//! and recorded in `MockState` together with its `Authorization` header, so
//! tests can check what actually went over the wire. Status queries answer
//! each id with one Android delivery and zero APNs sends.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    routing::{get, post},
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::{net::TcpListener, sync::RwLock};
use tracing::info;

const FIRST_MSG_ID: u64 = 1_613_113_584;

/// Reply to `POST push`, in the gateway's field names.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushReply {
    pub sendno: String,
    pub errcode: i64,
    pub errmsg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msg_id: Option<String>,
}

/// One entry of the `GET received` reply.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReply {
    pub msg_id: String,
    pub android_received: u64,
    pub ios_apns_sent: u64,
}

#[derive(Clone, Debug, PartialEq)]
pub enum PushBody {
    Form(BTreeMap<String, String>),
    Json(Value),
}

#[derive(Clone, Debug, PartialEq)]
pub struct ReceivedPush {
    pub path: &'static str,
    pub authorization: Option<String>,
    pub body: PushBody,
    /// The `msg_id` handed back, `None` when the push was rejected.
    pub msg_id: Option<String>,
}

#[derive(Debug)]
pub struct MockState {
    next_msg_id: AtomicU64,
    pub pushes: RwLock<Vec<ReceivedPush>>,
    /// Raw `msg_ids` parameter of every status query.
    pub status_queries: RwLock<Vec<String>>,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            next_msg_id: AtomicU64::new(FIRST_MSG_ID),
            pushes: RwLock::default(),
            status_queries: RwLock::default(),
        }
    }
}

pub type SharedState = Arc<MockState>;

impl MockState {
    pub fn shared() -> SharedState {
        Arc::new(Self::default())
    }

    fn allocate_msg_id(&self) -> String {
        self.next_msg_id.fetch_add(1, Ordering::Relaxed).to_string()
    }
}

#[derive(Deserialize)]
struct StatusQuery {
    #[serde(default)]
    msg_ids: String,
}

pub fn app() -> Router {
    app_with_state(MockState::shared())
}

pub fn app_with_state(state: SharedState) -> Router {
    Router::new()
        .route("/v2/push", post(push_form))
        .route("/v3/push", post(push_json))
        .route("/v2/received", get(received))
        .with_state(state)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

pub async fn run_with_state(listener: TcpListener, state: SharedState) -> Result<(), std::io::Error> {
    axum::serve(listener, app_with_state(state)).await
}

async fn push_form(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Form(fields): Form<BTreeMap<String, String>>,
) -> Json<PushReply> {
    let sendno = fields.get("sendno").cloned().unwrap_or_default();
    let reply = if fields.contains_key("receiver_type") {
        accepted(&state, sendno)
    } else {
        missing_parameter(sendno, "receiver_type")
    };
    info!(path = "/v2/push", fields = fields.len(), errcode = reply.errcode, "push received");
    record(&state, "/v2/push", &headers, PushBody::Form(fields), &reply).await;
    Json(reply)
}

async fn push_json(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<PushReply>) {
    let sendno = match &body["options"]["sendno"] {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        _ => String::new(),
    };
    let (status, reply) = if body.get("audience").is_some() {
        (StatusCode::OK, accepted(&state, sendno))
    } else {
        (StatusCode::BAD_REQUEST, missing_parameter(sendno, "audience"))
    };
    info!(path = "/v3/push", errcode = reply.errcode, "push received");
    record(&state, "/v3/push", &headers, PushBody::Json(body), &reply).await;
    (status, Json(reply))
}

async fn received(State(state): State<SharedState>, Query(query): Query<StatusQuery>) -> Json<Vec<StatusReply>> {
    info!(msg_ids = %query.msg_ids, "status query received");
    let replies = query
        .msg_ids
        .split(',')
        .filter(|id| !id.is_empty())
        .map(|id| StatusReply {
            msg_id: id.to_string(),
            android_received: 1,
            ios_apns_sent: 0,
        })
        .collect();
    state.status_queries.write().await.push(query.msg_ids);
    Json(replies)
}

fn accepted(state: &MockState, sendno: String) -> PushReply {
    PushReply {
        sendno,
        errcode: 0,
        errmsg: "Succeed".to_string(),
        msg_id: Some(state.allocate_msg_id()),
    }
}

fn missing_parameter(sendno: String, name: &str) -> PushReply {
    PushReply {
        sendno,
        errcode: 1002,
        errmsg: format!("{name} is required"),
        msg_id: None,
    }
}

async fn record(state: &MockState, path: &'static str, headers: &HeaderMap, body: PushBody, reply: &PushReply) {
    let authorization = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    state.pushes.write().await.push(ReceivedPush {
        path,
        authorization,
        body,
        msg_id: reply.msg_id.clone(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_reply_omits_missing_msg_id() {
        let reply = missing_parameter("7".to_string(), "audience");
        let json = serde_json::to_value(&reply).unwrap();
        assert_eq!(json["errcode"], 1002);
        assert_eq!(json["sendno"], "7");
        assert!(json.get("msg_id").is_none());
    }

    #[test]
    fn msg_ids_are_unique_and_increasing() {
        let state = MockState::default();
        let first = state.allocate_msg_id();
        let second = state.allocate_msg_id();
        assert_eq!(first, FIRST_MSG_ID.to_string());
        assert_eq!(second, (FIRST_MSG_ID + 1).to_string());
    }

    #[test]
    fn status_query_defaults_to_no_ids() {
        let query: StatusQuery = serde_json::from_str("{}").unwrap();
        assert!(query.msg_ids.is_empty());
    }
}
