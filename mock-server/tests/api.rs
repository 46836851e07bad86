use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, app_with_state, MockState, PushBody, PushReply, StatusReply};
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn form_request(body: &str) -> Request<String> {
    Request::builder()
        .method("POST")
        .uri("/v2/push")
        .header(http::header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .header(http::header::AUTHORIZATION, "Basic YXBwOnNlY3JldA==")
        .body(body.to_string())
        .unwrap()
}

fn json_request(body: &str) -> Request<String> {
    Request::builder()
        .method("POST")
        .uri("/v3/push")
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

// --- /v2/push ---

#[tokio::test]
async fn form_push_is_accepted_and_recorded() {
    let state = MockState::shared();
    let resp = app_with_state(state.clone())
        .oneshot(form_request(
            "receiver_type=4&msg_type=1&msg_content=%7B%22n_content%22%3A%22hello%22%7D&platform=android&sendno=629378330&app_key=app",
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let reply: PushReply = body_json(resp).await;
    assert_eq!(reply.errcode, 0);
    assert_eq!(reply.sendno, "629378330");
    assert!(reply.msg_id.is_some());

    let pushes = state.pushes.read().await;
    assert_eq!(pushes.len(), 1);
    assert_eq!(pushes[0].path, "/v2/push");
    assert_eq!(pushes[0].authorization.as_deref(), Some("Basic YXBwOnNlY3JldA=="));
    assert_eq!(pushes[0].msg_id, reply.msg_id);
    match &pushes[0].body {
        PushBody::Form(fields) => {
            assert_eq!(fields["msg_content"], r#"{"n_content":"hello"}"#);
            assert_eq!(fields["platform"], "android");
        }
        other => panic!("unexpected body {other:?}"),
    }
}

#[tokio::test]
async fn form_push_without_receiver_type_is_rejected() {
    let resp = app().oneshot(form_request("msg_type=1&sendno=5")).await.unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let reply: PushReply = body_json(resp).await;
    assert_eq!(reply.errcode, 1002);
    assert_eq!(reply.sendno, "5");
    assert!(reply.msg_id.is_none());
}

// --- /v3/push ---

#[tokio::test]
async fn json_push_echoes_numeric_sendno() {
    let state = MockState::shared();
    let resp = app_with_state(state.clone())
        .oneshot(json_request(
            r#"{"platform":"all","audience":"all","options":{"sendno":42,"apns_production":false}}"#,
        ))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let reply: PushReply = body_json(resp).await;
    assert_eq!(reply.errcode, 0);
    assert_eq!(reply.sendno, "42");

    let pushes = state.pushes.read().await;
    assert_eq!(pushes[0].path, "/v3/push");
    assert!(pushes[0].authorization.is_none());
    assert!(matches!(&pushes[0].body, PushBody::Json(body) if body["audience"] == "all"));
}

#[tokio::test]
async fn json_push_without_audience_is_bad_request() {
    let resp = app().oneshot(json_request(r#"{"platform":"all"}"#)).await.unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let reply: PushReply = body_json(resp).await;
    assert_eq!(reply.errcode, 1002);
    assert_eq!(reply.sendno, "");
}

#[tokio::test]
async fn json_push_malformed_body_is_client_error() {
    let resp = app().oneshot(json_request("{not json")).await.unwrap();
    assert!(resp.status().is_client_error());
}

// --- /v2/received ---

#[tokio::test]
async fn received_answers_every_id() {
    let state = MockState::shared();
    let resp = app_with_state(state.clone())
        .oneshot(
            Request::builder()
                .uri("/v2/received?msg_ids=abc123%2C456")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let statuses: Vec<StatusReply> = body_json(resp).await;
    assert_eq!(
        statuses,
        vec![
            StatusReply {
                msg_id: "abc123".to_string(),
                android_received: 1,
                ios_apns_sent: 0,
            },
            StatusReply {
                msg_id: "456".to_string(),
                android_received: 1,
                ios_apns_sent: 0,
            },
        ]
    );
    assert_eq!(*state.status_queries.read().await, vec!["abc123,456".to_string()]);
}

#[tokio::test]
async fn received_without_ids_is_empty_list() {
    let resp = app()
        .oneshot(Request::builder().uri("/v2/received").body(String::new()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(&body_bytes(resp).await[..], b"[]");
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let resp = app()
        .oneshot(Request::builder().uri("/v1/push").body(String::new()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

// --- msg_id allocation across requests ---

#[tokio::test]
async fn each_push_gets_a_new_msg_id() {
    use tower::Service;

    let state = MockState::shared();
    let mut app = app_with_state(state.clone()).into_service();

    let mut ids = Vec::new();
    for body in [r#"{"platform":"all","audience":"all"}"#, r#"{"platform":"all","audience":"all"}"#] {
        let resp = ServiceExt::ready(&mut app)
            .await
            .unwrap()
            .call(json_request(body))
            .await
            .unwrap();
        let reply: PushReply = body_json(resp).await;
        ids.push(reply.msg_id.unwrap());
    }

    assert_ne!(ids[0], ids[1]);
    assert_eq!(state.pushes.read().await.len(), 2);
}
