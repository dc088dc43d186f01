use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use serde_json::Value;

use super::*;
use crate::error::ErrorCode;

// =============================================================================
// ENVELOPE
// =============================================================================

#[test]
fn numeric_401_is_unauthorized() {
    let env = Envelope::failed(401, "token expired");
    assert_eq!(env.outcome(), Outcome::Unauthorized);
}

#[test]
fn string_401_is_unauthorized() {
    let env: Envelope = serde_json::from_str(r#"{"executed":false,"response":{"error":{"code":"401","message":"x"}}}"#).unwrap();
    assert_eq!(env.error_code(), Some(401));
    assert_eq!(env.outcome(), Outcome::Unauthorized);
}

#[test]
fn other_codes_are_plain_failures() {
    assert_eq!(Envelope::failed(500, "boom").outcome(), Outcome::Failed);
    assert_eq!(Envelope::transport_failure("connect refused").outcome(), Outcome::Failed);
    let no_error: Envelope = serde_json::from_str(r#"{"executed":false}"#).unwrap();
    assert_eq!(no_error.outcome(), Outcome::Failed);
}

#[test]
fn executed_exposes_response() {
    let env = Envelope::executed(json!({ "event_data": { "id": "e1" } }));
    match env.outcome() {
        Outcome::Executed(resp) => assert_eq!(resp["event_data"]["id"], "e1"),
        other => panic!("expected Executed, got {other:?}"),
    }
}

#[test]
fn transport_failure_carries_message() {
    let env = Envelope::transport_failure("timed out");
    assert!(!env.executed);
    assert_eq!(env.error_message(), Some("timed out"));
    assert_eq!(env.response["error"]["code"], envelope::TRANSPORT_ERROR_CODE);
}

#[test]
fn parse_envelope_prefers_body_over_status() {
    let body = r#"{"executed":false,"response":{"error":{"code":401,"message":"expired"}}}"#;
    assert_eq!(envelope::parse_envelope(400, body).outcome(), Outcome::Unauthorized);
}

#[test]
fn parse_envelope_wraps_non_envelope_bodies() {
    let env = envelope::parse_envelope(502, "<html>bad gateway</html>");
    assert!(!env.executed);
    assert_eq!(env.response["error"]["code"], "http_502");
    assert_eq!(env.outcome(), Outcome::Failed);

    let env = envelope::parse_envelope(200, "not json");
    assert!(!env.executed);
    assert_eq!(env.outcome(), Outcome::Failed);
}

// =============================================================================
// INPUT
// =============================================================================

#[derive(serde::Deserialize)]
struct Args {
    #[serde(default)]
    location: Param<String>,
    #[serde(default)]
    max_results: Param<u32>,
    #[serde(default)]
    is_private: Param<bool>,
}

#[test]
fn param_missing_and_null_are_omitted() {
    let args: Args = serde_json::from_value(json!({ "location": null })).unwrap();
    assert_eq!(args.location, Param::Omitted);
    assert_eq!(args.max_results, Param::Omitted);
}

#[test]
fn param_falsy_values_are_provided() {
    let args: Args = serde_json::from_value(json!({ "location": "", "max_results": 0, "is_private": false })).unwrap();
    assert_eq!(args.location, Param::Provided(String::new()));
    assert_eq!(args.max_results, Param::Provided(0));
    assert_eq!(args.is_private, Param::Provided(false));
}

#[test]
fn action_input_includes_only_provided_optionals() {
    let input = ActionInput::new()
        .required("summary", "Standup")
        .optional("location", &Param::<String>::Omitted)
        .optional("description", &Param::Provided(String::new()))
        .optional("max_results", &Param::Provided(0_u32));
    assert_eq!(input.keys(), vec!["description", "max_results", "summary"]);
    assert_eq!(input.get("description"), Some(&json!("")));
}

#[test]
fn param_unwrap_or_uses_default_only_when_omitted() {
    assert_eq!(Param::Omitted.unwrap_or(10_u32), 10);
    assert_eq!(Param::Provided(3_u32).unwrap_or(10), 3);
}

// =============================================================================
// ERRORS
// =============================================================================

#[test]
fn remote_error_codes() {
    assert_eq!(RemoteError::Transport("x".into()).error_code(), "E_REMOTE_TRANSPORT");
    assert!(RemoteError::Transport("x".into()).retryable());
    assert!(RemoteError::Status { status: 503, body: String::new() }.retryable());
    assert!(!RemoteError::Status { status: 400, body: String::new() }.retryable());
    assert!(!RemoteError::Parse("x".into()).retryable());
}

#[test]
fn parse_connection_request_reads_camel_case() {
    let req = parse_connection_request(200, r#"{"connectedAccountId":"ca_1","redirectUrl":"https://auth.example/x"}"#).unwrap();
    assert_eq!(req.connection_id, "ca_1");
    assert_eq!(req.redirect_url, "https://auth.example/x");
}

#[test]
fn parse_connection_request_rejects_bad_status_and_body() {
    assert!(matches!(parse_connection_request(403, "nope"), Err(RemoteError::Status { status: 403, .. })));
    assert!(matches!(parse_connection_request(200, r#"{"redirectUrl":"x"}"#), Err(RemoteError::Parse(_))));
}

#[test]
fn app_slugs() {
    assert_eq!(App::GoogleCalendar.slug(), "googlecalendar");
    assert_eq!(App::Gmail.to_string(), "gmail");
    assert_eq!(App::Github.display_name(), "GitHub");
}

// =============================================================================
// HTTP CLIENT AGAINST A LOCAL FAKE BACKEND
// =============================================================================

#[derive(Clone, Default)]
struct Seen {
    requests: Arc<Mutex<Vec<(String, Value)>>>,
}

async fn fake_execute(State(seen): State<Seen>, headers: HeaderMap, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    let key = headers
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    seen.requests.lock().unwrap().push((key, body));
    (StatusCode::OK, Json(json!({ "executed": true, "response": { "ok": true } })))
}

async fn fake_connect(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    assert_eq!(body["integrationId"], "int-1");
    (StatusCode::OK, Json(json!({ "connectedAccountId": "ca_new", "redirectUrl": "https://auth.example/ca_new" })))
}

async fn spawn_backend(seen: Seen) -> String {
    let app = Router::new()
        .route("/actions/{slug}/execute", post(fake_execute))
        .route("/connectedAccounts", post(fake_connect))
        .with_state(seen);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn backend_config(base_url: String) -> BackendConfig {
    BackendConfig {
        base_url,
        api_key: "ck-test".into(),
        integration_id: "int-1".into(),
        request_timeout: Duration::from_secs(5),
        connect_timeout: Duration::from_secs(5),
    }
}

#[tokio::test]
async fn execute_posts_one_request_with_connection_and_input() {
    let seen = Seen::default();
    let base = spawn_backend(seen.clone()).await;
    let client = BackendClient::new(&backend_config(base)).unwrap();

    let input = ActionInput::new().required("to_email", "a@b.c");
    let env = client.execute("ca_1", App::Gmail, "send_email", input).await;

    assert!(env.executed);
    let requests = seen.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    let (key, body) = &requests[0];
    assert_eq!(key, "ck-test");
    assert_eq!(body["connectedAccountId"], "ca_1");
    assert_eq!(body["appName"], "gmail");
    assert_eq!(body["input"], json!({ "to_email": "a@b.c" }));
}

#[tokio::test]
async fn execute_folds_connection_errors_into_failure_envelope() {
    // Port 9 on loopback is not expected to accept connections.
    let client = BackendClient::new(&backend_config("http://127.0.0.1:9".into())).unwrap();
    let env = client
        .execute("ca_1", App::Slack, "list_channels", ActionInput::new())
        .await;
    assert!(!env.executed);
    assert_eq!(env.outcome(), Outcome::Failed);
}

#[tokio::test]
async fn initiate_returns_connection_request() {
    let base = spawn_backend(Seen::default()).await;
    let client = BackendClient::new(&backend_config(base)).unwrap();
    let req = client.initiate().await.unwrap();
    assert_eq!(req.connection_id, "ca_new");
    assert_eq!(req.redirect_url, "https://auth.example/ca_new");
}
