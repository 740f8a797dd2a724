use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use recall_node::api::{ApiState, route};
use recall_node::config::MemoryConfig;
use recall_node::core::AcquireFailure;
use recall_node::testing::mocks::{MockAnswerClient, MockProvider, ScriptedCodec};
use recall_node::{FacingMode, VisualMemory};
use serde_json::Value;
use tiny_http::Method;

fn setup(answer: MockAnswerClient) -> (Arc<ApiState>, Arc<MockProvider>) {
    let provider = Arc::new(MockProvider::new());
    let config = MemoryConfig {
        capture_cadence_ms: 10,
        retention_secs: 1,
        sample_stride: 5,
        stall_after_ticks: 0,
    };
    let memory = VisualMemory::new(
        &config,
        provider.clone(),
        Box::new(ScriptedCodec::endless()),
        FacingMode::User,
    );
    let state = ApiState {
        memory: Arc::new(Mutex::new(memory)),
        answer: Arc::new(answer),
    };
    (Arc::new(state), provider)
}

fn post(state: &ApiState, path: &str, body: &str) -> Value {
    let response = route(state, &Method::Post, path, body);
    assert_eq!(response.status, 200, "body: {}", response.body);
    assert!(response.json);
    serde_json::from_str(&response.body).expect("json body")
}

fn status(state: &ApiState) -> Value {
    let response = route(state, &Method::Get, "/api/status", "");
    assert_eq!(response.status, 200);
    serde_json::from_str(&response.body).expect("json body")
}

#[test]
fn test_control_round_trip() {
    let (state, provider) = setup(MockAnswerClient::replying("unused"));

    let started = post(&state, "/api/control", r#"{"action":"start"}"#);
    assert_eq!(started["ok"], true);
    assert_eq!(started["state"], "recording");

    let deadline = Instant::now() + Duration::from_secs(3);
    while status(&state)["frames"].as_u64().unwrap_or(0) < 2 {
        assert!(Instant::now() < deadline, "no frames captured");
        std::thread::sleep(Duration::from_millis(5));
    }

    let switched = post(&state, "/api/control", r#"{"action":"switch_camera"}"#);
    assert_eq!(switched["ok"], true);
    assert_eq!(status(&state)["mode"], "environment");

    let stopped = post(&state, "/api/control", r#"{"action":"stop"}"#);
    assert_eq!(stopped["state"], "idle");
    assert_eq!(provider.live_handles(), 0);

    let snapshot = status(&state);
    assert!(snapshot["frames"].as_u64().unwrap_or(0) >= 2);
    assert!(snapshot["newest_capture"].is_string());
}

#[test]
fn test_control_reports_acquire_reason() {
    let (state, provider) = setup(MockAnswerClient::replying("unused"));
    provider.fail_next(AcquireFailure::PermissionDenied);

    let reply = post(&state, "/api/control", r#"{"action":"start"}"#);
    assert_eq!(reply["ok"], false);
    assert_eq!(reply["state"], "idle");
    assert_eq!(reply["reason"], "permission-denied");
}

#[test]
fn test_control_rejects_bad_input() {
    let (state, _) = setup(MockAnswerClient::replying("unused"));

    assert_eq!(route(&state, &Method::Post, "/api/control", "{").status, 400);
    let reply = post(&state, "/api/control", r#"{"action":"rewind"}"#);
    assert_eq!(reply["ok"], false);
    assert_eq!(reply["message"], "unknown action");
}

#[test]
fn test_ask_after_recording() {
    let (state, _) = setup(MockAnswerClient::replying("next to the door"));

    post(&state, "/api/control", r#"{"action":"start"}"#);
    let deadline = Instant::now() + Duration::from_secs(3);
    while status(&state)["frames"].as_u64().unwrap_or(0) < 6 {
        assert!(Instant::now() < deadline, "no frames captured");
        std::thread::sleep(Duration::from_millis(5));
    }
    post(&state, "/api/control", r#"{"action":"stop"}"#);

    let reply = post(&state, "/api/ask", r#"{"question":"where is my bag?"}"#);
    assert_eq!(reply["ok"], true);
    assert_eq!(reply["text"], "next to the door");
    assert!(reply["frames"].as_u64().unwrap_or(0) >= 2);
}

#[test]
fn test_ask_with_blank_question() {
    let (state, _) = setup(MockAnswerClient::replying("unused"));

    let reply = post(&state, "/api/ask", r#"{"question":"   "}"#);
    assert_eq!(reply["ok"], false);
    assert_eq!(reply["frames"], 0);
}
