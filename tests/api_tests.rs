use axum::http::StatusCode;
use axum_test::TestServer;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use courier::{
    AppState, ConfigManager, CourierConfig, InMemoryContextStore, HttpWebhookClient,
    api::routes::build_app,
    relay::{FixedFallback, RandomFallback},
    relay::fallback::DEFAULT_APOLOGIES,
    relay::reply::DEFAULT_GENERIC_REPLY,
};

const WEBHOOK_PATH: &str = "/webhook/chat";

// ============= Test Setup =============

fn test_config(upstream: &MockServer) -> CourierConfig {
    let mut config = CourierConfig::default();
    config.webhook.url = format!("{}{}", upstream.uri(), WEBHOOK_PATH);
    config.webhook.timeout_secs = 1;
    config
}

fn create_test_server(config: CourierConfig) -> TestServer {
    let history_limit = config.session.history_limit;
    let state = AppState::with_components(
        Arc::new(ConfigManager::from_config(config)),
        Arc::new(InMemoryContextStore::new(history_limit)),
        Arc::new(HttpWebhookClient::new()),
        Arc::new(RandomFallback),
    );
    TestServer::new(build_app(state)).expect("Failed to create test server")
}

async fn mount_reply(upstream: &MockServer, template: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(path(WEBHOOK_PATH))
        .respond_with(template)
        .mount(upstream)
        .await;
}

// ============= Health Tests =============

#[tokio::test]
async fn test_health_check() {
    let upstream = MockServer::start().await;
    let server = create_test_server(test_config(&upstream));

    let response = server.get("/api/health").await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["status"], "OK");
    assert_eq!(body["service"], "Engineering Admission Chatbot API");
    assert!(body["timestamp"].as_str().is_some_and(|t| t.ends_with('Z')));
}

#[tokio::test]
async fn test_root_serves_chat_ui() {
    let upstream = MockServer::start().await;
    let server = create_test_server(test_config(&upstream));

    let response = server.get("/").await;
    response.assert_status_ok();
    assert!(response.text().contains("/api/chat"));
}

#[tokio::test]
async fn test_chat_ui_formats_and_types_out_replies() {
    let upstream = MockServer::start().await;
    let server = create_test_server(test_config(&upstream));

    let page = server.get("/").await.text();

    assert!(page.contains("function formatMessage("));
    assert!(page.contains("function typeWriter("));
    assert!(page.contains("typeWriter(div, formatMessage(text))"));
    assert!(page.contains(r#"<span class="cursor">|</span>"#));
    assert!(page.contains("TYPE_SPEED_MS = 15"));
    assert!(page.contains("SCROLL_THRESHOLD_PX = 10"));
    assert!(page.contains("addEventListener('scroll'"));
    assert!(page.contains("userScrolled = false"));
    assert!(!page.contains("div.textContent = data.reply"));
}

// ============= Chat Relay Tests =============

#[tokio::test]
async fn test_chat_relays_output_field() {
    let upstream = MockServer::start().await;
    mount_reply(
        &upstream,
        ResponseTemplate::new(200).set_body_json(json!({"output": "hello"})),
    )
    .await;
    let server = create_test_server(test_config(&upstream));

    let response = server
        .post("/api/chat")
        .json(&json!({"message": "hi", "sessionId": "s1"}))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["reply"], "hello");
    assert_eq!(body["sessionId"], "s1");
    assert!(body["timestamp"].is_string());
    assert!(body.get("error").is_none());
}

#[tokio::test]
async fn test_chat_prefers_reply_over_response() {
    let upstream = MockServer::start().await;
    mount_reply(
        &upstream,
        ResponseTemplate::new(200).set_body_json(json!({"reply": "x", "response": "y"})),
    )
    .await;
    let server = create_test_server(test_config(&upstream));

    let response = server
        .post("/api/chat")
        .json(&json!({"message": "hi", "sessionId": "s1"}))
        .await;

    let body: Value = response.json();
    assert_eq!(body["reply"], "x");
}

#[tokio::test]
async fn test_chat_relays_plain_text_body() {
    let upstream = MockServer::start().await;
    mount_reply(
        &upstream,
        ResponseTemplate::new(200).set_body_string("Admissions close on June 30."),
    )
    .await;
    let server = create_test_server(test_config(&upstream));

    let response = server
        .post("/api/chat")
        .json(&json!({"message": "deadline?", "sessionId": "s1"}))
        .await;

    let body: Value = response.json();
    assert_eq!(body["reply"], "Admissions close on June 30.");
}

#[tokio::test]
async fn test_chat_unwraps_item_array() {
    let upstream = MockServer::start().await;
    mount_reply(
        &upstream,
        ResponseTemplate::new(200).set_body_json(json!([{"output": "from first item"}])),
    )
    .await;
    let server = create_test_server(test_config(&upstream));

    let response = server
        .post("/api/chat")
        .json(&json!({"message": "hi", "sessionId": "s1"}))
        .await;

    let body: Value = response.json();
    assert_eq!(body["reply"], "from first item");
}

#[tokio::test]
async fn test_chat_empty_object_uses_generic_reply() {
    let upstream = MockServer::start().await;
    mount_reply(&upstream, ResponseTemplate::new(200).set_body_json(json!({}))).await;
    let server = create_test_server(test_config(&upstream));

    let response = server
        .post("/api/chat")
        .json(&json!({"message": "hi", "sessionId": "s1"}))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["reply"], DEFAULT_GENERIC_REPLY);
    assert_eq!(body["sessionId"], "s1");

    // The generic reply is still a successful exchange
    let conversation: Value = server.get("/api/conversation/s1").await.json();
    assert_eq!(conversation["history"][0]["bot"], DEFAULT_GENERIC_REPLY);
}

#[tokio::test]
async fn test_chat_empty_body_uses_generic_reply() {
    let upstream = MockServer::start().await;
    mount_reply(&upstream, ResponseTemplate::new(200)).await;
    let server = create_test_server(test_config(&upstream));

    let response = server
        .post("/api/chat")
        .json(&json!({"message": "hi"}))
        .await;

    let body: Value = response.json();
    assert_eq!(body["reply"], DEFAULT_GENERIC_REPLY);
    assert_eq!(body["sessionId"], "default");
}

#[tokio::test]
async fn test_chat_forwards_history_and_preferences() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(WEBHOOK_PATH))
        .and(body_partial_json(json!({
            "message": "second",
            "sessionId": "s1",
            "context": {
                "history": [{"user": "first", "bot": "ok"}],
                "userPreferences": {"branch": "CSE"}
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"reply": "matched"})))
        .mount(&upstream)
        .await;
    mount_reply(
        &upstream,
        ResponseTemplate::new(200).set_body_json(json!({"reply": "ok"})),
    )
    .await;
    let server = create_test_server(test_config(&upstream));

    server
        .post("/api/chat")
        .json(&json!({"message": "first", "sessionId": "s1"}))
        .await
        .assert_status_ok();

    let response = server
        .post("/api/chat")
        .json(&json!({
            "message": "second",
            "sessionId": "s1",
            "context": {"branch": "CSE"}
        }))
        .await;

    let body: Value = response.json();
    assert_eq!(body["reply"], "matched");
}

#[tokio::test]
async fn test_chat_upstream_error_status_returns_apology() {
    let upstream = MockServer::start().await;
    mount_reply(&upstream, ResponseTemplate::new(500)).await;
    let server = create_test_server(test_config(&upstream));

    let response = server
        .post("/api/chat")
        .json(&json!({"message": "hi", "sessionId": "s1"}))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["error"], true);
    assert!(DEFAULT_APOLOGIES.contains(&body["reply"].as_str().unwrap()));
    assert!(body.get("sessionId").is_none());

    // Failed exchanges are not remembered
    server
        .get("/api/conversation/s1")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_chat_upstream_timeout_returns_apology() {
    let upstream = MockServer::start().await;
    mount_reply(
        &upstream,
        ResponseTemplate::new(200)
            .set_body_json(json!({"reply": "too late"}))
            .set_delay(Duration::from_secs(3)),
    )
    .await;
    let server = create_test_server(test_config(&upstream));

    let response = server
        .post("/api/chat")
        .json(&json!({"message": "hi", "sessionId": "s1"}))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["error"], true);
    assert!(DEFAULT_APOLOGIES.contains(&body["reply"].as_str().unwrap()));
}

#[tokio::test]
async fn test_chat_unreachable_upstream_uses_fixed_policy() {
    let mut config = CourierConfig::default();
    config.webhook.url = "http://127.0.0.1:9/webhook/chat".to_string();
    config.webhook.timeout_secs = 1;
    config.fallback.apologies = vec!["first".to_string(), "second".to_string()];

    let state = AppState::with_components(
        Arc::new(ConfigManager::from_config(config)),
        Arc::new(InMemoryContextStore::default()),
        Arc::new(HttpWebhookClient::new()),
        Arc::new(FixedFallback(1)),
    );
    let server = TestServer::new(build_app(state)).expect("Failed to create test server");

    let response = server
        .post("/api/chat")
        .json(&json!({"message": "hi"}))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["reply"], "second");
    assert_eq!(body["error"], true);
}

// ============= Validation Tests =============

#[tokio::test]
async fn test_chat_rejects_missing_or_blank_message() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(WEBHOOK_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&upstream)
        .await;
    let server = create_test_server(test_config(&upstream));

    for body in [
        json!({}),
        json!({"message": ""}),
        json!({"message": "   "}),
        json!({"message": 42}),
        json!({"sessionId": "s1"}),
    ] {
        let response = server.post("/api/chat").json(&body).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let error: Value = response.json();
        assert_eq!(error["error"], "Message is required");
    }
}

#[tokio::test]
async fn test_chat_rejects_malformed_json() {
    let upstream = MockServer::start().await;
    let server = create_test_server(test_config(&upstream));

    let response = server
        .post("/api/chat")
        .content_type("application/json")
        .text("{not json")
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_chat_tolerates_malformed_context_and_session_id() {
    let upstream = MockServer::start().await;
    mount_reply(
        &upstream,
        ResponseTemplate::new(200).set_body_json(json!({"reply": "ok"})),
    )
    .await;
    let server = create_test_server(test_config(&upstream));

    for body in [
        json!({"message": "hi", "context": "x"}),
        json!({"message": "hi", "context": [1]}),
        json!({"message": "hi", "sessionId": null, "context": null}),
    ] {
        let response = server.post("/api/chat").json(&body).await;
        response.assert_status_ok();
        let reply: Value = response.json();
        assert_eq!(reply["reply"], "ok");
        assert_eq!(reply["sessionId"], "default");
    }

    let response = server
        .post("/api/chat")
        .json(&json!({"message": "hi", "sessionId": 42}))
        .await;
    response.assert_status_ok();
    let reply: Value = response.json();
    assert_eq!(reply["sessionId"], "42");

    server.get("/api/conversation/42").await.assert_status_ok();
}

#[tokio::test]
async fn test_history_timestamps_use_millisecond_precision() {
    let upstream = MockServer::start().await;
    mount_reply(
        &upstream,
        ResponseTemplate::new(200).set_body_json(json!({"reply": "ok"})),
    )
    .await;
    let server = create_test_server(test_config(&upstream));

    server
        .post("/api/chat")
        .json(&json!({"message": "hi", "sessionId": "ts"}))
        .await
        .assert_status_ok();

    let conversation: Value = server.get("/api/conversation/ts").await.json();
    let ts = conversation["history"][0]["timestamp"].as_str().unwrap();
    assert_eq!(ts.len(), "2026-06-10T09:30:00.000Z".len());
    assert!(ts.ends_with('Z'));
}

// ============= Conversation Tests =============

#[tokio::test]
async fn test_unknown_conversation_is_not_found() {
    let upstream = MockServer::start().await;
    let server = create_test_server(test_config(&upstream));

    let response = server.get("/api/conversation/nobody").await;
    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["error"], "Conversation not found");
}

#[tokio::test]
async fn test_conversation_lookup_and_clear() {
    let upstream = MockServer::start().await;
    mount_reply(
        &upstream,
        ResponseTemplate::new(200).set_body_json(json!({"reply": "noted"})),
    )
    .await;
    let server = create_test_server(test_config(&upstream));

    server
        .post("/api/chat")
        .json(&json!({"message": "hi", "sessionId": "s1", "context": {"lang": "en"}}))
        .await
        .assert_status_ok();

    let response = server.get("/api/conversation/s1").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["sessionId"], "s1");
    assert_eq!(body["history"][0]["user"], "hi");
    assert_eq!(body["history"][0]["bot"], "noted");
    assert_eq!(body["preferences"]["lang"], "en");

    let response = server.delete("/api/conversation/s1").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["message"], "Conversation cleared successfully");
    assert_eq!(body["sessionId"], "s1");

    server
        .get("/api/conversation/s1")
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_clear_unknown_conversation_succeeds() {
    let upstream = MockServer::start().await;
    let server = create_test_server(test_config(&upstream));

    server.delete("/api/conversation/ghost").await.assert_status_ok();
    server.delete("/api/conversation/ghost").await.assert_status_ok();
}

#[tokio::test]
async fn test_history_is_capped_at_ten() {
    let upstream = MockServer::start().await;
    mount_reply(
        &upstream,
        ResponseTemplate::new(200).set_body_json(json!({"reply": "ack"})),
    )
    .await;
    let server = create_test_server(test_config(&upstream));

    for i in 0..12 {
        server
            .post("/api/chat")
            .json(&json!({"message": format!("m{}", i), "sessionId": "s1"}))
            .await
            .assert_status_ok();
    }

    let body: Value = server.get("/api/conversation/s1").await.json();
    let history = body["history"].as_array().unwrap();
    assert_eq!(history.len(), 10);
    assert_eq!(history[0]["user"], "m2");
    assert_eq!(history[9]["user"], "m11");
}

#[tokio::test]
async fn test_list_conversations() {
    let upstream = MockServer::start().await;
    mount_reply(
        &upstream,
        ResponseTemplate::new(200).set_body_json(json!({"reply": "ack"})),
    )
    .await;
    let server = create_test_server(test_config(&upstream));

    for session in ["b", "a", "b"] {
        server
            .post("/api/chat")
            .json(&json!({"message": "hi", "sessionId": session}))
            .await
            .assert_status_ok();
    }

    let body: Value = server.get("/api/conversations").await.json();
    assert_eq!(
        body["sessions"],
        json!([
            {"sessionId": "a", "exchanges": 1},
            {"sessionId": "b", "exchanges": 2}
        ])
    );
}
