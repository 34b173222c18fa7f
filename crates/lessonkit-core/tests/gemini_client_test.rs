//! Tests for the Gemini client against a local stub server.

use std::time::Duration;

use axum::http::StatusCode;

use lessonkit_core::generation::{GeminiClient, GeminiSettings, GenerationError, GenerationService};
use lessonkit_core::session::Session;
use lessonkit_test_utils::{gemini_text_response, spawn_stub_gemini};

fn client_for(base_url: &str) -> GeminiClient {
    GeminiClient::new(GeminiSettings {
        api_key: Some("test-key".to_string()),
        model: "gemini-test".to_string(),
        base_url: base_url.to_string(),
        timeout: Duration::from_secs(5),
        temperature: Some(0.4),
    })
    .expect("client should build")
}

#[tokio::test]
async fn returns_candidate_text_and_sends_key_header() {
    let stub = spawn_stub_gemini(StatusCode::OK, gemini_text_response("<h2>Xin chào</h2>")).await;
    let client = client_for(&stub.base_url);

    let text = client.generate_text("soạn bài").await.unwrap();
    assert_eq!(text, "<h2>Xin chào</h2>");

    let seen = stub.last_request().expect("stub should record the request");
    assert_eq!(seen.path, "/v1beta/models/gemini-test:generateContent");
    assert_eq!(seen.api_key.as_deref(), Some("test-key"));
    assert_eq!(seen.body["contents"][0]["parts"][0]["text"], "soạn bài");
    assert_eq!(seen.body["contents"][0]["role"], "user");
    assert!(seen.body["generationConfig"]["temperature"].is_number());
}

#[tokio::test]
async fn concatenates_multiple_parts() {
    let body = serde_json::json!({
        "candidates": [{ "content": { "parts": [{ "text": "<h2>A</h2>" }, { "text": "<p>B</p>" }] } }]
    });
    let stub = spawn_stub_gemini(StatusCode::OK, body).await;
    let text = client_for(&stub.base_url).generate_text("p").await.unwrap();
    assert_eq!(text, "<h2>A</h2><p>B</p>");
}

#[tokio::test]
async fn api_error_uses_error_message() {
    let body = serde_json::json!({ "error": { "code": 400, "message": "API key not valid" } });
    let stub = spawn_stub_gemini(StatusCode::BAD_REQUEST, body).await;

    let err = client_for(&stub.base_url).generate_text("p").await.unwrap_err();
    match err {
        GenerationError::Api { status, message } => {
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(message, "API key not valid");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn no_candidates_is_invalid_response() {
    let stub = spawn_stub_gemini(StatusCode::OK, serde_json::json!({ "candidates": [] })).await;
    let err = client_for(&stub.base_url).generate_text("p").await.unwrap_err();
    assert!(matches!(err, GenerationError::InvalidResponse(_)));
}

#[tokio::test]
async fn session_records_api_failure_as_error_document() {
    let body = serde_json::json!({ "error": { "message": "quota exceeded" } });
    let stub = spawn_stub_gemini(StatusCode::TOO_MANY_REQUESTS, body).await;
    let client = client_for(&stub.base_url);

    let mut session = Session::new();
    let doc = session.generate(&client, "p").await.unwrap();
    assert_eq!(doc.text, "Lỗi: HTTP 429 Too Many Requests: quota exceeded");
    assert!(doc.failed);
}
