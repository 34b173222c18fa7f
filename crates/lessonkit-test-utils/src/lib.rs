//! Shared test utilities for lessonkit integration tests.
//!
//! Two helpers:
//! - [`ScriptedGenerator`]: an in-process [`GenerationService`] that replays
//!   queued replies and records every prompt it receives.
//! - [`spawn_stub_gemini`]: a local axum server that answers
//!   `generateContent` with a canned status and body, so the real
//!   [`GeminiClient`](lessonkit_core::generation::GeminiClient) can be
//!   exercised without network access.

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::post;
use tokio::task::JoinHandle;

use lessonkit_core::generation::{GenerationError, GenerationService};

// ---------------------------------------------------------------------------
// Scripted generation service
// ---------------------------------------------------------------------------

/// Replays queued replies in order. When the queue is empty every call
/// returns `GenerationError::Service("no scripted reply")`.
#[derive(Default)]
pub struct ScriptedGenerator {
    credential: bool,
    delay: Option<Duration>,
    replies: Mutex<VecDeque<Result<String, String>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    /// A generator with a credential and no queued replies.
    pub fn new() -> Self {
        Self {
            credential: true,
            ..Self::default()
        }
    }

    /// A generator that reports no credential.
    pub fn without_credential() -> Self {
        Self::default()
    }

    /// Queue a successful reply.
    pub fn reply(self, text: &str) -> Self {
        self.replies
            .lock()
            .expect("replies lock poisoned")
            .push_back(Ok(text.to_string()));
        self
    }

    /// Queue a failure whose message is `message`.
    pub fn fail(self, message: &str) -> Self {
        self.replies
            .lock()
            .expect("replies lock poisoned")
            .push_back(Err(message.to_string()));
        self
    }

    /// Wait `delay` before answering each call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Every prompt received so far.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().expect("prompts lock poisoned").clone()
    }
}

#[async_trait]
impl GenerationService for ScriptedGenerator {
    fn name(&self) -> &str {
        "scripted"
    }

    fn has_credential(&self) -> bool {
        self.credential
    }

    async fn generate_text(&self, prompt: &str) -> Result<String, GenerationError> {
        self.prompts
            .lock()
            .expect("prompts lock poisoned")
            .push(prompt.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.replies
            .lock()
            .expect("replies lock poisoned")
            .pop_front()
            .unwrap_or_else(|| Err("no scripted reply".to_string()))
            .map_err(GenerationError::Service)
    }
}

// ---------------------------------------------------------------------------
// Stub Gemini server
// ---------------------------------------------------------------------------

/// What the stub saw on its last request.
#[derive(Debug, Default, Clone)]
pub struct StubRequest {
    pub path: String,
    pub api_key: Option<String>,
    pub body: serde_json::Value,
}

/// Handle to a running stub server.
pub struct StubGemini {
    /// Base URL to put in `GeminiSettings::base_url`.
    pub base_url: String,
    pub last_request: Arc<Mutex<Option<StubRequest>>>,
    _task: JoinHandle<()>,
}

impl StubGemini {
    pub fn last_request(&self) -> Option<StubRequest> {
        self.last_request
            .lock()
            .expect("stub lock poisoned")
            .clone()
    }
}

#[derive(Clone)]
struct StubState {
    status: StatusCode,
    body: serde_json::Value,
    last_request: Arc<Mutex<Option<StubRequest>>>,
}

async fn generate_content(
    State(state): State<StubState>,
    uri: axum::http::Uri,
    headers: HeaderMap,
    body: String,
) -> impl IntoResponse {
    let request = StubRequest {
        path: uri.path().to_string(),
        api_key: headers
            .get("x-goog-api-key")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body: serde_json::from_str(&body).unwrap_or(serde_json::Value::Null),
    };
    *state.last_request.lock().expect("stub lock poisoned") = Some(request);
    (state.status, axum::Json(state.body.clone()))
}

/// Start a stub that answers every `POST /v1beta/models/{model_action}` with
/// `status` and the JSON `body`.
pub async fn spawn_stub_gemini(status: StatusCode, body: serde_json::Value) -> StubGemini {
    let last_request = Arc::new(Mutex::new(None));
    let state = StubState {
        status,
        body,
        last_request: Arc::clone(&last_request),
    };

    let app = Router::new()
        .route("/v1beta/models/{model_action}", post(generate_content))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))
        .await
        .expect("failed to bind stub listener");
    let addr = listener.local_addr().expect("stub listener has no address");

    let task = tokio::spawn(async move {
        axum::serve(listener, app)
            .await
            .expect("stub server failed");
    });

    StubGemini {
        base_url: format!("http://{addr}/v1beta"),
        last_request,
        _task: task,
    }
}

/// A successful `generateContent` body carrying `text` in one part.
pub fn gemini_text_response(text: &str) -> serde_json::Value {
    serde_json::json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }],
        "usageMetadata": { "promptTokenCount": 12, "candidatesTokenCount": 34 }
    })
}
