use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::{Path, State};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;

use lessonkit_core::app::{AppEvent, AppState, Notice, NoticeLevel};
use lessonkit_core::attachments::Attachment;
use lessonkit_core::chat::{ChatLog, ChatMessage, ask};
use lessonkit_core::export::{ExportError, ExportFormat};
use lessonkit_core::generation::GenerationService;
use lessonkit_core::prompt::{AudienceTier, Grade, LessonConfig, Subject, TemplateKind};
use lessonkit_core::session::{GeneratedDocument, GenerationState, SessionError};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
        }
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, msg)
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }

    pub fn internal(err: anyhow::Error) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, format!("{err:#}"))
    }
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        let status = match err {
            SessionError::MissingCredential => StatusCode::PRECONDITION_FAILED,
            SessionError::AlreadyGenerating => StatusCode::CONFLICT,
        };
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Shared state
// ---------------------------------------------------------------------------

/// One studio session shared by every request.
#[derive(Clone)]
pub struct ServerState {
    app: Arc<Mutex<AppState>>,
    service: Arc<dyn GenerationService>,
    export_prefix: Arc<str>,
}

impl ServerState {
    pub fn new(service: Arc<dyn GenerationService>, export_prefix: String) -> Self {
        Self {
            app: Arc::new(Mutex::new(AppState::new())),
            service,
            export_prefix: export_prefix.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct StateResponse {
    pub config: LessonConfig,
    pub selected_template: Option<TemplateKind>,
    pub prompt: String,
    pub generation: GenerationState,
    pub has_credential: bool,
    pub document: Option<GeneratedDocument>,
    pub attachments: Vec<String>,
    pub notice: Option<Notice>,
}

impl StateResponse {
    fn snapshot(app: &AppState, has_credential: bool) -> Self {
        Self {
            config: app.config.clone(),
            selected_template: app.selected_template(),
            prompt: app.prompt().to_string(),
            generation: app.session().state(),
            has_credential,
            document: app.document().cloned(),
            attachments: app
                .attachments()
                .items()
                .iter()
                .map(|a| a.name.clone())
                .collect(),
            notice: app.notice().cloned(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CatalogResponse {
    pub subjects: Vec<&'static str>,
    pub grades: Vec<&'static str>,
    pub audiences: Vec<AudienceInfo>,
    pub templates: Vec<TemplateInfo>,
    pub formats: Vec<FormatInfo>,
}

#[derive(Debug, Serialize)]
pub struct AudienceInfo {
    pub key: AudienceTier,
    pub label: &'static str,
}

#[derive(Debug, Serialize)]
pub struct TemplateInfo {
    pub key: TemplateKind,
    pub label: &'static str,
    pub has_body: bool,
}

#[derive(Debug, Serialize)]
pub struct FormatInfo {
    pub format: ExportFormat,
    pub extension: &'static str,
}

#[derive(Debug, Serialize)]
pub struct TemplateResponse {
    pub template: TemplateKind,
    pub prompt: String,
    pub notice: Option<Notice>,
}

#[derive(Debug, Deserialize)]
pub struct PromptBody {
    pub prompt: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatBody {
    pub message: String,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(state: ServerState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/state", get(get_state))
        .route("/api/catalog", get(get_catalog))
        .route("/api/config", put(put_config))
        .route("/api/templates/{kind}", post(select_template))
        .route("/api/prompt", put(put_prompt))
        .route("/api/generate", post(generate))
        .route("/api/export/{format}", get(export))
        .route("/api/attachments", post(add_attachments))
        .route("/api/attachments/{index}", delete(remove_attachment))
        .route("/api/chat", get(chat_history).post(chat))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub async fn run_serve(state: ServerState, bind: &str, port: u16) -> Result<()> {
    if !state.service.has_credential() {
        tracing::warn!("no API key configured; POST /api/generate will answer 412");
    }
    let app = build_router(state);
    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    tracing::info!("lessonkit serve listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("lessonkit serve shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for Ctrl+C");
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn index() -> Html<&'static str> {
    Html(
        "<!DOCTYPE html>\
<html><head><meta charset=\"utf-8\"><title>lessonkit</title></head><body>\
<h1>lessonkit</h1>\
<p><a href=\"/api/state\">/api/state</a> | <a href=\"/api/catalog\">/api/catalog</a></p>\
<p>POST /api/templates/{kind}, PUT /api/prompt, POST /api/generate, \
GET /api/export/{html|word|pdf}</p>\
</body></html>",
    )
}

async fn get_state(State(state): State<ServerState>) -> Json<StateResponse> {
    let app = state.app.lock().await;
    Json(StateResponse::snapshot(&app, state.service.has_credential()))
}

async fn get_catalog() -> Json<CatalogResponse> {
    Json(CatalogResponse {
        subjects: Subject::all().map(Subject::name).collect(),
        grades: Grade::all().map(Grade::name).collect(),
        audiences: [AudienceTier::Standard, AudienceTier::InclusiveNeeds]
            .into_iter()
            .map(|key| AudienceInfo {
                key,
                label: key.label(),
            })
            .collect(),
        templates: TemplateKind::ALL
            .into_iter()
            .map(|key| TemplateInfo {
                key,
                label: key.label(),
                has_body: key.has_body(),
            })
            .collect(),
        formats: ExportFormat::ALL
            .into_iter()
            .map(|format| FormatInfo {
                format,
                extension: format.extension(),
            })
            .collect(),
    })
}

async fn put_config(
    State(state): State<ServerState>,
    Json(config): Json<LessonConfig>,
) -> Json<StateResponse> {
    let mut app = state.app.lock().await;
    app.apply(AppEvent::ConfigReplaced(config));
    Json(StateResponse::snapshot(&app, state.service.has_credential()))
}

async fn select_template(
    State(state): State<ServerState>,
    Path(kind): Path<String>,
) -> Result<Json<TemplateResponse>, AppError> {
    let kind: TemplateKind = kind
        .parse()
        .map_err(|err: lessonkit_core::prompt::CatalogError| AppError::not_found(err.to_string()))?;

    let mut app = state.app.lock().await;
    let notice = app.apply(AppEvent::TemplateSelected(kind));
    Ok(Json(TemplateResponse {
        template: kind,
        prompt: app.prompt().to_string(),
        notice,
    }))
}

async fn put_prompt(
    State(state): State<ServerState>,
    Json(body): Json<PromptBody>,
) -> Json<StateResponse> {
    let mut app = state.app.lock().await;
    app.apply(AppEvent::PromptEdited(body.prompt));
    Json(StateResponse::snapshot(&app, state.service.has_credential()))
}

/// The lock is released while the request is in flight. The request runs
/// on its own task so the session is finished even if the client hangs up.
async fn generate(State(state): State<ServerState>) -> Result<Json<GeneratedDocument>, AppError> {
    let pending = {
        let mut app = state.app.lock().await;
        app.begin_generation(state.service.as_ref())?
    };

    let task = tokio::spawn(async move {
        let result = state.service.generate_text(&pending.request_text).await;
        let mut app = state.app.lock().await;
        app.finish_generation(result).clone()
    });

    let document = task.await.map_err(|err| AppError::internal(err.into()))?;
    Ok(Json(document))
}

async fn export(
    State(state): State<ServerState>,
    Path(format): Path<String>,
) -> Result<Response, AppError> {
    let format: ExportFormat = format
        .parse()
        .map_err(|err: ExportError| AppError::not_found(err.to_string()))?;

    let app = state.app.lock().await;
    let document = app
        .document()
        .ok_or_else(|| AppError::not_found(ExportError::NoDocument.to_string()))?;
    let request = app.export_request(format, Some(&state.export_prefix));

    let content_type = HeaderValue::from_str(&format!("{}; charset=utf-8", format.mime()))
        .map_err(|err| AppError::internal(err.into()))?;
    let disposition = HeaderValue::from_str(&content_disposition(&request.file_name()))
        .map_err(|err| AppError::internal(err.into()))?;

    tracing::info!(file = %request.file_name(), "document downloaded");

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        document.text.clone(),
    )
        .into_response())
}

async fn add_attachments(
    State(state): State<ServerState>,
    Json(batch): Json<Vec<Attachment>>,
) -> Result<Json<Vec<Attachment>>, AppError> {
    // Client-side paths mean nothing on the server.
    let batch = batch
        .into_iter()
        .map(|a| Attachment { path: None, ..a })
        .collect();

    let mut app = state.app.lock().await;
    if let Some(notice) = app.apply(AppEvent::AttachmentsAdded(batch)) {
        if notice.level == NoticeLevel::Warning {
            return Err(AppError::new(StatusCode::UNPROCESSABLE_ENTITY, notice.message));
        }
    }
    Ok(Json(app.attachments().items().to_vec()))
}

async fn remove_attachment(
    State(state): State<ServerState>,
    Path(index): Path<usize>,
) -> Result<Json<Vec<Attachment>>, AppError> {
    let mut app = state.app.lock().await;
    if index >= app.attachments().len() {
        return Err(AppError::not_found(format!("no attachment at index {index}")));
    }
    app.apply(AppEvent::AttachmentRemoved(index));
    Ok(Json(app.attachments().items().to_vec()))
}

async fn chat_history(State(state): State<ServerState>) -> Json<Vec<ChatMessage>> {
    let app = state.app.lock().await;
    Json(app.chat.messages().to_vec())
}

/// Each turn is collected in its own log and appended once the reply is in.
async fn chat(
    State(state): State<ServerState>,
    Json(body): Json<ChatBody>,
) -> Result<Json<ChatMessage>, AppError> {
    let mut turn = ChatLog::new();
    let reply = ask(state.service.as_ref(), &mut turn, &body.message)
        .await
        .cloned()
        .ok_or_else(|| AppError::bad_request("message is empty"))?;

    state.app.lock().await.chat.append(turn);
    Ok(Json(reply))
}

// -- Helpers --

/// `attachment` disposition with an ASCII fallback name and the exact
/// UTF-8 name in `filename*`.
fn content_disposition(file_name: &str) -> String {
    let fallback: String = file_name
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() || c == ' ') && c != '"' && c != '\\' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!(
        "attachment; filename=\"{fallback}\"; filename*=UTF-8''{}",
        urlencoding::encode(file_name)
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
