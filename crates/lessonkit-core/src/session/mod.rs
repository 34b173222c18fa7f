//! Generation session: sends a prompt, holds the returned document and
//! exports it.
//!
//! The session is a two-state machine:
//!
//! ```text
//! Idle --begin--> Generating --complete(ok | err)--> Idle
//! ```
//!
//! `begin` refuses to start without a credential and while a request is
//! outstanding. There is no cancellation and no retry: a failed request
//! leaves an error document and the caller decides whether to try again.

pub mod document;

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::export::{ExportError, ExportRequest, ExportedFile, export_document};
use crate::generation::{GenerationError, GenerationService};

pub use document::{ERROR_PREFIX, GeneratedDocument};

/// Fixed persona and output-format instructions sent ahead of every prompt.
pub const REQUEST_WRAPPER: &str = "\
Bạn là trợ lý AI hỗ trợ giáo viên Việt Nam soạn tài liệu giảng dạy. \
Trả lời hoàn toàn bằng tiếng Việt. Trình bày bằng HTML thuần, chỉ dùng các thẻ \
<h2>, <h3>, <p>, <ul>, <ol>, <li>, <b>, <i>, <table>, <tr>, <th>, <td>; \
không dùng Markdown và không bọc kết quả trong khối mã.";

/// Prepend [`REQUEST_WRAPPER`] to the teacher's prompt.
pub fn wrap_prompt(prompt: &str) -> String {
    format!("{REQUEST_WRAPPER}\n\n{prompt}")
}

/// Where the session is in its request cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationState {
    #[default]
    Idle,
    Generating,
}

/// Reasons a generation request cannot start.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("chưa cấu hình API key: đặt LESSONKIT_API_KEY hoặc chạy `lessonkit init --api-key ...`")]
    MissingCredential,
    #[error("a generation request is already in progress")]
    AlreadyGenerating,
}

/// A request that has been started and must be completed with
/// [`Session::complete`].
#[derive(Debug, Clone)]
pub struct PendingGeneration {
    /// Wrapper plus prompt, exactly as sent to the service.
    pub request_text: String,
    pub started_at: DateTime<Utc>,
}

/// Holds the current document and the request state.
#[derive(Debug, Default)]
pub struct Session {
    state: GenerationState,
    document: Option<GeneratedDocument>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> GenerationState {
        self.state
    }

    pub fn is_generating(&self) -> bool {
        self.state == GenerationState::Generating
    }

    pub fn document(&self) -> Option<&GeneratedDocument> {
        self.document.as_ref()
    }

    /// Start a request.
    ///
    /// On success the previous document is cleared and the session enters
    /// [`GenerationState::Generating`]. On error nothing changes.
    pub fn begin(
        &mut self,
        service: &dyn GenerationService,
        prompt: &str,
    ) -> Result<PendingGeneration, SessionError> {
        if !service.has_credential() {
            warn!(service = service.name(), "generation refused: no API credential");
            return Err(SessionError::MissingCredential);
        }
        if self.is_generating() {
            return Err(SessionError::AlreadyGenerating);
        }

        self.state = GenerationState::Generating;
        self.document = None;

        info!(
            service = service.name(),
            prompt_len = prompt.len(),
            "generation started"
        );

        Ok(PendingGeneration {
            request_text: wrap_prompt(prompt),
            started_at: Utc::now(),
        })
    }

    /// Store the outcome of a request and return to idle.
    ///
    /// Blank responses are treated as failures.
    pub fn complete(&mut self, result: Result<String, GenerationError>) -> &GeneratedDocument {
        let result = result.and_then(|text| {
            if text.trim().is_empty() {
                Err(GenerationError::EmptyResponse)
            } else {
                Ok(text)
            }
        });

        let document = match result {
            Ok(text) => {
                info!(bytes = text.len(), "🎉 document generated");
                GeneratedDocument::content(text)
            }
            Err(err) => {
                warn!(error = %err, "generation failed");
                GeneratedDocument::failure(&err)
            }
        };

        self.state = GenerationState::Idle;
        self.document.insert(document)
    }

    /// Run a full request: [`Self::begin`], call the service, then
    /// [`Self::complete`].
    pub async fn generate(
        &mut self,
        service: &dyn GenerationService,
        prompt: &str,
    ) -> Result<&GeneratedDocument, SessionError> {
        let pending = self.begin(service, prompt)?;
        let result = service.generate_text(&pending.request_text).await;
        Ok(self.complete(result))
    }

    /// Write the current document to `dir` in the requested format.
    pub fn export(&self, request: &ExportRequest, dir: &Path) -> Result<ExportedFile, ExportError> {
        let document = self.document.as_ref().ok_or(ExportError::NoDocument)?;
        export_document(&document.text, request, dir)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
