//! Application controller shared by the studio and the HTTP surface.
//!
//! [`AppState`] owns everything a front-end shows: the lesson form, the
//! selected template, the prompt buffer, the generation session, the
//! attachment list and the chat log. Front-ends change it only through
//! [`AppState::apply`] and the generation/export methods, and read the
//! resulting [`Notice`] instead of raising their own alerts.

use std::path::Path;

use serde::Serialize;

use crate::attachments::{Attachment, AttachmentList};
use crate::chat::ChatLog;
use crate::export::{ExportFormat, ExportRequest, ExportedFile};
use crate::generation::{GenerationError, GenerationService};
use crate::prompt::{AudienceTier, Grade, LessonConfig, Subject, TemplateKind, build_prompt};
use crate::session::{ERROR_PREFIX, GeneratedDocument, PendingGeneration, Session, SessionError};

/// Severity of a user-facing notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// A message for the teacher, replacing modal alerts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

/// Named state transitions.
#[derive(Debug, Clone)]
pub enum AppEvent {
    SubjectChanged(Subject),
    GradeChanged(Grade),
    TitleChanged(String),
    PeriodCountChanged(String),
    AudienceChanged(AudienceTier),
    /// Replace the form in one step.
    ConfigReplaced(LessonConfig),
    /// Expand a template into the prompt buffer, replacing its contents.
    TemplateSelected(TemplateKind),
    /// Replace the prompt buffer with hand-edited text.
    PromptEdited(String),
    AttachmentsAdded(Vec<Attachment>),
    AttachmentRemoved(usize),
}

/// Everything one front-end session shows.
#[derive(Debug, Default)]
pub struct AppState {
    pub config: LessonConfig,
    selected_template: Option<TemplateKind>,
    prompt: String,
    session: Session,
    attachments: AttachmentList,
    pub chat: ChatLog,
    notice: Option<Notice>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: LessonConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn selected_template(&self) -> Option<TemplateKind> {
        self.selected_template
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn document(&self) -> Option<&GeneratedDocument> {
        self.session.document()
    }

    pub fn attachments(&self) -> &AttachmentList {
        &self.attachments
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn clear_notice(&mut self) {
        self.notice = None;
    }

    /// Replace the current notice, e.g. for front-end specific failures.
    pub fn set_notice(&mut self, notice: Notice) -> Notice {
        self.notice = Some(notice.clone());
        notice
    }

    /// Apply one event. Returns the notice it produced, if any.
    pub fn apply(&mut self, event: AppEvent) -> Option<Notice> {
        match event {
            AppEvent::SubjectChanged(subject) => self.config.subject = subject,
            AppEvent::GradeChanged(grade) => self.config.grade = grade,
            AppEvent::TitleChanged(title) => self.config.lesson_title = title,
            AppEvent::PeriodCountChanged(count) => self.config.period_count = count,
            AppEvent::AudienceChanged(tier) => self.config.audience = tier,
            AppEvent::ConfigReplaced(config) => self.config = config,
            AppEvent::TemplateSelected(kind) => {
                self.selected_template = Some(kind);
                self.prompt = build_prompt(kind, &self.config);
                if !kind.has_body() {
                    return Some(self.set_notice(Notice::info(format!(
                        "Mẫu \"{}\" chưa có nội dung, hãy tự nhập yêu cầu.",
                        kind.label()
                    ))));
                }
            }
            AppEvent::PromptEdited(text) => self.prompt = text,
            AppEvent::AttachmentsAdded(batch) => {
                if let Err(err) = self.attachments.add_batch(batch) {
                    return Some(self.set_notice(Notice::warning(err.to_string())));
                }
            }
            AppEvent::AttachmentRemoved(index) => {
                self.attachments.remove(index);
            }
        }
        None
    }

    /// Start generating from the current prompt buffer.
    pub fn begin_generation(
        &mut self,
        service: &dyn GenerationService,
    ) -> Result<PendingGeneration, SessionError> {
        let prompt = self.prompt.clone();
        match self.session.begin(service, &prompt) {
            Ok(pending) => {
                self.notice = None;
                Ok(pending)
            }
            Err(err) => {
                self.set_notice(Notice::error(err.to_string()));
                Err(err)
            }
        }
    }

    /// Record the outcome of a request started with [`Self::begin_generation`].
    pub fn finish_generation(
        &mut self,
        result: Result<String, GenerationError>,
    ) -> &GeneratedDocument {
        let document = self.session.complete(result);
        let notice = if document.failed {
            let reason = document
                .text
                .strip_prefix(ERROR_PREFIX)
                .unwrap_or(&document.text);
            Notice::error(format!("Tạo tài liệu thất bại: {reason}"))
        } else {
            Notice::info("🎉 Đã tạo xong tài liệu!")
        };
        self.notice = Some(notice);
        document
    }

    /// Full request cycle against `service`.
    pub async fn generate(
        &mut self,
        service: &dyn GenerationService,
    ) -> Result<&GeneratedDocument, SessionError> {
        let pending = self.begin_generation(service)?;
        let result = service.generate_text(&pending.request_text).await;
        Ok(self.finish_generation(result))
    }

    /// Export the current document, naming the file after the lesson title.
    pub fn export(
        &mut self,
        format: ExportFormat,
        dir: &Path,
        prefix: Option<&str>,
    ) -> Result<ExportedFile, crate::export::ExportError> {
        let request = self.export_request(format, prefix);
        match self.session.export(&request, dir) {
            Ok(file) => {
                self.set_notice(Notice::info(format!("Đã lưu {}", file.path.display())));
                Ok(file)
            }
            Err(err) => {
                self.set_notice(Notice::error(err.to_string()));
                Err(err)
            }
        }
    }

    /// The export request for the current form.
    pub fn export_request(&self, format: ExportFormat, prefix: Option<&str>) -> ExportRequest {
        ExportRequest::new(format, &self.config.lesson_title, prefix)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::attachments::MAX_ATTACHMENTS;
    use crate::prompt::{INCLUSIVE_CLAUSE, STANDARD_CLAUSE};

    struct Keyless;

    #[async_trait]
    impl GenerationService for Keyless {
        fn name(&self) -> &str {
            "keyless"
        }

        fn has_credential(&self) -> bool {
            false
        }

        async fn generate_text(&self, _prompt: &str) -> Result<String, GenerationError> {
            Err(GenerationError::MissingApiKey)
        }
    }

    fn attachments(n: usize) -> Vec<Attachment> {
        (0..n)
            .map(|i| Attachment {
                name: format!("file-{i}"),
                path: None,
                size_bytes: 1,
            })
            .collect()
    }

    #[test]
    fn template_selection_uses_the_current_form() {
        let mut app = AppState::new();
        app.apply(AppEvent::TitleChanged("Phân số".into()));
        app.apply(AppEvent::AudienceChanged(AudienceTier::InclusiveNeeds));
        assert!(app.apply(AppEvent::TemplateSelected(TemplateKind::LessonPlan)).is_none());

        assert_eq!(app.selected_template(), Some(TemplateKind::LessonPlan));
        assert!(app.prompt().contains("Phân số"));
        assert!(app.prompt().contains(INCLUSIVE_CLAUSE));
    }

    #[test]
    fn form_changes_do_not_rewrite_an_expanded_prompt() {
        let mut app = AppState::new();
        app.apply(AppEvent::TemplateSelected(TemplateKind::LessonPlan));
        app.apply(AppEvent::AudienceChanged(AudienceTier::InclusiveNeeds));
        assert!(app.prompt().contains(STANDARD_CLAUSE));

        app.apply(AppEvent::PromptEdited("tự viết".into()));
        assert_eq!(app.prompt(), "tự viết");
        assert_eq!(app.selected_template(), Some(TemplateKind::LessonPlan));
    }

    #[test]
    fn empty_templates_raise_an_info_notice() {
        let mut app = AppState::new();
        let notice = app.apply(AppEvent::TemplateSelected(TemplateKind::Quiz)).unwrap();
        assert_eq!(notice.level, NoticeLevel::Info);
        assert!(app.prompt().is_empty());
        assert_eq!(app.notice(), Some(&notice));
    }

    #[test]
    fn attachment_limit_warns_and_keeps_list() {
        let mut app = AppState::new();
        assert!(app.apply(AppEvent::AttachmentsAdded(attachments(3))).is_none());
        let notice = app
            .apply(AppEvent::AttachmentsAdded(attachments(MAX_ATTACHMENTS)))
            .unwrap();
        assert_eq!(notice.level, NoticeLevel::Warning);
        assert_eq!(app.attachments().len(), 3);

        app.apply(AppEvent::AttachmentRemoved(0));
        assert_eq!(app.attachments().items()[0].name, "file-1");
    }

    #[tokio::test]
    async fn missing_credential_sets_error_notice() {
        let mut app = AppState::new();
        app.apply(AppEvent::PromptEdited("p".into()));
        let err = app.generate(&Keyless).await.unwrap_err();
        assert_eq!(err, SessionError::MissingCredential);
        assert_eq!(app.notice().unwrap().level, NoticeLevel::Error);
        assert!(app.document().is_none());
    }

    #[test]
    fn finish_generation_stores_failure_text() {
        let mut app = AppState::new();
        let doc = app.finish_generation(Err(GenerationError::Service("timeout".into())));
        assert_eq!(doc.text, "Lỗi: timeout");
        assert_eq!(app.notice().unwrap().level, NoticeLevel::Error);
    }

    #[test]
    fn blank_reply_sets_error_notice() {
        let mut app = AppState::new();
        let doc = app.finish_generation(Ok("   ".into()));
        assert!(doc.failed);
        assert_eq!(doc.text, "Lỗi: empty response from generation service");

        let notice = app.notice().unwrap();
        assert_eq!(notice.level, NoticeLevel::Error);
        assert_eq!(
            notice.message,
            "Tạo tài liệu thất bại: empty response from generation service"
        );
    }

    #[test]
    fn export_uses_lesson_title() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut app = AppState::new();
        app.apply(AppEvent::TitleChanged("Phân số".into()));
        app.finish_generation(Ok("<p>nội dung</p>".into()));

        let file = app.export(ExportFormat::Word, tmp.path(), None).unwrap();
        assert_eq!(file.path, tmp.path().join("GiaoAn_Phân số.doc"));
        assert_eq!(std::fs::read_to_string(&file.path).unwrap(), "<p>nội dung</p>");
    }
}
