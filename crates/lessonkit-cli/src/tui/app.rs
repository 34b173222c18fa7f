//! Studio state and key handling.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use lessonkit_core::app::{AppEvent, AppState, Notice};
use lessonkit_core::attachments::Attachment;
use lessonkit_core::export::ExportFormat;
use lessonkit_core::generation::GenerationService;
use lessonkit_core::prompt::TemplateKind;
use lessonkit_core::session::PendingGeneration;

/// Which panel has keyboard focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Subject,
    Grade,
    Title,
    Periods,
    Audience,
    Templates,
    Prompt,
    Attachments,
}

impl Focus {
    const ORDER: [Focus; 8] = [
        Focus::Subject,
        Focus::Grade,
        Focus::Title,
        Focus::Periods,
        Focus::Audience,
        Focus::Templates,
        Focus::Prompt,
        Focus::Attachments,
    ];

    fn index(self) -> usize {
        Self::ORDER.iter().position(|f| *f == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ORDER[(self.index() + 1) % Self::ORDER.len()]
    }

    pub fn prev(self) -> Self {
        Self::ORDER[(self.index() + Self::ORDER.len() - 1) % Self::ORDER.len()]
    }
}

/// A text field being edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditTarget {
    Title,
    Periods,
    Prompt,
    AttachmentPath,
}

/// What the event loop must do after a key press.
#[derive(Debug)]
pub enum Action {
    None,
    Generate(PendingGeneration),
}

/// Application state for the studio.
pub struct App {
    pub state: AppState,
    pub service: Arc<dyn GenerationService>,
    pub focus: Focus,
    pub editing: Option<EditTarget>,
    pub input: String,
    pub selected_attachment: usize,
    pub output_dir: PathBuf,
    pub export_prefix: String,
    pub tick_rate: Duration,
    pub should_quit: bool,
}

impl App {
    pub fn new(service: Arc<dyn GenerationService>, output_dir: PathBuf, export_prefix: String) -> Self {
        Self {
            state: AppState::new(),
            service,
            focus: Focus::Subject,
            editing: None,
            input: String::new(),
            selected_attachment: 0,
            output_dir,
            export_prefix,
            tick_rate: Duration::from_millis(200),
            should_quit: false,
        }
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.state.notice()
    }

    pub fn is_generating(&self) -> bool {
        self.state.session().is_generating()
    }

    /// Handle one key press.
    pub fn handle_key(&mut self, key: KeyEvent) -> Action {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return Action::None;
        }
        if self.editing.is_some() {
            self.handle_edit_key(key);
            return Action::None;
        }

        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Tab => self.focus = self.focus.next(),
            KeyCode::BackTab => self.focus = self.focus.prev(),
            KeyCode::Left => self.cycle(false),
            KeyCode::Right => self.cycle(true),
            KeyCode::Up => self.move_attachment(false),
            KeyCode::Down => self.move_attachment(true),
            KeyCode::Enter => self.start_editing_focused(),
            KeyCode::Char(c @ '1'..='5') => {
                let index = c as usize - '1' as usize;
                self.select_template(TemplateKind::ALL[index]);
            }
            KeyCode::Char('g') => return self.start_generation(),
            KeyCode::Char('h') => self.export(ExportFormat::Html),
            KeyCode::Char('w') => self.export(ExportFormat::Word),
            KeyCode::Char('p') => self.export(ExportFormat::Pdf),
            KeyCode::Char('a') => self.start_editing(EditTarget::AttachmentPath, String::new()),
            KeyCode::Char('x') => self.remove_selected_attachment(),
            _ => {}
        }
        Action::None
    }

    /// Begin a request unless one is already running.
    pub fn start_generation(&mut self) -> Action {
        if self.is_generating() {
            return Action::None;
        }
        match self.state.begin_generation(self.service.as_ref()) {
            Ok(pending) => Action::Generate(pending),
            Err(_) => Action::None,
        }
    }

    fn select_template(&mut self, kind: TemplateKind) {
        self.state.apply(AppEvent::TemplateSelected(kind));
    }

    fn cycle(&mut self, forward: bool) {
        let config = &self.state.config;
        let event = match self.focus {
            Focus::Subject => AppEvent::SubjectChanged(if forward {
                config.subject.next()
            } else {
                config.subject.prev()
            }),
            Focus::Grade => AppEvent::GradeChanged(if forward {
                config.grade.next()
            } else {
                config.grade.prev()
            }),
            Focus::Audience => AppEvent::AudienceChanged(config.audience.toggle()),
            Focus::Templates => {
                let len = TemplateKind::ALL.len();
                let current = self
                    .state
                    .selected_template()
                    .and_then(|k| TemplateKind::ALL.iter().position(|t| *t == k));
                let index = match (current, forward) {
                    (None, true) => 0,
                    (None, false) => len - 1,
                    (Some(i), true) => (i + 1) % len,
                    (Some(i), false) => (i + len - 1) % len,
                };
                AppEvent::TemplateSelected(TemplateKind::ALL[index])
            }
            _ => return,
        };
        self.state.apply(event);
    }

    fn move_attachment(&mut self, down: bool) {
        if self.focus != Focus::Attachments {
            return;
        }
        let len = self.state.attachments().len();
        if len == 0 {
            return;
        }
        self.selected_attachment = if down {
            (self.selected_attachment + 1).min(len - 1)
        } else {
            self.selected_attachment.saturating_sub(1)
        };
    }

    fn remove_selected_attachment(&mut self) {
        let index = self.selected_attachment;
        self.state.apply(AppEvent::AttachmentRemoved(index));
        let len = self.state.attachments().len();
        if self.selected_attachment >= len {
            self.selected_attachment = len.saturating_sub(1);
        }
    }

    fn export(&mut self, format: ExportFormat) {
        // The result is reported through the notice.
        let _ = self
            .state
            .export(format, &self.output_dir, Some(&self.export_prefix));
    }

    // -- Editing --

    fn start_editing_focused(&mut self) {
        let (target, current) = match self.focus {
            Focus::Title => (EditTarget::Title, self.state.config.lesson_title.clone()),
            Focus::Periods => (EditTarget::Periods, self.state.config.period_count.clone()),
            Focus::Prompt => (EditTarget::Prompt, self.state.prompt().to_string()),
            Focus::Attachments => (EditTarget::AttachmentPath, String::new()),
            _ => return,
        };
        self.start_editing(target, current);
    }

    fn start_editing(&mut self, target: EditTarget, current: String) {
        self.editing = Some(target);
        self.input = current;
    }

    fn handle_edit_key(&mut self, key: KeyEvent) {
        let Some(target) = self.editing else {
            return;
        };
        match key.code {
            KeyCode::Esc => self.finish_editing(target),
            KeyCode::Enter if target == EditTarget::Prompt => self.input.push('\n'),
            KeyCode::Enter => self.finish_editing(target),
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Char(c) => self.input.push(c),
            _ => {}
        }
    }

    fn finish_editing(&mut self, target: EditTarget) {
        self.editing = None;
        let text = std::mem::take(&mut self.input);
        match target {
            EditTarget::Title => {
                self.state.apply(AppEvent::TitleChanged(text));
            }
            EditTarget::Periods => {
                self.state.apply(AppEvent::PeriodCountChanged(text));
            }
            EditTarget::Prompt => {
                self.state.apply(AppEvent::PromptEdited(text));
            }
            EditTarget::AttachmentPath => self.add_attachment(text.trim()),
        }
    }

    fn add_attachment(&mut self, path: &str) {
        if path.is_empty() {
            return;
        }
        match Attachment::from_path(std::path::Path::new(path)) {
            Ok(attachment) => {
                self.state.apply(AppEvent::AttachmentsAdded(vec![attachment]));
            }
            Err(err) => {
                tracing::warn!(error = %err, "attachment rejected");
                self.state.set_notice(Notice::error(err.to_string()));
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
