//! Studio rendering using ratatui.

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph, Wrap};

use lessonkit_core::app::NoticeLevel;
use lessonkit_core::attachments::MAX_ATTACHMENTS;
use lessonkit_core::prompt::{TITLE_PLACEHOLDER, TemplateKind};

use super::app::{App, EditTarget, Focus};

/// Render the whole studio.
pub fn render(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(7), // form + attachments
            Constraint::Length(3), // template bar
            Constraint::Min(6),    // prompt + preview
            Constraint::Length(1), // status bar
        ])
        .split(f.area());

    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(chunks[0]);
    render_form(f, app, top[0]);
    render_attachments(f, app, top[1]);

    render_templates(f, app, chunks[1]);

    let middle = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(chunks[2]);
    render_prompt(f, app, middle[0]);
    render_preview(f, app, middle[1]);

    render_status_bar(f, app, chunks[3]);
}

fn render_form(f: &mut Frame, app: &App, area: Rect) {
    let config = &app.state.config;
    let title = editable(app, EditTarget::Title, &config.lesson_title, TITLE_PLACEHOLDER);
    let periods = editable(app, EditTarget::Periods, &config.period_count, "1");

    let lines = vec![
        field_line(app, Focus::Subject, "Môn học", format!("< {} >", config.subject)),
        field_line(app, Focus::Grade, "Khối lớp", format!("< {} >", config.grade)),
        field_line(app, Focus::Title, "Tên bài", title),
        field_line(app, Focus::Periods, "Số tiết", periods),
        field_line(
            app,
            Focus::Audience,
            "Đối tượng",
            format!("< {} >", config.audience.label()),
        ),
    ];

    let paragraph = Paragraph::new(lines).block(panel(" Thông tin bài dạy ", false));
    f.render_widget(paragraph, area);
}

fn render_attachments(f: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus == Focus::Attachments;
    let mut items: Vec<ListItem> = app
        .state
        .attachments()
        .items()
        .iter()
        .enumerate()
        .map(|(i, a)| {
            let style = if focused && i == app.selected_attachment {
                Style::default()
                    .bg(Color::DarkGray)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            ListItem::new(format!("{} ({} B)", a.name, a.size_bytes)).style(style)
        })
        .collect();

    if app.editing == Some(EditTarget::AttachmentPath) {
        items.push(
            ListItem::new(format!("+ {}▏", app.input)).style(Style::default().fg(Color::Yellow)),
        );
    }

    let title = format!(
        " Tệp đính kèm {}/{MAX_ATTACHMENTS} ",
        app.state.attachments().len()
    );
    f.render_widget(List::new(items).block(panel(&title, focused)), area);
}

fn render_templates(f: &mut Frame, app: &App, area: Rect) {
    let selected = app.state.selected_template();
    let mut spans = Vec::new();
    for (i, kind) in TemplateKind::ALL.iter().enumerate() {
        let style = if selected == Some(*kind) {
            Style::default().bg(Color::Blue).fg(Color::White)
        } else if kind.has_body() {
            Style::default()
        } else {
            Style::default().fg(Color::DarkGray)
        };
        spans.push(Span::styled(format!(" {}:{} ", i + 1, kind.label()), style));
        spans.push(Span::raw(" "));
    }
    let bar = Paragraph::new(Line::from(spans))
        .block(panel(" Mẫu ", app.focus == Focus::Templates));
    f.render_widget(bar, area);
}

fn render_prompt(f: &mut Frame, app: &App, area: Rect) {
    let focused = app.focus == Focus::Prompt;
    let text = if app.editing == Some(EditTarget::Prompt) {
        format!("{}▏", app.input)
    } else {
        app.state.prompt().to_string()
    };
    let paragraph = Paragraph::new(text)
        .wrap(Wrap { trim: false })
        .block(panel(" Yêu cầu (Enter: sửa, Esc: xong) ", focused));
    f.render_widget(paragraph, area);
}

fn render_preview(f: &mut Frame, app: &App, area: Rect) {
    let (text, style) = if app.is_generating() {
        (
            "Đang tạo tài liệu...".to_string(),
            Style::default().fg(Color::Yellow),
        )
    } else {
        match app.state.document() {
            Some(doc) if doc.failed => (doc.text.clone(), Style::default().fg(Color::Red)),
            Some(doc) => (plain_text(&doc.text), Style::default()),
            None => (
                "Chưa có tài liệu. Nhấn g để tạo.".to_string(),
                Style::default().fg(Color::DarkGray),
            ),
        }
    };
    let paragraph = Paragraph::new(text)
        .style(style)
        .wrap(Wrap { trim: false })
        .block(panel(" Xem trước ", false));
    f.render_widget(paragraph, area);
}

fn render_status_bar(f: &mut Frame, app: &App, area: Rect) {
    let (message, color) = match app.notice() {
        Some(n) => (
            n.message.as_str(),
            match n.level {
                NoticeLevel::Info => Color::Green,
                NoticeLevel::Warning => Color::Yellow,
                NoticeLevel::Error => Color::Red,
            },
        ),
        None => ("", Color::Green),
    };

    let mode = if app.editing.is_some() {
        " EDIT "
    } else if app.is_generating() {
        " BUSY "
    } else {
        " READY "
    };

    let bar = Line::from(vec![
        Span::styled(mode, Style::default().bg(Color::Blue).fg(Color::White)),
        Span::raw("  "),
        Span::styled(message, Style::default().fg(color)),
        Span::raw("  g:tạo  h/w/p:xuất  a/x:tệp  Tab:chuyển  q:thoát"),
    ]);

    f.render_widget(Paragraph::new(bar), area);
}

// -- Helpers --

fn panel(title: &str, focused: bool) -> Block<'_> {
    let border = if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };
    Block::default()
        .borders(Borders::ALL)
        .border_style(border)
        .title(title)
}

fn field_line(app: &App, focus: Focus, label: &str, value: String) -> Line<'static> {
    let label_style = if app.focus == focus {
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Yellow)
    };
    Line::from(vec![
        Span::styled(format!("{label:<10}"), label_style),
        Span::raw(value),
    ])
}

/// Current value of a text field, the live input while editing it, or a
/// dimmed placeholder.
fn editable(app: &App, target: EditTarget, value: &str, placeholder: &str) -> String {
    if app.editing == Some(target) {
        format!("{}▏", app.input)
    } else if value.trim().is_empty() {
        format!("({placeholder})")
    } else {
        value.to_string()
    }
}

/// Rough text rendering of document markup: block tags become line breaks,
/// list items get a bullet, other tags are dropped.
fn plain_text(markup: &str) -> String {
    let mut out = String::with_capacity(markup.len());
    let mut rest = markup;
    while let Some(start) = rest.find('<') {
        out.push_str(&rest[..start]);
        let Some(end) = rest[start..].find('>') else {
            out.push_str(&rest[start..]);
            return out;
        };
        let tag = rest[start + 1..start + end].trim().to_ascii_lowercase();
        let name = tag.trim_start_matches('/');
        let name = name.split_whitespace().next().unwrap_or("");
        match name {
            "li" if !tag.starts_with('/') => out.push_str("\n• "),
            "br" | "p" | "h1" | "h2" | "h3" | "h4" | "tr" | "ul" | "ol" | "table" => {
                if !out.ends_with('\n') {
                    out.push('\n');
                }
            }
            "td" | "th" if tag.starts_with('/') => out.push_str(" | "),
            _ => {}
        }
        rest = &rest[start + end + 1..];
    }
    out.push_str(rest);
    out.trim().to_string()
}
