//! Chat assistant.
//!
//! A side channel for quick questions. Each message is sent on its own
//! with a short persona wrapper; earlier turns are kept for display only.
//! When the service is unavailable the assistant answers with a canned
//! reply instead of an error.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use crate::generation::GenerationService;

/// Persona sent ahead of each chat message.
pub const CHAT_WRAPPER: &str = "\
Bạn là trợ lý thân thiện của giáo viên. Trả lời ngắn gọn, rõ ràng, bằng tiếng Việt, \
dạng văn bản thường (không dùng HTML).";

/// Reply shown when the service cannot answer.
pub const FALLBACK_REPLY: &str =
    "Xin lỗi, hiện tôi chưa thể trả lời. Thầy cô vui lòng thử lại sau ít phút.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
    /// True when the assistant reply is [`FALLBACK_REPLY`].
    pub fallback: bool,
    pub sent_at: DateTime<Utc>,
}

/// Display history of the chat panel.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ChatLog {
    messages: Vec<ChatMessage>,
}

impl ChatLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Move every message of `other` to the end of this log.
    pub fn append(&mut self, mut other: ChatLog) {
        self.messages.append(&mut other.messages);
    }

    fn push(&mut self, role: ChatRole, text: String, fallback: bool) -> &ChatMessage {
        self.messages.push(ChatMessage {
            role,
            text,
            fallback,
            sent_at: Utc::now(),
        });
        &self.messages[self.messages.len() - 1]
    }
}

/// Send one chat message and record both sides of the turn.
///
/// Blank messages are ignored and return `None`.
pub async fn ask<'a>(
    service: &dyn GenerationService,
    log: &'a mut ChatLog,
    message: &str,
) -> Option<&'a ChatMessage> {
    let message = message.trim();
    if message.is_empty() {
        return None;
    }
    log.push(ChatRole::User, message.to_string(), false);

    let reply = if service.has_credential() {
        service
            .generate_text(&format!("{CHAT_WRAPPER}\n\n{message}"))
            .await
            .map_err(|err| warn!(error = %err, "chat request failed"))
            .ok()
            .filter(|text| !text.trim().is_empty())
    } else {
        None
    };

    Some(match reply {
        Some(text) => log.push(ChatRole::Assistant, text, false),
        None => log.push(ChatRole::Assistant, FALLBACK_REPLY.to_string(), true),
    })
}
