//! The generated document held by a session.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::generation::GenerationError;

/// Prefix for documents that record a failed request.
pub const ERROR_PREFIX: &str = "Lỗi: ";

/// Markup returned by the generation service, or the error text that
/// replaced it.
///
/// Failed requests keep the historical behaviour of showing
/// `"Lỗi: <message>"` where the document would be; `failed` lets callers
/// tell the two apart without parsing the text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedDocument {
    pub id: Uuid,
    pub text: String,
    pub failed: bool,
    pub generated_at: DateTime<Utc>,
}

impl GeneratedDocument {
    /// A successful response. The text is kept verbatim.
    pub fn content(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            failed: false,
            generated_at: Utc::now(),
        }
    }

    /// A failed request, rendered as `"Lỗi: <error>"`.
    pub fn failure(err: &GenerationError) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: format!("{ERROR_PREFIX}{err}"),
            failed: true,
            generated_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_text_is_prefixed_message() {
        let doc = GeneratedDocument::failure(&GenerationError::Service("timeout".into()));
        assert_eq!(doc.text, "Lỗi: timeout");
        assert!(doc.failed);
    }

    #[test]
    fn content_is_verbatim() {
        let doc = GeneratedDocument::content("<h2>Bài 1</h2>\n");
        assert_eq!(doc.text, "<h2>Bài 1</h2>\n");
        assert!(!doc.failed);
        assert_ne!(doc.id, GeneratedDocument::content("x").id);
    }
}
