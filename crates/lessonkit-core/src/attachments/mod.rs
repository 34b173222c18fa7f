//! Attachment list.
//!
//! Teachers can pick up to [`MAX_ATTACHMENTS`] reference files. A batch that
//! would exceed the cap is rejected as a whole. Attachments are listed in the
//! interface only; they are not sent with generation requests.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Maximum number of attachments.
pub const MAX_ATTACHMENTS: usize = 5;

/// A user-selected file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(default)]
    pub size_bytes: u64,
}

impl Attachment {
    /// Describe an existing file from its metadata.
    pub fn from_path(path: &Path) -> Result<Self, AttachmentError> {
        let meta = std::fs::metadata(path).map_err(|source| AttachmentError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        if !meta.is_file() {
            return Err(AttachmentError::NotAFile(path.to_path_buf()));
        }
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self {
            name,
            path: Some(path.to_path_buf()),
            size_bytes: meta.len(),
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AttachmentError {
    #[error(
        "tối đa {max} tệp đính kèm: đã có {existing}, không thể thêm {incoming}"
    )]
    LimitExceeded {
        existing: usize,
        incoming: usize,
        max: usize,
    },
    #[error("cannot read {path}: {source}")]
    Unreadable {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("{0} is not a regular file")]
    NotAFile(PathBuf),
}

/// Ordered, capped list of attachments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AttachmentList {
    items: Vec<Attachment>,
}

impl AttachmentList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[Attachment] {
        &self.items
    }

    /// Append `batch` in order, or reject all of it if the result would
    /// hold more than [`MAX_ATTACHMENTS`]. Returns the new length.
    pub fn add_batch(&mut self, batch: Vec<Attachment>) -> Result<usize, AttachmentError> {
        let existing = self.items.len();
        let incoming = batch.len();
        if existing + incoming > MAX_ATTACHMENTS {
            warn!(existing, incoming, max = MAX_ATTACHMENTS, "attachment batch rejected");
            return Err(AttachmentError::LimitExceeded {
                existing,
                incoming,
                max: MAX_ATTACHMENTS,
            });
        }
        self.items.extend(batch);
        Ok(self.items.len())
    }

    /// Remove the attachment at `index`. Out-of-range indices return `None`.
    pub fn remove(&mut self, index: usize) -> Option<Attachment> {
        (index < self.items.len()).then(|| self.items.remove(index))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
