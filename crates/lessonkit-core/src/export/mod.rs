//! Document export.
//!
//! Every format writes the same bytes: the document markup exactly as
//! generated. The format only picks the file extension, so a `.doc` or
//! `.pdf` export is an HTML file under another name. Word processors open
//! such files; PDF viewers generally do not.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::info;

/// Prefix used for exported file names when none is configured.
pub const DEFAULT_PREFIX: &str = "GiaoAn";

/// Stem used when the lesson title is blank.
pub const DEFAULT_TITLE_TOKEN: &str = "TaiLieu";

/// MIME label attached to every export.
pub const EXPORT_MIME: &str = "text/html";

/// Export target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Html,
    Word,
    Pdf,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 3] = [Self::Html, Self::Word, Self::Pdf];

    pub fn extension(self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Word => "doc",
            Self::Pdf => "pdf",
        }
    }

    pub fn mime(self) -> &'static str {
        EXPORT_MIME
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Html => f.write_str("html"),
            Self::Word => f.write_str("word"),
            Self::Pdf => f.write_str("pdf"),
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "html" | "markup" => Ok(Self::Html),
            "word" | "doc" => Ok(Self::Word),
            "pdf" => Ok(Self::Pdf),
            _ => Err(ExportError::UnknownFormat(s.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("unknown export format {0:?} (expected html, word or pdf)")]
    UnknownFormat(String),
    #[error("no document to export; generate one first")]
    NoDocument,
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// What to write and under which name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRequest {
    pub format: ExportFormat,
    /// File name without extension, e.g. `GiaoAn_Phân số`.
    pub filename_stem: String,
}

impl ExportRequest {
    /// Derive `<prefix>_<title or TaiLieu>` from the lesson title.
    ///
    /// Path separators in the title are replaced with `-` so the file
    /// always lands directly in the export directory.
    pub fn new(format: ExportFormat, lesson_title: &str, prefix: Option<&str>) -> Self {
        let prefix = prefix
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .unwrap_or(DEFAULT_PREFIX);
        let title = lesson_title.trim();
        let title = if title.is_empty() {
            DEFAULT_TITLE_TOKEN.to_string()
        } else {
            title.replace(['/', '\\'], "-")
        };
        Self {
            format,
            filename_stem: format!("{prefix}_{title}"),
        }
    }

    pub fn file_name(&self) -> String {
        format!("{}.{}", self.filename_stem, self.format.extension())
    }
}

/// A file written by [`export_document`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportedFile {
    pub path: PathBuf,
    pub format: ExportFormat,
    pub mime: &'static str,
    pub bytes_written: usize,
}

/// Write `text` verbatim to `dir/<stem>.<ext>`, creating `dir` if needed.
/// An existing file with the same name is overwritten.
pub fn export_document(
    text: &str,
    request: &ExportRequest,
    dir: &Path,
) -> Result<ExportedFile, ExportError> {
    std::fs::create_dir_all(dir).map_err(|source| ExportError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let path = dir.join(request.file_name());
    std::fs::write(&path, text.as_bytes()).map_err(|source| ExportError::Io {
        path: path.clone(),
        source,
    })?;

    info!(path = %path.display(), format = %request.format, bytes = text.len(), "document exported");

    Ok(ExportedFile {
        path,
        format: request.format,
        mime: request.format.mime(),
        bytes_written: text.len(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const DOC: &str = "<h2>Bài 5: Phân số</h2>\n<ul><li>Mục tiêu</li></ul>";

    #[test]
    fn all_formats_write_identical_bytes() {
        let tmp = TempDir::new().unwrap();
        for format in ExportFormat::ALL {
            let request = ExportRequest::new(format, "Phân số", None);
            let file = export_document(DOC, &request, tmp.path()).unwrap();

            assert_eq!(std::fs::read_to_string(&file.path).unwrap(), DOC);
            assert_eq!(file.bytes_written, DOC.len());
            assert_eq!(file.mime, "text/html");
            assert_eq!(
                file.path.extension().and_then(|e| e.to_str()),
                Some(format.extension())
            );
        }
    }

    #[test]
    fn file_name_uses_prefix_and_title() {
        let request = ExportRequest::new(ExportFormat::Word, "Phân số", None);
        assert_eq!(request.file_name(), "GiaoAn_Phân số.doc");

        let request = ExportRequest::new(ExportFormat::Pdf, "  ", Some("DeThi"));
        assert_eq!(request.file_name(), "DeThi_TaiLieu.pdf");
    }

    #[test]
    fn title_separators_are_replaced() {
        let request = ExportRequest::new(ExportFormat::Html, "Bài 1/2\\3", None);
        assert_eq!(request.file_name(), "GiaoAn_Bài 1-2-3.html");
    }

    #[test]
    fn export_creates_missing_directory() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("nested").join("out");
        let request = ExportRequest::new(ExportFormat::Html, "", None);
        let file = export_document("x", &request, &dir).unwrap();
        assert_eq!(file.path, dir.join("GiaoAn_TaiLieu.html"));
    }

    #[test]
    fn format_parsing() {
        assert_eq!("markup".parse::<ExportFormat>().unwrap(), ExportFormat::Html);
        assert_eq!("DOC".parse::<ExportFormat>().unwrap(), ExportFormat::Word);
        assert_eq!("pdf".parse::<ExportFormat>().unwrap(), ExportFormat::Pdf);
        assert!(matches!(
            "odt".parse::<ExportFormat>(),
            Err(ExportError::UnknownFormat(_))
        ));
    }
}
