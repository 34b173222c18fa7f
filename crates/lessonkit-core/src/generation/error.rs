//! Errors returned by generation backends.
//!
//! The `Display` output of each variant is the message shown to teachers,
//! after the `"Lỗi: "` prefix, when a request fails.

use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// No API key was configured.
    #[error("chưa cấu hình API key")]
    MissingApiKey,

    /// Transport failure (DNS, TLS, connection reset, timeout).
    #[error("{0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Api { status: StatusCode, message: String },

    /// The response body did not have the expected shape.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The service answered successfully but with no text.
    #[error("empty response from generation service")]
    EmptyResponse,

    /// Free-form failure reported by a backend.
    #[error("{0}")]
    Service(String),
}
