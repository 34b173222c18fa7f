//! Text-generation service interface.
//!
//! This module defines the [`GenerationService`] trait that every backend
//! implements, the [`GenerationError`] type, and the [`GeminiClient`]
//! backend for the Gemini `generateContent` API.
//!
//! # Architecture
//!
//! ```text
//! Session / ChatLog
//!     |
//!     v
//! &dyn GenerationService
//!     |   has_credential()  -> precondition check, no request sent
//!     |   generate_text(prompt) -> Result<String, GenerationError>
//!     v
//! GeminiClient --POST models/{model}:generateContent--> Gemini
//! ```

pub mod error;
pub mod gemini;
pub mod trait_def;

pub use error::GenerationError;
pub use gemini::{GeminiClient, GeminiSettings};
pub use trait_def::GenerationService;
