//! Prompt assembly: the lesson form, its catalog and the document templates.

pub mod catalog;
pub mod config;
pub mod template;

pub use catalog::{CatalogError, Grade, Subject};
pub use config::{AudienceTier, DEFAULT_PERIOD_COUNT, LessonConfig, TITLE_PLACEHOLDER};
pub use template::{INCLUSIVE_CLAUSE, STANDARD_CLAUSE, TemplateKind, build_prompt};
