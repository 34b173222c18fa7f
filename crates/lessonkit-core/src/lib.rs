//! Core library for lessonkit: prompt assembly, the generation session,
//! document export, attachments, the chat assistant and the application
//! controller shared by the CLI front-ends.

pub mod app;
pub mod attachments;
pub mod chat;
pub mod export;
pub mod generation;
pub mod prompt;
pub mod session;
