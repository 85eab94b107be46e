//! Conversation threads and their messages.

pub mod model;

pub use model::{ChatMessageData, ChatRole, DEFAULT_THREAD_TITLE, ThreadMetadata};
