//! Conversation thread and message types.

use serde::{Deserialize, Serialize};

use crate::document::StoredDocument;

/// Title given to threads until the first user message names them.
pub const DEFAULT_THREAD_TITLE: &str = "New chat";

const MAX_DERIVED_TITLE_CHARS: usize = 48;

/// Represents the role of a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
    System,
}

/// A single chat message. Immutable once appended to a thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessageData {
    pub id: String,
    pub role: ChatRole,
    pub content: String,
    /// Epoch milliseconds
    pub created_at: i64,
    /// Display annotation, e.g. the model name or an attached file name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<String>,
}

impl ChatMessageData {
    pub fn new(
        id: impl Into<String>,
        role: ChatRole,
        content: impl Into<String>,
        created_at: i64,
    ) -> Self {
        Self {
            id: id.into(),
            role,
            content: content.into(),
            created_at,
            meta: None,
        }
    }

    pub fn with_meta(mut self, meta: impl Into<String>) -> Self {
        self.meta = Some(meta.into());
        self
    }
}

/// A conversation thread, either global or owned by a project.
///
/// `documents` is only meaningful for global threads; project threads point
/// into the project's document set via `active_document_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadMetadata {
    pub id: String,
    pub title: String,
    /// Append-only; use [`ThreadMetadata::append_message`]
    #[serde(default)]
    pub messages: Vec<ChatMessageData>,
    #[serde(default)]
    pub documents: Vec<StoredDocument>,
    #[serde(default)]
    pub active_document_id: Option<String>,
    /// Epoch milliseconds
    pub last_updated: i64,
}

impl ThreadMetadata {
    pub fn new(id: impl Into<String>, now: i64) -> Self {
        Self {
            id: id.into(),
            title: DEFAULT_THREAD_TITLE.to_string(),
            messages: Vec::new(),
            documents: Vec::new(),
            active_document_id: None,
            last_updated: now,
        }
    }

    pub fn has_default_title(&self) -> bool {
        self.title == DEFAULT_THREAD_TITLE
    }

    /// Appends a message, bumping `last_updated` and naming the thread after
    /// the first user message while it still carries the default title.
    pub fn append_message(&mut self, message: ChatMessageData) {
        if message.role == ChatRole::User && self.has_default_title() {
            if let Some(title) = derive_title(&message.content) {
                self.title = title;
            }
        }
        self.last_updated = self.last_updated.max(message.created_at);
        self.messages.push(message);
    }

    pub fn find_document(&self, document_id: &str) -> Option<&StoredDocument> {
        self.documents.iter().find(|d| d.id == document_id)
    }

    /// Attaches a document to a global thread and makes it active.
    pub fn add_document(&mut self, document: StoredDocument) {
        self.active_document_id = Some(document.id.clone());
        self.documents.retain(|d| d.id != document.id);
        self.documents.push(document);
    }

    /// Removes a thread-level document, clearing the active pointer if needed.
    ///
    /// The caller owns deleting the blob of the returned document.
    pub fn remove_document(&mut self, document_id: &str) -> Option<StoredDocument> {
        let index = self.documents.iter().position(|d| d.id == document_id)?;
        self.clear_active_document(document_id);
        Some(self.documents.remove(index))
    }

    pub(crate) fn clear_active_document(&mut self, document_id: &str) {
        if self.active_document_id.as_deref() == Some(document_id) {
            self.active_document_id = None;
        }
    }
}

/// Collapses whitespace and truncates to a short title.
fn derive_title(content: &str) -> Option<String> {
    let collapsed = content.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return None;
    }
    if collapsed.chars().count() <= MAX_DERIVED_TITLE_CHARS {
        return Some(collapsed);
    }
    let truncated: String = collapsed.chars().take(MAX_DERIVED_TITLE_CHARS).collect();
    Some(format!("{}…", truncated.trim_end()))
}
