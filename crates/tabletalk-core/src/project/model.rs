//! Project domain models.

use serde::{Deserialize, Serialize};

use crate::document::StoredDocument;
use crate::thread::ThreadMetadata;

/// Lightweight entry in the application's project index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    pub id: String,
    pub name: String,
    /// Epoch milliseconds
    pub updated_at: i64,
}

/// Per-project state, persisted as `projects/<id>/project.json`.
///
/// Documents are project-scoped; every thread of the project may point at
/// one of them through `active_document_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMetadata {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub documents: Vec<StoredDocument>,
    #[serde(default)]
    pub threads: Vec<ThreadMetadata>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl ProjectMetadata {
    pub fn new(id: impl Into<String>, name: impl Into<String>, now: i64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            documents: Vec::new(),
            threads: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn summary(&self) -> ProjectSummary {
        ProjectSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            updated_at: self.updated_at,
        }
    }

    pub fn touch(&mut self, now: i64) {
        self.updated_at = self.updated_at.max(now);
    }

    pub fn find_thread(&self, thread_id: &str) -> Option<&ThreadMetadata> {
        self.threads.iter().find(|t| t.id == thread_id)
    }

    pub fn find_thread_mut(&mut self, thread_id: &str) -> Option<&mut ThreadMetadata> {
        self.threads.iter_mut().find(|t| t.id == thread_id)
    }

    pub fn add_thread(&mut self, thread: ThreadMetadata) {
        self.touch(thread.last_updated);
        self.threads.push(thread);
    }

    /// Removes a thread. Project threads own no blobs, so nothing else to clean up.
    pub fn remove_thread(&mut self, thread_id: &str) -> Option<ThreadMetadata> {
        let index = self.threads.iter().position(|t| t.id == thread_id)?;
        Some(self.threads.remove(index))
    }

    pub fn find_document(&self, document_id: &str) -> Option<&StoredDocument> {
        self.documents.iter().find(|d| d.id == document_id)
    }

    /// Adds a project-level document, replacing one with the same id.
    pub fn add_document(&mut self, document: StoredDocument) {
        self.touch(document.added_at);
        self.documents.retain(|d| d.id != document.id);
        self.documents.push(document);
    }

    /// Removes a project-level document and clears every thread's pointer to it.
    ///
    /// The caller owns deleting the blob of the returned document.
    pub fn remove_document(&mut self, document_id: &str) -> Option<StoredDocument> {
        let index = self.documents.iter().position(|d| d.id == document_id)?;
        for thread in &mut self.threads {
            thread.clear_active_document(document_id);
        }
        Some(self.documents.remove(index))
    }
}
