//! Document domain models.

use serde::{Deserialize, Serialize};

use super::naming;

/// How the parsing collaborator should treat a stored document.
///
/// Inferred purely from the file extension, never from file contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    /// CSV, Excel and anything else that is not a PDF.
    Tabular,
    Pdf,
}

impl DocumentKind {
    /// Infers the kind from a file name: `.pdf` (any case) is a PDF, everything else is tabular.
    pub fn from_file_name(file_name: &str) -> Self {
        let is_pdf = file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.eq_ignore_ascii_case("pdf"))
            .unwrap_or(false);
        if is_pdf {
            DocumentKind::Pdf
        } else {
            DocumentKind::Tabular
        }
    }
}

/// The owner of a document blob: a project or a global thread.
///
/// Routing is explicit; nothing infers the owner from the shape of an id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum DocumentTarget {
    Project(String),
    Thread(String),
}

impl DocumentTarget {
    /// Id prefix that older builds used to mark global threads.
    pub const LEGACY_THREAD_PREFIX: &'static str = "thread-";

    pub fn project(id: impl Into<String>) -> Self {
        DocumentTarget::Project(id.into())
    }

    pub fn thread(id: impl Into<String>) -> Self {
        DocumentTarget::Thread(id.into())
    }

    /// Parses an id minted under the old prefix convention.
    ///
    /// Only for callers holding ids from a source that still follows that
    /// convention; new code should construct the variant directly.
    pub fn from_prefixed_id(id: &str) -> Self {
        if id.starts_with(Self::LEGACY_THREAD_PREFIX) {
            DocumentTarget::Thread(id.to_string())
        } else {
            DocumentTarget::Project(id.to_string())
        }
    }

    pub fn id(&self) -> &str {
        match self {
            DocumentTarget::Project(id) | DocumentTarget::Thread(id) => id,
        }
    }
}

impl std::fmt::Display for DocumentTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentTarget::Project(id) => write!(f, "project '{}'", id),
            DocumentTarget::Thread(id) => write!(f, "thread '{}'", id),
        }
    }
}

/// A file copied into the blob store.
///
/// The record that lists a `StoredDocument` owns the blob on disk. `kind` is
/// serialized for the UI but recomputed from `stored_file_name` whenever a
/// record is deserialized, so it always matches the actual extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "StoredDocumentRecord")]
pub struct StoredDocument {
    /// Caller-generated id, also the blob-name prefix
    pub id: String,
    pub original_file_name: String,
    /// `<sanitized-id>-<sanitized-original-name>`
    pub stored_file_name: String,
    pub kind: DocumentKind,
    pub size_bytes: u64,
    /// Epoch milliseconds
    pub added_at: i64,
}

impl StoredDocument {
    pub fn new(
        id: impl Into<String>,
        original_file_name: impl Into<String>,
        size_bytes: u64,
        added_at: i64,
    ) -> Self {
        let id = id.into();
        let original_file_name = original_file_name.into();
        let stored_file_name = naming::stored_file_name(&id, &original_file_name);
        let kind = DocumentKind::from_file_name(&stored_file_name);
        Self {
            id,
            original_file_name,
            stored_file_name,
            kind,
            size_bytes,
            added_at,
        }
    }
}

/// On-disk shape of [`StoredDocument`]; `kind` is accepted but ignored.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredDocumentRecord {
    id: String,
    original_file_name: String,
    stored_file_name: String,
    #[serde(default)]
    #[allow(dead_code)]
    kind: Option<DocumentKind>,
    #[serde(default)]
    size_bytes: u64,
    #[serde(default)]
    added_at: i64,
}

impl From<StoredDocumentRecord> for StoredDocument {
    fn from(record: StoredDocumentRecord) -> Self {
        let kind = DocumentKind::from_file_name(&record.stored_file_name);
        Self {
            id: record.id,
            original_file_name: record.original_file_name,
            stored_file_name: record.stored_file_name,
            kind,
            size_bytes: record.size_bytes,
            added_at: record.added_at,
        }
    }
}

/// A blob read back from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentBlob {
    pub bytes: Vec<u8>,
    pub original_file_name: String,
    pub kind: DocumentKind,
}
