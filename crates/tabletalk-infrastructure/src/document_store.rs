//! Filesystem implementation of the document blob store.

use async_trait::async_trait;
use std::io::ErrorKind;
use tabletalk_core::document::naming::original_name_from_stored;
use tabletalk_core::document::{
    DocumentBlob, DocumentKind, DocumentStore, DocumentTarget, StoredDocument,
};
use tabletalk_core::error::{Result, TabletalkError};
use tokio::fs;

use crate::paths::StoragePaths;
use crate::storage::write_atomic;

/// Keeps blobs under `projects/<id>/documents` or `threads/<id>/documents`.
///
/// Blob names are unique per document id, so blob writes bypass the write
/// scheduler and go straight through the atomic writer.
#[derive(Debug, Clone)]
pub struct FsDocumentStore {
    paths: StoragePaths,
}

impl FsDocumentStore {
    pub fn new(paths: StoragePaths) -> Self {
        Self { paths }
    }
}

#[async_trait]
impl DocumentStore for FsDocumentStore {
    async fn store(
        &self,
        target: &DocumentTarget,
        document_id: &str,
        original_file_name: &str,
        bytes: &[u8],
    ) -> Result<StoredDocument> {
        let document = StoredDocument::new(
            document_id,
            original_file_name,
            bytes.len() as u64,
            chrono::Utc::now().timestamp_millis(),
        );
        let path = self.paths.document_path(target, &document.stored_file_name);

        write_atomic(&path, bytes).await?;
        tracing::debug!(
            owner = %target,
            stored = %document.stored_file_name,
            size = document.size_bytes,
            "Stored document"
        );

        Ok(document)
    }

    async fn read(&self, target: &DocumentTarget, stored_file_name: &str) -> Result<DocumentBlob> {
        let path = self.paths.document_path(target, stored_file_name);
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(TabletalkError::not_found("document", stored_file_name));
            }
            Err(e) => {
                return Err(TabletalkError::io(format!(
                    "Failed to read '{}': {}",
                    path.display(),
                    e
                )));
            }
        };

        Ok(DocumentBlob {
            bytes,
            original_file_name: original_name_from_stored(stored_file_name).to_string(),
            kind: DocumentKind::from_file_name(stored_file_name),
        })
    }

    async fn delete(&self, target: &DocumentTarget, stored_file_name: &str) -> Result<()> {
        let path = self.paths.document_path(target, stored_file_name);
        match fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!(owner = %target, stored = stored_file_name, "Deleted document");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(TabletalkError::io(format!(
                "Failed to delete '{}': {}",
                path.display(),
                e
            ))),
        }
    }

    async fn delete_target(&self, target: &DocumentTarget) -> Result<()> {
        let dir = self.paths.target_dir(target);
        match fs::remove_dir_all(&dir).await {
            Ok(()) => {
                tracing::info!(owner = %target, "Deleted target directory");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(TabletalkError::io(format!(
                "Failed to delete '{}': {}",
                dir.display(),
                e
            ))),
        }
    }
}
