//! Document blob store trait.

use async_trait::async_trait;

use super::model::{DocumentBlob, DocumentTarget, StoredDocument};
use crate::error::Result;

/// Opaque file blobs kept under a per-target directory.
///
/// The store never inspects contents; `kind` comes from the extension only.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Copies `bytes` into the target's document directory.
    ///
    /// Parent directories are created on demand.
    async fn store(
        &self,
        target: &DocumentTarget,
        document_id: &str,
        original_file_name: &str,
        bytes: &[u8],
    ) -> Result<StoredDocument>;

    /// Reads a blob back.
    ///
    /// # Errors
    ///
    /// Returns `TabletalkError::NotFound` when the blob does not exist.
    async fn read(&self, target: &DocumentTarget, stored_file_name: &str) -> Result<DocumentBlob>;

    /// Deletes a blob. Deleting a missing blob is not an error.
    async fn delete(&self, target: &DocumentTarget, stored_file_name: &str) -> Result<()>;

    /// Removes every blob the target owns. Idempotent.
    async fn delete_target(&self, target: &DocumentTarget) -> Result<()>;
}
