//! Project repository trait.

use async_trait::async_trait;

use super::model::ProjectMetadata;
use crate::error::Result;

/// Repository for per-project metadata.
///
/// # Implementation Notes
///
/// Implementations should:
/// - Upgrade older on-disk shapes on load and persist the upgrade before returning
/// - Coalesce rapid saves of the same project
/// - Never surface "nothing stored yet" as an error
#[async_trait]
pub trait ProjectRepository: Send + Sync {
    /// Loads a project.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(ProjectMetadata))`: Project found
    /// - `Ok(None)`: No file, or a file that cannot be parsed
    /// - `Err(_)`: The upgraded shape could not be written back
    async fn load(&self, project_id: &str) -> Result<Option<ProjectMetadata>>;

    /// Schedules a save. Write failures are reported through the scheduler's
    /// event channel, not returned here.
    async fn save(&self, project: &ProjectMetadata) -> Result<()>;

    /// Removes the project's whole directory, documents included. Idempotent.
    async fn delete(&self, project_id: &str) -> Result<()>;
}
