//! JSON-file implementation of the project repository.

use async_trait::async_trait;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tabletalk_core::error::{Result, TabletalkError};
use tabletalk_core::project::{ProjectMetadata, ProjectRepository};

use crate::migration::{UpgradeRegistry, project_registry};
use crate::paths::StoragePaths;
use crate::storage::{AtomicJsonFile, WriteScheduler, load_versioned, stamped_json};

/// Stores each project in `projects/<id>/project.json`.
///
/// Saves are debounced per project. The last saved record is kept in memory
/// and served by `load`, so a read inside the debounce window never sees the
/// stale file. Older file shapes are upgraded on load and written back
/// immediately, so each file is upgraded at most once.
#[derive(Clone)]
pub struct JsonProjectRepository {
    paths: StoragePaths,
    scheduler: WriteScheduler,
    registry: Arc<UpgradeRegistry>,
    /// Last saved record per scheduler key
    saved: Arc<Mutex<HashMap<String, ProjectMetadata>>>,
}

impl JsonProjectRepository {
    pub fn new(paths: StoragePaths, scheduler: WriteScheduler) -> Self {
        Self {
            paths,
            scheduler,
            registry: Arc::new(project_registry()),
            saved: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn saved(&self) -> MutexGuard<'_, HashMap<String, ProjectMetadata>> {
        self.saved.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Drops the in-memory copy of a project whose file was replaced outside
    /// this repository, so the next `load` reads the file.
    pub fn forget(&self, project_id: &str) {
        self.saved().remove(&StoragePaths::project_key(project_id));
    }

    fn file(&self, project_id: &str) -> AtomicJsonFile<ProjectMetadata> {
        AtomicJsonFile::new(self.paths.project_file(project_id))
    }
}

#[async_trait]
impl ProjectRepository for JsonProjectRepository {
    async fn load(&self, project_id: &str) -> Result<Option<ProjectMetadata>> {
        let cached = self
            .saved()
            .get(&StoragePaths::project_key(project_id))
            .cloned();
        if cached.is_some() {
            return Ok(cached);
        }

        let file = self.file(project_id);
        let Some(loaded) = load_versioned(&file, &self.registry).await else {
            return Ok(None);
        };

        if loaded.upgraded {
            // Not debounced: the next reader must see the upgraded shape
            file.save_value(&loaded.value).await?;
            tracing::info!(project_id = %project_id, "Persisted upgraded project file");
        }

        Ok(Some(loaded.record))
    }

    async fn save(&self, project: &ProjectMetadata) -> Result<()> {
        let contents = stamped_json(project, &self.registry)?;
        let key = StoragePaths::project_key(&project.id);
        self.saved().insert(key.clone(), project.clone());
        self.scheduler
            .schedule_write(key, self.paths.project_file(&project.id), contents);
        Ok(())
    }

    async fn delete(&self, project_id: &str) -> Result<()> {
        let key = StoragePaths::project_key(project_id);
        self.saved().remove(&key);
        self.scheduler.cancel(&key).await;

        let dir = self.paths.project_dir(project_id);
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => {
                tracing::info!(project_id = %project_id, "Deleted project directory");
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
