//! JSON-file implementation of the state repository.

use async_trait::async_trait;
use std::sync::Arc;
use tabletalk_core::error::Result;
use tabletalk_core::state::{ApplicationState, StateRepository};

use crate::migration::{UpgradeRegistry, app_state_registry};
use crate::paths::{APP_STATE_KEY, StoragePaths};
use crate::storage::{AtomicJsonFile, WriteScheduler, load_versioned, stamped_json};

/// Stores the application state in `app-state.json`.
///
/// Field renames are applied on every load; the renamed shape reaches disk
/// with the next save.
#[derive(Clone)]
pub struct JsonStateRepository {
    paths: StoragePaths,
    scheduler: WriteScheduler,
    registry: Arc<UpgradeRegistry>,
}

impl JsonStateRepository {
    pub fn new(paths: StoragePaths, scheduler: WriteScheduler) -> Self {
        Self {
            paths,
            scheduler,
            registry: Arc::new(app_state_registry()),
        }
    }
}

#[async_trait]
impl StateRepository for JsonStateRepository {
    async fn load(&self) -> Result<Option<ApplicationState>> {
        let file = AtomicJsonFile::new(self.paths.app_state_file());
        let loaded = load_versioned(&file, &self.registry).await;
        if loaded.as_ref().is_some_and(|loaded| loaded.upgraded) {
            tracing::debug!("Applied application state upgrades in memory");
        }
        Ok(loaded.map(|loaded| loaded.record))
    }

    async fn save(&self, state: &ApplicationState) -> Result<()> {
        let contents = stamped_json(state, &self.registry)?;
        self.scheduler
            .schedule_write(APP_STATE_KEY, self.paths.app_state_file(), contents);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use tabletalk_core::project::ProjectSummary;
    use tabletalk_core::state::ReasoningEffort;
    use tabletalk_core::thread::ThreadMetadata;
    use tempfile::TempDir;

    fn repository(temp_dir: &TempDir) -> JsonStateRepository {
        JsonStateRepository::new(
            StoragePaths::new(temp_dir.path()),
            WriteScheduler::new(Duration::from_secs(60)),
        )
    }

    #[tokio::test]
    async fn test_load_missing_state_is_none() {
        let temp_dir = TempDir::new().unwrap();
        assert!(repository(&temp_dir).load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_flush_load_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let repo = repository(&temp_dir);

        let mut state = ApplicationState::default();
        state.project_index.push(ProjectSummary {
            id: "p1".to_string(),
            name: "Soccer".to_string(),
            updated_at: 1000,
        });
        state.threads.push(ThreadMetadata::new("g1", 500));
        state.active_thread_id = Some("g1".to_string());
        state.settings.reasoning_effort = ReasoningEffort::High;

        repo.save(&state).await.unwrap();
        repo.scheduler.flush_all().await.unwrap();

        assert_eq!(repo.load().await.unwrap(), Some(state));
    }

    #[tokio::test]
    async fn test_old_field_names_are_renamed_on_load() {
        let temp_dir = TempDir::new().unwrap();
        let old = json!({
            "projectIndex": [],
            "sessions": [{ "id": "g1", "title": "Budget", "lastUpdated": 10 }],
            "activeProjectId": null,
            "activeSessionId": "g1",
            "settings": { "model": "gpt-4o", "shortcuts": { "toggleSidebar": "Ctrl+\\" } }
        });
        std::fs::write(
            temp_dir.path().join("app-state.json"),
            serde_json::to_string(&old).unwrap(),
        )
        .unwrap();

        let state = repository(&temp_dir).load().await.unwrap().unwrap();
        assert_eq!(state.threads[0].title, "Budget");
        assert_eq!(state.active_thread_id.as_deref(), Some("g1"));
        assert_eq!(state.settings.keyboard_shortcuts.toggle_sidebar, "Ctrl+\\");
    }

    #[tokio::test]
    async fn test_unparsable_state_is_none() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("app-state.json"), "[1, 2").unwrap();
        assert!(repository(&temp_dir).load().await.unwrap().is_none());
    }
}
