//! One-shot import of the legacy single-blob format.
//!
//! Everything is written synchronously through the atomic writer, never
//! through the debounce window, and the result depends only on the input:
//! no clock reads and no generated ids.

use std::collections::HashSet;
use tabletalk_core::document::DocumentTarget;
use tabletalk_core::error::{Result, TabletalkError};
use tabletalk_core::project::ProjectMetadata;
use tabletalk_core::state::{AppSettings, ApplicationState};

use crate::dto::LegacyState;
use crate::migration::{app_state_registry, project_registry};
use crate::paths::{APP_STATE_KEY, StoragePaths};
use crate::storage::{WriteScheduler, stamped_json, write_atomic};

/// Converts legacy data into per-project files plus a new application state.
pub struct LegacyImporter {
    paths: StoragePaths,
    scheduler: WriteScheduler,
}

impl LegacyImporter {
    pub fn new(paths: StoragePaths, scheduler: WriteScheduler) -> Self {
        Self { paths, scheduler }
    }

    /// Imports a serialized legacy blob and persists the result.
    ///
    /// The caller must not run this again once it succeeded.
    ///
    /// # Errors
    ///
    /// Malformed input fails before anything is written. A write failure
    /// propagates and may leave some project files behind.
    pub async fn import(&self, raw: &str) -> Result<ApplicationState> {
        let legacy = LegacyState::parse(raw)?;
        let settings = legacy.app_settings()?;
        let active_project_id = legacy.active_project_id.clone();
        let active_session_id = legacy.active_session_id.clone();

        let mut seen = HashSet::new();
        let mut projects: Vec<ProjectMetadata> = Vec::new();
        for legacy_project in legacy.projects {
            if !seen.insert(legacy_project.id.clone()) {
                tracing::warn!(project_id = %legacy_project.id, "Skipping duplicate legacy project");
                continue;
            }
            projects.push(legacy_project.into_project());
        }

        let project_registry = project_registry();
        for project in &projects {
            self.scheduler
                .cancel(&StoragePaths::project_key(&project.id))
                .await;
            write_atomic(
                &self.paths.project_file(&project.id),
                &stamped_json(project, &project_registry)?,
            )
            .await?;

            let documents_dir = self
                .paths
                .documents_dir(&DocumentTarget::project(&project.id));
            tokio::fs::create_dir_all(&documents_dir).await.map_err(|e| {
                TabletalkError::io(format!(
                    "Failed to create directory '{}': {}",
                    documents_dir.display(),
                    e
                ))
            })?;
            tracing::info!(
                project_id = %project.id,
                threads = project.threads.len(),
                "Imported legacy project"
            );
        }

        let state = build_state(&projects, active_project_id, active_session_id, settings);

        self.scheduler.cancel(APP_STATE_KEY).await;
        write_atomic(
            &self.paths.app_state_file(),
            &stamped_json(&state, &app_state_registry())?,
        )
        .await?;
        tracing::info!(projects = projects.len(), "Legacy import complete");

        Ok(state)
    }
}

/// Picks the active selection: the legacy ids when they resolve, else the
/// first project and its first thread.
fn build_state(
    projects: &[ProjectMetadata],
    active_project_id: Option<String>,
    active_session_id: Option<String>,
    settings: AppSettings,
) -> ApplicationState {
    let active_project = active_project_id
        .and_then(|id| projects.iter().find(|p| p.id == id))
        .or_else(|| projects.first());

    let active_thread_id = active_project.and_then(|project| {
        active_session_id
            .filter(|id| project.find_thread(id).is_some())
            .or_else(|| project.threads.first().map(|t| t.id.clone()))
    });

    ApplicationState {
        project_index: projects.iter().map(ProjectMetadata::summary).collect(),
        threads: Vec::new(),
        active_project_id: active_project.map(|p| p.id.clone()),
        active_thread_id,
        settings,
    }
}
