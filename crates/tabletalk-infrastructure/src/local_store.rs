//! Facade wiring every store onto one data directory and one write scheduler.
//!
//! The host process opens a single `LocalStore`, calls [`LocalStore::boot`]
//! once, and must await [`LocalStore::flush_all`] before exiting.

use tabletalk_core::document::{DocumentBlob, DocumentStore, DocumentTarget, StoredDocument};
use tabletalk_core::error::{Result, TabletalkError};
use tabletalk_core::project::{ProjectMetadata, ProjectRepository};
use tabletalk_core::state::{ApplicationState, StateRepository};
use tabletalk_core::thread::ThreadMetadata;
use uuid::Uuid;

use crate::config::StorageConfig;
use crate::document_store::FsDocumentStore;
use crate::dto::LegacyState;
use crate::legacy_import::LegacyImporter;
use crate::paths::StoragePaths;
use crate::project_repository::JsonProjectRepository;
use crate::state_repository::JsonStateRepository;
use crate::storage::WriteScheduler;

/// Name of the project synthesized when nothing exists yet.
pub const DEFAULT_PROJECT_NAME: &str = "My project";

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

pub struct LocalStore {
    paths: StoragePaths,
    scheduler: WriteScheduler,
    state: JsonStateRepository,
    projects: JsonProjectRepository,
    documents: FsDocumentStore,
}

impl LocalStore {
    /// Opens the store described by `config`.
    pub fn open(config: &StorageConfig) -> Result<Self> {
        let paths = StoragePaths::new(config.data_dir()?);
        tracing::debug!(base = %paths.base().display(), "Opening local store");
        Ok(Self::with_scheduler(paths, WriteScheduler::new(config.debounce())))
    }

    pub fn with_scheduler(paths: StoragePaths, scheduler: WriteScheduler) -> Self {
        Self {
            state: JsonStateRepository::new(paths.clone(), scheduler.clone()),
            projects: JsonProjectRepository::new(paths.clone(), scheduler.clone()),
            documents: FsDocumentStore::new(paths.clone()),
            paths,
            scheduler,
        }
    }

    pub fn paths(&self) -> &StoragePaths {
        &self.paths
    }

    pub fn scheduler(&self) -> &WriteScheduler {
        &self.scheduler
    }

    /// Loads the application state and repairs it so the selection is usable.
    ///
    /// The active thread falls back to the first thread of the active
    /// project, then the first global thread, then the first thread of the
    /// first loadable project. A project without threads gets a new one; when
    /// no project and no global thread exist a default project is created.
    /// Repairs are saved through the debounce window.
    pub async fn boot(&self) -> Result<ApplicationState> {
        let mut state = self.state.load().await?.unwrap_or_default();

        let active = match state.active_project_id.clone() {
            Some(id) => self.projects.load(&id).await?,
            None => None,
        };
        let mut changed = state.repair_selection(active.as_ref());

        if state.active_thread_id.is_none() {
            let project = match active.filter(|_| state.active_project_id.is_some()) {
                Some(project) => Some(project),
                None => self.first_loadable_project(&state).await?,
            };
            let mut project = project.unwrap_or_else(|| {
                tracing::info!("No projects or threads found, creating default project");
                ProjectMetadata::new(new_id(), DEFAULT_PROJECT_NAME, now_millis())
            });

            if project.threads.is_empty() {
                project.add_thread(ThreadMetadata::new(new_id(), now_millis()));
                self.projects.save(&project).await?;
            }

            state.upsert_project_summary(project.summary());
            state.active_project_id = Some(project.id.clone());
            state.active_thread_id = project.threads.first().map(|t| t.id.clone());
            changed = true;
        }

        if changed {
            tracing::info!(
                active_project_id = ?state.active_project_id,
                active_thread_id = ?state.active_thread_id,
                "Repaired active selection"
            );
            self.state.save(&state).await?;
        }

        Ok(state)
    }

    async fn first_loadable_project(
        &self,
        state: &ApplicationState,
    ) -> Result<Option<ProjectMetadata>> {
        for summary in &state.project_index {
            if let Some(project) = self.projects.load(&summary.id).await? {
                return Ok(Some(project));
            }
        }
        Ok(None)
    }

    pub async fn load_state(&self) -> Result<Option<ApplicationState>> {
        self.state.load().await
    }

    pub async fn save_state(&self, state: &ApplicationState) -> Result<()> {
        self.state.save(state).await
    }

    pub async fn load_project(&self, project_id: &str) -> Result<Option<ProjectMetadata>> {
        self.projects.load(project_id).await
    }

    pub async fn save_project(&self, project: &ProjectMetadata) -> Result<()> {
        self.projects.save(project).await
    }

    /// Deletes a project's directory and drops it from the state's index.
    ///
    /// Selection pointing into the project is cleared; the next
    /// [`Self::boot`] picks a new one.
    pub async fn delete_project(&self, state: &mut ApplicationState, project_id: &str) -> Result<()> {
        self.projects.delete(project_id).await?;
        if state.remove_project_summary(project_id).is_some() {
            self.state.save(state).await?;
        }
        Ok(())
    }

    pub async fn store_document(
        &self,
        target: &DocumentTarget,
        document_id: &str,
        original_file_name: &str,
        bytes: &[u8],
    ) -> Result<StoredDocument> {
        self.documents
            .store(target, document_id, original_file_name, bytes)
            .await
    }

    pub async fn read_document(
        &self,
        target: &DocumentTarget,
        stored_file_name: &str,
    ) -> Result<DocumentBlob> {
        self.documents.read(target, stored_file_name).await
    }

    pub async fn delete_document(&self, target: &DocumentTarget, stored_file_name: &str) -> Result<()> {
        self.documents.delete(target, stored_file_name).await
    }

    /// Copies a file into a target and records it in the owning metadata.
    ///
    /// The new document becomes the active one of a global thread; for a
    /// project it joins the project's document set.
    ///
    /// # Errors
    ///
    /// `NotFound` if the project or global thread doesn't exist. Nothing is
    /// written in that case.
    pub async fn attach_document(
        &self,
        state: &mut ApplicationState,
        target: &DocumentTarget,
        original_file_name: &str,
        bytes: &[u8],
    ) -> Result<StoredDocument> {
        let document_id = new_id();
        match target {
            DocumentTarget::Project(project_id) => {
                let mut project = self.require_project(project_id).await?;
                let document = self
                    .store_document(target, &document_id, original_file_name, bytes)
                    .await?;
                project.add_document(document.clone());
                self.projects.save(&project).await?;
                state.upsert_project_summary(project.summary());
                self.state.save(state).await?;
                Ok(document)
            }
            DocumentTarget::Thread(thread_id) => {
                if state.find_thread(thread_id).is_none() {
                    return Err(TabletalkError::not_found("thread", thread_id.as_str()));
                }
                let document = self
                    .store_document(target, &document_id, original_file_name, bytes)
                    .await?;
                if let Some(thread) = state.find_thread_mut(thread_id) {
                    thread.add_document(document.clone());
                }
                self.state.save(state).await?;
                Ok(document)
            }
        }
    }

    /// Deletes a document's blob, then removes it from its owning metadata.
    ///
    /// Returns `None` if the owner doesn't list the document. When the blob
    /// cannot be deleted the metadata keeps its entry.
    pub async fn detach_document(
        &self,
        state: &mut ApplicationState,
        target: &DocumentTarget,
        document_id: &str,
    ) -> Result<Option<StoredDocument>> {
        match target {
            DocumentTarget::Project(project_id) => {
                let mut project = self.require_project(project_id).await?;
                let Some(document) = project.find_document(document_id) else {
                    return Ok(None);
                };
                self.documents
                    .delete(target, &document.stored_file_name)
                    .await?;

                let removed = project.remove_document(document_id);
                project.touch(now_millis());
                self.projects.save(&project).await?;
                state.upsert_project_summary(project.summary());
                self.state.save(state).await?;
                Ok(removed)
            }
            DocumentTarget::Thread(thread_id) => {
                let thread = state
                    .find_thread(thread_id)
                    .ok_or_else(|| TabletalkError::not_found("thread", thread_id.as_str()))?;
                let Some(document) = thread.find_document(document_id) else {
                    return Ok(None);
                };
                self.documents
                    .delete(target, &document.stored_file_name)
                    .await?;

                let removed = state
                    .find_thread_mut(thread_id)
                    .and_then(|thread| thread.remove_document(document_id));
                self.state.save(state).await?;
                Ok(removed)
            }
        }
    }

    /// Removes a global thread and every blob attached to it.
    pub async fn delete_global_thread(
        &self,
        state: &mut ApplicationState,
        thread_id: &str,
    ) -> Result<Option<ThreadMetadata>> {
        let Some(thread) = state.remove_thread(thread_id) else {
            return Ok(None);
        };
        self.documents
            .delete_target(&DocumentTarget::thread(thread_id))
            .await?;
        self.state.save(state).await?;
        Ok(Some(thread))
    }

    /// Imports the legacy single-blob format. See [`LegacyImporter::import`].
    pub async fn import_legacy(&self, raw: &str) -> Result<ApplicationState> {
        // The importer replaces project files directly
        if let Ok(legacy) = LegacyState::parse(raw) {
            for project in &legacy.projects {
                self.projects.forget(&project.id);
            }
        }
        LegacyImporter::new(self.paths.clone(), self.scheduler.clone())
            .import(raw)
            .await
    }

    /// Drains every pending write. Must be awaited before the process exits.
    pub async fn flush_all(&self) -> Result<()> {
        self.scheduler.flush_all().await
    }

    async fn require_project(&self, project_id: &str) -> Result<ProjectMetadata> {
        self.projects
            .load(project_id)
            .await?
            .ok_or_else(|| TabletalkError::not_found("project", project_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    fn open(temp_dir: &TempDir) -> LocalStore {
        LocalStore::with_scheduler(
            StoragePaths::new(temp_dir.path()),
            WriteScheduler::new(Duration::from_secs(60)),
        )
    }

    #[tokio::test]
    async fn test_first_boot_synthesizes_default_project() {
        let temp_dir = TempDir::new().unwrap();
        let store = open(&temp_dir);

        let state = store.boot().await.unwrap();
        assert_eq!(state.project_index.len(), 1);
        assert_eq!(state.project_index[0].name, DEFAULT_PROJECT_NAME);

        let project_id = state.active_project_id.clone().unwrap();

        // Visible before its debounced write lands
        let project_file = store.paths().project_file(&project_id);
        assert!(!project_file.exists());
        let project = store.load_project(&project_id).await.unwrap().unwrap();
        assert_eq!(project.name, DEFAULT_PROJECT_NAME);

        store.flush_all().await.unwrap();
        assert!(project_file.exists());
        assert_eq!(
            state.active_thread_id.as_deref(),
            Some(project.threads[0].id.as_str())
        );

        // A second boot keeps the selection
        let again = store.boot().await.unwrap();
        assert_eq!(again, state);
    }

    #[tokio::test]
    async fn test_boot_keeps_global_thread_selection() {
        let temp_dir = TempDir::new().unwrap();
        let store = open(&temp_dir);

        let state = ApplicationState {
            threads: vec![ThreadMetadata::new("g1", 10)],
            active_thread_id: Some("g1".to_string()),
            ..Default::default()
        };
        store.save_state(&state).await.unwrap();
        store.flush_all().await.unwrap();

        assert_eq!(store.boot().await.unwrap(), state);
        assert_eq!(store.scheduler().pending_count(), 0);
    }

    #[tokio::test]
    async fn test_boot_falls_back_to_first_loadable_project() {
        let temp_dir = TempDir::new().unwrap();
        let store = open(&temp_dir);

        let mut project = ProjectMetadata::new("p2", "Budget", 10);
        project.add_thread(ThreadMetadata::new("t2", 10));
        store.save_project(&project).await.unwrap();

        let mut state = ApplicationState::default();
        state.upsert_project_summary(ProjectMetadata::new("p1", "Gone", 5).summary());
        state.upsert_project_summary(project.summary());
        state.active_project_id = Some("p1".to_string());
        state.active_thread_id = Some("t1".to_string());
        store.save_state(&state).await.unwrap();
        store.flush_all().await.unwrap();

        let booted = store.boot().await.unwrap();
        assert_eq!(booted.active_project_id.as_deref(), Some("p2"));
        assert_eq!(booted.active_thread_id.as_deref(), Some("t2"));
    }

    #[tokio::test]
    async fn test_boot_adds_thread_to_empty_active_project() {
        let temp_dir = TempDir::new().unwrap();
        let store = open(&temp_dir);

        let project = ProjectMetadata::new("p1", "Empty", 10);
        store.save_project(&project).await.unwrap();
        let mut state = ApplicationState::default();
        state.upsert_project_summary(project.summary());
        state.active_project_id = Some("p1".to_string());
        store.save_state(&state).await.unwrap();
        store.flush_all().await.unwrap();

        let booted = store.boot().await.unwrap();
        store.flush_all().await.unwrap();

        let project = store.load_project("p1").await.unwrap().unwrap();
        assert_eq!(project.threads.len(), 1);
        assert_eq!(booted.active_project_id.as_deref(), Some("p1"));
        assert_eq!(
            booted.active_thread_id.as_deref(),
            Some(project.threads[0].id.as_str())
        );
    }

    #[tokio::test]
    async fn test_attach_and_detach_project_document() {
        let temp_dir = TempDir::new().unwrap();
        let store = open(&temp_dir);
        let mut state = store.boot().await.unwrap();
        let project_id = state.active_project_id.clone().unwrap();
        let target = DocumentTarget::project(&project_id);

        let document = store
            .attach_document(&mut state, &target, "goals.csv", b"team,goals\n")
            .await
            .unwrap();
        store.flush_all().await.unwrap();

        let project = store.load_project(&project_id).await.unwrap().unwrap();
        assert_eq!(project.documents, vec![document.clone()]);
        let blob = store
            .read_document(&target, &document.stored_file_name)
            .await
            .unwrap();
        assert_eq!(blob.original_file_name, "goals.csv");

        let removed = store
            .detach_document(&mut state, &target, &document.id)
            .await
            .unwrap();
        assert_eq!(removed, Some(document.clone()));
        store.flush_all().await.unwrap();

        let project = store.load_project(&project_id).await.unwrap().unwrap();
        assert!(project.documents.is_empty());
        assert!(
            store
                .read_document(&target, &document.stored_file_name)
                .await
                .unwrap_err()
                .is_not_found()
        );
    }

    #[tokio::test]
    async fn test_two_attaches_inside_debounce_window_keep_both() {
        let temp_dir = TempDir::new().unwrap();
        let store = LocalStore::with_scheduler(
            StoragePaths::new(temp_dir.path()),
            WriteScheduler::new(Duration::from_millis(500)),
        );
        let mut state = store.boot().await.unwrap();
        let project_id = state.active_project_id.clone().unwrap();
        let target = DocumentTarget::project(&project_id);

        let first = store
            .attach_document(&mut state, &target, "goals.csv", b"1")
            .await
            .unwrap();
        let second = store
            .attach_document(&mut state, &target, "cards.csv", b"2")
            .await
            .unwrap();
        store.flush_all().await.unwrap();

        let reopened = open(&temp_dir);
        let project = reopened.load_project(&project_id).await.unwrap().unwrap();
        assert_eq!(project.documents.len(), 2);
        assert!(project.find_document(&first.id).is_some());
        assert!(project.find_document(&second.id).is_some());
    }

    #[tokio::test]
    async fn test_failed_blob_delete_keeps_metadata() {
        let temp_dir = TempDir::new().unwrap();
        let store = open(&temp_dir);
        let mut state = ApplicationState {
            threads: vec![ThreadMetadata::new("g1", 10)],
            active_thread_id: Some("g1".to_string()),
            ..Default::default()
        };
        let target = DocumentTarget::thread("g1");
        let document = store
            .attach_document(&mut state, &target, "a.csv", b"x")
            .await
            .unwrap();

        // A non-empty directory in place of the blob cannot be removed as a file
        let blob = store.paths().document_path(&target, &document.stored_file_name);
        std::fs::remove_file(&blob).unwrap();
        std::fs::create_dir(&blob).unwrap();
        std::fs::write(blob.join("keep"), "x").unwrap();

        assert!(
            store
                .detach_document(&mut state, &target, &document.id)
                .await
                .is_err()
        );
        assert!(state.threads[0].find_document(&document.id).is_some());

        assert!(
            store
                .detach_document(&mut state, &target, "unknown")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_attach_to_unknown_owner_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let store = open(&temp_dir);
        let mut state = ApplicationState::default();

        let err = store
            .attach_document(&mut state, &DocumentTarget::thread("nope"), "a.csv", b"x")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert!(!temp_dir.path().join("threads").exists());

        let err = store
            .attach_document(&mut state, &DocumentTarget::project("nope"), "a.csv", b"x")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_delete_global_thread_removes_blobs() {
        let temp_dir = TempDir::new().unwrap();
        let store = open(&temp_dir);
        let mut state = ApplicationState {
            threads: vec![ThreadMetadata::new("g1", 10)],
            active_thread_id: Some("g1".to_string()),
            ..Default::default()
        };
        let target = DocumentTarget::thread("g1");
        let document = store
            .attach_document(&mut state, &target, "scan.pdf", b"%PDF")
            .await
            .unwrap();
        assert_eq!(
            state.threads[0].active_document_id.as_deref(),
            Some(document.id.as_str())
        );

        let removed = store.delete_global_thread(&mut state, "g1").await.unwrap();
        assert_eq!(removed.map(|t| t.id), Some("g1".to_string()));
        assert!(state.threads.is_empty());
        assert!(state.active_thread_id.is_none());
        assert!(!temp_dir.path().join("threads/g1").exists());

        assert!(store.delete_global_thread(&mut state, "g1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_project_updates_index() {
        let temp_dir = TempDir::new().unwrap();
        let store = open(&temp_dir);
        let mut state = store.boot().await.unwrap();
        let project_id = state.active_project_id.clone().unwrap();
        store.flush_all().await.unwrap();

        store.delete_project(&mut state, &project_id).await.unwrap();
        store.flush_all().await.unwrap();

        assert!(state.project_index.is_empty());
        assert!(state.active_project_id.is_none());
        assert!(store.load_project(&project_id).await.unwrap().is_none());
        assert_eq!(store.load_state().await.unwrap(), Some(state));
    }
}
