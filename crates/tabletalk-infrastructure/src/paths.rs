//! Unified path management for the Tabletalk data directory.
//!
//! Every path and every write-scheduler key is derived here, so two stores can
//! never pick overlapping files.
//!
//! # Directory Structure
//!
//! ```text
//! <base>/
//! ├── app-state.json
//! ├── projects/
//! │   └── <project-id>/
//! │       ├── project.json
//! │       └── documents/
//! │           └── <doc-id>-<original-name>
//! └── threads/
//!     └── <thread-id>/
//!         └── documents/
//!             └── <doc-id>-<original-name>
//! ```

use std::path::{Path, PathBuf};
use tabletalk_core::document::DocumentTarget;
use tabletalk_core::document::naming::{sanitize_segment, sanitize_stored_name};
use tabletalk_core::error::{Result, TabletalkError};

const APP_NAME: &str = "tabletalk";
const APP_STATE_FILE: &str = "app-state.json";
const PROJECT_FILE: &str = "project.json";
const DOCUMENTS_DIR: &str = "documents";

/// Scheduler key of the singleton application state.
pub const APP_STATE_KEY: &str = "app-state";

/// Resolves every on-disk location below a base directory.
///
/// All methods are pure: nothing touches the filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoragePaths {
    base: PathBuf,
}

impl StoragePaths {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// Platform data directory for Tabletalk (e.g. `~/.local/share/tabletalk`).
    pub fn default_base_dir() -> Result<PathBuf> {
        dirs::data_dir()
            .map(|dir| dir.join(APP_NAME))
            .ok_or_else(|| TabletalkError::io("Cannot determine the platform data directory"))
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn app_state_file(&self) -> PathBuf {
        self.base.join(APP_STATE_FILE)
    }

    pub fn projects_dir(&self) -> PathBuf {
        self.base.join("projects")
    }

    pub fn project_dir(&self, project_id: &str) -> PathBuf {
        self.projects_dir().join(sanitize_segment(project_id))
    }

    pub fn project_file(&self, project_id: &str) -> PathBuf {
        self.project_dir(project_id).join(PROJECT_FILE)
    }

    pub fn threads_dir(&self) -> PathBuf {
        self.base.join("threads")
    }

    pub fn thread_dir(&self, thread_id: &str) -> PathBuf {
        self.threads_dir().join(sanitize_segment(thread_id))
    }

    /// Directory that holds a target's blobs.
    pub fn documents_dir(&self, target: &DocumentTarget) -> PathBuf {
        match target {
            DocumentTarget::Project(id) => self.project_dir(id).join(DOCUMENTS_DIR),
            DocumentTarget::Thread(id) => self.thread_dir(id).join(DOCUMENTS_DIR),
        }
    }

    /// Directory removed when a target is deleted.
    pub fn target_dir(&self, target: &DocumentTarget) -> PathBuf {
        match target {
            DocumentTarget::Project(id) => self.project_dir(id),
            DocumentTarget::Thread(id) => self.thread_dir(id),
        }
    }

    /// Path of one blob. The stored name is re-sanitized so it cannot escape the directory.
    pub fn document_path(&self, target: &DocumentTarget, stored_file_name: &str) -> PathBuf {
        self.documents_dir(target).join(sanitize_stored_name(stored_file_name))
    }

    /// Scheduler key owning a project's `project.json`.
    pub fn project_key(project_id: &str) -> String {
        format!("project:{}", sanitize_segment(project_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout() {
        let paths = StoragePaths::new("/data");
        assert_eq!(paths.app_state_file(), PathBuf::from("/data/app-state.json"));
        assert_eq!(
            paths.project_file("p1"),
            PathBuf::from("/data/projects/p1/project.json")
        );
        assert_eq!(
            paths.documents_dir(&DocumentTarget::project("p1")),
            PathBuf::from("/data/projects/p1/documents")
        );
        assert_eq!(
            paths.document_path(&DocumentTarget::thread("t1"), "d1-a.csv"),
            PathBuf::from("/data/threads/t1/documents/d1-a.csv")
        );
    }

    #[test]
    fn test_ids_cannot_escape_base() {
        let paths = StoragePaths::new("/data");
        assert_eq!(paths.project_dir("../../etc"), PathBuf::from("/data/projects/....etc"));
        assert_eq!(paths.project_dir(".."), PathBuf::from("/data/projects/_"));
        assert_eq!(
            paths.document_path(&DocumentTarget::project("p1"), "../secret"),
            PathBuf::from("/data/projects/p1/documents/..secret")
        );
    }

    #[test]
    fn test_project_and_thread_with_same_id_do_not_overlap() {
        let paths = StoragePaths::new("/data");
        assert_ne!(
            paths.documents_dir(&DocumentTarget::project("x")),
            paths.documents_dir(&DocumentTarget::thread("x"))
        );
    }

    #[test]
    fn test_project_key_is_distinct_from_app_state_key() {
        assert_eq!(StoragePaths::project_key("p1"), "project:p1");
        assert_ne!(StoragePaths::project_key(APP_STATE_KEY), APP_STATE_KEY);
    }
}
