//! Application state domain models.
//!
//! Contains the singleton record describing what is selected, the project
//! index, global threads and user settings.

use serde::{Deserialize, Serialize};

use crate::project::{ProjectMetadata, ProjectSummary};
use crate::thread::ThreadMetadata;

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// How hard the planning model should think.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReasoningEffort {
    Low,
    #[default]
    Medium,
    High,
}

/// Keyboard-shortcut bindings, stored as accelerator strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KeyboardShortcuts {
    pub new_thread: String,
    pub send_message: String,
    pub toggle_sidebar: String,
    pub focus_composer: String,
}

impl Default for KeyboardShortcuts {
    fn default() -> Self {
        Self {
            new_thread: "CmdOrCtrl+N".to_string(),
            send_message: "CmdOrCtrl+Enter".to_string(),
            toggle_sidebar: "CmdOrCtrl+B".to_string(),
            focus_composer: "CmdOrCtrl+L".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppSettings {
    pub model: String,
    pub reasoning_effort: ReasoningEffort,
    pub keyboard_shortcuts: KeyboardShortcuts,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            reasoning_effort: ReasoningEffort::default(),
            keyboard_shortcuts: KeyboardShortcuts::default(),
        }
    }
}

/// Application state that persists across restarts (`app-state.json`).
///
/// `active_thread_id` refers to a thread of the active project when
/// `active_project_id` is set, and to a global thread otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationState {
    /// Projects in UI display order
    #[serde(default)]
    pub project_index: Vec<ProjectSummary>,
    /// Threads not tied to any project
    #[serde(default)]
    pub threads: Vec<ThreadMetadata>,
    #[serde(default)]
    pub active_project_id: Option<String>,
    #[serde(default)]
    pub active_thread_id: Option<String>,
    #[serde(default)]
    pub settings: AppSettings,
}

impl ApplicationState {
    pub fn find_thread(&self, thread_id: &str) -> Option<&ThreadMetadata> {
        self.threads.iter().find(|t| t.id == thread_id)
    }

    pub fn find_thread_mut(&mut self, thread_id: &str) -> Option<&mut ThreadMetadata> {
        self.threads.iter_mut().find(|t| t.id == thread_id)
    }

    /// Removes a global thread, clearing the selection if it was active.
    ///
    /// The caller owns deleting the thread's document blobs.
    pub fn remove_thread(&mut self, thread_id: &str) -> Option<ThreadMetadata> {
        let index = self.threads.iter().position(|t| t.id == thread_id)?;
        if self.active_project_id.is_none() && self.active_thread_id.as_deref() == Some(thread_id) {
            self.active_thread_id = None;
        }
        Some(self.threads.remove(index))
    }

    /// Inserts or refreshes a project's index entry, keeping its position.
    pub fn upsert_project_summary(&mut self, summary: ProjectSummary) {
        match self.project_index.iter_mut().find(|p| p.id == summary.id) {
            Some(existing) => *existing = summary,
            None => self.project_index.push(summary),
        }
    }

    /// Drops a project from the index, clearing the selection if it was active.
    pub fn remove_project_summary(&mut self, project_id: &str) -> Option<ProjectSummary> {
        let index = self.project_index.iter().position(|p| p.id == project_id)?;
        if self.active_project_id.as_deref() == Some(project_id) {
            self.active_project_id = None;
            self.active_thread_id = None;
        }
        Some(self.project_index.remove(index))
    }

    /// Repairs the active selection against what actually exists.
    ///
    /// `active_project` is the loaded metadata of `active_project_id`, or
    /// `None` when it could not be loaded. Returns `true` when anything changed.
    ///
    /// After repair `active_thread_id` is either valid or `None`; the latter
    /// means no thread exists in the chosen scope and the caller has to create one.
    pub fn repair_selection(&mut self, active_project: Option<&ProjectMetadata>) -> bool {
        let before = (self.active_project_id.clone(), self.active_thread_id.clone());

        if let Some(project_id) = self.active_project_id.clone() {
            match active_project.filter(|p| p.id == project_id) {
                Some(project) => {
                    let valid = self
                        .active_thread_id
                        .as_deref()
                        .is_some_and(|id| project.find_thread(id).is_some());
                    if !valid {
                        self.active_thread_id = project.threads.first().map(|t| t.id.clone());
                    }
                }
                None => self.active_project_id = None,
            }
        }

        if self.active_project_id.is_none() {
            let valid = self
                .active_thread_id
                .as_deref()
                .is_some_and(|id| self.find_thread(id).is_some());
            if !valid {
                self.active_thread_id = self.threads.first().map(|t| t.id.clone());
            }
        }

        before != (self.active_project_id.clone(), self.active_thread_id.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project_with_threads(id: &str, thread_ids: &[&str]) -> ProjectMetadata {
        let mut project = ProjectMetadata::new(id, "Project", 0);
        for thread_id in thread_ids {
            project.add_thread(ThreadMetadata::new(*thread_id, 0));
        }
        project
    }

    #[test]
    fn test_valid_selection_is_untouched() {
        let project = project_with_threads("p1", &["t1", "t2"]);
        let mut state = ApplicationState {
            active_project_id: Some("p1".to_string()),
            active_thread_id: Some("t2".to_string()),
            ..Default::default()
        };
        assert!(!state.repair_selection(Some(&project)));
        assert_eq!(state.active_thread_id.as_deref(), Some("t2"));
    }

    #[test]
    fn test_dangling_project_thread_falls_back_to_first() {
        let project = project_with_threads("p1", &["t1", "t2"]);
        let mut state = ApplicationState {
            active_project_id: Some("p1".to_string()),
            active_thread_id: Some("gone".to_string()),
            ..Default::default()
        };
        assert!(state.repair_selection(Some(&project)));
        assert_eq!(state.active_thread_id.as_deref(), Some("t1"));
    }

    #[test]
    fn test_unloadable_project_falls_back_to_global_thread() {
        let mut state = ApplicationState {
            threads: vec![ThreadMetadata::new("g1", 0)],
            active_project_id: Some("p-missing".to_string()),
            active_thread_id: Some("t1".to_string()),
            ..Default::default()
        };
        assert!(state.repair_selection(None));
        assert!(state.active_project_id.is_none());
        assert_eq!(state.active_thread_id.as_deref(), Some("g1"));
    }

    #[test]
    fn test_nothing_to_select_leaves_thread_empty() {
        let mut state = ApplicationState {
            active_thread_id: Some("stale".to_string()),
            ..Default::default()
        };
        assert!(state.repair_selection(None));
        assert!(state.active_thread_id.is_none());
    }

    #[test]
    fn test_project_index_keeps_order_on_upsert() {
        let mut state = ApplicationState::default();
        for id in ["a", "b", "c"] {
            state.upsert_project_summary(ProjectMetadata::new(id, id, 0).summary());
        }
        let mut renamed = ProjectMetadata::new("b", "Renamed", 5).summary();
        renamed.updated_at = 9;
        state.upsert_project_summary(renamed);

        let ids: Vec<&str> = state.project_index.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(state.project_index[1].name, "Renamed");
    }

    #[test]
    fn test_removing_active_project_clears_selection() {
        let mut state = ApplicationState::default();
        state.upsert_project_summary(ProjectMetadata::new("p1", "P", 0).summary());
        state.active_project_id = Some("p1".to_string());
        state.active_thread_id = Some("t1".to_string());

        assert!(state.remove_project_summary("p1").is_some());
        assert!(state.active_project_id.is_none());
        assert!(state.active_thread_id.is_none());
    }

    #[test]
    fn test_settings_fill_missing_fields_with_defaults() {
        let settings: AppSettings =
            serde_json::from_value(serde_json::json!({ "reasoningEffort": "high" })).unwrap();
        assert_eq!(settings.reasoning_effort, ReasoningEffort::High);
        assert_eq!(settings.model, DEFAULT_MODEL);
        assert_eq!(settings.keyboard_shortcuts, KeyboardShortcuts::default());
    }
}
