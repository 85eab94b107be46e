//! The pre-project storage format.
//!
//! Legacy data is a single JSON blob: projects own flat "sessions", there are
//! no documents and no global threads.
//!
//! ```json
//! {
//!   "projects": [{
//!     "id": "p1", "name": "Soccer", "createdAt": 900,
//!     "sessions": [{ "id": "s1", "title": "Goals", "messages": [...], "lastUpdated": 1000 }]
//!   }],
//!   "activeProjectId": "p1",
//!   "activeSessionId": "s1",
//!   "settings": { "model": "gpt-4o", "shortcuts": { ... } }
//! }
//! ```

use serde::Deserialize;
use serde_json::Value as JsonValue;
use tabletalk_core::error::{Result, TabletalkError};
use tabletalk_core::project::ProjectMetadata;
use tabletalk_core::state::AppSettings;
use tabletalk_core::thread::{ChatMessageData, DEFAULT_THREAD_TITLE, ThreadMetadata};

use crate::migration::traits::rename_key;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyState {
    #[serde(default)]
    pub projects: Vec<LegacyProject>,
    #[serde(default)]
    pub active_project_id: Option<String>,
    #[serde(default)]
    pub active_session_id: Option<String>,
    /// Kept raw; may still use pre-rename keys
    #[serde(default)]
    pub settings: Option<JsonValue>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyProject {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub sessions: Vec<LegacySession>,
    pub created_at: i64,
    #[serde(default)]
    pub updated_at: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacySession {
    pub id: String,
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default)]
    pub messages: Vec<ChatMessageData>,
    pub last_updated: i64,
}

fn default_title() -> String {
    DEFAULT_THREAD_TITLE.to_string()
}

impl LegacyState {
    /// Parses a serialized legacy blob. Malformed input is an error.
    pub fn parse(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| {
            TabletalkError::migration(format!("Malformed legacy state: {}", e))
        })
    }

    /// Converts legacy settings, accepting the old `shortcuts` key.
    ///
    /// Returns defaults when the blob carries no settings.
    pub fn app_settings(&self) -> Result<AppSettings> {
        let Some(settings) = &self.settings else {
            return Ok(AppSettings::default());
        };
        let mut settings = settings.clone();
        if let Some(object) = settings.as_object_mut() {
            rename_key(object, "shortcuts", "keyboardShortcuts");
        }
        serde_json::from_value(settings).map_err(|e| {
            TabletalkError::migration(format!("Malformed legacy settings: {}", e))
        })
    }
}

impl LegacySession {
    pub fn into_thread(self) -> ThreadMetadata {
        ThreadMetadata {
            id: self.id,
            title: self.title,
            messages: self.messages,
            documents: Vec::new(),
            active_document_id: None,
            last_updated: self.last_updated,
        }
    }
}

impl LegacyProject {
    /// `updatedAt` falls back to the newest session, then to `createdAt`.
    pub fn effective_updated_at(&self) -> i64 {
        self.updated_at
            .or_else(|| self.sessions.iter().map(|s| s.last_updated).max())
            .unwrap_or(self.created_at)
    }

    pub fn into_project(self) -> ProjectMetadata {
        let updated_at = self.effective_updated_at();
        ProjectMetadata {
            id: self.id,
            name: self.name,
            documents: Vec::new(),
            threads: self
                .sessions
                .into_iter()
                .map(LegacySession::into_thread)
                .collect(),
            created_at: self.created_at,
            updated_at,
        }
    }
}
