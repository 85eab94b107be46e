//! Upgrade chain for `project.json`.

use semver::Version;
use serde_json::{Value as JsonValue, json};
use std::sync::Arc;

use super::registry::UpgradeRegistry;
use super::traits::{UpgradeStep, rename_key};

/// Current schema version of `project.json`.
pub const PROJECT_SCHEMA_VERSION: Version = Version::new(2, 0, 0);

/// 1.0.0 → 2.0.0: flat `sessions` become `threads` that own document pointers.
///
/// Each conversation record gains `documents: []` and `activeDocumentId: null`
/// unless it already has them, and the project gains a `documents` list.
#[derive(Debug)]
pub struct SessionsToThreads;

impl UpgradeStep for SessionsToThreads {
    fn from_version(&self) -> Version {
        Version::new(1, 0, 0)
    }

    fn to_version(&self) -> Version {
        PROJECT_SCHEMA_VERSION
    }

    fn description(&self) -> &str {
        "convert sessions to threads with document sets"
    }

    fn apply(&self, mut value: JsonValue) -> JsonValue {
        let Some(project) = value.as_object_mut() else {
            return value;
        };

        rename_key(project, "sessions", "threads");
        project.entry("documents").or_insert_with(|| json!([]));

        if let Some(threads) = project.get_mut("threads").and_then(JsonValue::as_array_mut) {
            for thread in threads.iter_mut().filter_map(JsonValue::as_object_mut) {
                thread.entry("documents").or_insert_with(|| json!([]));
                thread
                    .entry("activeDocumentId")
                    .or_insert(JsonValue::Null);
            }
        }

        value
    }
}

/// Builds the registry for project files.
pub fn project_registry() -> UpgradeRegistry {
    let mut registry =
        UpgradeRegistry::new("project", Version::new(1, 0, 0), PROJECT_SCHEMA_VERSION);
    registry.register(Arc::new(SessionsToThreads));
    registry
}
