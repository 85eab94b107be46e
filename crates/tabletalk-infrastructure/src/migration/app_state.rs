//! Upgrade chain for `app-state.json`.
//!
//! Each step is a guarded key rename; values are moved untouched.

use semver::Version;
use serde_json::Value as JsonValue;
use std::sync::Arc;

use super::registry::UpgradeRegistry;
use super::traits::{UpgradeStep, rename_key};

/// Current schema version of `app-state.json`.
pub const APP_STATE_SCHEMA_VERSION: Version = Version::new(1, 3, 0);

/// 1.0.0 → 1.1.0: the global list `sessions` becomes `threads`.
#[derive(Debug)]
pub struct ThreadListRename;

impl UpgradeStep for ThreadListRename {
    fn from_version(&self) -> Version {
        Version::new(1, 0, 0)
    }

    fn to_version(&self) -> Version {
        Version::new(1, 1, 0)
    }

    fn description(&self) -> &str {
        "rename sessions to threads"
    }

    fn apply(&self, mut value: JsonValue) -> JsonValue {
        if let Some(object) = value.as_object_mut() {
            rename_key(object, "sessions", "threads");
        }
        value
    }
}

/// 1.1.0 → 1.2.0: `activeSessionId` becomes `activeThreadId`.
#[derive(Debug)]
pub struct ActiveThreadRename;

impl UpgradeStep for ActiveThreadRename {
    fn from_version(&self) -> Version {
        Version::new(1, 1, 0)
    }

    fn to_version(&self) -> Version {
        Version::new(1, 2, 0)
    }

    fn description(&self) -> &str {
        "rename activeSessionId to activeThreadId"
    }

    fn apply(&self, mut value: JsonValue) -> JsonValue {
        if let Some(object) = value.as_object_mut() {
            rename_key(object, "activeSessionId", "activeThreadId");
        }
        value
    }
}

/// 1.2.0 → 1.3.0: `settings.shortcuts` becomes `settings.keyboardShortcuts`.
#[derive(Debug)]
pub struct ShortcutsRename;

impl UpgradeStep for ShortcutsRename {
    fn from_version(&self) -> Version {
        Version::new(1, 2, 0)
    }

    fn to_version(&self) -> Version {
        APP_STATE_SCHEMA_VERSION
    }

    fn description(&self) -> &str {
        "rename settings.shortcuts to settings.keyboardShortcuts"
    }

    fn apply(&self, mut value: JsonValue) -> JsonValue {
        if let Some(settings) = value.get_mut("settings").and_then(JsonValue::as_object_mut) {
            rename_key(settings, "shortcuts", "keyboardShortcuts");
        }
        value
    }
}

/// Builds the registry for the application state.
pub fn app_state_registry() -> UpgradeRegistry {
    let mut registry =
        UpgradeRegistry::new("app_state", Version::new(1, 0, 0), APP_STATE_SCHEMA_VERSION);
    registry.register(Arc::new(ThreadListRename));
    registry.register(Arc::new(ActiveThreadRename));
    registry.register(Arc::new(ShortcutsRename));
    registry
}
