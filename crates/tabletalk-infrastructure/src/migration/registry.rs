//! Registry for linear chains of schema upgrade steps.
//!
//! Every version must pass through all intermediate steps; skipping is not
//! possible. Files carry a `schemaVersion` stamp, and a file without one is
//! treated as the chain's base version.

use semver::Version;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tabletalk_core::error::{Result, TabletalkError};

use super::traits::UpgradeStep;

/// Key holding the schema version inside persisted JSON objects.
pub const SCHEMA_VERSION_KEY: &str = "schemaVersion";

/// Result of running a tree through the registry.
#[derive(Debug, Clone, PartialEq)]
pub struct Upgraded {
    /// The tree at the latest version, stamped with it
    pub value: JsonValue,
    /// Version the tree had before upgrading
    pub from: Version,
    /// Whether anything had to be done (steps applied or stamp added)
    pub changed: bool,
}

/// A linear chain of upgrade steps for one entity.
///
/// # Example
///
/// ```ignore
/// let mut registry = UpgradeRegistry::new("app_state", v("1.0.0"), v("1.2.0"));
/// registry.register(Arc::new(ThreadListRename));   // 1.0.0 → 1.1.0
/// registry.register(Arc::new(ActiveThreadRename)); // 1.1.0 → 1.2.0
///
/// let upgraded = registry.upgrade(raw_json)?;
/// ```
#[derive(Debug)]
pub struct UpgradeRegistry {
    entity: &'static str,
    steps: Vec<Arc<dyn UpgradeStep>>,
    base_version: Version,
    latest_version: Version,
}

impl UpgradeRegistry {
    /// Creates an empty registry.
    ///
    /// * `base_version` - Version assumed for files without a stamp
    /// * `latest_version` - Version every upgrade ends at
    pub fn new(entity: &'static str, base_version: Version, latest_version: Version) -> Self {
        Self {
            entity,
            steps: Vec::new(),
            base_version,
            latest_version,
        }
    }

    /// Registers a step, validating chain continuity.
    ///
    /// # Panics
    ///
    /// Panics if the step doesn't connect to the existing chain or overshoots
    /// the latest version. Registration is static wiring, so this is a
    /// programming error.
    pub fn register(&mut self, step: Arc<dyn UpgradeStep>) {
        let expected_from = self
            .steps
            .last()
            .map(|last| last.to_version())
            .unwrap_or_else(|| self.base_version.clone());
        assert_eq!(
            expected_from,
            step.from_version(),
            "Upgrade chain for '{}' broken at '{}'",
            self.entity,
            step.description()
        );
        assert!(
            step.to_version() <= self.latest_version,
            "Upgrade target {} exceeds latest version {} for '{}'",
            step.to_version(),
            self.latest_version,
            self.entity
        );
        self.steps.push(step);
    }

    pub fn latest_version(&self) -> &Version {
        &self.latest_version
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Reads the stamp of a tree; a missing stamp means the base version.
    pub fn version_of(&self, value: &JsonValue) -> Result<Version> {
        match value.get(SCHEMA_VERSION_KEY) {
            None | Some(JsonValue::Null) => Ok(self.base_version.clone()),
            Some(JsonValue::String(raw)) => Ok(Version::parse(raw)?),
            Some(other) => Err(TabletalkError::migration(format!(
                "'{}' has a non-string {}: {}",
                self.entity, SCHEMA_VERSION_KEY, other
            ))),
        }
    }

    /// Stamps a tree with the latest version.
    pub fn stamp(&self, value: &mut JsonValue) {
        if let Some(object) = value.as_object_mut() {
            object.insert(
                SCHEMA_VERSION_KEY.to_string(),
                JsonValue::String(self.latest_version.to_string()),
            );
        }
    }

    /// Runs every step from the tree's version up to the latest one.
    ///
    /// # Errors
    ///
    /// Returns an error if the root is not an object, the stamp is newer than
    /// the latest version, or no step starts at the stamped version.
    pub fn upgrade(&self, mut value: JsonValue) -> Result<Upgraded> {
        if !value.is_object() {
            return Err(TabletalkError::migration(format!(
                "'{}' root must be a JSON object",
                self.entity
            )));
        }

        let from = self.version_of(&value)?;
        let stamped = value.get(SCHEMA_VERSION_KEY).is_some();

        if from == self.latest_version {
            return Ok(Upgraded {
                value,
                from,
                changed: false,
            });
        }

        if from > self.latest_version {
            return Err(TabletalkError::migration(format!(
                "'{}' data version ({}) is newer than the latest supported version ({})",
                self.entity, from, self.latest_version
            )));
        }

        let start = self
            .steps
            .iter()
            .position(|step| step.from_version() == from)
            .ok_or_else(|| {
                TabletalkError::migration(format!(
                    "No upgrade for '{}' starts at version {}",
                    self.entity, from
                ))
            })?;

        for step in &self.steps[start..] {
            tracing::info!(
                entity = self.entity,
                "Upgrade step {} -> {}: {}",
                step.from_version(),
                step.to_version(),
                step.description()
            );
            value = step.apply(value);
        }

        self.stamp(&mut value);
        tracing::debug!(
            entity = self.entity,
            was_stamped = stamped,
            "Upgraded {} -> {}",
            from,
            self.latest_version
        );

        Ok(Upgraded {
            value,
            from,
            changed: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn v(raw: &str) -> Version {
        Version::parse(raw).unwrap()
    }

    #[derive(Debug)]
    struct AddField {
        from: &'static str,
        to: &'static str,
        field: &'static str,
    }

    impl UpgradeStep for AddField {
        fn from_version(&self) -> Version {
            v(self.from)
        }
        fn to_version(&self) -> Version {
            v(self.to)
        }
        fn description(&self) -> &str {
            self.field
        }
        fn apply(&self, mut value: JsonValue) -> JsonValue {
            if let Some(object) = value.as_object_mut() {
                object.entry(self.field).or_insert(json!(true));
            }
            value
        }
    }

    fn registry() -> UpgradeRegistry {
        let mut registry = UpgradeRegistry::new("test", v("1.0.0"), v("1.2.0"));
        registry.register(Arc::new(AddField {
            from: "1.0.0",
            to: "1.1.0",
            field: "a",
        }));
        registry.register(Arc::new(AddField {
            from: "1.1.0",
            to: "1.2.0",
            field: "b",
        }));
        registry
    }

    #[test]
    fn test_unstamped_data_runs_whole_chain() {
        let upgraded = registry().upgrade(json!({})).unwrap();
        assert!(upgraded.changed);
        assert_eq!(upgraded.from, v("1.0.0"));
        assert_eq!(
            upgraded.value,
            json!({ "a": true, "b": true, "schemaVersion": "1.2.0" })
        );
    }

    #[test]
    fn test_starts_at_stamped_version() {
        let upgraded = registry()
            .upgrade(json!({ "schemaVersion": "1.1.0" }))
            .unwrap();
        assert_eq!(upgraded.value, json!({ "b": true, "schemaVersion": "1.2.0" }));
    }

    #[test]
    fn test_latest_data_is_untouched() {
        let input = json!({ "x": 1, "schemaVersion": "1.2.0" });
        let upgraded = registry().upgrade(input.clone()).unwrap();
        assert!(!upgraded.changed);
        assert_eq!(upgraded.value, input);
    }

    #[test]
    fn test_newer_data_is_rejected() {
        let err = registry()
            .upgrade(json!({ "schemaVersion": "9.0.0" }))
            .unwrap_err();
        assert!(err.to_string().contains("newer"));
    }

    #[test]
    fn test_unknown_version_is_rejected() {
        assert!(registry().upgrade(json!({ "schemaVersion": "1.0.5" })).is_err());
        assert!(registry().upgrade(json!({ "schemaVersion": 3 })).is_err());
        assert!(registry().upgrade(json!([1, 2])).is_err());
    }

    #[test]
    #[should_panic(expected = "broken")]
    fn test_broken_chain_panics() {
        let mut registry = UpgradeRegistry::new("test", v("1.0.0"), v("2.0.0"));
        registry.register(Arc::new(AddField {
            from: "1.1.0",
            to: "2.0.0",
            field: "a",
        }));
    }
}
