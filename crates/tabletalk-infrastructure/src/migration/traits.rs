//! Core trait for schema upgrade steps.

use semver::Version;
use serde_json::Value as JsonValue;

/// One step in a linear chain of on-disk schema upgrades.
///
/// Steps operate on the generic JSON tree before it is deserialized into a
/// typed record. `apply` must be pure and must leave data that already has
/// the new shape untouched, so running a step twice is harmless.
pub trait UpgradeStep: Send + Sync + std::fmt::Debug {
    /// Returns the source version this step starts from.
    fn from_version(&self) -> Version;

    /// Returns the target version this step produces.
    fn to_version(&self) -> Version;

    /// Returns a human-readable description, used for logging.
    fn description(&self) -> &str;

    /// Transforms the tree from `from_version` to `to_version`.
    fn apply(&self, value: JsonValue) -> JsonValue;
}

/// Renames `old` to `new` when `old` is present and `new` is not.
///
/// Returns `true` if the object changed. Values are moved unchanged.
pub fn rename_key(object: &mut serde_json::Map<String, JsonValue>, old: &str, new: &str) -> bool {
    if object.contains_key(new) {
        return false;
    }
    match object.remove(old) {
        Some(value) => {
            object.insert(new.to_string(), value);
            true
        }
        None => false,
    }
}
