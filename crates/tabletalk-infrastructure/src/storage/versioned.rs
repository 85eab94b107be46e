//! Loading of schema-versioned JSON files.

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value as JsonValue;

use super::atomic_json::AtomicJsonFile;
use crate::migration::UpgradeRegistry;

/// A record read from disk together with its upgraded JSON tree.
pub struct VersionedLoad<T> {
    pub record: T,
    /// Upgraded tree, stamped with the latest version
    pub value: JsonValue,
    /// Whether the tree on disk differs from `value`
    pub upgraded: bool,
}

/// Reads, upgrades and deserializes a versioned file.
///
/// Every failure degrades to `None` with a warning: a missing, unreadable,
/// unparsable or unsupported file means "nothing stored yet" to callers.
pub async fn load_versioned<T>(
    file: &AtomicJsonFile<T>,
    registry: &UpgradeRegistry,
) -> Option<VersionedLoad<T>>
where
    T: Serialize + DeserializeOwned,
{
    let path = file.path().display();
    let raw = match file.load_value().await {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            tracing::warn!(path = %path, "Ignoring unreadable file: {}", e);
            return None;
        }
    };

    let upgraded = match registry.upgrade(raw) {
        Ok(upgraded) => upgraded,
        Err(e) => {
            tracing::warn!(path = %path, "Ignoring file that cannot be upgraded: {}", e);
            return None;
        }
    };

    match serde_json::from_value::<T>(upgraded.value.clone()) {
        Ok(record) => Some(VersionedLoad {
            record,
            value: upgraded.value,
            upgraded: upgraded.changed,
        }),
        Err(e) => {
            tracing::warn!(path = %path, "Ignoring file with unexpected shape: {}", e);
            None
        }
    }
}

/// Serializes a record and stamps it with the registry's latest version.
pub fn stamped_json<T: Serialize>(
    record: &T,
    registry: &UpgradeRegistry,
) -> tabletalk_core::Result<Vec<u8>> {
    let mut value = serde_json::to_value(record)?;
    registry.stamp(&mut value);
    super::atomic_json::to_pretty_json(&value)
}
