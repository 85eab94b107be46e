//! Atomic JSON file operations.
//!
//! A target file is only ever replaced by renaming a fully written sibling
//! `<name>.tmp` over it, so readers see either the old or the new content.

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value as JsonValue;
use std::io::ErrorKind;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tabletalk_core::error::{Result, TabletalkError};
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;

/// Returns the sibling temp path used while writing `path` (`<path>.tmp`).
pub fn temp_path(path: &Path) -> Result<PathBuf> {
    let file_name = path.file_name().ok_or_else(|| {
        TabletalkError::invalid_input(format!("Path has no file name: '{}'", path.display()))
    })?;
    let mut tmp_name = file_name.to_os_string();
    tmp_name.push(".tmp");
    Ok(path.with_file_name(tmp_name))
}

/// Writes `contents` to `path` via temp file + fsync + rename.
///
/// Creates the parent directory if missing. Errors propagate; there is no retry.
pub async fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await.map_err(|e| {
            TabletalkError::io(format!(
                "Failed to create directory '{}': {}",
                parent.display(),
                e
            ))
        })?;
    }

    let tmp_path = temp_path(path)?;
    let mut tmp_file = File::create(&tmp_path).await.map_err(|e| {
        TabletalkError::io(format!("Failed to create '{}': {}", tmp_path.display(), e))
    })?;
    tmp_file.write_all(contents).await.map_err(|e| {
        TabletalkError::io(format!("Failed to write '{}': {}", tmp_path.display(), e))
    })?;

    // Data must be on disk before the rename makes it visible
    tmp_file.sync_all().await?;
    drop(tmp_file);

    fs::rename(&tmp_path, path).await.map_err(|e| {
        TabletalkError::io(format!(
            "Failed to rename '{}' to '{}': {}",
            tmp_path.display(),
            path.display(),
            e
        ))
    })
}

/// Serializes to pretty-printed UTF-8 JSON.
pub fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(value)?)
}

/// A handle to a JSON file that is always replaced atomically.
pub struct AtomicJsonFile<T> {
    path: PathBuf,
    _phantom: PhantomData<T>,
}

impl<T> AtomicJsonFile<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            _phantom: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the raw JSON tree.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(value))`: File exists and is valid JSON
    /// - `Ok(None)`: File doesn't exist or is empty
    /// - `Err`: Failed to read or parse the file
    pub async fn load_value(&self) -> Result<Option<JsonValue>> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        if content.trim().is_empty() {
            return Ok(None);
        }

        Ok(Some(serde_json::from_str(&content)?))
    }

    /// Loads and deserializes the file. Same `None` rules as [`Self::load_value`].
    pub async fn load(&self) -> Result<Option<T>> {
        match self.load_value().await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Saves data atomically, bypassing any debouncing.
    pub async fn save(&self, data: &T) -> Result<()> {
        write_atomic(&self.path, &to_pretty_json(data)?).await
    }

    /// Saves a raw JSON tree atomically.
    pub async fn save_value(&self, value: &JsonValue) -> Result<()> {
        write_atomic(&self.path, &to_pretty_json(value)?).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct TestConfig {
        name: String,
        count: u32,
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let file = AtomicJsonFile::<TestConfig>::new(temp_dir.path().join("test.json"));

        let config = TestConfig {
            name: "test".to_string(),
            count: 42,
        };
        file.save(&config).await.unwrap();

        let loaded = file.load().await.unwrap().unwrap();
        assert_eq!(loaded, config);

        let raw = std::fs::read_to_string(file.path()).unwrap();
        assert!(raw.contains("\n  \"name\""), "expected pretty JSON, got: {}", raw);
    }

    #[tokio::test]
    async fn test_load_nonexistent_file() {
        let temp_dir = TempDir::new().unwrap();
        let file = AtomicJsonFile::<TestConfig>::new(temp_dir.path().join("missing.json"));
        assert!(file.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_load_empty_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("empty.json");
        std::fs::write(&path, "  \n").unwrap();
        let file = AtomicJsonFile::<TestConfig>::new(path);
        assert!(file.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_load_malformed_file_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();
        let file = AtomicJsonFile::<TestConfig>::new(path);
        assert!(file.load().await.unwrap_err().is_serialization());
    }

    #[tokio::test]
    async fn test_write_creates_parent_and_leaves_no_temp_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("a").join("b").join("state.json");

        write_atomic(&path, b"{}").await.unwrap();
        write_atomic(&path, b"{\"v\":2}").await.unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{\"v\":2}");
        assert!(!temp_dir.path().join("a/b/state.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_failed_write_keeps_old_content() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("state.json");
        write_atomic(&path, b"old").await.unwrap();

        // A directory squatting on the temp path makes File::create fail
        std::fs::create_dir(temp_path(&path).unwrap()).unwrap();
        assert!(write_atomic(&path, b"new").await.is_err());

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "old");
    }

    #[test]
    fn test_temp_path_is_sibling() {
        let tmp = temp_path(Path::new("/data/app-state.json")).unwrap();
        assert_eq!(tmp, PathBuf::from("/data/app-state.json.tmp"));
        assert!(temp_path(Path::new("/")).is_err());
    }
}
