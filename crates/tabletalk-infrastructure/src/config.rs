//! Configuration loading.
//!
//! Configuration is read from `<config_dir>/tabletalk/config.toml`:
//!
//! ```toml
//! [storage]
//! data_dir = "/path/to/data"   # optional, defaults to the platform data dir
//! debounce_ms = 500
//!
//! [logging]
//! level = "info"
//! ```
//!
//! `TABLETALK_DATA_DIR` overrides `storage.data_dir`.

use serde::Deserialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tabletalk_core::error::{Result, TabletalkError};

use crate::paths::StoragePaths;
use crate::storage::DEFAULT_DEBOUNCE;

/// Environment variable that overrides the data directory.
pub const DATA_DIR_ENV: &str = "TABLETALK_DATA_DIR";

/// Root configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub storage: StorageSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    pub data_dir: Option<PathBuf>,
    /// Debounce interval for coalesced saves, in milliseconds
    pub debounce_ms: u64,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            data_dir: None,
            debounce_ms: DEFAULT_DEBOUNCE.as_millis() as u64,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Default `tracing` filter directive; `RUST_LOG` takes precedence
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl StorageConfig {
    /// Default location of `config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("tabletalk").join("config.toml"))
    }

    /// Loads configuration from `path`, or from [`Self::default_path`].
    ///
    /// A missing file yields defaults; a malformed one is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path.map(Path::to_path_buf).or_else(Self::default_path) {
            Some(path) => path,
            None => return Ok(Self::default()),
        };

        match std::fs::read_to_string(&path) {
            Ok(content) => {
                let config = Self::from_toml(&content)?;
                tracing::debug!(path = %path.display(), "Loaded configuration");
                Ok(config)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(TabletalkError::io(format!(
                "Failed to read config '{}': {}",
                path.display(),
                e
            ))),
        }
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.storage.data_dir = Some(data_dir.into());
        self
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.storage.debounce_ms)
    }

    /// Resolves the data directory: environment, then config file, then platform default.
    pub fn data_dir(&self) -> Result<PathBuf> {
        self.data_dir_with_env(std::env::var_os(DATA_DIR_ENV))
    }

    fn data_dir_with_env(&self, env: Option<OsString>) -> Result<PathBuf> {
        if let Some(dir) = env.filter(|v| !v.is_empty()) {
            return Ok(PathBuf::from(dir));
        }
        match &self.storage.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => StoragePaths::default_base_dir(),
        }
    }
}
