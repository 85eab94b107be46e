//! Versioned schema upgrades for persisted JSON.
//!
//! Files are parsed into a generic [`serde_json::Value`], run through a
//! linear chain of pure [`UpgradeStep`]s and only then deserialized into the
//! typed records.

pub mod app_state;
pub mod project;
pub mod registry;
pub mod traits;

pub use app_state::{APP_STATE_SCHEMA_VERSION, app_state_registry};
pub use project::{PROJECT_SCHEMA_VERSION, project_registry};
pub use registry::{SCHEMA_VERSION_KEY, UpgradeRegistry, Upgraded};
pub use traits::UpgradeStep;
