//! Filesystem persistence for Tabletalk.
//!
//! Implements the repository traits of `tabletalk-core` on top of atomic
//! JSON files, a debounced write scheduler and per-target blob directories.

pub mod config;
pub mod document_store;
pub mod dto;
pub mod legacy_import;
pub mod local_store;
pub mod migration;
pub mod paths;
pub mod project_repository;
pub mod state_repository;
pub mod storage;

pub use crate::config::StorageConfig;
pub use crate::document_store::FsDocumentStore;
pub use crate::legacy_import::LegacyImporter;
pub use crate::local_store::LocalStore;
pub use crate::paths::StoragePaths;
pub use crate::project_repository::JsonProjectRepository;
pub use crate::state_repository::JsonStateRepository;
pub use crate::storage::{WriteEvent, WriteScheduler, WriteTrigger};
