//! Application-level state.

pub mod model;
pub mod repository;

pub use model::{AppSettings, ApplicationState, KeyboardShortcuts, ReasoningEffort};
pub use repository::StateRepository;
