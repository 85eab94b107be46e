//! Projects: named containers of documents and threads.

pub mod model;
pub mod repository;

pub use model::{ProjectMetadata, ProjectSummary};
pub use repository::ProjectRepository;
