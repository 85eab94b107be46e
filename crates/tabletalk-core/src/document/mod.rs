//! Document blobs owned by projects and global threads.

pub mod model;
pub mod naming;
pub mod repository;

pub use model::{DocumentBlob, DocumentKind, DocumentTarget, StoredDocument};
pub use repository::DocumentStore;
