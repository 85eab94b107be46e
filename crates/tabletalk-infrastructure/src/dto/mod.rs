//! Data transfer objects for formats that are read but never written.

pub mod legacy;

pub use legacy::{LegacyProject, LegacySession, LegacyState};
