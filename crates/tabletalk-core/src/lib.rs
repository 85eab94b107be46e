//! Domain records and repository contracts for Tabletalk's local persistence.
//!
//! Everything here is plain data plus pure logic; filesystem implementations
//! live in `tabletalk-infrastructure`.

pub mod document;
pub mod error;
pub mod project;
pub mod state;
pub mod thread;

pub use error::{Result, TabletalkError};
