//! Low-level persistence primitives.

pub mod atomic_json;
pub mod versioned;
pub mod write_scheduler;

pub use atomic_json::{AtomicJsonFile, temp_path, to_pretty_json, write_atomic};
pub use versioned::{VersionedLoad, load_versioned, stamped_json};
pub use write_scheduler::{DEFAULT_DEBOUNCE, WriteEvent, WriteScheduler, WriteTrigger};
