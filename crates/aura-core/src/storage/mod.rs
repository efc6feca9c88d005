//! Storage layer
//!
//! Key/value backends the store persists collections into.
//!
//! ## Backends
//!
//! - **Memory**: in-process map with an optional hard byte limit
//! - **File**: one JSON file per key, written atomically
//! - **SQLite**: one row per key in a single database file

mod backend;
mod error;
mod file;
mod schema;
mod sqlite;

pub use backend::{Backend, MemoryBackend};
#[cfg(test)]
pub(crate) use backend::FlakyBackend;
pub use error::{StorageError, StorageResult};
pub use file::FileBackend;
pub use schema::SCHEMA_VERSION;
pub use sqlite::SqliteBackend;
