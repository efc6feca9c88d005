//! Bible Aura Core Library
//!
//! This crate provides the offline persistence layer for Bible Aura: the
//! client-side store that keeps sermons, journal entries and AI chat
//! conversations durable across sessions without a backend.
//!
//! # Architecture
//!
//! - **Backend**: a persistent key/value substrate (memory, files or SQLite)
//! - **Store**: keyed-collection CRUD, one collection per record kind
//!
//! Quota accounting and search are read-side views computed on demand from
//! the store; backups compose from, and decompose into, the store.
//!
//! # Quick Start
//!
//! ```text
//! let store = Store::open()?;
//!
//! // Save a journal entry
//! let mut entry = JournalEntry::new("Morning reflection");
//! entry.set_content("Be still, and know that I am God.");
//! store.save(&entry)?;
//!
//! // Query entries
//! let hits = store.search::<JournalEntry>("still", &JournalFilter::default());
//! ```
//!
//! # Modules
//!
//! - `store`: Record Store (main entry point)
//! - `models`: Sermons, journal entries and chat conversations
//! - `collection`: Collection names and the `Record` contract
//! - `storage`: Key/value backends
//! - `quota`: Storage usage against a fixed byte budget
//! - `search`: Substring and filter queries
//! - `sync_status`: Per-collection dirty tracking
//! - `backup`: Snapshot export and import
//! - `config`: Application configuration

pub mod backup;
pub mod collection;
pub mod config;
pub mod error;
pub mod models;
pub mod quota;
pub mod search;
pub mod storage;
pub mod store;
pub mod sync_status;

pub use backup::{backup_file_name, ImportSummary, Snapshot, SNAPSHOT_VERSION};
pub use collection::{Collection, Record};
pub use config::{BackendKind, Config};
pub use error::{StoreError, StoreResult};
pub use models::{ChatConversation, ChatMessage, ChatMode, JournalEntry, Language, MessageRole, Sermon};
pub use quota::{format_size, CollectionStats, Quota, StorageHealth, StorageStats};
pub use search::{ChatFilter, JournalFilter, Searchable, SermonFilter};
pub use storage::{Backend, FileBackend, MemoryBackend, SqliteBackend, StorageError};
pub use store::Store;
pub use sync_status::{SyncStatus, SyncTracker};
