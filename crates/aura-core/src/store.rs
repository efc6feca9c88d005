//! Record store
//!
//! The `Store` owns the backend and is the only writer to it. Each
//! collection is persisted as one JSON array; every mutation is a
//! load → modify → persist of the whole array, serialized per collection.
//!
//! ## Usage
//!
//! ```ignore
//! let store = Store::open()?;
//!
//! store.save(&Sermon::new("Grace Abounds", "A. Preacher"))?;
//! let sermons: Vec<Sermon> = store.list();
//! ```
//!
//! ## Validation
//!
//! Stored elements that no longer match the record schema are skipped on
//! read and moved to the collection's quarantine key on the next write, so
//! one bad element never hides the rest of the collection. The collection
//! is rewritten before the quarantine key; if the quarantine write fails,
//! the rejected elements are held in memory and retried on the next write.

use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::collection::{Collection, Record};
use crate::config::{BackendKind, Config};
use crate::error::{StoreError, StoreResult};
use crate::models::{ChatConversation, JournalEntry, Sermon};
use crate::quota::{CollectionStats, Quota, StorageStats};
use crate::search::{self, Searchable};
use crate::storage::{Backend, FileBackend, MemoryBackend, SqliteBackend, StorageResult};
use crate::sync_status::{SyncTracker, SYNC_STATUS_KEY};

/// A collection as read from the backend
pub(crate) struct Loaded<R> {
    pub(crate) records: Vec<R>,
    /// Raw elements that failed validation
    pub(crate) rejected: Vec<Value>,
}

impl<R> Default for Loaded<R> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            rejected: Vec::new(),
        }
    }
}

/// Per-collection write locks, always taken in `Collection::ALL` order
///
/// Each lock guards the collection's rejected elements that are still
/// waiting to be written to its quarantine key.
#[derive(Default)]
struct CollectionLocks {
    sermons: Mutex<Vec<Value>>,
    journals: Mutex<Vec<Value>>,
    chats: Mutex<Vec<Value>>,
}

impl CollectionLocks {
    fn of(&self, collection: Collection) -> &Mutex<Vec<Value>> {
        match collection {
            Collection::Sermons => &self.sermons,
            Collection::Journals => &self.journals,
            Collection::Chats => &self.chats,
        }
    }
}

/// Guarded values are replaced wholesale, so a poisoned lock is still usable
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Offline store for sermons, journal entries and chat conversations
pub struct Store {
    backend: Box<dyn Backend>,
    quota: Quota,
    locks: CollectionLocks,
    sync_lock: Mutex<()>,
}

impl Store {
    /// Create a store over an existing backend
    pub fn new(backend: Box<dyn Backend>, quota: Quota) -> Self {
        Self {
            backend,
            quota,
            locks: CollectionLocks::default(),
            sync_lock: Mutex::new(()),
        }
    }

    /// Create a store that keeps everything in memory
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemoryBackend::new()), Quota::default())
    }

    /// Open the store described by the default configuration
    pub fn open() -> Result<Self> {
        let config = Config::load().context("Failed to load configuration")?;
        Self::open_with_config(&config)
    }

    /// Open the store with a specific configuration
    pub fn open_with_config(config: &Config) -> Result<Self> {
        let backend: Box<dyn Backend> = match config.backend {
            BackendKind::File => Box::new(
                FileBackend::open(&config.data_dir).context("Failed to open data directory")?,
            ),
            BackendKind::Sqlite => Box::new(
                SqliteBackend::open(&config.sqlite_path())
                    .context("Failed to open SQLite database")?,
            ),
            BackendKind::Memory => Box::new(MemoryBackend::new()),
        };

        debug!(backend = backend.name(), "Opened store");
        Ok(Self::new(backend, config.quota()))
    }

    pub fn quota(&self) -> Quota {
        self.quota
    }

    /// Name of the backend in use
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    // ==================== Record Operations ====================

    /// Insert or replace a record by id
    ///
    /// Returns the record as stored, with its creation marker preserved from
    /// any earlier version and its update timestamp set to now.
    pub fn save<R: Record>(&self, record: &R) -> StoreResult<R> {
        let collection = R::COLLECTION;
        let mut pending = lock(self.locks.of(collection));

        let mut loaded = self.load::<R>()?;
        let now = Utc::now();
        let mut stored = record.clone();

        match loaded.records.iter().position(|r| r.id() == record.id()) {
            Some(index) => {
                stored.stamp(Some(&loaded.records[index]), now);
                loaded.records[index] = stored.clone();
            }
            None => {
                stored.stamp(None, now);
                loaded.records.push(stored.clone());
            }
        }

        self.persist(collection, loaded, &mut pending)?;
        self.touch_sync(&[collection], now);
        debug!(%collection, id = stored.id(), "Saved record");
        Ok(stored)
    }

    /// All records of a collection, in storage order
    ///
    /// Never fails: missing or unreadable data yields an empty list.
    pub fn list<R: Record>(&self) -> Vec<R> {
        match self.load::<R>() {
            Ok(loaded) => loaded.records,
            Err(e) => {
                warn!(collection = %R::COLLECTION, error = %e, "Failed to read collection");
                Vec::new()
            }
        }
    }

    /// Get a record by id
    pub fn get<R: Record>(&self, id: &str) -> Option<R> {
        self.list::<R>().into_iter().find(|r| r.id() == id)
    }

    /// Delete a record by id
    ///
    /// Deleting an id that is not present succeeds. Returns whether a record
    /// was removed.
    pub fn delete<R: Record>(&self, id: &str) -> StoreResult<bool> {
        let collection = R::COLLECTION;
        let mut pending = lock(self.locks.of(collection));

        let mut loaded = self.load::<R>()?;
        let before = loaded.records.len();
        loaded.records.retain(|r| r.id() != id);
        let removed = loaded.records.len() != before;

        self.persist(collection, loaded, &mut pending)?;
        self.touch_sync(&[collection], Utc::now());
        debug!(%collection, id, removed, "Deleted record");
        Ok(removed)
    }

    /// Delete a record by id from the named collection
    pub fn delete_in(&self, collection: Collection, id: &str) -> StoreResult<bool> {
        match collection {
            Collection::Sermons => self.delete::<Sermon>(id),
            Collection::Journals => self.delete::<JournalEntry>(id),
            Collection::Chats => self.delete::<ChatConversation>(id),
        }
    }

    /// Delete an id from every collection
    ///
    /// Returns the collections a record was removed from.
    pub fn delete_everywhere(&self, id: &str) -> StoreResult<Vec<Collection>> {
        let mut removed = Vec::new();
        for collection in Collection::ALL {
            if self.delete_in(collection, id)? {
                removed.push(collection);
            }
        }
        Ok(removed)
    }

    /// Empty a collection, including its quarantine
    pub fn clear(&self, collection: Collection) -> StoreResult<()> {
        let mut pending = lock(self.locks.of(collection));

        self.backend.remove(collection.storage_key())?;
        self.backend.remove(&collection.quarantine_key())?;
        pending.clear();
        self.touch_sync(&[collection], Utc::now());
        info!(%collection, "Cleared collection");
        Ok(())
    }

    /// Empty every collection
    pub fn clear_all(&self) -> StoreResult<()> {
        for collection in Collection::ALL {
            self.clear(collection)?;
        }
        Ok(())
    }

    /// The `count` oldest records, oldest first
    pub fn oldest<R: Record>(&self, count: usize) -> Vec<R> {
        let mut records = self.list::<R>();
        records.sort_by_key(|r| r.created());
        records.truncate(count);
        records
    }

    /// Records that failed validation and were moved aside
    pub fn quarantined(&self, collection: Collection) -> Vec<Value> {
        match self.backend.get(&collection.quarantine_key()) {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_default(),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(%collection, error = %e, "Failed to read quarantine");
                Vec::new()
            }
        }
    }

    /// Discard a collection's quarantined elements
    pub fn clear_quarantine(&self, collection: Collection) -> StoreResult<()> {
        let mut pending = lock(self.locks.of(collection));

        self.backend.remove(&collection.quarantine_key())?;
        pending.clear();
        info!(%collection, "Cleared quarantine");
        Ok(())
    }

    // ==================== Search ====================

    /// Query a collection; see [`search::search`]
    pub fn search<R: Searchable>(&self, query: &str, filter: &R::Filter) -> Vec<R> {
        search::search(self.list::<R>(), query, filter)
    }

    // ==================== Quota ====================

    /// Per-collection and overall usage
    pub fn stats(&self) -> StoreResult<StorageStats> {
        Ok(self.quota.stats(
            self.measure::<Sermon>()?,
            self.measure::<JournalEntry>()?,
            self.measure::<ChatConversation>()?,
        ))
    }

    /// True when available space is below the low-water mark
    pub fn is_full(&self) -> StoreResult<bool> {
        Ok(self.quota.is_full(&self.stats()?))
    }

    fn measure<R: Record>(&self) -> StoreResult<CollectionStats> {
        CollectionStats::measure(&self.list::<R>()).map_err(|source| StoreError::Serialize {
            collection: R::COLLECTION,
            source,
        })
    }

    // ==================== Sync Status ====================

    /// Current sync status of every collection
    pub fn sync_status(&self) -> SyncTracker {
        match self.read_sync_status() {
            Ok(tracker) => tracker,
            Err(e) => {
                warn!(error = %e, "Failed to read sync status");
                SyncTracker::default()
            }
        }
    }

    /// Clear a collection's dirty flag after a remote sync
    pub fn mark_synced(&self, collection: Collection) -> StoreResult<bool> {
        let _guard = lock(&self.sync_lock);

        let mut tracker = self.read_sync_status()?;
        let marked = tracker.mark_synced(collection);
        if marked {
            self.write_sync_status(&tracker)?;
        }
        Ok(marked)
    }

    /// Mark collections modified at `now`
    ///
    /// A failure here is logged; the record mutation already succeeded.
    /// When the stored status cannot be read it is left as is rather than
    /// overwritten with a fresh document.
    pub(crate) fn touch_sync(&self, collections: &[Collection], now: DateTime<Utc>) {
        let _guard = lock(&self.sync_lock);

        let mut tracker = match self.read_sync_status() {
            Ok(tracker) => tracker,
            Err(e) => {
                warn!(error = %e, "Failed to read sync status; not updating it");
                return;
            }
        };
        for collection in collections {
            tracker.mark_modified(*collection, now);
        }
        if let Err(e) = self.write_sync_status(&tracker) {
            warn!(error = %e, "Failed to update sync status");
        }
    }

    fn read_sync_status(&self) -> StorageResult<SyncTracker> {
        Ok(SyncTracker::decode(self.backend.get(SYNC_STATUS_KEY)?.as_deref()))
    }

    fn write_sync_status(&self, tracker: &SyncTracker) -> StoreResult<()> {
        let encoded = tracker.encode().map_err(StoreError::SyncStatus)?;
        self.backend.set(SYNC_STATUS_KEY, &encoded)?;
        Ok(())
    }

    // ==================== Persistence ====================

    pub(crate) fn collection_lock(&self, collection: Collection) -> &Mutex<Vec<Value>> {
        self.locks.of(collection)
    }

    pub(crate) fn read_raw(&self, collection: Collection) -> StorageResult<Option<String>> {
        self.backend.get(collection.storage_key())
    }

    /// Write a raw payload, or remove the key when `payload` is `None`
    pub(crate) fn write_raw(
        &self,
        collection: Collection,
        payload: Option<&str>,
    ) -> StorageResult<()> {
        match payload {
            Some(payload) => self.backend.set(collection.storage_key(), payload),
            None => self.backend.remove(collection.storage_key()),
        }
    }

    /// Read and validate a collection
    pub(crate) fn load<R: Record>(&self) -> StoreResult<Loaded<R>> {
        Ok(match self.read_raw(R::COLLECTION)? {
            Some(raw) => decode(R::COLLECTION, &raw),
            None => Loaded::default(),
        })
    }

    /// Write a collection back, then move rejected elements to quarantine
    ///
    /// Only the collection write can fail the mutation. Rejected elements
    /// that cannot be quarantined stay in `pending` for the next write.
    fn persist<R: Record>(
        &self,
        collection: Collection,
        loaded: Loaded<R>,
        pending: &mut Vec<Value>,
    ) -> StoreResult<()> {
        let payload = serde_json::to_string(&loaded.records)
            .map_err(|source| StoreError::Serialize { collection, source })?;
        self.write_raw(collection, Some(&payload))?;

        for value in loaded.rejected {
            if !pending.contains(&value) {
                pending.push(value);
            }
        }
        if pending.is_empty() {
            return Ok(());
        }

        match self.quarantine(collection, pending) {
            Ok(()) => pending.clear(),
            Err(e) => warn!(
                %collection,
                held = pending.len(),
                error = %e,
                "Failed to quarantine invalid records; will retry on next write"
            ),
        }
        Ok(())
    }

    fn quarantine(&self, collection: Collection, rejected: &[Value]) -> StoreResult<()> {
        let mut held: Vec<Value> = match self.backend.get(&collection.quarantine_key())? {
            Some(raw) => serde_json::from_str(&raw).unwrap_or_default(),
            None => Vec::new(),
        };
        let before = held.len();
        for value in rejected {
            if !held.contains(value) {
                held.push(value.clone());
            }
        }
        if held.len() == before {
            return Ok(());
        }

        let payload = serde_json::to_string(&held)
            .map_err(|source| StoreError::Serialize { collection, source })?;
        self.backend.set(&collection.quarantine_key(), &payload)?;
        warn!(%collection, count = held.len() - before, "Quarantined invalid records");
        Ok(())
    }
}

/// Parse a stored payload, keeping valid records and setting aside the rest
fn decode<R: Record>(collection: Collection, raw: &str) -> Loaded<R> {
    let values: Vec<Value> = match serde_json::from_str(raw) {
        Ok(values) => values,
        Err(e) => {
            warn!(%collection, error = %e, "Stored collection is unreadable; treating as empty");
            return Loaded {
                records: Vec::new(),
                rejected: vec![Value::String(raw.to_string())],
            };
        }
    };

    let mut loaded = Loaded::default();
    for value in values {
        match R::deserialize(&value) {
            Ok(record) => loaded.records.push(record),
            Err(e) => {
                warn!(%collection, error = %e, "Skipping invalid record");
                loaded.rejected.push(value);
            }
        }
    }
    loaded
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ChatMode, MessageRole};
    use crate::search::{JournalFilter, SermonFilter};
    use crate::storage::StorageError;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn test_config(temp_dir: &TempDir, backend: BackendKind) -> Config {
        Config {
            data_dir: temp_dir.path().to_path_buf(),
            backend,
            ..Config::default()
        }
    }

    #[test]
    fn test_sermon_scenario() {
        let store = Store::in_memory();

        let a = Sermon::with_id("1", "Sermon A", "Speaker");
        store.save(&a).unwrap();

        let a2 = Sermon::with_id("1", "Sermon A Revised", "Speaker");
        store.save(&a2).unwrap();
        let sermons: Vec<Sermon> = store.list();
        assert_eq!(sermons.len(), 1);
        assert_eq!(sermons[0].title, "Sermon A Revised");

        store.save(&Sermon::with_id("2", "Sermon B", "Speaker")).unwrap();
        assert_eq!(store.list::<Sermon>().len(), 2);

        store.delete::<Sermon>("1").unwrap();
        let sermons: Vec<Sermon> = store.list();
        assert_eq!(sermons.len(), 1);
        assert_eq!(sermons[0].id, "2");

        let snapshot = store.export().unwrap();
        store.clear(Collection::Sermons).unwrap();
        assert!(store.list::<Sermon>().is_empty());

        store.import(&snapshot).unwrap();
        let sermons: Vec<Sermon> = store.list();
        assert_eq!(sermons.len(), 1);
        assert_eq!(sermons[0].id, "2");
        assert_eq!(sermons[0].title, "Sermon B");
    }

    #[test]
    fn test_idempotent_upsert() {
        let store = Store::in_memory();
        let mut entry = JournalEntry::with_id("j", "Same");
        entry.content = "Same content".to_string();

        store.save(&entry).unwrap();
        store.save(&entry).unwrap();

        let entries: Vec<JournalEntry> = store.list();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, "j");
    }

    #[test]
    fn test_save_preserves_creation_and_sets_update_time() {
        let store = Store::in_memory();

        let first = store.save(&JournalEntry::with_id("j", "First")).unwrap();

        let mut second = JournalEntry::with_id("j", "Second");
        second.created_at = first.created_at + chrono::Duration::days(10);
        second.content = "four words right here".to_string();
        let stored = store.save(&second).unwrap();

        assert_eq!(stored.created_at, first.created_at);
        assert!(stored.updated_at >= first.updated_at);
        assert_eq!(stored.word_count, 4);

        let listed: JournalEntry = store.get("j").unwrap();
        assert_eq!(listed, stored);
    }

    #[test]
    fn test_sermon_download_time_is_kept() {
        let store = Store::in_memory();
        let first = store.save(&Sermon::with_id("s", "Title", "Speaker")).unwrap();

        let mut update = first.clone();
        update.downloaded_at = first.downloaded_at + chrono::Duration::hours(1);
        update.is_favorite = true;
        let stored = store.save(&update).unwrap();

        assert_eq!(stored.downloaded_at, first.downloaded_at);
        assert!(stored.is_favorite);
    }

    #[test]
    fn test_list_preserves_storage_order() {
        let store = Store::in_memory();
        for id in ["c", "a", "b"] {
            store.save(&Sermon::with_id(id, id, "Speaker")).unwrap();
        }
        // Replacing keeps the record's position
        store.save(&Sermon::with_id("a", "renamed", "Speaker")).unwrap();

        let ids: Vec<String> = store.list::<Sermon>().into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_delete_missing_is_noop() {
        let store = Store::in_memory();
        store.save(&Sermon::with_id("1", "One", "Speaker")).unwrap();
        let before: Vec<Sermon> = store.list();

        assert!(!store.delete::<Sermon>("missing").unwrap());
        assert_eq!(store.list::<Sermon>(), before);
    }

    #[test]
    fn test_collections_are_independent() {
        let store = Store::in_memory();
        store.save(&Sermon::with_id("shared", "Sermon", "Speaker")).unwrap();
        store.save(&JournalEntry::with_id("shared", "Journal")).unwrap();

        store.delete::<Sermon>("shared").unwrap();
        assert!(store.list::<Sermon>().is_empty());
        assert_eq!(store.list::<JournalEntry>().len(), 1);
    }

    #[test]
    fn test_delete_everywhere() {
        let store = Store::in_memory();
        store.save(&Sermon::with_id("x", "Sermon", "Speaker")).unwrap();
        store
            .save(&ChatConversation::with_id("x", "Chat", ChatMode::Insights))
            .unwrap();
        store.save(&JournalEntry::with_id("y", "Other")).unwrap();

        let removed = store.delete_everywhere("x").unwrap();
        assert_eq!(removed, vec![Collection::Sermons, Collection::Chats]);
        assert_eq!(store.list::<JournalEntry>().len(), 1);
    }

    #[test]
    fn test_clear_and_clear_all() {
        let store = Store::in_memory();
        store.save(&Sermon::new("S", "Speaker")).unwrap();
        store.save(&JournalEntry::new("J")).unwrap();
        store.save(&ChatConversation::new("C", ChatMode::Theological)).unwrap();

        store.clear(Collection::Journals).unwrap();
        assert!(store.list::<JournalEntry>().is_empty());
        assert_eq!(store.list::<Sermon>().len(), 1);

        store.clear_all().unwrap();
        let stats = store.stats().unwrap();
        assert_eq!(stats.sermons.count + stats.journals.count + stats.chats.count, 0);
    }

    #[test]
    fn test_mutations_update_sync_status() {
        let store = Store::in_memory();
        assert!(store.sync_status().pending().is_empty());

        store.save(&Sermon::new("S", "Speaker")).unwrap();
        assert_eq!(store.sync_status().pending(), vec![Collection::Sermons]);

        assert!(store.mark_synced(Collection::Sermons).unwrap());
        assert!(store.sync_status().pending().is_empty());

        store.delete::<Sermon>("nothing").unwrap();
        store.clear(Collection::Chats).unwrap();
        assert_eq!(
            store.sync_status().pending(),
            vec![Collection::Sermons, Collection::Chats]
        );
        assert!(!store.mark_synced(Collection::Journals).unwrap());
    }

    #[test]
    fn test_corrupt_payload_reads_as_empty_and_is_quarantined() {
        let backend = MemoryBackend::new();
        backend.set("bible_aura_journals", "{not json").unwrap();
        let store = Store::new(Box::new(backend), Quota::default());

        assert!(store.list::<JournalEntry>().is_empty());

        store.save(&JournalEntry::with_id("j", "Fresh")).unwrap();
        assert_eq!(store.list::<JournalEntry>().len(), 1);
        assert_eq!(
            store.quarantined(Collection::Journals),
            vec![Value::String("{not json".to_string())]
        );
    }

    #[test]
    fn test_invalid_elements_are_skipped_not_fatal() {
        let good = serde_json::to_value(Sermon::with_id("good", "Good", "Speaker")).unwrap();
        let bad = serde_json::json!({"id": "bad", "title": 42});
        let payload = serde_json::to_string(&vec![good, bad.clone()]).unwrap();

        let backend = MemoryBackend::new();
        backend.set("bible_aura_sermons", &payload).unwrap();
        let store = Store::new(Box::new(backend), Quota::default());

        let sermons: Vec<Sermon> = store.list();
        assert_eq!(sermons.len(), 1);
        assert_eq!(sermons[0].id, "good");
        assert!(store.quarantined(Collection::Sermons).is_empty());

        // Two writes quarantine the bad element exactly once
        store.delete::<Sermon>("nothing").unwrap();
        store.delete::<Sermon>("nothing").unwrap();
        assert_eq!(store.quarantined(Collection::Sermons), vec![bad]);
        assert_eq!(store.list::<Sermon>().len(), 1);
    }

    #[test]
    fn test_large_corrupt_payload_does_not_block_writes() {
        let raw = format!("{{{}", "x".repeat(3000));
        let backend = MemoryBackend::with_limit(5000);
        backend.set("bible_aura_journals", &raw).unwrap();
        let store = Store::new(Box::new(backend), Quota::default());

        store.save(&JournalEntry::with_id("j1", "First")).unwrap();
        store.save(&JournalEntry::with_id("j2", "Second")).unwrap();

        assert_eq!(store.list::<JournalEntry>().len(), 2);
        assert_eq!(store.quarantined(Collection::Journals), vec![Value::String(raw)]);
    }

    #[test]
    fn test_quarantine_that_cannot_fit_is_held_for_retry() {
        let raw = format!("{{{}", "x".repeat(4900));
        let backend = MemoryBackend::with_limit(5000);
        backend.set("bible_aura_journals", &raw).unwrap();
        let store = Store::new(Box::new(backend), Quota::default());

        store.save(&JournalEntry::with_id("j1", "First")).unwrap();
        store.save(&JournalEntry::with_id("j2", "Second")).unwrap();

        assert_eq!(store.list::<JournalEntry>().len(), 2);
        assert!(store.quarantined(Collection::Journals).is_empty());
        assert_eq!(
            *lock(store.locks.of(Collection::Journals)),
            vec![Value::String(raw)]
        );

        store.clear_quarantine(Collection::Journals).unwrap();
        assert!(lock(store.locks.of(Collection::Journals)).is_empty());
        store.save(&JournalEntry::with_id("j3", "Third")).unwrap();
        assert!(store.quarantined(Collection::Journals).is_empty());
        assert_eq!(store.list::<JournalEntry>().len(), 3);
    }

    #[test]
    fn test_clear_removes_quarantine() {
        let backend = MemoryBackend::new();
        backend.set("bible_aura_journals", "{not json").unwrap();
        let store = Store::new(Box::new(backend), Quota::default());

        store.save(&JournalEntry::with_id("j", "Fresh")).unwrap();
        assert_eq!(store.quarantined(Collection::Journals).len(), 1);

        store.clear(Collection::Journals).unwrap();
        assert!(store.quarantined(Collection::Journals).is_empty());
        assert!(store.list::<JournalEntry>().is_empty());

        store.save(&JournalEntry::with_id("j", "Again")).unwrap();
        store.clear_quarantine(Collection::Journals).unwrap();
        assert!(store.quarantined(Collection::Journals).is_empty());
    }

    #[test]
    fn test_unreadable_sync_status_is_not_overwritten() {
        let (backend, failing) = crate::storage::FlakyBackend::new();
        let store = Store::new(Box::new(backend), Quota::default());
        store.save(&Sermon::with_id("s1", "S", "Speaker")).unwrap();

        failing.lock().unwrap().push(SYNC_STATUS_KEY.to_string());
        store.save(&JournalEntry::with_id("j1", "J")).unwrap();
        assert!(store.mark_synced(Collection::Sermons).is_err());

        failing.lock().unwrap().clear();
        assert_eq!(store.sync_status().pending(), vec![Collection::Sermons]);
    }

    #[test]
    fn test_rejected_write_leaves_state_unchanged() {
        let store = Store::new(Box::new(MemoryBackend::with_limit(2048)), Quota::default());
        store.save(&JournalEntry::with_id("small", "Small")).unwrap();
        let before: Vec<JournalEntry> = store.list();

        let mut huge = JournalEntry::with_id("huge", "Huge");
        huge.content = "x".repeat(4096);
        let err = store.save(&huge).unwrap_err();

        assert!(matches!(
            err,
            StoreError::Storage(StorageError::QuotaExceeded { .. })
        ));
        assert_eq!(store.list::<JournalEntry>(), before);
    }

    #[test]
    fn test_oldest() {
        let store = Store::in_memory();
        let now = Utc::now();
        for (id, days_ago) in [("mid", 2), ("new", 0), ("old", 5)] {
            let mut chat = ChatConversation::with_id(id, id, ChatMode::Insights);
            chat.created_at = now - chrono::Duration::days(days_ago);
            store.save(&chat).unwrap();
        }

        let oldest: Vec<ChatConversation> = store.oldest(2);
        let ids: Vec<&str> = oldest.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["old", "mid"]);
        assert_eq!(store.oldest::<ChatConversation>(10).len(), 3);
    }

    #[test]
    fn test_search_through_store() {
        let store = Store::in_memory();
        let mut sermon = Sermon::new("Grace Abounds", "Speaker");
        sermon.category = "grace".to_string();
        store.save(&sermon).unwrap();
        store.save(&Sermon::new("Faith", "Speaker")).unwrap();

        let hits = store.search::<Sermon>(
            "grace",
            &SermonFilter {
                category: Some("grace".to_string()),
                ..Default::default()
            },
        );
        assert_eq!(hits.len(), 1);
        assert!(store.search::<JournalEntry>("grace", &JournalFilter::default()).is_empty());
    }

    #[test]
    fn test_stats_match_serialized_sizes() {
        let store = Store::new(Box::new(MemoryBackend::new()), Quota::new(100_000, 10_000));
        let mut chat = ChatConversation::new("Chat", ChatMode::Theological);
        chat.push_message(MessageRole::User, "Hello");
        store.save(&chat).unwrap();
        store.save(&Sermon::new("S", "Speaker")).unwrap();

        let stats = store.stats().unwrap();
        let chats: Vec<ChatConversation> = store.list();
        assert_eq!(
            stats.chats.total_size,
            serde_json::to_string(&chats).unwrap().len() as u64
        );
        assert_eq!(stats.journals.total_size, 2);
        assert_eq!(
            stats.total_size,
            stats.sermons.total_size + stats.journals.total_size + stats.chats.total_size
        );
        assert_eq!(stats.available, 100_000 - stats.total_size as i64);
        assert!(!store.is_full().unwrap());
    }

    #[test]
    fn test_is_full_near_capacity() {
        let store = Store::new(Box::new(MemoryBackend::new()), Quota::new(1000, 900));
        store.save(&Sermon::new("Long enough to matter", "Speaker")).unwrap();
        assert!(store.is_full().unwrap());
    }

    #[test]
    fn test_concurrent_saves_do_not_lose_updates() {
        let store = Arc::new(Store::in_memory());

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for i in 0..25 {
                        let id = format!("{}-{}", t, i);
                        store.save(&JournalEntry::with_id(id, "Entry")).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.list::<JournalEntry>().len(), 100);
    }

    #[test]
    fn test_file_backend_persists_across_reopens() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir, BackendKind::File);

        {
            let store = Store::open_with_config(&config).unwrap();
            assert_eq!(store.backend_name(), "file");
            let mut entry = JournalEntry::with_id("keep", "Persistent");
            entry.content = "Body content".to_string();
            store.save(&entry).unwrap();
        }

        let store = Store::open_with_config(&config).unwrap();
        let entries: Vec<JournalEntry> = store.list();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].content, "Body content");
        assert_eq!(store.sync_status().pending(), vec![Collection::Journals]);
    }

    #[test]
    fn test_sqlite_backend_persists_across_reopens() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir, BackendKind::Sqlite);

        {
            let store = Store::open_with_config(&config).unwrap();
            assert_eq!(store.backend_name(), "sqlite");
            store
                .save(&ChatConversation::with_id("c", "Chat", ChatMode::Historical))
                .unwrap();
        }

        let store = Store::open_with_config(&config).unwrap();
        assert!(config.sqlite_path().exists());
        assert!(store.get::<ChatConversation>("c").is_some());
    }
}
