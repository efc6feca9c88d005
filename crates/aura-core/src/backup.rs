//! Backup export and import
//!
//! A backup is a single JSON document holding every collection plus a
//! format version and export time. Import replaces each collection present
//! in the document and leaves absent ones untouched.
//!
//! Import is all-or-nothing: the whole document is validated before any
//! write, and if a write fails partway the collections already replaced are
//! restored to their previous contents.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::collection::Collection;
use crate::error::{StoreError, StoreResult};
use crate::models::{ChatConversation, JournalEntry, Sermon};
use crate::store::{lock, Store};

/// Format version written by [`Store::export`]
pub const SNAPSHOT_VERSION: &str = "1.0";

/// Backup document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sermons: Option<Vec<Sermon>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub journals: Option<Vec<JournalEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chats: Option<Vec<ChatConversation>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exported_at: Option<DateTime<Utc>>,
    /// Missing in the oldest backups; treated as 1.0
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl Snapshot {
    /// Parse and version-check a backup document
    pub fn parse(text: &str) -> StoreResult<Self> {
        let snapshot: Snapshot = serde_json::from_str(text).map_err(StoreError::InvalidSnapshot)?;

        if let Some(version) = &snapshot.version {
            if version.split('.').next() != Some("1") {
                return Err(StoreError::UnsupportedVersion(version.clone()));
            }
        }

        Ok(snapshot)
    }

    fn payload(&self, collection: Collection) -> StoreResult<Option<String>> {
        let encoded = match collection {
            Collection::Sermons => self.sermons.as_ref().map(serde_json::to_string),
            Collection::Journals => self.journals.as_ref().map(serde_json::to_string),
            Collection::Chats => self.chats.as_ref().map(serde_json::to_string),
        };
        encoded
            .transpose()
            .map_err(|source| StoreError::Serialize { collection, source })
    }
}

/// Record counts written by an import, per collection
///
/// `None` means the collection was absent from the backup and left as it was.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub sermons: Option<usize>,
    pub journals: Option<usize>,
    pub chats: Option<usize>,
}

impl ImportSummary {
    fn from_snapshot(snapshot: &Snapshot) -> Self {
        Self {
            sermons: snapshot.sermons.as_ref().map(Vec::len),
            journals: snapshot.journals.as_ref().map(Vec::len),
            chats: snapshot.chats.as_ref().map(Vec::len),
        }
    }

    /// Collections the import replaced
    pub fn replaced(&self) -> Vec<Collection> {
        Collection::ALL
            .into_iter()
            .filter(|c| self.get(*c).is_some())
            .collect()
    }

    pub fn get(&self, collection: Collection) -> Option<usize> {
        match collection {
            Collection::Sermons => self.sermons,
            Collection::Journals => self.journals,
            Collection::Chats => self.chats,
        }
    }

    /// Total records written
    pub fn total(&self) -> usize {
        Collection::ALL
            .into_iter()
            .filter_map(|c| self.get(c))
            .sum()
    }
}

/// Suggested file name for a backup taken on `date`
pub fn backup_file_name(date: NaiveDate) -> String {
    format!("bible-aura-backup-{}.json", date.format("%Y-%m-%d"))
}

impl Store {
    /// Export every collection as a pretty-printed snapshot document
    ///
    /// A collection that cannot be read fails the export rather than being
    /// written out as empty.
    pub fn export(&self) -> StoreResult<String> {
        let _sermons = lock(self.collection_lock(Collection::Sermons));
        let _journals = lock(self.collection_lock(Collection::Journals));
        let _chats = lock(self.collection_lock(Collection::Chats));

        let snapshot = Snapshot {
            sermons: Some(self.load::<Sermon>()?.records),
            journals: Some(self.load::<JournalEntry>()?.records),
            chats: Some(self.load::<ChatConversation>()?.records),
            exported_at: Some(Utc::now()),
            version: Some(SNAPSHOT_VERSION.to_string()),
        };

        let text = serde_json::to_string_pretty(&snapshot).map_err(StoreError::InvalidSnapshot)?;
        info!(bytes = text.len(), "Exported backup");
        Ok(text)
    }

    /// Replace collections with the contents of a snapshot document
    ///
    /// Fails without touching the store if the text is not a valid snapshot.
    pub fn import(&self, text: &str) -> StoreResult<ImportSummary> {
        let snapshot = Snapshot::parse(text)?;

        let mut payloads = Vec::new();
        for collection in Collection::ALL {
            if let Some(payload) = snapshot.payload(collection)? {
                payloads.push((collection, payload));
            }
        }

        let _sermons = lock(self.collection_lock(Collection::Sermons));
        let _journals = lock(self.collection_lock(Collection::Journals));
        let _chats = lock(self.collection_lock(Collection::Chats));

        let mut written: Vec<(Collection, Option<String>)> = Vec::new();
        for (collection, payload) in &payloads {
            let result = self
                .read_raw(*collection)
                .and_then(|previous| {
                    self.write_raw(*collection, Some(payload))?;
                    Ok(previous)
                });

            match result {
                Ok(previous) => written.push((*collection, previous)),
                Err(e) => {
                    self.roll_back(&written);
                    return Err(e.into());
                }
            }
        }

        let summary = ImportSummary::from_snapshot(&snapshot);
        let replaced = summary.replaced();
        if !replaced.is_empty() {
            self.touch_sync(&replaced, Utc::now());
        }

        info!(
            sermons = ?summary.sermons,
            journals = ?summary.journals,
            chats = ?summary.chats,
            "Imported backup"
        );
        Ok(summary)
    }

    fn roll_back(&self, written: &[(Collection, Option<String>)]) {
        for (collection, previous) in written.iter().rev() {
            if let Err(e) = self.write_raw(*collection, previous.as_deref()) {
                warn!(%collection, error = %e, "Failed to restore collection after import error");
            }
        }
    }
}
