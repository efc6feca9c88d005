//! Sync status tracking
//!
//! Records, per collection, when it was last modified locally and whether
//! it has changes a remote sync has not picked up yet. The store updates
//! this on every mutation; the sync transport itself lives elsewhere.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::collection::Collection;

/// Backend key holding the sync status document
pub const SYNC_STATUS_KEY: &str = "bible_aura_sync_status";

/// Sync bookkeeping for one collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    pub last_modified: DateTime<Utc>,
    pub needs_sync: bool,
}

/// Sync status of every collection that has been modified
///
/// Serialized as a JSON object keyed by collection name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SyncTracker {
    entries: BTreeMap<String, SyncStatus>,
}

impl SyncTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a stored document; unreadable data starts a fresh tracker
    pub fn decode(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Self::default();
        };

        match serde_json::from_str(raw) {
            Ok(tracker) => tracker,
            Err(e) => {
                warn!(error = %e, "Discarding unreadable sync status");
                Self::default()
            }
        }
    }

    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Record a local modification at `now`
    pub fn mark_modified(&mut self, collection: Collection, now: DateTime<Utc>) {
        self.entries.insert(
            collection.name().to_string(),
            SyncStatus {
                last_modified: now,
                needs_sync: true,
            },
        );
    }

    /// Clear the dirty flag after a successful remote sync
    ///
    /// Returns false if the collection has never been modified.
    pub fn mark_synced(&mut self, collection: Collection) -> bool {
        match self.entries.get_mut(collection.name()) {
            Some(status) => {
                status.needs_sync = false;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, collection: Collection) -> Option<&SyncStatus> {
        self.entries.get(collection.name())
    }

    /// Collections with changes not yet synced
    pub fn pending(&self) -> Vec<Collection> {
        Collection::ALL
            .into_iter()
            .filter(|c| self.get(*c).is_some_and(|s| s.needs_sync))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_modified_sets_dirty() {
        let mut tracker = SyncTracker::new();
        assert!(tracker.get(Collection::Sermons).is_none());

        let now = Utc::now();
        tracker.mark_modified(Collection::Sermons, now);

        let status = tracker.get(Collection::Sermons).unwrap();
        assert_eq!(status.last_modified, now);
        assert!(status.needs_sync);
        assert_eq!(tracker.pending(), vec![Collection::Sermons]);
    }

    #[test]
    fn test_mark_synced() {
        let mut tracker = SyncTracker::new();
        assert!(!tracker.mark_synced(Collection::Chats));

        tracker.mark_modified(Collection::Chats, Utc::now());
        assert!(tracker.mark_synced(Collection::Chats));
        assert!(!tracker.get(Collection::Chats).unwrap().needs_sync);
        assert!(tracker.pending().is_empty());
    }

    #[test]
    fn test_wire_format() {
        let mut tracker = SyncTracker::new();
        tracker.mark_modified(Collection::Journals, Utc::now());

        let json: serde_json::Value = serde_json::from_str(&tracker.encode().unwrap()).unwrap();
        assert_eq!(json["journals"]["needsSync"], true);
        assert!(json["journals"]["lastModified"].is_string());
    }

    #[test]
    fn test_decode_roundtrip_and_corruption() {
        let mut tracker = SyncTracker::new();
        tracker.mark_modified(Collection::Sermons, Utc::now());
        let encoded = tracker.encode().unwrap();

        assert_eq!(SyncTracker::decode(Some(&encoded)), tracker);
        assert_eq!(SyncTracker::decode(None), SyncTracker::new());
        assert_eq!(SyncTracker::decode(Some("not json")), SyncTracker::new());
    }
}
