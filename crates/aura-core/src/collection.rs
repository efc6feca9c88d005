//! Collections and the record contract
//!
//! Every record kind lives in exactly one collection, persisted as a single
//! JSON array under a fixed key of the backend.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// One of the three logical collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Sermons,
    Journals,
    Chats,
}

impl Collection {
    /// All collections, in lock-acquisition order
    pub const ALL: [Collection; 3] = [Collection::Sermons, Collection::Journals, Collection::Chats];

    /// Backend key holding the collection payload
    pub fn storage_key(self) -> &'static str {
        match self {
            Collection::Sermons => "bible_aura_sermons",
            Collection::Journals => "bible_aura_journals",
            Collection::Chats => "bible_aura_chats",
        }
    }

    /// Backend key holding records that failed validation
    pub fn quarantine_key(self) -> String {
        format!("{}_quarantine", self.storage_key())
    }

    /// Short name, also used in snapshots and sync status
    pub fn name(self) -> &'static str {
        match self {
            Collection::Sermons => "sermons",
            Collection::Journals => "journals",
            Collection::Chats => "chats",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Collection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sermon" | "sermons" => Ok(Collection::Sermons),
            "journal" | "journals" | "entry" | "entries" => Ok(Collection::Journals),
            "chat" | "chats" | "conversation" | "conversations" => Ok(Collection::Chats),
            other => Err(format!(
                "Unknown collection '{}' (expected sermons, journals or chats)",
                other
            )),
        }
    }
}

/// A record kind that can be stored in a collection
///
/// `stamp` is applied by the store on every write. Implementations must keep
/// the creation marker of `previous` (when present) and set any update
/// timestamp to `now`.
pub trait Record: Clone + Serialize + DeserializeOwned + Send {
    /// The collection this kind is stored in
    const COLLECTION: Collection;

    /// Identity, unique within the collection
    fn id(&self) -> &str;

    /// Creation marker, set once at first insertion
    fn created(&self) -> DateTime<Utc>;

    /// Timestamp used for recency ordering in search results
    fn recency(&self) -> DateTime<Utc> {
        self.created()
    }

    /// Prepare the record for a write at `now`
    fn stamp(&mut self, previous: Option<&Self>, now: DateTime<Utc>);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_keys_are_distinct() {
        let keys: Vec<_> = Collection::ALL.iter().map(|c| c.storage_key()).collect();
        assert_eq!(keys, vec!["bible_aura_sermons", "bible_aura_journals", "bible_aura_chats"]);
        assert_eq!(Collection::Chats.quarantine_key(), "bible_aura_chats_quarantine");
    }

    #[test]
    fn test_parse_collection_aliases() {
        assert_eq!("sermon".parse::<Collection>().unwrap(), Collection::Sermons);
        assert_eq!("Journals".parse::<Collection>().unwrap(), Collection::Journals);
        assert_eq!("conversations".parse::<Collection>().unwrap(), Collection::Chats);
        assert!("notes".parse::<Collection>().is_err());
    }

    #[test]
    fn test_display_matches_name() {
        for collection in Collection::ALL {
            assert_eq!(collection.to_string(), collection.name());
        }
    }
}
