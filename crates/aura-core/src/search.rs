//! Collection search
//!
//! Stateless filtering over a collection's record list: a case-insensitive
//! substring query over each kind's text fields, plus exact-match filters.
//! Results are ordered newest first by the kind's recency timestamp.
//!
//! Every filter only removes records, so narrowing a query (longer
//! substring, more filters, more required tags) never grows the result set.

use crate::collection::Record;
use crate::models::{ChatConversation, ChatMode, JournalEntry, Sermon};

/// A record kind that supports text and filter queries
pub trait Searchable: Record {
    /// Structured filter for this kind
    type Filter: Default;

    /// Whether any designated text field contains `needle` (already lowercase)
    fn matches_text(&self, needle: &str) -> bool;

    /// Whether every provided filter passes
    fn matches_filter(&self, filter: &Self::Filter) -> bool;
}

/// Filter sermons by exact category, speaker, and required tags
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SermonFilter {
    pub category: Option<String>,
    pub speaker: Option<String>,
    pub tags: Vec<String>,
}

/// Filter journal entries by exact category, mood, and required tags
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JournalFilter {
    pub category: Option<String>,
    pub mood: Option<String>,
    pub tags: Vec<String>,
}

/// Filter conversations by mode and required tags
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatFilter {
    pub mode: Option<ChatMode>,
    pub tags: Vec<String>,
}

/// Run a query over `records`
///
/// An empty `query` matches every record. Sorting is stable, so records with
/// equal timestamps keep their storage order.
pub fn search<R: Searchable>(records: Vec<R>, query: &str, filter: &R::Filter) -> Vec<R> {
    let needle = query.to_lowercase();

    let mut hits: Vec<R> = records
        .into_iter()
        .filter(|r| (needle.is_empty() || r.matches_text(&needle)) && r.matches_filter(filter))
        .collect();

    hits.sort_by(|a, b| b.recency().cmp(&a.recency()));
    hits
}

fn contains(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

fn any_tag_contains(tags: &[String], needle: &str) -> bool {
    tags.iter().any(|t| contains(t, needle))
}

fn has_all_tags(tags: &[String], required: &[String]) -> bool {
    required.iter().all(|t| tags.contains(t))
}

fn equals(wanted: &Option<String>, actual: &str) -> bool {
    wanted.as_deref().map_or(true, |w| w == actual)
}

impl Searchable for Sermon {
    type Filter = SermonFilter;

    fn matches_text(&self, needle: &str) -> bool {
        contains(&self.title, needle)
            || contains(&self.speaker, needle)
            || contains(&self.description, needle)
            || any_tag_contains(&self.tags, needle)
    }

    fn matches_filter(&self, filter: &SermonFilter) -> bool {
        equals(&filter.category, &self.category)
            && equals(&filter.speaker, &self.speaker)
            && has_all_tags(&self.tags, &filter.tags)
    }
}

impl Searchable for JournalEntry {
    type Filter = JournalFilter;

    fn matches_text(&self, needle: &str) -> bool {
        contains(&self.title, needle)
            || contains(&self.content, needle)
            || any_tag_contains(&self.tags, needle)
    }

    fn matches_filter(&self, filter: &JournalFilter) -> bool {
        let mood_matches = match (&filter.mood, &self.mood) {
            (None, _) => true,
            (Some(wanted), Some(mood)) => wanted == mood,
            (Some(_), None) => false,
        };

        equals(&filter.category, &self.category)
            && mood_matches
            && has_all_tags(&self.tags, &filter.tags)
    }
}

impl Searchable for ChatConversation {
    type Filter = ChatFilter;

    fn matches_text(&self, needle: &str) -> bool {
        contains(&self.title, needle)
            || self
                .verse_reference
                .as_deref()
                .is_some_and(|v| contains(v, needle))
            || self.messages.iter().any(|m| contains(&m.content, needle))
            || any_tag_contains(&self.tags, needle)
    }

    fn matches_filter(&self, filter: &ChatFilter) -> bool {
        filter.mode.map_or(true, |m| m == self.mode) && has_all_tags(&self.tags, &filter.tags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MessageRole;
    use chrono::{Duration, Utc};

    fn sermon(id: &str, title: &str, speaker: &str, hours_ago: i64) -> Sermon {
        let mut s = Sermon::with_id(id, title, speaker);
        s.downloaded_at = Utc::now() - Duration::hours(hours_ago);
        s
    }

    fn sermons() -> Vec<Sermon> {
        let mut a = sermon("a", "Grace Abounds", "Paul Washer", 3);
        a.category = "grace".to_string();
        a.tags = vec!["romans".to_string(), "faith".to_string()];

        let mut b = sermon("b", "The Prodigal Son", "Tim Keller", 1);
        b.category = "parables".to_string();
        b.description = "A story of amazing grace".to_string();
        b.tags = vec!["luke".to_string()];

        let mut c = sermon("c", "Faith and Works", "Paul Washer", 2);
        c.category = "grace".to_string();
        c.tags = vec!["james".to_string(), "faith".to_string()];

        vec![a, b, c]
    }

    fn ids<R: Record>(records: &[R]) -> Vec<&str> {
        records.iter().map(|r| r.id()).collect()
    }

    #[test]
    fn test_empty_query_returns_all_newest_first() {
        let results = search(sermons(), "", &SermonFilter::default());
        assert_eq!(ids(&results), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_query_is_case_insensitive_across_fields() {
        // title of a, description of b
        let results = search(sermons(), "GRACE", &SermonFilter::default());
        assert_eq!(ids(&results), vec!["b", "a"]);

        // speaker
        let results = search(sermons(), "keller", &SermonFilter::default());
        assert_eq!(ids(&results), vec!["b"]);

        // tag substring
        let results = search(sermons(), "jam", &SermonFilter::default());
        assert_eq!(ids(&results), vec!["c"]);
    }

    #[test]
    fn test_filters_combine() {
        let filter = SermonFilter {
            category: Some("grace".to_string()),
            speaker: Some("Paul Washer".to_string()),
            tags: vec!["faith".to_string()],
        };
        let results = search(sermons(), "", &filter);
        assert_eq!(ids(&results), vec!["c", "a"]);

        let filter = SermonFilter {
            tags: vec!["faith".to_string(), "james".to_string()],
            ..Default::default()
        };
        assert_eq!(ids(&search(sermons(), "", &filter)), vec!["c"]);
    }

    #[test]
    fn test_narrowing_never_grows_results() {
        let base = search(sermons(), "a", &SermonFilter::default());
        let longer = search(sermons(), "ace", &SermonFilter::default());
        let filtered = search(
            sermons(),
            "ace",
            &SermonFilter {
                category: Some("grace".to_string()),
                ..Default::default()
            },
        );
        let tagged = search(
            sermons(),
            "ace",
            &SermonFilter {
                category: Some("grace".to_string()),
                tags: vec!["faith".to_string(), "romans".to_string()],
                ..Default::default()
            },
        );

        for (narrow, wide) in [(&longer, &base), (&filtered, &longer), (&tagged, &filtered)] {
            assert!(narrow.len() <= wide.len());
            assert!(ids(narrow).iter().all(|id| ids(wide).contains(id)));
        }
        assert_eq!(ids(&tagged), vec!["a"]);
    }

    #[test]
    fn test_journal_search() {
        let mut morning = JournalEntry::with_id("m", "Morning");
        morning.content = "Be still and know".to_string();
        morning.mood = Some("peaceful".to_string());
        morning.created_at = Utc::now() - Duration::days(1);

        let mut evening = JournalEntry::with_id("e", "Evening prayer");
        evening.content = "Thankful for today".to_string();
        evening.tags = vec!["gratitude".to_string()];

        let entries = vec![morning, evening];

        let results = search(entries.clone(), "still", &JournalFilter::default());
        assert_eq!(ids(&results), vec!["m"]);

        let results = search(entries.clone(), "", &JournalFilter::default());
        assert_eq!(ids(&results), vec!["e", "m"]);

        let filter = JournalFilter {
            mood: Some("peaceful".to_string()),
            ..Default::default()
        };
        assert_eq!(ids(&search(entries.clone(), "", &filter)), vec!["m"]);

        let filter = JournalFilter {
            category: Some("work".to_string()),
            ..Default::default()
        };
        assert!(search(entries, "", &filter).is_empty());
    }

    #[test]
    fn test_chat_search_covers_messages_and_verse() {
        let mut older = ChatConversation::with_id("old", "Sermon on the Mount", ChatMode::Theological);
        older.verse_reference = Some("Matthew 5:3".to_string());
        older.updated_at = Utc::now() - Duration::hours(5);

        let mut newer = ChatConversation::with_id("new", "Exile", ChatMode::Historical);
        newer.push_message(MessageRole::Ai, "Babylon conquered Jerusalem in 586 BC");

        let chats = vec![older, newer];

        assert_eq!(ids(&search(chats.clone(), "matthew", &ChatFilter::default())), vec!["old"]);
        assert_eq!(ids(&search(chats.clone(), "babylon", &ChatFilter::default())), vec!["new"]);
        assert_eq!(ids(&search(chats.clone(), "", &ChatFilter::default())), vec!["new", "old"]);

        let filter = ChatFilter {
            mode: Some(ChatMode::Theological),
            ..Default::default()
        };
        assert_eq!(ids(&search(chats, "", &filter)), vec!["old"]);
    }

    #[test]
    fn test_equal_timestamps_keep_storage_order() {
        let now = Utc::now();
        let records: Vec<Sermon> = ["x", "y", "z"]
            .iter()
            .map(|id| {
                let mut s = Sermon::with_id(*id, "Same", "Speaker");
                s.downloaded_at = now;
                s
            })
            .collect();

        assert_eq!(ids(&search(records, "same", &SermonFilter::default())), vec!["x", "y", "z"]);
    }
}
