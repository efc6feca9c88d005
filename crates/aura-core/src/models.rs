//! Data models for Bible Aura
//!
//! Defines the stored record kinds: Sermon, JournalEntry and
//! ChatConversation (with its ChatMessage transcript).
//!
//! Field names on the wire follow the app's document format: sermons use
//! camelCase keys, journal entries and conversations use snake_case keys.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::collection::{Collection, Record};

/// Average reading speed used for journal reading-time estimates
const WORDS_PER_MINUTE: usize = 200;

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn add_unique_tag(tags: &mut Vec<String>, tag: String) -> bool {
    if tags.contains(&tag) {
        return false;
    }
    tags.push(tag);
    true
}

/// Downloaded audio sermon metadata
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Sermon {
    /// Unique identifier
    pub id: String,
    pub title: String,
    pub speaker: String,
    pub description: String,
    /// Duration label, e.g. "45:12"
    pub duration: String,
    /// Scheduled or preached date label
    pub date: String,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series: Option<String>,
    pub scripture_ref: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
    /// Base64-encoded audio kept for offline playback
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_blob: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// When the sermon was first stored on this device
    pub downloaded_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_played: Option<DateTime<Utc>>,
    /// Last playback position in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub play_position: Option<f64>,
    /// Free-text user notes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub is_favorite: bool,
    /// Size of the downloaded audio in bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
}

impl Sermon {
    /// Create a new sermon with the given title and speaker
    pub fn new(title: impl Into<String>, speaker: impl Into<String>) -> Self {
        Self::with_id(new_id(), title, speaker)
    }

    /// Create a sermon with a specific ID
    pub fn with_id(
        id: impl Into<String>,
        title: impl Into<String>,
        speaker: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            speaker: speaker.into(),
            description: String::new(),
            duration: String::new(),
            date: String::new(),
            category: String::new(),
            series: None,
            scripture_ref: String::new(),
            audio_url: None,
            audio_blob: None,
            transcript: None,
            tags: Vec::new(),
            downloaded_at: Utc::now(),
            last_played: None,
            play_position: None,
            notes: None,
            is_favorite: false,
            file_size: None,
        }
    }

    /// Record a playback position
    pub fn mark_played(&mut self, position_secs: f64) {
        self.last_played = Some(Utc::now());
        self.play_position = Some(position_secs);
    }

    pub fn add_tag(&mut self, tag: impl Into<String>) {
        add_unique_tag(&mut self.tags, tag.into());
    }
}

impl Record for Sermon {
    const COLLECTION: Collection = Collection::Sermons;

    fn id(&self) -> &str {
        &self.id
    }

    fn created(&self) -> DateTime<Utc> {
        self.downloaded_at
    }

    fn stamp(&mut self, previous: Option<&Self>, _now: DateTime<Utc>) {
        if let Some(previous) = previous {
            self.downloaded_at = previous.downloaded_at;
        }
    }
}

/// Interface language of a journal entry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    English,
    Tamil,
    Sinhala,
}

/// A personal journal entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JournalEntry {
    /// Unique identifier
    pub id: String,
    pub title: String,
    /// Entry body
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spiritual_state: Option<String>,
    /// Primary verse reference, e.g. "Psalm 46:10"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verse_reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verse_text: Option<String>,
    #[serde(default)]
    pub verse_references: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_private: bool,
    /// Date the entry is about, e.g. "2024-03-01"
    pub entry_date: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub word_count: usize,
    /// Estimated reading time in minutes
    #[serde(default)]
    pub reading_time: usize,
    #[serde(default)]
    pub language: Language,
    pub category: String,
    #[serde(default)]
    pub is_pinned: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_used: Option<String>,
    /// Base64-encoded images
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather: Option<String>,
}

impl JournalEntry {
    /// Create a new, empty entry dated today
    pub fn new(title: impl Into<String>) -> Self {
        Self::with_id(new_id(), title)
    }

    /// Create an entry with a specific ID
    pub fn with_id(id: impl Into<String>, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            title: title.into(),
            content: String::new(),
            mood: None,
            spiritual_state: None,
            verse_reference: None,
            verse_text: None,
            verse_references: Vec::new(),
            tags: Vec::new(),
            is_private: false,
            entry_date: now.format("%Y-%m-%d").to_string(),
            created_at: now,
            updated_at: now,
            word_count: 0,
            reading_time: 0,
            language: Language::default(),
            category: "personal".to_string(),
            is_pinned: false,
            template_used: None,
            attachments: None,
            location: None,
            weather: None,
        }
    }

    /// Replace the body and refresh the derived counts
    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
        self.refresh_counts();
        self.updated_at = Utc::now();
    }

    pub fn add_tag(&mut self, tag: impl Into<String>) {
        if add_unique_tag(&mut self.tags, tag.into()) {
            self.updated_at = Utc::now();
        }
    }

    pub fn remove_tag(&mut self, tag: &str) {
        if let Some(pos) = self.tags.iter().position(|t| t == tag) {
            self.tags.remove(pos);
            self.updated_at = Utc::now();
        }
    }

    fn refresh_counts(&mut self) {
        self.word_count = self.content.split_whitespace().count();
        self.reading_time = self.word_count.div_ceil(WORDS_PER_MINUTE);
    }
}

impl Record for JournalEntry {
    const COLLECTION: Collection = Collection::Journals;

    fn id(&self) -> &str {
        &self.id
    }

    fn created(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn stamp(&mut self, previous: Option<&Self>, now: DateTime<Utc>) {
        if let Some(previous) = previous {
            self.created_at = previous.created_at;
        }
        self.updated_at = now;
        self.refresh_counts();
    }
}

/// Study mode of an AI conversation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChatMode {
    #[default]
    Theological,
    Historical,
    CrossReference,
    Insights,
}

impl ChatMode {
    /// Wire name, as stored on conversations and their messages
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatMode::Theological => "theological",
            ChatMode::Historical => "historical",
            ChatMode::CrossReference => "cross-reference",
            ChatMode::Insights => "insights",
        }
    }
}

/// Who sent a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Ai,
}

/// One message of a conversation transcript
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub id: String,
    #[serde(rename = "type")]
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    /// Mode the message was sent in; kept as written, so modes this build
    /// does not know still load
    pub mode: String,
}

/// A stored AI chat conversation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatConversation {
    /// Unique identifier
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verse_reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verse_text: Option<String>,
    pub mode: ChatMode,
    /// Transcript in send order
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default)]
    pub is_archived: bool,
    pub category: String,
}

impl ChatConversation {
    /// Create an empty conversation in the given mode
    pub fn new(title: impl Into<String>, mode: ChatMode) -> Self {
        Self::with_id(new_id(), title, mode)
    }

    /// Create a conversation with a specific ID
    pub fn with_id(id: impl Into<String>, title: impl Into<String>, mode: ChatMode) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            title: title.into(),
            verse_reference: None,
            verse_text: None,
            mode,
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
            tags: Vec::new(),
            is_favorite: false,
            is_archived: false,
            category: "general".to_string(),
        }
    }

    /// Append a message in the conversation's current mode
    pub fn push_message(&mut self, role: MessageRole, content: impl Into<String>) -> &ChatMessage {
        let now = Utc::now();
        self.messages.push(ChatMessage {
            id: new_id(),
            role,
            content: content.into(),
            timestamp: now,
            mode: self.mode.as_str().to_string(),
        });
        self.updated_at = now;
        &self.messages[self.messages.len() - 1]
    }

    pub fn add_tag(&mut self, tag: impl Into<String>) {
        if add_unique_tag(&mut self.tags, tag.into()) {
            self.updated_at = Utc::now();
        }
    }
}

impl Record for ChatConversation {
    const COLLECTION: Collection = Collection::Chats;

    fn id(&self) -> &str {
        &self.id
    }

    fn created(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn recency(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn stamp(&mut self, previous: Option<&Self>, now: DateTime<Utc>) {
        if let Some(previous) = previous {
            self.created_at = previous.created_at;
        }
        self.updated_at = now;
    }
}
