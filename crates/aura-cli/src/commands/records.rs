//! Record command handlers
//!
//! Listing, searching, upserting and deleting records in any collection.

use std::io::Read;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde_json::Value;

use aura_core::{
    ChatConversation, ChatFilter, ChatMode, Collection, JournalEntry, JournalFilter, Record,
    Sermon, SermonFilter, Store,
};

use crate::editor::{confirm, edit_text, strip_comments};
use crate::output::{Output, OutputFormat};

/// Query and filter flags for `aura search`
#[derive(Debug, Default)]
pub struct SearchArgs {
    pub query: Option<String>,
    pub category: Option<String>,
    pub speaker: Option<String>,
    pub mood: Option<String>,
    pub mode: Option<ChatMode>,
    pub tags: Vec<String>,
}

impl SearchArgs {
    fn sermon_filter(&self) -> Result<SermonFilter> {
        self.reject(self.mood.is_some(), "--mood", Collection::Sermons)?;
        self.reject(self.mode.is_some(), "--mode", Collection::Sermons)?;
        Ok(SermonFilter {
            category: self.category.clone(),
            speaker: self.speaker.clone(),
            tags: self.tags.clone(),
        })
    }

    fn journal_filter(&self) -> Result<JournalFilter> {
        self.reject(self.speaker.is_some(), "--speaker", Collection::Journals)?;
        self.reject(self.mode.is_some(), "--mode", Collection::Journals)?;
        Ok(JournalFilter {
            category: self.category.clone(),
            mood: self.mood.clone(),
            tags: self.tags.clone(),
        })
    }

    fn chat_filter(&self) -> Result<ChatFilter> {
        self.reject(self.category.is_some(), "--category", Collection::Chats)?;
        self.reject(self.speaker.is_some(), "--speaker", Collection::Chats)?;
        self.reject(self.mood.is_some(), "--mood", Collection::Chats)?;
        Ok(ChatFilter {
            mode: self.mode,
            tags: self.tags.clone(),
        })
    }

    fn reject(&self, present: bool, flag: &str, collection: Collection) -> Result<()> {
        if present {
            bail!("{} does not apply to {}", flag, collection);
        }
        Ok(())
    }
}

/// Parse a chat mode flag value, e.g. `cross-reference`
pub fn parse_mode(s: &str) -> std::result::Result<ChatMode, String> {
    serde_json::from_value(Value::String(s.to_ascii_lowercase())).map_err(|_| {
        format!(
            "Unknown mode '{}' (expected theological, historical, cross-reference or insights)",
            s
        )
    })
}

/// List all records in a collection
pub fn list(store: &Store, collection: Collection, output: &Output) -> Result<()> {
    match collection {
        Collection::Sermons => output.print_records(&store.list::<Sermon>()),
        Collection::Journals => output.print_records(&store.list::<JournalEntry>()),
        Collection::Chats => output.print_records(&store.list::<ChatConversation>()),
    }
    Ok(())
}

/// Search a collection
pub fn search(
    store: &Store,
    collection: Collection,
    args: SearchArgs,
    output: &Output,
) -> Result<()> {
    let query = args.query.as_deref().unwrap_or("");
    match collection {
        Collection::Sermons => {
            output.print_records(&store.search::<Sermon>(query, &args.sermon_filter()?))
        }
        Collection::Journals => {
            output.print_records(&store.search::<JournalEntry>(query, &args.journal_filter()?))
        }
        Collection::Chats => {
            output.print_records(&store.search::<ChatConversation>(query, &args.chat_filter()?))
        }
    }
    Ok(())
}

/// Show the oldest records of a collection, oldest first
pub fn oldest(store: &Store, collection: Collection, count: usize, output: &Output) -> Result<()> {
    match collection {
        Collection::Sermons => output.print_records(&store.oldest::<Sermon>(count)),
        Collection::Journals => output.print_records(&store.oldest::<JournalEntry>(count)),
        Collection::Chats => output.print_records(&store.oldest::<ChatConversation>(count)),
    }
    Ok(())
}

/// Upsert records from a JSON file, or stdin when `source` is `-`
pub fn put(store: &Store, collection: Collection, source: &str, output: &Output) -> Result<()> {
    let text = if source == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read stdin")?;
        text
    } else {
        std::fs::read_to_string(Path::new(source))
            .with_context(|| format!("Failed to read {}", source))?
    };

    let saved = match collection {
        Collection::Sermons => put_records::<Sermon>(store, &text)?,
        Collection::Journals => put_records::<JournalEntry>(store, &text)?,
        Collection::Chats => put_records::<ChatConversation>(store, &text)?,
    };

    match output.format {
        OutputFormat::Quiet => {
            for id in &saved {
                println!("{}", id);
            }
        }
        _ => output.success(&format!("Saved {} record(s) to {}", saved.len(), collection)),
    }
    Ok(())
}

/// Validate every record first, then save each; returns the saved ids
fn put_records<R: Record>(store: &Store, text: &str) -> Result<Vec<String>> {
    let records = parse_records::<R>(text)?;

    let mut saved = Vec::with_capacity(records.len());
    for record in &records {
        let stored = store
            .save(record)
            .with_context(|| format!("Failed to save record {}", record.id()))?;
        saved.push(stored.id().to_string());
    }
    Ok(saved)
}

/// Parse one record or an array of records
fn parse_records<R: Record>(text: &str) -> Result<Vec<R>> {
    let value: Value = serde_json::from_str(text).context("Input is not valid JSON")?;
    let values = match value {
        Value::Array(values) => values,
        single => vec![single],
    };

    values
        .into_iter()
        .enumerate()
        .map(|(i, v)| {
            serde_json::from_value(v).with_context(|| {
                format!("Record {} is not a valid {} record", i + 1, R::COLLECTION)
            })
        })
        .collect()
}

/// Create a journal entry
pub fn journal(
    store: &Store,
    title: String,
    body: Option<String>,
    tags: Vec<String>,
    category: Option<String>,
    output: &Output,
) -> Result<()> {
    let body = match body {
        Some(b) => b,
        None => {
            let initial = format!("<!-- New journal entry: {} -->\n\n", title);
            strip_comments(&edit_text(&initial).context("Failed to edit journal entry")?)
        }
    };

    if body.trim().is_empty() {
        bail!("Journal entry body cannot be empty");
    }

    let entry = new_entry(title, body, tags, category);
    let stored = store
        .save(&entry)
        .context("Failed to save journal entry")?;

    match output.format {
        OutputFormat::Json => output.print_json(&stored),
        OutputFormat::Quiet => println!("{}", stored.id),
        OutputFormat::Human => output.success(&format!(
            "Saved journal entry {} ({} words)",
            stored.id, stored.word_count
        )),
    }
    Ok(())
}

fn new_entry(
    title: String,
    body: String,
    tags: Vec<String>,
    category: Option<String>,
) -> JournalEntry {
    let mut entry = JournalEntry::new(title);
    entry.set_content(body);
    for tag in tags {
        entry.add_tag(tag);
    }
    if let Some(category) = category {
        entry.category = category;
    }
    entry
}

/// Delete a record from one collection
pub fn delete(store: &Store, collection: Collection, id: String, output: &Output) -> Result<()> {
    if store.delete_in(collection, &id)? {
        output.success(&format!("Deleted {} from {}", id, collection));
    } else {
        output.message(&format!("No record {} in {}", id, collection));
    }
    Ok(())
}

/// Delete an id from every collection
pub fn forget(store: &Store, id: String, output: &Output) -> Result<()> {
    let removed = store.delete_everywhere(&id)?;

    if removed.is_empty() {
        output.message(&format!("No record {} found", id));
    } else {
        let names: Vec<&str> = removed.iter().map(|c| c.name()).collect();
        output.success(&format!("Deleted {} from {}", id, names.join(", ")));
    }
    Ok(())
}

/// Empty one collection, or all of them
pub fn clear(
    store: &Store,
    collection: Option<Collection>,
    yes: bool,
    output: &Output,
) -> Result<()> {
    let target = collection
        .map(|c| c.to_string())
        .unwrap_or_else(|| "all collections".to_string());

    if !yes && output.should_prompt() {
        println!("This permanently removes every record in {}.", target);
        if !confirm("Are you sure?")? {
            println!("Cancelled.");
            return Ok(());
        }
    } else if !yes {
        bail!("Refusing to clear {} without --yes", target);
    }

    match collection {
        Some(c) => store.clear(c)?,
        None => store.clear_all()?,
    }

    output.success(&format!("Cleared {}", target));
    Ok(())
}

/// Show records that failed validation, or discard them with `--clear`
pub fn quarantine(
    store: &Store,
    collection: Collection,
    clear: bool,
    output: &Output,
) -> Result<()> {
    let held = store.quarantined(collection);

    if clear {
        store.clear_quarantine(collection)?;
        output.success(&format!(
            "Discarded {} quarantined record(s) from {}",
            held.len(),
            collection
        ));
        return Ok(());
    }

    match output.format {
        OutputFormat::Json => output.print_json(&held),
        OutputFormat::Quiet => println!("{}", held.len()),
        OutputFormat::Human => {
            if held.is_empty() {
                println!("No quarantined {}.", collection);
                return Ok(());
            }
            for value in &held {
                println!("{}", value);
            }
            println!("\n{} quarantined record(s)", held.len());
        }
    }
    Ok(())
}
