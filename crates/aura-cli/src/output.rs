//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use serde::Serialize;

use aura_core::{ChatConversation, JournalEntry, Record, Sermon};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// One-line human summary of a stored record
pub trait Summary: Record {
    /// Noun used in counts, e.g. "sermon(s)"
    const NOUN: &'static str;

    fn summary(&self) -> String;
}

impl Summary for Sermon {
    const NOUN: &'static str = "sermon(s)";

    fn summary(&self) -> String {
        format!(
            "{} | {} | {} | {}",
            short_id(&self.id),
            truncate(&self.title, 35),
            truncate(&self.speaker, 20),
            self.downloaded_at.format("%Y-%m-%d")
        )
    }
}

impl Summary for JournalEntry {
    const NOUN: &'static str = "entry(ies)";

    fn summary(&self) -> String {
        let pinned = if self.is_pinned { " *" } else { "" };
        format!(
            "{} | {} | {}{} | {}",
            short_id(&self.id),
            self.entry_date,
            truncate(&self.title, 35),
            pinned,
            truncate_line(&self.content, 40)
        )
    }
}

impl Summary for ChatConversation {
    const NOUN: &'static str = "conversation(s)";

    fn summary(&self) -> String {
        format!(
            "{} | {} | {} [{}] | {}",
            short_id(&self.id),
            self.updated_at.format("%Y-%m-%d %H:%M"),
            truncate(&self.title, 35),
            self.messages.len(),
            self.mode.as_str()
        )
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Check if output is in quiet mode
    pub fn is_quiet(&self) -> bool {
        matches!(self.format, OutputFormat::Quiet)
    }

    /// Print a list of records
    pub fn print_records<R: Summary>(&self, records: &[R]) {
        match self.format {
            OutputFormat::Human => {
                if records.is_empty() {
                    println!("No {} found.", R::COLLECTION);
                    return;
                }
                for record in records {
                    println!("{}", record.summary());
                }
                println!("\n{} {}", records.len(), R::NOUN);
            }
            OutputFormat::Json => self.print_json(records),
            OutputFormat::Quiet => {
                for record in records {
                    println!("{}", record.id());
                }
            }
        }
    }

    /// Print any serializable value as pretty JSON
    pub fn print_json<T: Serialize + ?Sized>(&self, value: &T) {
        match serde_json::to_string_pretty(value) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("Failed to format output: {}", e),
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print a warning to stderr (suppressed in quiet mode)
    pub fn warning(&self, message: &str) {
        if !self.is_quiet() {
            eprintln!("⚠ {}", message);
        }
    }

    /// Check if we should prompt for confirmation
    pub fn should_prompt(&self) -> bool {
        self.format == OutputFormat::Human
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }
}

/// First 8 characters of an id
pub fn short_id(id: &str) -> &str {
    match id.char_indices().nth(8) {
        Some((end, _)) => &id[..end],
        None => id,
    }
}

/// Truncate a string to max characters, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Truncate to first line and max length
fn truncate_line(s: &str, max_len: usize) -> String {
    let first_line = s.lines().next().unwrap_or("");
    truncate(first_line, max_len)
}
