//! Backup command handlers

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Local;

use aura_core::{backup_file_name, Collection, Store};

use crate::output::{Output, OutputFormat};

/// Write a backup of every collection
///
/// Without `--output` the file is named after today's date in the current
/// directory; `-` writes to stdout.
pub fn export(store: &Store, path: Option<PathBuf>, output: &Output) -> Result<()> {
    let text = store.export().context("Failed to export backup")?;

    let path = path.unwrap_or_else(|| PathBuf::from(backup_file_name(Local::now().date_naive())));
    if path.as_os_str() == "-" {
        println!("{}", text);
        return Ok(());
    }

    std::fs::write(&path, &text)
        .with_context(|| format!("Failed to write backup: {}", path.display()))?;

    match output.format {
        OutputFormat::Quiet => println!("{}", path.display()),
        _ => output.success(&format!("Exported backup to {}", path.display())),
    }
    Ok(())
}

/// Replace collections from a backup file
pub fn import(store: &Store, path: PathBuf, output: &Output) -> Result<()> {
    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read backup: {}", path.display()))?;

    let summary = match store.import(&text) {
        Ok(summary) => summary,
        Err(e) => {
            if let Some(hint) = e.recovery_suggestion() {
                output.warning(hint);
            }
            return Err(e).context("Failed to import backup");
        }
    };

    match output.format {
        OutputFormat::Json => output.print_json(&summary),
        OutputFormat::Quiet => println!("{}", summary.total()),
        OutputFormat::Human => {
            for collection in Collection::ALL {
                match summary.get(collection) {
                    Some(count) => println!("  {:<9} {} record(s)", collection.name(), count),
                    None => println!("  {:<9} unchanged", collection.name()),
                }
            }
            output.success(&format!("Imported {} record(s)", summary.total()));
        }
    }
    Ok(())
}
