//! Status command handler

use anyhow::{Context, Result};

use aura_core::{format_size, Collection, Config, StorageHealth, Store};

use crate::output::{Output, OutputFormat};

/// Show storage usage and sync status
pub fn show(store: &Store, config: &Config, output: &Output) -> Result<()> {
    let stats = store.stats().context("Failed to measure storage")?;
    let quota = store.quota();
    let is_full = quota.is_full(&stats);
    let sync = store.sync_status();

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "backend": store.backend_name(),
                    "data_dir": config.data_dir,
                    "storage": stats,
                    "capacity": quota.capacity(),
                    "used_percentage": quota.used_percentage(&stats),
                    "health": quota.health(&stats),
                    "is_full": is_full,
                    "sync": sync
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", stats.total_size);
        }
        OutputFormat::Human => {
            println!("Bible Aura Storage");
            println!("==================");
            println!();
            println!("Backend:  {}", store.backend_name());
            println!("Location: {}", config.data_dir.display());
            println!();
            println!("Collections:");
            for (collection, s) in [
                (Collection::Sermons, stats.sermons),
                (Collection::Journals, stats.journals),
                (Collection::Chats, stats.chats),
            ] {
                println!(
                    "  {:<9} {:>5} record(s)  {:>10}",
                    collection.name(),
                    s.count,
                    format_size(s.total_size)
                );
            }
            println!();
            println!("Usage:");
            println!(
                "  Used:      {} of {} ({}%, {})",
                format_size(stats.total_size),
                format_size(quota.capacity()),
                quota.used_percentage(&stats),
                health_label(quota.health(&stats))
            );
            if stats.available >= 0 {
                println!("  Available: {}", format_size(stats.available as u64));
            } else {
                println!(
                    "  Available: none ({} over capacity)",
                    format_size(stats.available.unsigned_abs())
                );
            }
            println!();
            println!("Sync:");
            for collection in Collection::ALL {
                match sync.get(collection) {
                    Some(status) => println!(
                        "  {:<9} {} (modified {})",
                        collection.name(),
                        if status.needs_sync { "pending" } else { "synced" },
                        status.last_modified.format("%Y-%m-%d %H:%M")
                    ),
                    None => println!("  {:<9} never modified", collection.name()),
                }
            }
        }
    }

    if is_full {
        output.warning("Storage is nearly full. Export a backup and remove old records.");
    }

    Ok(())
}

/// Mark a collection as synced
pub fn mark_synced(store: &Store, collection: Collection, output: &Output) -> Result<()> {
    if store.mark_synced(collection)? {
        output.success(&format!("Marked {} as synced", collection));
    } else {
        output.message(&format!("{} has no local changes", collection));
    }
    Ok(())
}

fn health_label(health: StorageHealth) -> &'static str {
    match health {
        StorageHealth::Healthy => "healthy",
        StorageHealth::Warning => "warning",
        StorageHealth::Critical => "critical",
    }
}
