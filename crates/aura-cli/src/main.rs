//! Bible Aura CLI
//!
//! Command-line interface for the Bible Aura offline store: sermons,
//! journal entries and AI chat conversations.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use aura_core::{ChatMode, Collection, Config, Store};

mod commands;
mod editor;
mod logging;
mod output;

use commands::records::{parse_mode, SearchArgs};
use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "aura")]
#[command(about = "Bible Aura - offline sermons, journals and study chats")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show storage usage and sync status
    Status,
    /// List records in a collection
    #[command(alias = "ls")]
    List {
        /// sermons, journals or chats
        collection: Collection,
    },
    /// Search a collection
    Search {
        /// sermons, journals or chats
        collection: Collection,
        /// Case-insensitive text to look for
        query: Option<String>,
        /// Exact category (sermons, journals)
        #[arg(long)]
        category: Option<String>,
        /// Exact speaker (sermons)
        #[arg(long)]
        speaker: Option<String>,
        /// Exact mood (journals)
        #[arg(long)]
        mood: Option<String>,
        /// Study mode (chats)
        #[arg(long, value_parser = parse_mode)]
        mode: Option<ChatMode>,
        /// Required tag (repeatable; all must match)
        #[arg(short, long)]
        tag: Vec<String>,
    },
    /// Show the oldest records in a collection
    Oldest {
        /// sermons, journals or chats
        collection: Collection,
        /// How many records to show
        #[arg(short = 'n', long, default_value_t = 10)]
        count: usize,
    },
    /// Insert or replace records from JSON (a file, or - for stdin)
    Put {
        /// sermons, journals or chats
        collection: Collection,
        /// JSON file holding one record or an array of records
        source: String,
    },
    /// Write a new journal entry
    Journal {
        /// Entry title
        title: String,
        /// Entry body (opens editor if not provided)
        #[arg(short, long)]
        body: Option<String>,
        /// Tags to add
        #[arg(short, long)]
        tag: Vec<String>,
        /// Category (defaults to personal)
        #[arg(short, long)]
        category: Option<String>,
    },
    /// Delete a record from a collection
    #[command(alias = "rm")]
    Delete {
        /// sermons, journals or chats
        collection: Collection,
        /// Record ID
        id: String,
    },
    /// Delete an ID from every collection
    Forget {
        /// Record ID
        id: String,
    },
    /// Remove every record in a collection (all collections when omitted)
    Clear {
        /// sermons, journals or chats
        collection: Option<Collection>,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Export a backup of every collection
    Export {
        /// Output file (- for stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Replace collections from a backup file
    Import {
        /// Backup file
        path: PathBuf,
    },
    /// Show records that failed validation
    Quarantine {
        /// sermons, journals or chats
        collection: Collection,
        /// Discard the quarantined records instead of showing them
        #[arg(long)]
        clear: bool,
    },
    /// Mark a collection as synced
    Synced {
        /// sermons, journals or chats
        collection: Collection,
    },
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, backend, capacity_bytes, low_water_bytes, log_level, log_file)
        key: String,
        /// Configuration value
        value: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));

    // Config commands must work even when the store cannot be opened
    if let Commands::Config { command } = &cli.command {
        return handle_config_command(command.clone(), &output);
    }

    let config = Config::load().context("Failed to load configuration")?;
    logging::init(&config);

    let store = Store::open_with_config(&config)?;

    match cli.command {
        Commands::Status => commands::status::show(&store, &config, &output),
        Commands::List { collection } => commands::records::list(&store, collection, &output),
        Commands::Search {
            collection,
            query,
            category,
            speaker,
            mood,
            mode,
            tag,
        } => {
            let args = SearchArgs {
                query,
                category,
                speaker,
                mood,
                mode,
                tags: tag,
            };
            commands::records::search(&store, collection, args, &output)
        }
        Commands::Oldest { collection, count } => {
            commands::records::oldest(&store, collection, count, &output)
        }
        Commands::Put { collection, source } => {
            commands::records::put(&store, collection, &source, &output)
        }
        Commands::Journal {
            title,
            body,
            tag,
            category,
        } => commands::records::journal(&store, title, body, tag, category, &output),
        Commands::Delete { collection, id } => {
            commands::records::delete(&store, collection, id, &output)
        }
        Commands::Forget { id } => commands::records::forget(&store, id, &output),
        Commands::Clear { collection, yes } => {
            commands::records::clear(&store, collection, yes, &output)
        }
        Commands::Export { output: path } => commands::backup::export(&store, path, &output),
        Commands::Import { path } => commands::backup::import(&store, path, &output),
        Commands::Quarantine { collection, clear } => {
            commands::records::quarantine(&store, collection, clear, &output)
        }
        Commands::Synced { collection } => {
            commands::status::mark_synced(&store, collection, &output)
        }
        Commands::Config { .. } => unreachable!(), // Handled above
    }
}

fn handle_config_command(command: Option<ConfigCommands>, output: &Output) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::show(output),
        Some(ConfigCommands::Set { key, value }) => commands::config::set(key, value, output),
    }
}
