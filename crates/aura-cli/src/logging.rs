//! Logging setup
//!
//! Level comes from `AURA_LOG` or the config file's `log_level` (default
//! `warn`). Logs go to stderr, or to `log_file` when one is configured.

use std::fs::OpenOptions;
use std::sync::Mutex;

use tracing::debug;
use tracing_subscriber::EnvFilter;

use aura_core::Config;

const DEFAULT_LEVEL: &str = "warn";

/// Filter directive covering the library and the CLI
fn filter_directive(level: &str) -> String {
    format!("aura_core={},aura_cli={}", level, level)
}

/// Install the global subscriber; later calls are ignored
pub fn init(config: &Config) {
    let level = config.log_level.as_deref().unwrap_or(DEFAULT_LEVEL);
    let env_filter = EnvFilter::new(filter_directive(level));

    let Some(log_path) = &config.log_file else {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init();
        return;
    };

    let file = match OpenOptions::new().create(true).append(true).open(log_path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Warning: Could not open log file {:?}: {}", log_path, e);
            return;
        }
    };

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init();

    debug!("Logging to {:?}", log_path);
}
