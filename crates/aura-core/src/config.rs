//! Application configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/bible-aura/config.toml)
//! 3. Environment variables (AURA_* prefix)
//!
//! Environment variables take precedence over config file values.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::quota::{Quota, DEFAULT_CAPACITY_BYTES, DEFAULT_LOW_WATER_BYTES};

/// Environment variable prefix
const ENV_PREFIX: &str = "AURA";

/// Directory name under the platform config/data dirs
const APP_DIR: &str = "bible-aura";

/// Which key/value backend the store persists into
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// One JSON file per collection
    #[default]
    File,
    /// Single SQLite database
    Sqlite,
    /// Nothing persisted (for testing)
    Memory,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BackendKind::File => "file",
            BackendKind::Sqlite => "sqlite",
            BackendKind::Memory => "memory",
        })
    }
}

impl FromStr for BackendKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "file" => Ok(BackendKind::File),
            "sqlite" => Ok(BackendKind::Sqlite),
            "memory" => Ok(BackendKind::Memory),
            other => bail!("Unknown backend '{}' (expected file, sqlite or memory)", other),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory for stored collections
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Storage backend
    #[serde(default)]
    pub backend: BackendKind,

    /// Storage budget in bytes
    #[serde(default = "default_capacity")]
    pub capacity_bytes: u64,

    /// Available bytes below which storage counts as nearly full
    #[serde(default = "default_low_water")]
    pub low_water_bytes: u64,

    /// Log level for the CLI (trace, debug, info, warn, error)
    #[serde(default)]
    pub log_level: Option<String>,

    /// Write logs to this file instead of stderr
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            backend: BackendKind::default(),
            capacity_bytes: DEFAULT_CAPACITY_BYTES,
            low_water_bytes: DEFAULT_LOW_WATER_BYTES,
            log_level: None,
            log_file: None,
        }
    }
}

impl Config {
    /// Load configuration from default location and environment
    ///
    /// Order of precedence (highest to lowest):
    /// 1. Environment variables (AURA_DATA_DIR, AURA_BACKEND, ...)
    /// 2. Config file (~/.config/bible-aura/config.toml or AURA_CONFIG)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        config.ensure_data_dir()?;
        Ok(config)
    }

    /// Load configuration from a TOML string (useful for testing)
    pub fn load_from_str(toml_content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(toml_content).context("Failed to parse config TOML")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var(format!("{}_DATA_DIR", ENV_PREFIX)) {
            self.data_dir = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var(format!("{}_BACKEND", ENV_PREFIX)) {
            match val.parse() {
                Ok(kind) => self.backend = kind,
                Err(e) => warn!(error = %e, "Ignoring {}_BACKEND", ENV_PREFIX),
            }
        }

        if let Some(bytes) = env_bytes("CAPACITY_BYTES") {
            self.capacity_bytes = bytes;
        }

        if let Some(bytes) = env_bytes("LOW_WATER_BYTES") {
            self.low_water_bytes = bytes;
        }

        if let Ok(val) = std::env::var(format!("{}_LOG", ENV_PREFIX)) {
            self.log_level = if val.is_empty() { None } else { Some(val) };
        }
    }

    /// Ensure data directory exists
    fn ensure_data_dir(&self) -> Result<()> {
        if !self.data_dir.exists() {
            std::fs::create_dir_all(&self.data_dir)
                .with_context(|| format!("Failed to create data directory: {:?}", self.data_dir))?;
        }
        Ok(())
    }

    /// Set a single value by key, as used by `aura config set`
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "data_dir" => self.data_dir = PathBuf::from(value),
            "backend" => self.backend = value.parse()?,
            "capacity_bytes" => {
                self.capacity_bytes = value
                    .parse()
                    .with_context(|| format!("Invalid byte count: {}", value))?
            }
            "low_water_bytes" => {
                self.low_water_bytes = value
                    .parse()
                    .with_context(|| format!("Invalid byte count: {}", value))?
            }
            "log_level" => {
                self.log_level = if value.is_empty() {
                    None
                } else {
                    Some(value.to_string())
                }
            }
            "log_file" => {
                self.log_file = if value.is_empty() {
                    None
                } else {
                    Some(PathBuf::from(value))
                }
            }
            _ => bail!(
                "Unknown config key '{}'. Valid keys: data_dir, backend, capacity_bytes, \
                 low_water_bytes, log_level, log_file",
                key
            ),
        }
        Ok(())
    }

    /// Save configuration to the default config file
    pub fn save(&self) -> Result<()> {
        self.save_to_path(&Self::config_file_path())
    }

    /// Save configuration to a specific path
    pub fn save_to_path(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(config_path, content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;
        Ok(())
    }

    /// Get the config file path
    ///
    /// Can be overridden with AURA_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join("config.toml")
    }

    /// Get the path to the SQLite database (sqlite backend)
    pub fn sqlite_path(&self) -> PathBuf {
        self.data_dir.join("aura.db")
    }

    /// Quota derived from the configured capacity and low-water mark
    pub fn quota(&self) -> Quota {
        Quota::new(self.capacity_bytes, self.low_water_bytes)
    }
}

fn env_bytes(suffix: &str) -> Option<u64> {
    let name = format!("{}_{}", ENV_PREFIX, suffix);
    let val = std::env::var(&name).ok()?;
    match val.parse() {
        Ok(bytes) => Some(bytes),
        Err(_) => {
            warn!(value = %val, "Ignoring non-numeric {}", name);
            None
        }
    }
}

/// Get the default data directory
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

fn default_capacity() -> u64 {
    DEFAULT_CAPACITY_BYTES
}

fn default_low_water() -> u64 {
    DEFAULT_LOW_WATER_BYTES
}
