//! Config command handlers

use anyhow::{Context, Result};

use aura_core::{format_size, Config};

use crate::output::{Output, OutputFormat};

/// Show current configuration
pub fn show(output: &Output) -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "data_dir": config.data_dir,
                    "backend": config.backend.to_string(),
                    "capacity_bytes": config.capacity_bytes,
                    "low_water_bytes": config.low_water_bytes,
                    "log_level": config.log_level,
                    "log_file": config.log_file,
                    "config_file": Config::config_file_path()
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", config.data_dir.display());
        }
        OutputFormat::Human => {
            println!("Configuration:");
            println!("  data_dir:        {}", config.data_dir.display());
            println!("  backend:         {}", config.backend);
            println!(
                "  capacity_bytes:  {} ({})",
                config.capacity_bytes,
                format_size(config.capacity_bytes)
            );
            println!(
                "  low_water_bytes: {} ({})",
                config.low_water_bytes,
                format_size(config.low_water_bytes)
            );
            println!(
                "  log_level:       {}",
                config.log_level.as_deref().unwrap_or("(not set)")
            );
            println!(
                "  log_file:        {}",
                config
                    .log_file
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "(not set)".to_string())
            );
            println!();
            println!("Config file: {}", Config::config_file_path().display());
        }
    }

    Ok(())
}

/// Set a configuration value
pub fn set(key: String, value: String, output: &Output) -> Result<()> {
    let mut config = Config::load().context("Failed to load configuration")?;

    config.set(&key, &value)?;
    config.save().context("Failed to save configuration")?;

    output.success(&format!("Set {} = {}", key, value));

    Ok(())
}
