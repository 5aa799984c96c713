// Configuration file parser

//! Configuration file parsing and validation
//!
//! This module handles loading the TOML configuration file and validating
//! its contents before a run starts.

use crate::types::Config;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Load configuration from TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let contents = fs::read_to_string(path.as_ref()).context("Failed to read config file")?;

    let config: Config = toml::from_str(&contents).context("Failed to parse config file")?;

    validate_config(&config)?;
    Ok(config)
}

/// Validate configuration values
fn validate_config(config: &Config) -> Result<()> {
    // Validate profile path names an actual file
    if let Some(profile) = &config.profile_path {
        if profile.file_stem().map_or(true, |stem| stem.is_empty()) {
            anyhow::bail!("profile_path must name a file: {}", profile.display());
        }
    }

    // Validate allow/exclude entries are not blank
    for entry in config.allowed_ips.iter().chain(config.excluded_ips.iter()) {
        if entry.trim().is_empty() {
            anyhow::bail!("allowed_ips/excluded_ips entries cannot be empty");
        }
    }

    // Validate PostUp/PostDown commands are not blank
    for command in config.post_up.iter().chain(config.post_down.iter()) {
        if command.trim().is_empty() {
            anyhow::bail!("post_up/post_down commands cannot be empty");
        }
    }

    Ok(())
}
