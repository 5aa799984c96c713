// Shared types

//! Shared data structures
//!
//! This module defines the configuration structure loaded from the TOML
//! config file. All fields default so a minimal config stays minimal.

use serde::Deserialize;
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Ansible-style inventory files to pull hosts from
    #[serde(default)]
    pub inventory_paths: Vec<PathBuf>,
    /// WireGuard profile to rewrite; when unset the run stops after resolution
    #[serde(default)]
    pub profile_path: Option<PathBuf>,
    /// Hosts (IP, CIDR, or domain name) always allowed
    #[serde(default)]
    pub allowed_ips: Vec<String>,
    /// Hosts whose resolved CIDRs are dropped from the allow-list
    #[serde(default)]
    pub excluded_ips: Vec<String>,
    /// Routing table number; 0 leaves the profile's Table line unchanged
    #[serde(default)]
    pub table: u32,
    /// Commands joined into the profile's PostUp line
    #[serde(default)]
    pub post_up: Vec<String>,
    /// Commands joined into the profile's PostDown line
    #[serde(default)]
    pub post_down: Vec<String>,
    /// Log filter level, overridable with --debug
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            inventory_paths: Vec::new(),
            profile_path: None,
            allowed_ips: Vec::new(),
            excluded_ips: Vec::new(),
            table: 0,
            post_up: Vec::new(),
            post_down: Vec::new(),
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.inventory_paths.is_empty());
        assert!(config.profile_path.is_none());
        assert_eq!(config.table, 0);
        assert_eq!(config.log_level, "info");
    }
}
