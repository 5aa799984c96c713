// Run-once pipeline

//! The run-once sync pipeline
//!
//! Resolve the allow-list, rewrite the profile, reconcile the interface.
//! An empty allow-list is "nothing to do": the run succeeds with a warning
//! and the profile stays untouched.

use crate::allowlist::build_allowed_ips;
use crate::profile::update_profile;
use crate::resolver::DnsLookup;
use crate::service::{interface_exists, reconcile_interface, ServiceRunner};
use crate::types::Config;
use anyhow::{Context, Result};
use std::path::Path;

/// Execute one sync run
pub async fn run(cfg: &Config, dns: &dyn DnsLookup, runner: &dyn ServiceRunner) -> Result<()> {
    let allowed_ips = build_allowed_ips(cfg, dns).await;
    log::info!("discovered {} allowed IPs", allowed_ips.len());
    if allowed_ips.is_empty() {
        log::warn!("no allowed IPs found, leaving the profile untouched");
        return Ok(());
    }

    let profile_path = match &cfg.profile_path {
        Some(path) => path,
        None => {
            log::debug!("no profile_path configured, nothing to update");
            return Ok(());
        }
    };

    let name = interface_name(profile_path)?;
    log::info!("updating WireGuard profile {}", profile_path.display());
    update_profile(
        profile_path,
        &name,
        &allowed_ips,
        &cfg.post_up,
        &cfg.post_down,
        cfg.table,
    )?;

    log::info!("reconciling WireGuard interface {}", name);
    reconcile_interface(&name, interface_exists(&name), runner).await
}

/// Logical interface name: the profile file's base name without extension
fn interface_name(path: &Path) -> Result<String> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::to_string)
        .with_context(|| format!("cannot derive an interface name from {}", path.display()))
}
