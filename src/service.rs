// Interface reconciliation

//! Interface existence checks and service reconciliation
//!
//! After a profile edit the backing wg-quick unit is started when the
//! interface is absent and restarted when it is present. Restart rather
//! than reload: reload-style reconfiguration (`wg syncconf`) does not
//! apply AllowedIPs changes.

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::process::Command;

/// Service actions the reconciler can issue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceAction {
    /// Cold start of the unit (interface absent)
    Start,
    /// Full restart of the unit (interface present)
    Restart,
}

impl ServiceAction {
    /// The service-manager verb for this action
    pub fn verb(self) -> &'static str {
        match self {
            ServiceAction::Start => "start",
            ServiceAction::Restart => "restart",
        }
    }
}

/// Service-manager boundary; production uses systemctl, tests record calls
#[async_trait]
pub trait ServiceRunner: Send + Sync {
    /// Apply `action` to `unit`, propagating the invocation's exit status
    async fn run(&self, action: ServiceAction, unit: &str) -> Result<()>;
}

/// systemctl-backed service runner
pub struct Systemctl;

#[async_trait]
impl ServiceRunner for Systemctl {
    async fn run(&self, action: ServiceAction, unit: &str) -> Result<()> {
        let status = Command::new("systemctl")
            .args([action.verb(), unit])
            .status()
            .await
            .with_context(|| format!("Failed to execute systemctl {} {}", action.verb(), unit))?;

        anyhow::ensure!(
            status.success(),
            "systemctl {} {} exited with {}",
            action.verb(),
            unit,
            status
        );
        Ok(())
    }
}

/// Validates that an interface name is safe to embed in a unit name.
/// Only alphanumeric characters, hyphens, and underscores are allowed.
pub fn validate_interface_name(name: &str) -> Result<()> {
    if name.is_empty() {
        anyhow::bail!("Interface name cannot be empty");
    }

    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        anyhow::bail!(
            "Interface name contains invalid characters: '{}'. Only alphanumeric, hyphens, and underscores are allowed",
            name
        );
    }

    Ok(())
}

/// Check the OS interface table for an interface with this name.
/// Queried fresh each run, never cached.
pub fn interface_exists(name: &str) -> bool {
    match if_addrs::get_if_addrs() {
        Ok(interfaces) => interfaces.iter().any(|iface| iface.name == name),
        Err(err) => {
            log::warn!("Failed to enumerate network interfaces: {}", err);
            false
        }
    }
}

/// Start or restart the wg-quick unit for `name` depending on whether the
/// interface currently exists. A failed start/restart is surfaced as-is;
/// there are no retries.
pub async fn reconcile_interface(
    name: &str,
    exists: bool,
    runner: &dyn ServiceRunner,
) -> Result<()> {
    validate_interface_name(name)?;

    let unit = format!("wg-quick@{}", name);
    let action = if exists {
        ServiceAction::Restart
    } else {
        ServiceAction::Start
    };

    log::info!(
        "interface {} is {}, issuing {} for {}",
        name,
        if exists { "present" } else { "absent" },
        action.verb(),
        unit
    );
    runner.run(action, &unit).await
}
