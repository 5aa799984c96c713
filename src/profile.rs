// WireGuard profile editing

//! WireGuard profile inspection and mutation
//!
//! The profile is a line-oriented text document: only the `Table`,
//! `AllowedIPs`, `PostUp`, and `PostDown` lines are rewritten and every
//! other line is preserved byte-for-byte, so comments and formatting
//! survive a sync. The rewritten document is template-expanded and then
//! written atomically with owner-only permissions.

use crate::template;
use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

/// IP address family support detected from a profile's `Address` line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IpCapability {
    /// Profile can carry IPv4 CIDRs
    pub ipv4: bool,
    /// Profile can carry IPv6 CIDRs
    pub ipv6: bool,
}

/// Detect family support from the first `Address` line.
///
/// The check is textual on purpose: a `.` in the line means IPv4, a `:`
/// means IPv6. A profile without an `Address` line supports neither, which
/// filters every candidate CIDR out.
pub fn determine_ip_capability(lines: &[String]) -> IpCapability {
    for line in lines {
        if line.starts_with("Address") {
            return IpCapability {
                ipv4: line.contains('.'),
                ipv6: line.contains(':'),
            };
        }
    }
    IpCapability {
        ipv4: false,
        ipv6: false,
    }
}

/// Drop CIDRs the profile cannot carry, based on its `Address` line
pub fn filter_unsupported_ips(lines: &[String], allowed_ips: Vec<String>) -> Vec<String> {
    let capability = determine_ip_capability(lines);
    let mut allowed = allowed_ips;

    if !capability.ipv4 {
        let kept = filter_out_cidrs_containing(&allowed, '.');
        let dropped = allowed.len() - kept.len();
        if dropped > 0 {
            log::info!(
                "filtered out {} IPv4 CIDRs, the profile lacks IPv4 support",
                dropped
            );
            allowed = kept;
        }
    }
    if !capability.ipv6 {
        let kept = filter_out_cidrs_containing(&allowed, ':');
        let dropped = allowed.len() - kept.len();
        if dropped > 0 {
            log::info!(
                "filtered out {} IPv6 CIDRs, the profile lacks IPv6 support",
                dropped
            );
            allowed = kept;
        }
    }

    allowed
}

/// Remove CIDRs containing the marker character ('.' for IPv4, ':' for IPv6)
fn filter_out_cidrs_containing(allowed_ips: &[String], needle: char) -> Vec<String> {
    allowed_ips
        .iter()
        .filter(|ip| !ip.contains(needle))
        .cloned()
        .collect()
}

/// Replace the value of every line starting with `key`, leaving all other
/// lines byte-identical. Returns the number of lines rewritten.
pub fn set_by_prefix(lines: &mut [String], key: &str, value: &str) -> usize {
    let mut replaced = 0;
    for line in lines.iter_mut() {
        if line.starts_with(key) {
            *line = format!("{} = {}", key, value);
            replaced += 1;
        }
    }
    replaced
}

/// Rewrite the profile at `path`: `AllowedIPs` always, `Table` when
/// `table > 0`, `PostUp`/`PostDown` when commands were supplied. The
/// document is then expanded with the `name` and `table` variables and
/// written back with mode 0600.
pub fn update_profile(
    path: &Path,
    name: &str,
    allowed_ips: &[String],
    post_up: &[String],
    post_down: &[String],
    table: u32,
) -> Result<()> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read profile {}", path.display()))?;
    let mut lines: Vec<String> = contents.split('\n').map(str::to_string).collect();

    let allowed = filter_unsupported_ips(&lines, allowed_ips.to_vec());

    if table > 0 {
        set_by_prefix(&mut lines, "Table", &table.to_string());
    }
    set_by_prefix(&mut lines, "AllowedIPs", &allowed.join(","));
    if !post_up.is_empty() {
        set_by_prefix(&mut lines, "PostUp", &post_up.join("; "));
    }
    if !post_down.is_empty() {
        set_by_prefix(&mut lines, "PostDown", &post_down.join("; "));
    }

    let document = template::apply_vars(
        &lines.join("\n"),
        &[("name", name.to_string()), ("table", table.to_string())],
    )
    .with_context(|| format!("Failed to expand template variables in {}", path.display()))?;

    write_profile(path, &document)
}

/// Write via a temp file in the profile's directory and rename into place,
/// so an interrupted run never leaves a half-written profile
fn write_profile(path: &Path, contents: &str) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temp file in {}", dir.display()))?;
    tmp.write_all(contents.as_bytes())
        .context("Failed to write profile contents")?;
    tmp.as_file()
        .set_permissions(fs::Permissions::from_mode(0o600))
        .context("Failed to set profile permissions")?;
    tmp.persist(path)
        .with_context(|| format!("Failed to replace profile {}", path.display()))?;

    Ok(())
}
