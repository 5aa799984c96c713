// Allow-list assembly

//! Building the canonical allow-list
//!
//! Combines explicit allow/exclude entries with inventory-derived hosts
//! into one deduplicated, sorted CIDR list. Exclusion matches the resolved
//! CIDR string exactly: excluding `10.0.0.0/8` drops that literal CIDR
//! only, not addresses the block contains. Excluding a domain name drops
//! the CIDRs it resolves to at exclusion time; later DNS changes are not
//! retroactively protected.

use crate::inventory;
use crate::resolver::{determine_cidrs, DnsLookup};
use crate::types::Config;
use std::collections::HashSet;
use std::net::IpAddr;
use std::path::Path;

/// Build the final allow-list for a run: config entries first, then every
/// inventory host, minus exclusions, deduplicated and sorted
pub async fn build_allowed_ips(cfg: &Config, dns: &dyn DnsLookup) -> Vec<String> {
    let excluded = collect_excluded(dns, &cfg.excluded_ips).await;
    let mut allowed = collect_allowed(dns, &cfg.allowed_ips, &excluded).await;
    for path in &cfg.inventory_paths {
        allowed.extend(inventory_ips(dns, path, &excluded).await);
    }

    dedup(&mut allowed);
    sort_ips(&mut allowed);
    allowed
}

async fn collect_excluded(dns: &dyn DnsLookup, excluded: &[String]) -> HashSet<String> {
    let mut set = HashSet::new();
    for entry in excluded {
        let cidrs = determine_cidrs(dns, entry).await;
        if cidrs.is_empty() {
            log::debug!("excluded entry {} did not resolve to any CIDR", entry);
            continue;
        }
        set.extend(cidrs);
    }
    set
}

async fn collect_allowed(
    dns: &dyn DnsLookup,
    allowed: &[String],
    excluded: &HashSet<String>,
) -> Vec<String> {
    let mut result = Vec::with_capacity(allowed.len());
    for entry in allowed {
        let cidrs = determine_cidrs(dns, entry).await;
        if cidrs.is_empty() {
            log::debug!("allowed entry {} did not resolve to any CIDR", entry);
            continue;
        }
        result.extend(cidrs.into_iter().filter(|cidr| !excluded.contains(cidr)));
    }
    result
}

/// Resolve every host of one inventory source. An unreadable source is
/// logged and skipped; it does not abort the run.
async fn inventory_ips(
    dns: &dyn DnsLookup,
    path: &Path,
    excluded: &HashSet<String>,
) -> Vec<String> {
    let hosts = match inventory::load_hosts(path) {
        Ok(hosts) => hosts,
        Err(err) => {
            log::error!("cannot read inventory file {}: {:#}", path.display(), err);
            return Vec::new();
        }
    };
    if hosts.is_empty() {
        log::debug!("inventory {} is empty", path.display());
        return Vec::new();
    }

    let mut allowed = Vec::with_capacity(hosts.len());
    for host in hosts {
        let cidrs = determine_cidrs(dns, &host.address).await;
        if cidrs.is_empty() {
            log::debug!("host {} did not resolve to any CIDR", host.address);
            continue;
        }
        allowed.extend(cidrs.into_iter().filter(|cidr| !excluded.contains(cidr)));
    }
    allowed
}

fn dedup(ips: &mut Vec<String>) {
    let mut seen = HashSet::new();
    ips.retain(|ip| seen.insert(ip.clone()));
}

/// Sort CIDRs by the byte value of the embedded address. IPv4 keys are four
/// bytes and IPv6 keys sixteen, so IPv4 addresses order before IPv6 purely
/// through the length difference in the comparison, not a family-first rule.
pub fn sort_ips(ips: &mut [String]) {
    ips.sort_by_cached_key(|cidr| addr_key(cidr));
}

fn addr_key(cidr: &str) -> Vec<u8> {
    let addr = cidr.split('/').next().unwrap_or_default();
    match addr.parse::<IpAddr>() {
        Ok(IpAddr::V4(v4)) => v4.octets().to_vec(),
        Ok(IpAddr::V6(v6)) => v6.octets().to_vec(),
        Err(_) => Vec::new(),
    }
}
