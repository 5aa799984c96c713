// Host-to-CIDR resolution

//! Turning host references into CIDR strings
//!
//! A host reference is a CIDR literal, a bare IP address, or a domain name.
//! Resolution is total: anything that cannot be mapped to at least one CIDR
//! yields an empty list and the caller decides how loudly to log it.

use async_trait::async_trait;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::proto::rr::{RData, RecordType};
use hickory_resolver::system_conf::read_system_conf;
use hickory_resolver::TokioAsyncResolver;
use regex::Regex;
use std::net::IpAddr;
use std::sync::OnceLock;
use std::time::Duration;

/// Upper bound on CNAME chain chasing; a looping chain fails closed to an
/// empty result instead of recursing forever.
const MAX_CNAME_CHASE: usize = 8;

/// Per-lookup DNS timeout; a hung resolver must not stall the whole run
const DNS_TIMEOUT: Duration = Duration::from_secs(5);

fn domain_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^(?:[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?\.)+[a-zA-Z0-9][a-zA-Z0-9-]{0,61}[a-zA-Z0-9]$",
        )
        .unwrap()
    })
}

/// DNS lookups needed by the resolver
///
/// Implemented by [`SystemDns`] in production and by deterministic fakes in
/// tests, so resolution logic never depends on live DNS.
#[async_trait]
pub trait DnsLookup: Send + Sync {
    /// A/AAAA lookup; failures and NXDOMAIN collapse to an empty list
    async fn lookup_ip(&self, host: &str) -> Vec<IpAddr>;

    /// CNAME lookup; returns the canonical name when one exists
    async fn lookup_cname(&self, host: &str) -> Option<String>;
}

/// System DNS resolver with a bounded per-lookup timeout
pub struct SystemDns {
    resolver: TokioAsyncResolver,
}

impl SystemDns {
    /// Create a resolver from the system configuration (/etc/resolv.conf),
    /// falling back to the library defaults when it cannot be read
    pub fn new() -> Self {
        let (config, mut opts) = read_system_conf().unwrap_or_else(|err| {
            log::debug!(
                "cannot read system resolver config ({}), using defaults",
                err
            );
            (ResolverConfig::default(), ResolverOpts::default())
        });
        opts.timeout = DNS_TIMEOUT;

        Self {
            resolver: TokioAsyncResolver::tokio(config, opts),
        }
    }
}

impl Default for SystemDns {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DnsLookup for SystemDns {
    async fn lookup_ip(&self, host: &str) -> Vec<IpAddr> {
        match self.resolver.lookup_ip(host).await {
            Ok(lookup) => lookup.iter().collect(),
            Err(err) => {
                log::debug!("A/AAAA lookup for {} failed: {}", host, err);
                Vec::new()
            }
        }
    }

    async fn lookup_cname(&self, host: &str) -> Option<String> {
        match self.resolver.lookup(host, RecordType::CNAME).await {
            Ok(lookup) => lookup.iter().find_map(|rdata| match rdata {
                RData::CNAME(cname) => Some(cname.0.to_utf8()),
                _ => None,
            }),
            Err(err) => {
                log::debug!("CNAME lookup for {} failed: {}", host, err);
                None
            }
        }
    }
}

/// Determine the network CIDRs for a host reference.
///
/// CIDR literals pass through unchanged. Bare IP addresses become a /32 or
/// /128 CIDR depending on the address family. Domain names fan out to one
/// CIDR per A/AAAA record and CNAME records are chased up to
/// [`MAX_CNAME_CHASE`] links deep.
pub async fn determine_cidrs(dns: &dyn DnsLookup, host: &str) -> Vec<String> {
    let mut target = host.to_string();

    for _ in 0..MAX_CNAME_CHASE {
        // if CIDR, return as is
        if is_cidr(&target) {
            return vec![target];
        }

        // if IP, return CIDR
        if let Ok(ip) = target.parse::<IpAddr>() {
            return vec![ip_to_cidr(ip)];
        }

        if !is_domain(&target) {
            return Vec::new();
        }

        // if domain with A or AAAA records, return CIDRs
        let ips = dns.lookup_ip(&target).await;
        if !ips.is_empty() {
            return ips.into_iter().map(ip_to_cidr).collect();
        }

        // if domain with CNAME record, chase the canonical name
        match dns.lookup_cname(&target).await {
            Some(cname) => target = cname.trim_end_matches('.').to_string(),
            None => return Vec::new(),
        }
    }

    log::debug!(
        "CNAME chain for {} exceeded {} links, treating as unresolvable",
        host,
        MAX_CNAME_CHASE
    );
    Vec::new()
}

/// A CIDR literal is `addr/prefix` with a prefix valid for the family
fn is_cidr(host: &str) -> bool {
    let (addr, prefix) = match host.split_once('/') {
        Some(parts) => parts,
        None => return false,
    };
    let addr = match addr.parse::<IpAddr>() {
        Ok(addr) => addr,
        Err(_) => return false,
    };
    // u8::from_str tolerates a leading `+` and leading zeros; a prefix
    // length is plain digits with no zero padding
    if prefix.is_empty() || !prefix.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    if prefix.len() > 1 && prefix.starts_with('0') {
        return false;
    }
    let prefix = match prefix.parse::<u8>() {
        Ok(prefix) => prefix,
        Err(_) => return false,
    };
    match addr {
        IpAddr::V4(_) => prefix <= 32,
        IpAddr::V6(_) => prefix <= 128,
    }
}

fn ip_to_cidr(ip: IpAddr) -> String {
    match ip {
        IpAddr::V4(v4) => format!("{}/32", v4),
        IpAddr::V6(v6) => format!("{}/128", v6),
    }
}

/// Syntactic plausibility check for a DNS name: length 4..=77 and a
/// label-dotted hostname grammar with at least two labels
fn is_domain(host: &str) -> bool {
    if host.len() < 4 || host.len() > 77 {
        return false;
    }
    domain_regex().is_match(host)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[derive(Default)]
    struct FakeDns {
        ips: HashMap<String, Vec<IpAddr>>,
        cnames: HashMap<String, String>,
    }

    impl FakeDns {
        fn with_ips(host: &str, ips: &[&str]) -> Self {
            let mut dns = Self::default();
            dns.ips
                .insert(host.to_string(), ips.iter().map(|s| s.parse().unwrap()).collect());
            dns
        }
    }

    #[async_trait]
    impl DnsLookup for FakeDns {
        async fn lookup_ip(&self, host: &str) -> Vec<IpAddr> {
            self.ips.get(host).cloned().unwrap_or_default()
        }

        async fn lookup_cname(&self, host: &str) -> Option<String> {
            self.cnames.get(host).cloned()
        }
    }

    #[tokio::test]
    async fn test_ipv4_literal() {
        let dns = FakeDns::default();
        assert_eq!(determine_cidrs(&dns, "10.1.2.3").await, vec!["10.1.2.3/32"]);
    }

    #[tokio::test]
    async fn test_ipv6_literal() {
        let dns = FakeDns::default();
        assert_eq!(determine_cidrs(&dns, "fd00::1").await, vec!["fd00::1/128"]);
    }

    #[tokio::test]
    async fn test_cidr_literal_passthrough() {
        let dns = FakeDns::default();
        assert_eq!(determine_cidrs(&dns, "10.0.0.0/8").await, vec!["10.0.0.0/8"]);
        assert_eq!(determine_cidrs(&dns, "fd00::/64").await, vec!["fd00::/64"]);
        // Host bits set is still a valid literal and passes through unchanged
        assert_eq!(determine_cidrs(&dns, "10.0.0.5/8").await, vec!["10.0.0.5/8"]);
    }

    #[tokio::test]
    async fn test_invalid_cidr_prefix() {
        let dns = FakeDns::default();
        assert!(determine_cidrs(&dns, "10.0.0.0/33").await.is_empty());
        assert!(determine_cidrs(&dns, "10.0.0.0/").await.is_empty());
    }

    #[tokio::test]
    async fn test_cidr_prefix_must_be_plain_digits() {
        let dns = FakeDns::default();
        // Signs and zero padding are not valid prefix lengths and must not
        // pass through into the allow-list
        assert!(determine_cidrs(&dns, "10.0.0.0/+8").await.is_empty());
        assert!(determine_cidrs(&dns, "10.0.0.0/08").await.is_empty());
        assert!(determine_cidrs(&dns, "fd00::/+64").await.is_empty());
        assert!(determine_cidrs(&dns, "10.0.0.0/ 8").await.is_empty());
        // A bare zero prefix is still legal
        assert_eq!(determine_cidrs(&dns, "0.0.0.0/0").await, vec!["0.0.0.0/0"]);
    }

    #[tokio::test]
    async fn test_invalid_hosts_resolve_to_nothing() {
        let dns = FakeDns::default();
        // too short / too long
        assert!(determine_cidrs(&dns, "a.b").await.is_empty());
        let long = format!("{}.com", "a".repeat(80));
        assert!(determine_cidrs(&dns, &long).await.is_empty());
        // malformed grammar
        assert!(determine_cidrs(&dns, "single-label").await.is_empty());
        assert!(determine_cidrs(&dns, "-bad.example.com").await.is_empty());
        assert!(determine_cidrs(&dns, "bad.example.com.").await.is_empty());
        assert!(determine_cidrs(&dns, "").await.is_empty());
        // valid grammar but no records and no CNAME
        assert!(determine_cidrs(&dns, "nosuch.example.com").await.is_empty());
    }

    #[tokio::test]
    async fn test_domain_fans_out_across_families() {
        let dns = FakeDns::with_ips("dual.example.com", &["10.1.2.3", "fd00::1"]);
        assert_eq!(
            determine_cidrs(&dns, "dual.example.com").await,
            vec!["10.1.2.3/32", "fd00::1/128"]
        );
    }

    #[tokio::test]
    async fn test_cname_chase() {
        let mut dns = FakeDns::with_ips("target.example.com", &["192.0.2.1"]);
        dns.cnames.insert(
            "alias.example.com".to_string(),
            "target.example.com.".to_string(),
        );
        assert_eq!(
            determine_cidrs(&dns, "alias.example.com").await,
            vec!["192.0.2.1/32"]
        );
    }

    #[tokio::test]
    async fn test_cname_loop_fails_closed() {
        let mut dns = FakeDns::default();
        dns.cnames
            .insert("aaa.example.com".to_string(), "bbb.example.com".to_string());
        dns.cnames
            .insert("bbb.example.com".to_string(), "aaa.example.com".to_string());
        assert!(determine_cidrs(&dns, "aaa.example.com").await.is_empty());
    }

    #[test]
    fn test_is_domain() {
        assert!(is_domain("example.com"));
        assert!(is_domain("a-b.example.com"));
        assert!(!is_domain("a.b"));
        assert!(!is_domain("example"));
        assert!(!is_domain("ex_ample.com"));
        assert!(!is_domain(&format!("{}.com", "a".repeat(80))));
    }
}
