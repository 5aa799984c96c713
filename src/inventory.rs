// Minimal Ansible hosts reader

//! Minimal Ansible-style inventory reader
//!
//! Only the piece the allow-list needs: host records with an address
//! string. Group variables and children sections are skipped entirely; an
//! `ansible_host=` var on a host line overrides the address, otherwise the
//! host name itself is the address.

use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// One host record from an inventory file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryHost {
    /// Inventory name of the host (the line's first token)
    pub name: String,
    /// Address to resolve: `ansible_host=` when present, the name otherwise
    pub address: String,
}

/// Read all host records from an INI-style inventory file
pub fn load_hosts(path: &Path) -> Result<Vec<InventoryHost>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read inventory file {}", path.display()))?;
    Ok(parse_hosts(&contents))
}

fn parse_hosts(contents: &str) -> Vec<InventoryHost> {
    let mut hosts = Vec::new();
    let mut seen = HashSet::new();
    let mut in_host_section = true;

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if line.starts_with('[') {
            // Only plain [group] sections contain host lines
            in_host_section = !line.contains(":vars") && !line.contains(":children");
            continue;
        }
        if !in_host_section {
            continue;
        }

        let mut tokens = line.split_whitespace();
        let name = match tokens.next() {
            Some(name) => name.to_string(),
            None => continue,
        };
        if !seen.insert(name.clone()) {
            continue;
        }

        let mut address = name.clone();
        for token in tokens {
            if let Some(value) = token.strip_prefix("ansible_host=") {
                address = value.to_string();
            }
        }

        hosts.push(InventoryHost { name, address });
    }

    hosts
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_hosts_basic() {
        let hosts = parse_hosts("10.1.2.3\nserver.example.com\n");
        assert_eq!(hosts.len(), 2);
        assert_eq!(hosts[0].name, "10.1.2.3");
        assert_eq!(hosts[0].address, "10.1.2.3");
        assert_eq!(hosts[1].address, "server.example.com");
    }

    #[test]
    fn test_parse_hosts_ansible_host_override() {
        let hosts = parse_hosts("web1 ansible_host=192.0.2.10 ansible_user=deploy\n");
        assert_eq!(hosts.len(), 1);
        assert_eq!(hosts[0].name, "web1");
        assert_eq!(hosts[0].address, "192.0.2.10");
    }

    #[test]
    fn test_parse_hosts_sections() {
        let contents = "\
[web]
web1 ansible_host=192.0.2.10

[web:vars]
ansible_user=deploy

[all:children]
web

[db]
db1 ansible_host=192.0.2.20
";
        let hosts = parse_hosts(contents);
        let names: Vec<&str> = hosts.iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, vec!["web1", "db1"]);
    }

    #[test]
    fn test_parse_hosts_comments_and_duplicates() {
        let contents = "\
# comment
; another comment
web1 ansible_host=192.0.2.10

[other]
web1 ansible_host=198.51.100.1
";
        let hosts = parse_hosts(contents);
        // First occurrence wins
        assert_eq!(hosts.len(), 1);
        assert_eq!(hosts[0].address, "192.0.2.10");
    }

    #[test]
    fn test_load_hosts_missing_file() {
        assert!(load_hosts(Path::new("/nonexistent/hosts.ini")).is_err());
    }

    #[test]
    fn test_load_hosts_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "[vpn]\nhost-a ansible_host=10.1.2.3\n").unwrap();
        let hosts = load_hosts(file.path()).unwrap();
        assert_eq!(hosts.len(), 1);
        assert_eq!(hosts[0].address, "10.1.2.3");
    }
}
