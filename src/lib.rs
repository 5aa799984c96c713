// WireGuard AllowedIPs inventory sync
// Shared modules for the binary and tests

#![warn(missing_docs)]

//! WireGuard AllowedIPs inventory sync
//!
//! This library keeps a WireGuard profile's `AllowedIPs` set synchronized
//! with hosts described by configuration and Ansible-style inventory files,
//! then reconciles the running interface against the rewritten profile.
//!
//! # Main Components
//!
//! - [`config`]: Configuration file parsing and validation
//! - [`resolver`]: Host references (IP, CIDR, domain name) to CIDR strings
//! - [`allowlist`]: Canonical, deduplicated, sorted allow-list assembly
//! - [`inventory`]: Minimal Ansible-style inventory reader
//! - [`profile`]: WireGuard profile inspection and mutation
//! - [`template`]: Minimal `{{var}}` substitution over the profile
//! - [`service`]: Interface existence checks and start/restart reconciliation
//! - [`sync`]: The run-once pipeline tying everything together
//! - [`types`]: Shared data structures

pub mod allowlist;
pub mod config;
pub mod inventory;
pub mod profile;
pub mod resolver;
pub mod service;
pub mod sync;
pub mod template;
pub mod types;
