//! Domain allowlist for incoming links
//!
//! The registry starts with the DLN-owned domains and grows with the verified
//! custom domains reported by the init endpoint. It never shrinks for the
//! life of the process.

use std::collections::HashSet;

use parking_lot::RwLock;

use crate::model::CustomDomain;

/// Domains owned by DLN. Any subdomain of these is also accepted.
pub const BUILT_IN_DOMAINS: [&str; 2] = ["deeplinknow.com", "deeplink.now"];

/// Set of hostnames the SDK trusts
///
/// Reads take a short shared lock, so request-handling code can validate
/// hosts while the init task is merging custom domains. A read that races the
/// merge simply sees the built-in set.
#[derive(Debug)]
pub struct DomainRegistry {
    domains: RwLock<HashSet<String>>,
    enable_logs: bool,
}

impl DomainRegistry {
    pub fn new(enable_logs: bool) -> Self {
        let domains = BUILT_IN_DOMAINS.iter().map(|d| d.to_string()).collect();
        Self {
            domains: RwLock::new(domains),
            enable_logs,
        }
    }

    /// Returns true if `host` is a stored domain or belongs to a built-in
    /// domain (`deeplinknow.com`, `foo.deeplinknow.com`, `deeplink.now`, ...).
    ///
    /// Comparison is case-insensitive.
    pub fn is_valid_domain(&self, host: &str) -> bool {
        let host = host.to_ascii_lowercase();

        if self.domains.read().contains(&host) {
            return true;
        }

        if BUILT_IN_DOMAINS.iter().any(|suffix| is_same_or_subdomain(&host, suffix)) {
            return true;
        }

        crate::dln_debug!(self.enable_logs, host = %host, "domain is not in the allowlist");
        false
    }

    /// Adds every verified custom domain and returns how many were new.
    ///
    /// Unverified entries and entries without a domain are ignored. Merging
    /// the same list twice leaves the set unchanged.
    pub fn merge_verified(&self, custom_domains: &[CustomDomain]) -> usize {
        let verified: Vec<String> = custom_domains
            .iter()
            .filter(|d| d.verified == Some(true))
            .filter_map(|d| d.domain.as_deref())
            .map(|d| d.trim().to_ascii_lowercase())
            .filter(|d| !d.is_empty())
            .collect();

        let mut domains = self.domains.write();
        let added = verified
            .into_iter()
            .filter(|d| domains.insert(d.clone()))
            .count();
        drop(domains);

        crate::dln_debug!(self.enable_logs, added, "merged verified custom domains");
        added
    }

    /// Sorted snapshot of the stored domains.
    pub fn domains(&self) -> Vec<String> {
        let mut domains: Vec<String> = self.domains.read().iter().cloned().collect();
        domains.sort();
        domains
    }
}

impl Default for DomainRegistry {
    fn default() -> Self {
        Self::new(false)
    }
}

fn is_same_or_subdomain(host: &str, domain: &str) -> bool {
    host == domain
        || host
            .strip_suffix(domain)
            .is_some_and(|prefix| prefix.ends_with('.'))
}
