// crates/federation-providers/src/host.rs
// ============================================================================
// Module: Host Permission Provider
// Description: Derives a single role from a machine's host name.
// Purpose: Grant machines credentials based on their FQDN naming scheme.
// Dependencies: federation-core, serde, tokio
// ============================================================================

//! ## Overview
//! The principal is an IP address or host name. It is resolved to an FQDN,
//! split at the first dot into host and domain, and checked against the
//! allowed domains. Host names are eight characters long; the first six encode
//! location and type. Hosts in the `ber` and `ham` locations are normalized to
//! `pro`. The role is `role_prefix` followed by the normalized location/type,
//! granted in the single configured account.
//! Invariants:
//! - Exactly one account and exactly one role are returned on success.
//! - Policy failures are reported as [`ProviderError::Unavailable`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use federation_core::PermissionEntry;
use federation_core::PermissionProvider;
use federation_core::PermissionRegistry;
use federation_core::Principal;
use federation_core::ProviderError;
use serde::Deserialize;
use tokio::process::Command;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Required host name length.
pub const HOST_NAME_LEN: usize = 8;
/// Location prefixes normalized to `pro`.
const PRODUCTION_LOCATIONS: [&str; 2] = ["ber", "ham"];

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Options for the `host` provider.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HostProviderConfig {
    /// Account granted to every accepted machine.
    pub account_name: String,
    /// Domains machines must belong to.
    pub allowed_domains: BTreeSet<String>,
    /// Prefix prepended to the derived role.
    #[serde(default)]
    pub role_prefix: String,
    /// Static address to FQDN table; `getent hosts` is used when absent.
    #[serde(default)]
    pub hosts: Option<BTreeMap<String, String>>,
}

// ============================================================================
// SECTION: Hostname Resolution
// ============================================================================

/// Resolves an address or host name to its canonical FQDN.
#[async_trait]
pub trait HostnameResolver: Send + Sync {
    /// Returns the FQDN for `address`.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Unavailable`] when the name cannot be resolved.
    async fn fqdn(&self, address: &str) -> Result<String, ProviderError>;
}

/// Resolver backed by `getent hosts`.
#[derive(Debug, Clone, Default)]
pub struct GetentResolver;

#[async_trait]
impl HostnameResolver for GetentResolver {
    async fn fqdn(&self, address: &str) -> Result<String, ProviderError> {
        if address.is_empty() || address.starts_with('-') {
            return Err(ProviderError::Unavailable(format!("invalid address: '{address}'")));
        }
        let output = Command::new("getent")
            .arg("hosts")
            .arg("--")
            .arg(address)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|err| ProviderError::Unavailable(format!("failed to run getent: {err}")))?;
        if !output.status.success() {
            return Err(ProviderError::Unavailable(format!("no host name found for {address}")));
        }
        parse_getent_hosts(&String::from_utf8_lossy(&output.stdout))
            .ok_or_else(|| ProviderError::Unavailable(format!("no host name found for {address}")))
    }
}

/// Extracts the canonical name from `getent hosts` output.
#[must_use]
pub fn parse_getent_hosts(output: &str) -> Option<String> {
    output.lines().find_map(|line| line.split_whitespace().nth(1).map(str::to_string))
}

/// Resolver backed by a fixed table.
#[derive(Debug, Clone, Default)]
pub struct StaticHostResolver {
    /// Address to FQDN table.
    hosts: BTreeMap<String, String>,
}

impl StaticHostResolver {
    /// Creates a resolver from an address to FQDN table.
    #[must_use]
    pub const fn new(hosts: BTreeMap<String, String>) -> Self {
        Self {
            hosts,
        }
    }
}

#[async_trait]
impl HostnameResolver for StaticHostResolver {
    async fn fqdn(&self, address: &str) -> Result<String, ProviderError> {
        self.hosts
            .get(address)
            .cloned()
            .ok_or_else(|| ProviderError::Unavailable(format!("no host name found for {address}")))
    }
}

// ============================================================================
// SECTION: Provider
// ============================================================================

/// Provider granting one role derived from the machine's host name.
pub struct HostPermissionProvider {
    /// Account granted to every accepted machine.
    account_name: String,
    /// Domains a machine's FQDN must belong to.
    allowed_domains: BTreeSet<String>,
    /// Prefix prepended to the normalized location and type.
    role_prefix: String,
    /// Address to FQDN lookup.
    resolver: Arc<dyn HostnameResolver>,
}

impl HostPermissionProvider {
    /// Creates the provider with an explicit resolver.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Configuration`] when the account name is empty
    /// or no domain is allowed.
    pub fn new(
        config: HostProviderConfig,
        resolver: Arc<dyn HostnameResolver>,
    ) -> Result<Self, ProviderError> {
        if config.account_name.trim().is_empty() {
            return Err(ProviderError::Configuration(
                "host provider requires account_name".to_string(),
            ));
        }
        if config.allowed_domains.is_empty() {
            return Err(ProviderError::Configuration(
                "host provider requires at least one allowed domain".to_string(),
            ));
        }
        Ok(Self {
            account_name: config.account_name,
            allowed_domains: config.allowed_domains,
            role_prefix: config.role_prefix,
            resolver,
        })
    }

    /// Creates the provider, choosing the resolver from the config.
    ///
    /// # Errors
    ///
    /// Same as [`HostPermissionProvider::new`].
    pub fn from_config(mut config: HostProviderConfig) -> Result<Self, ProviderError> {
        let resolver: Arc<dyn HostnameResolver> = match config.hosts.take() {
            Some(hosts) => Arc::new(StaticHostResolver::new(hosts)),
            None => Arc::new(GetentResolver),
        };
        Self::new(config, resolver)
    }

    /// Derives the role for an FQDN, enforcing the domain and naming policy.
    fn role_for(&self, principal: &Principal, fqdn: &str) -> Result<String, ProviderError> {
        let (host, domain) = fqdn.split_once('.').ok_or_else(|| {
            ProviderError::Unavailable(format!(
                "Client IP {principal} (FQDN {fqdn}) is not permitted"
            ))
        })?;
        if !self.allowed_domains.contains(domain) {
            return Err(ProviderError::Unavailable(format!(
                "Client IP {principal} (FQDN {fqdn}) is not permitted"
            )));
        }
        if host.chars().count() != HOST_NAME_LEN {
            return Err(ProviderError::Unavailable(format!("Client {fqdn} has an invalid name")));
        }
        Ok(format!("{}{}", self.role_prefix, normalize_location_type(host)))
    }
}

/// Returns the normalized location/type part of an eight character host name.
#[must_use]
pub fn normalize_location_type(host: &str) -> String {
    if PRODUCTION_LOCATIONS.iter().any(|location| host.starts_with(location)) {
        let kind: String = host.chars().skip(3).take(3).collect();
        format!("pro{kind}")
    } else {
        host.chars().take(6).collect()
    }
}

#[async_trait]
impl PermissionProvider for HostPermissionProvider {
    async fn accounts_and_roles(
        &self,
        principal: &Principal,
    ) -> Result<PermissionRegistry, ProviderError> {
        let fqdn = self.resolver.fqdn(principal.as_str()).await?;
        let role = self.role_for(principal, &fqdn)?;
        let reason = format!("Machine {principal} (FQDN {fqdn}) matched the role {role}");
        tracing::debug!(%principal, %fqdn, %role, "machine matched role");
        Ok([PermissionEntry::new(self.account_name.as_str(), role, reason)].into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::normalize_location_type;
    use super::parse_getent_hosts;

    #[test]
    fn production_locations_normalize_to_pro() {
        assert_eq!(normalize_location_type("berwebxx"), "proweb");
        assert_eq!(normalize_location_type("hamdbsxx"), "prodbs");
    }

    #[test]
    fn other_locations_keep_first_six_chars() {
        assert_eq!(normalize_location_type("devwebxx"), "devweb");
        assert_eq!(normalize_location_type("tuvfoo01"), "tuvfoo");
    }

    #[test]
    fn getent_output_yields_canonical_name() {
        assert_eq!(
            parse_getent_hosts("10.0.0.1        devwebxx.example.com devwebxx\n").as_deref(),
            Some("devwebxx.example.com")
        );
        assert_eq!(parse_getent_hosts(""), None);
    }
}
