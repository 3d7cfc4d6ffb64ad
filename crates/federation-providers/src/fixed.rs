// crates/federation-providers/src/fixed.rs
// ============================================================================
// Module: Static Providers
// Description: Configuration-backed permission and group sources.
// Purpose: Deterministic providers for demos, monitoring, and tests.
// Dependencies: federation-core, serde
// ============================================================================

//! ## Overview
//! [`StaticPermissionProvider`] grants the same configured accounts and roles
//! to every principal. [`StaticGroupSource`] returns configured group labels,
//! optionally per principal, for resolution through a group pattern.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use async_trait::async_trait;
use federation_core::GroupLabel;
use federation_core::IdentityGroupSource;
use federation_core::PermissionEntry;
use federation_core::PermissionProvider;
use federation_core::PermissionRegistry;
use federation_core::Principal;
use federation_core::ProviderError;
use serde::Deserialize;

/// Audit reason attached to statically configured grants.
pub const STATIC_REASON: &str = "static provider configuration";

// ============================================================================
// SECTION: Static Permissions
// ============================================================================

/// Options for the `static` provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StaticProviderConfig {
    /// Roles granted per account alias.
    #[serde(default)]
    pub accounts: BTreeMap<String, Vec<String>>,
}

/// Provider granting the configured accounts and roles to every principal.
pub struct StaticPermissionProvider {
    /// Registry returned for every principal.
    registry: PermissionRegistry,
}

impl StaticPermissionProvider {
    /// Creates the provider from its options.
    #[must_use]
    pub fn new(config: StaticProviderConfig) -> Self {
        let registry = config
            .accounts
            .into_iter()
            .flat_map(|(account, roles)| {
                roles
                    .into_iter()
                    .map(move |role| PermissionEntry::new(account.as_str(), role, STATIC_REASON))
            })
            .collect();
        Self {
            registry,
        }
    }
}

#[async_trait]
impl PermissionProvider for StaticPermissionProvider {
    async fn accounts_and_roles(
        &self,
        _principal: &Principal,
    ) -> Result<PermissionRegistry, ProviderError> {
        Ok(self.registry.clone())
    }
}

// ============================================================================
// SECTION: Static Groups
// ============================================================================

/// Options for the `static_groups` provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StaticGroupsConfig {
    /// Groups returned for principals without a `members` entry.
    #[serde(default)]
    pub groups: Vec<String>,
    /// Groups returned per principal.
    #[serde(default)]
    pub members: BTreeMap<String, Vec<String>>,
}

/// Group source returning configured labels.
pub struct StaticGroupSource {
    /// Shared and per-principal group lists.
    config: StaticGroupsConfig,
}

impl StaticGroupSource {
    /// Creates the source from its options.
    #[must_use]
    pub const fn new(config: StaticGroupsConfig) -> Self {
        Self {
            config,
        }
    }
}

#[async_trait]
impl IdentityGroupSource for StaticGroupSource {
    async fn group_list(
        &self,
        principal: &Principal,
    ) -> Result<BTreeSet<GroupLabel>, ProviderError> {
        let labels = self.config.members.get(principal.as_str()).unwrap_or(&self.config.groups);
        Ok(labels.iter().map(|label| GroupLabel::from(label.as_str())).collect())
    }
}
