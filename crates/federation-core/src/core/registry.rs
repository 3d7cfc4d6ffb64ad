// crates/federation-core/src/core/registry.rs
// ============================================================================
// Module: Permission Registry
// Description: Account to role mapping resolved for a single principal.
// Purpose: Hold the permitted (account, role) set consulted by the gate.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! A [`PermissionRegistry`] maps account aliases to the set of roles a
//! principal may assume, each with a human-readable audit reason. Registries
//! are built once per request from an iterator of [`PermissionEntry`] values
//! and are never mutated afterwards.
//!
//! Grants are deduplicated on the full `(role, reason)` pair, so the same role
//! may appear more than once with different reasons. Consumers that only need
//! role names use [`PermissionRegistry::role_names`], which collapses those
//! duplicates.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use serde::Serialize;

use crate::core::identifiers::AccountAlias;
use crate::core::identifiers::RoleName;

// ============================================================================
// SECTION: Entries
// ============================================================================

/// Single permitted `(account, role)` pair with its audit reason.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PermissionEntry {
    /// Account alias the role belongs to.
    pub account: AccountAlias,
    /// Role the principal may assume.
    pub role: RoleName,
    /// Human-readable explanation, used only for audit output.
    pub reason: String,
}

impl PermissionEntry {
    /// Creates a permission entry.
    #[must_use]
    pub fn new(
        account: impl Into<AccountAlias>,
        role: impl Into<RoleName>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            account: account.into(),
            role: role.into(),
            reason: reason.into(),
        }
    }
}

/// Role grant stored under an account key.
///
/// # Invariants
/// - Equality and ordering cover both `role` and `reason`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RoleGrant {
    /// Role the principal may assume.
    pub role: RoleName,
    /// Human-readable explanation, used only for audit output.
    pub reason: String,
}

// ============================================================================
// SECTION: Registry
// ============================================================================

/// Permitted accounts and roles for one principal at one point in time.
///
/// # Invariants
/// - Never mutated after construction.
/// - Every account key maps to a non-empty grant set.
/// - An empty registry is valid and permits nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PermissionRegistry {
    /// Role grants keyed by account alias.
    accounts: BTreeMap<AccountAlias, BTreeSet<RoleGrant>>,
}

impl PermissionRegistry {
    /// Returns an empty registry.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns true when no account is permitted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Returns the number of permitted accounts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// Returns the grants recorded for an account, if any.
    #[must_use]
    pub fn grants(&self, account: &AccountAlias) -> Option<&BTreeSet<RoleGrant>> {
        self.accounts.get(account)
    }

    /// Iterates account aliases in sorted order.
    pub fn accounts(&self) -> impl Iterator<Item = &AccountAlias> {
        self.accounts.keys()
    }

    /// Iterates accounts with their grant sets in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = (&AccountAlias, &BTreeSet<RoleGrant>)> {
        self.accounts.iter()
    }

    /// Returns the distinct role names permitted for an account.
    #[must_use]
    pub fn role_names(&self, account: &AccountAlias) -> BTreeSet<&RoleName> {
        self.accounts
            .get(account)
            .map(|grants| grants.iter().map(|grant| &grant.role).collect())
            .unwrap_or_default()
    }

    /// Flattens the registry back into permission entries.
    pub fn entries(&self) -> impl Iterator<Item = PermissionEntry> + '_ {
        self.accounts.iter().flat_map(|(account, grants)| {
            grants.iter().map(move |grant| PermissionEntry {
                account: account.clone(),
                role: grant.role.clone(),
                reason: grant.reason.clone(),
            })
        })
    }
}

impl FromIterator<PermissionEntry> for PermissionRegistry {
    fn from_iter<I: IntoIterator<Item = PermissionEntry>>(iter: I) -> Self {
        let mut accounts: BTreeMap<AccountAlias, BTreeSet<RoleGrant>> = BTreeMap::new();
        for entry in iter {
            accounts.entry(entry.account).or_default().insert(RoleGrant {
                role: entry.role,
                reason: entry.reason,
            });
        }
        Self {
            accounts,
        }
    }
}
