// crates/federation-core/src/runtime/gate.rs
// ============================================================================
// Module: Authorization Gate
// Description: Allow/deny decision for a requested account and role.
// Purpose: Enforce that only roles present in the registry may be assumed.
// Dependencies: tracing, crate::core
// ============================================================================

//! ## Overview
//! The gate compares a requested `(account, role)` pair against a freshly
//! resolved [`PermissionRegistry`]. Role comparison is exact string equality.
//! An unknown account and an unknown role produce the same denial so callers
//! cannot enumerate which accounts exist.
//!
//! Security posture: the gate holds no state, so allow decisions are never
//! reused across requests.

use crate::core::AccountAlias;
use crate::core::PermissionRegistry;
use crate::core::Principal;
use crate::core::RoleName;
use crate::runtime::error::PermissionDenied;

/// Stateless allow/deny evaluator.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthorizationGate;

impl AuthorizationGate {
    /// Checks a request against the registry, returning the audit reason on allow.
    ///
    /// When the same role is granted more than once with different reasons,
    /// the reason that sorts first is returned.
    ///
    /// # Errors
    ///
    /// Returns [`PermissionDenied`] when the account is absent or carries no
    /// grant for `role`.
    pub fn check(
        registry: &PermissionRegistry,
        principal: &Principal,
        account: &AccountAlias,
        role: &RoleName,
    ) -> Result<String, PermissionDenied> {
        let Some(grants) = registry.grants(account) else {
            tracing::debug!(%principal, %account, %role, "account not present in registry");
            return Err(deny(principal, account, role));
        };
        match grants.iter().find(|grant| &grant.role == role) {
            Some(grant) => Ok(grant.reason.clone()),
            None => {
                tracing::debug!(%principal, %account, %role, "role not granted for account");
                Err(deny(principal, account, role))
            }
        }
    }
}

/// Builds the denial for a requested pair.
fn deny(principal: &Principal, account: &AccountAlias, role: &RoleName) -> PermissionDenied {
    PermissionDenied {
        principal: principal.clone(),
        account: account.clone(),
        role: role.clone(),
    }
}
