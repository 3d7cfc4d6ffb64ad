// crates/federation-core/src/runtime/error.rs
// ============================================================================
// Module: Federation Errors
// Description: Terminal error kinds surfaced by the federation broker.
// Purpose: Distinguish configuration, permission, and upstream failures.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! Every broker operation fails with exactly one [`FederationError`] kind.
//! Each kind has a distinct outward meaning, and none is retried inside the
//! broker. The HTTP boundary translates kinds into protocol status codes.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::AccountAlias;
use crate::core::Principal;
use crate::core::RoleName;
use crate::interfaces::ProviderError;
use crate::interfaces::TokenServiceError;

// ============================================================================
// SECTION: Permission Denial
// ============================================================================

/// Denial of a requested `(account, role)` pair.
///
/// # Invariants
/// - Carries only the requested pair and the principal, never other grants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("User '{principal}' may not access role '{role}' in account '{account}'")]
pub struct PermissionDenied {
    /// Principal that made the request.
    pub principal: Principal,
    /// Requested account alias.
    pub account: AccountAlias,
    /// Requested role.
    pub role: RoleName,
}

// ============================================================================
// SECTION: Federation Error
// ============================================================================

/// Terminal failure of a broker request.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum FederationError {
    /// Broker or provider is misconfigured.
    #[error("{0}")]
    Configuration(String),
    /// Principal is not permitted to assume the requested role.
    #[error(transparent)]
    Permission(#[from] PermissionDenied),
    /// Token service or sign-in endpoint failed.
    #[error("{0}")]
    Aws(#[from] TokenServiceError),
    /// Identity source could not resolve the principal.
    #[error("{0}")]
    IdentitySource(String),
}

impl FederationError {
    /// Returns a stable label for the error kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::Permission(_) => "permission",
            Self::Aws(_) => "aws",
            Self::IdentitySource(_) => "identity_source",
        }
    }
}

impl From<ProviderError> for FederationError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::Configuration(message) => Self::Configuration(message),
            ProviderError::Unavailable(message) => Self::IdentitySource(message),
        }
    }
}
