// crates/federation-core/src/interfaces/mod.rs
// ============================================================================
// Module: Federation Interfaces
// Description: Backend-agnostic interfaces for identity sources and token services.
// Purpose: Define the contract surfaces consumed by the federation broker.
// Dependencies: crate::core, async-trait, thiserror
// ============================================================================

//! ## Overview
//! Interfaces define how the broker integrates with identity backends and the
//! upstream token service without embedding backend-specific details.
//! Implementations are interchangeable and selected at startup.
//! Invariants:
//! - Implementations hold no per-request state; every call is independent.
//! - Failures are reported once and never retried inside the broker.
//!
//! Security posture: directory data and upstream responses are untrusted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

use crate::core::Credentials;
use crate::core::GroupLabel;
use crate::core::PermissionRegistry;
use crate::core::Principal;
use crate::core::RoleArn;

// ============================================================================
// SECTION: Identity Providers
// ============================================================================

/// Errors reported by identity sources and permission providers.
///
/// # Invariants
/// - `Configuration` means the broker is set up incorrectly.
/// - `Unavailable` means the backend could not answer for this principal.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Provider is misconfigured.
    #[error("provider configuration error: {0}")]
    Configuration(String),
    /// Identity backend failed or refused the lookup.
    #[error("identity source unavailable: {0}")]
    Unavailable(String),
}

/// Source of raw group labels for a principal.
#[async_trait]
pub trait IdentityGroupSource: Send + Sync {
    /// Returns the group labels the principal belongs to.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] when the backend lookup fails.
    async fn group_list(&self, principal: &Principal)
    -> Result<BTreeSet<GroupLabel>, ProviderError>;
}

/// Resolves the full permission registry for a principal.
#[async_trait]
pub trait PermissionProvider: Send + Sync {
    /// Returns every account and role the principal may assume.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] when the identity backend fails.
    async fn accounts_and_roles(
        &self,
        principal: &Principal,
    ) -> Result<PermissionRegistry, ProviderError>;
}

// ============================================================================
// SECTION: Token Service
// ============================================================================

/// Request sent to the token service for one role assumption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssumeRoleRequest {
    /// Role to assume.
    pub role_arn: RoleArn,
    /// Session name recorded upstream; always the principal string.
    pub session_name: String,
}

/// Failure reported by the token service or sign-in endpoint.
///
/// # Invariants
/// - `status` and `message` are carried verbatim from upstream when present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenServiceError {
    /// Upstream HTTP status code when one was received.
    pub status: Option<u16>,
    /// Upstream reason or transport failure description.
    pub message: String,
}

impl TokenServiceError {
    /// Creates an error without an upstream status (transport failures).
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }

    /// Creates an error carrying an upstream status code.
    #[must_use]
    pub fn upstream(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
        }
    }
}

impl fmt::Display for TokenServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "Error {status} {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for TokenServiceError {}

/// Upstream security-token service.
#[async_trait]
pub trait TokenService: Send + Sync {
    /// Assumes the requested role and returns temporary credentials.
    ///
    /// # Errors
    ///
    /// Returns [`TokenServiceError`] on transport or upstream failure.
    async fn assume_role(&self, request: &AssumeRoleRequest)
    -> Result<Credentials, TokenServiceError>;
}

/// Upstream sign-in token endpoint.
#[async_trait]
pub trait SigninTokenService: Send + Sync {
    /// Exchanges a URL-encoded session document for a single-use sign-in token.
    ///
    /// # Errors
    ///
    /// Returns [`TokenServiceError`] when the endpoint fails or answers non-200.
    async fn signin_token(&self, encoded_session: &str) -> Result<String, TokenServiceError>;
}
