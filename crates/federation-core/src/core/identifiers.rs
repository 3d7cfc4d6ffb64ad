// crates/federation-core/src/core/identifiers.rs
// ============================================================================
// Module: Federation Identifiers
// Description: Opaque identifiers for principals, accounts, roles, and groups.
// Purpose: Provide strongly typed, serializable identifiers with stable wire forms.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! This module defines the identifiers passed between identity providers, the
//! authorization gate, and the token service. All string identifiers are
//! opaque: no normalization is applied, so comparisons are exact and
//! case-sensitive. Account ids are the only validated identifier; they must be
//! non-empty ASCII digit strings because they are embedded into role ARNs.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: String Identifiers
// ============================================================================

/// Declares an opaque string identifier newtype.
macro_rules! string_identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self::new(value)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_identifier! {
    /// Identity making a request (user name, host FQDN, or IP address).
    ///
    /// # Invariants
    /// - Immutable for the lifetime of a request.
    /// - Passed upstream verbatim as the role session name.
    Principal
}

string_identifier! {
    /// Human-readable cloud account alias.
    ///
    /// # Invariants
    /// - Mapped to an [`AccountId`] only through broker configuration.
    AccountAlias
}

string_identifier! {
    /// Role name within an account.
    ///
    /// # Invariants
    /// - Compared by exact string equality at the authorization gate.
    RoleName
}

string_identifier! {
    /// Raw group label produced by an identity group source.
    ///
    /// # Invariants
    /// - Untrusted directory data; only ever matched against anchored patterns.
    GroupLabel
}

// ============================================================================
// SECTION: Account Identifier
// ============================================================================

/// Numeric cloud account identifier.
///
/// # Invariants
/// - Non-empty and composed of ASCII digits only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountId(String);

impl AccountId {
    /// Parses an account id (returns `None` when empty or non-numeric).
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || !trimmed.bytes().all(|byte| byte.is_ascii_digit()) {
            return None;
        }
        Some(Self(trimmed.to_string()))
    }

    /// Returns the account id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl TryFrom<String> for AccountId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("account id must be numeric: {value}"))
    }
}

impl From<AccountId> for String {
    fn from(value: AccountId) -> Self {
        value.0
    }
}

// ============================================================================
// SECTION: Role ARN
// ============================================================================

/// Role resource name in the form `arn:aws:iam::<account-id>:role/<role-name>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RoleArn(String);

impl RoleArn {
    /// Builds the role ARN for an account id and role name.
    #[must_use]
    pub fn new(account_id: &AccountId, role: &RoleName) -> Self {
        Self(format!("arn:aws:iam::{account_id}:role/{role}"))
    }

    /// Returns the ARN as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoleArn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
