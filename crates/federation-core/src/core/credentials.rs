// crates/federation-core/src/core/credentials.rs
// ============================================================================
// Module: Federation Credentials
// Description: Temporary credentials and console sign-in values.
// Purpose: Carry token-service output through a single request/response cycle.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! [`Credentials`] are minted per request by the token service and are never
//! cached. [`ConsoleSigninUrl`] values embed a single-use sign-in token that
//! expires 15 minutes after issue, so callers must not cache them either.
//!
//! Security posture: secret material is redacted from `Debug` output.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;

// ============================================================================
// SECTION: Credentials
// ============================================================================

/// Temporary credentials returned by the token service.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Access key identifier.
    pub access_key_id: String,
    /// Secret access key.
    pub secret_access_key: String,
    /// Session token bound to the access key.
    pub session_token: String,
    /// Expiration instant of the credentials.
    #[serde(with = "time::serde::rfc3339")]
    pub expiration: OffsetDateTime,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &"<redacted>")
            .field("expiration", &self.expiration)
            .finish()
    }
}

// ============================================================================
// SECTION: Sign-In Session
// ============================================================================

/// Session document exchanged for a console sign-in token.
///
/// # Invariants
/// - Serializes to exactly three keys in the order `sessionId`, `sessionKey`,
///   `sessionToken`.
#[derive(Clone, Serialize)]
pub struct SigninSession<'a> {
    /// Access key identifier.
    #[serde(rename = "sessionId")]
    pub session_id: &'a str,
    /// Secret access key.
    #[serde(rename = "sessionKey")]
    pub session_key: &'a str,
    /// Session token.
    #[serde(rename = "sessionToken")]
    pub session_token: &'a str,
}

impl<'a> From<&'a Credentials> for SigninSession<'a> {
    fn from(credentials: &'a Credentials) -> Self {
        Self {
            session_id: &credentials.access_key_id,
            session_key: &credentials.secret_access_key,
            session_token: &credentials.session_token,
        }
    }
}

// ============================================================================
// SECTION: Console URL
// ============================================================================

/// Time-limited console sign-in URL.
///
/// # Invariants
/// - Valid for at most 15 minutes after the embedded token was issued.
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ConsoleSigninUrl(String);

impl ConsoleSigninUrl {
    /// Wraps an already formatted console URL.
    #[must_use]
    pub const fn new(url: String) -> Self {
        Self(url)
    }

    /// Returns the URL as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the wrapper and returns the URL string.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ConsoleSigninUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Debug for ConsoleSigninUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ConsoleSigninUrl(<redacted>)")
    }
}
