// crates/federation-core/src/runtime/exchange.rs
// ============================================================================
// Module: Credential Exchanger
// Description: Role assumption and console sign-in URL construction.
// Purpose: Turn an allowed (account, role) pair into temporary credentials.
// Dependencies: serde_json, url, crate::interfaces
// ============================================================================

//! ## Overview
//! [`CredentialExchanger`] resolves an account alias to its numeric id, builds
//! the role ARN, and asks the token service for credentials with the principal
//! as session name. It can also convert credentials into a console sign-in
//! URL through the sign-in token endpoint.
//! Invariants:
//! - One token-service call per exchange; no retries.
//! - A missing account alias is a configuration error, never a denial.
//! - Console URL parameters appear in the fixed order `Action`, `Issuer`,
//!   `Destination`, `SigninToken`.
//!
//! Security posture: credentials pass through and are never stored.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;

use url::form_urlencoded;

use crate::core::AccountAlias;
use crate::core::AccountId;
use crate::core::ConsoleSigninUrl;
use crate::core::Credentials;
use crate::core::Principal;
use crate::core::RoleArn;
use crate::core::RoleName;
use crate::core::SigninSession;
use crate::interfaces::AssumeRoleRequest;
use crate::interfaces::SigninTokenService;
use crate::interfaces::TokenService;
use crate::interfaces::TokenServiceError;
use crate::runtime::error::FederationError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Console federation endpoint used for the final login URL.
pub const CONSOLE_FEDERATION_URL: &str = "https://signin.aws.amazon.com/federation";
/// Fixed console destination embedded in every login URL.
pub const CONSOLE_DESTINATION: &str = "https://console.aws.amazon.com/";

// ============================================================================
// SECTION: Account Directory
// ============================================================================

/// Account alias to numeric id table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountDirectory {
    /// Account ids keyed by alias.
    ids: BTreeMap<AccountAlias, AccountId>,
}

impl AccountDirectory {
    /// Creates a directory from an alias to id map.
    #[must_use]
    pub const fn new(ids: BTreeMap<AccountAlias, AccountId>) -> Self {
        Self {
            ids,
        }
    }

    /// Returns the id configured for an alias.
    #[must_use]
    pub fn id(&self, alias: &AccountAlias) -> Option<&AccountId> {
        self.ids.get(alias)
    }

    /// Returns the number of configured accounts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns true when no accounts are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl FromIterator<(AccountAlias, AccountId)> for AccountDirectory {
    fn from_iter<I: IntoIterator<Item = (AccountAlias, AccountId)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

// ============================================================================
// SECTION: Encoding Helpers
// ============================================================================

/// Form-encodes a query value, spaces as `+` and every reserved byte
/// (including `*`) percent-encoded.
#[must_use]
pub fn encode_query_value(value: &str) -> String {
    let encoded: String = form_urlencoded::byte_serialize(value.as_bytes()).collect();
    encoded.replace('*', "%2A")
}

/// Serializes the sign-in session document and form-encodes it.
///
/// # Errors
///
/// Returns [`FederationError::Configuration`] when serialization fails.
pub fn encode_signin_session(credentials: &Credentials) -> Result<String, FederationError> {
    let json = serde_json::to_string(&SigninSession::from(credentials)).map_err(|err| {
        FederationError::Configuration(format!("failed to encode sign-in session: {err}"))
    })?;
    Ok(encode_query_value(&json))
}

/// Builds the console login URL from a sign-in token and a callback URL.
#[must_use]
pub fn build_console_url(signin_token: &str, callback_url: &str) -> ConsoleSigninUrl {
    let issuer = encode_query_value(callback_url);
    let destination = encode_query_value(CONSOLE_DESTINATION);
    ConsoleSigninUrl::new(format!(
        "{CONSOLE_FEDERATION_URL}?Action=login&Issuer={issuer}&Destination={destination}&SigninToken={signin_token}"
    ))
}

// ============================================================================
// SECTION: Exchanger
// ============================================================================

/// Exchanges authorized requests for credentials and console URLs.
#[derive(Clone)]
pub struct CredentialExchanger {
    /// Role assumption backend.
    token_service: Arc<dyn TokenService>,
    /// Sign-in token backend.
    signin: Arc<dyn SigninTokenService>,
    /// Alias to account id table.
    accounts: AccountDirectory,
}

impl CredentialExchanger {
    /// Creates an exchanger.
    #[must_use]
    pub fn new(
        token_service: Arc<dyn TokenService>,
        signin: Arc<dyn SigninTokenService>,
        accounts: AccountDirectory,
    ) -> Self {
        Self {
            token_service,
            signin,
            accounts,
        }
    }

    /// Returns the account directory.
    #[must_use]
    pub const fn accounts(&self) -> &AccountDirectory {
        &self.accounts
    }

    /// Builds the role ARN for an alias and role.
    ///
    /// # Errors
    ///
    /// Returns [`FederationError::Configuration`] naming the alias when it is
    /// not in the account directory.
    pub fn role_arn(&self, account: &AccountAlias, role: &RoleName) -> Result<RoleArn, FederationError> {
        let id = self.accounts.id(account).ok_or_else(|| {
            FederationError::Configuration(format!("No AWS account configured for '{account}'"))
        })?;
        Ok(RoleArn::new(id, role))
    }

    /// Assumes `role` in `account` on behalf of `principal`.
    ///
    /// # Errors
    ///
    /// Returns [`FederationError::Configuration`] for an unknown alias and
    /// [`FederationError::Aws`] when the token service fails.
    pub async fn exchange(
        &self,
        principal: &Principal,
        account: &AccountAlias,
        role: &RoleName,
    ) -> Result<Credentials, FederationError> {
        let request = AssumeRoleRequest {
            role_arn: self.role_arn(account, role)?,
            session_name: principal.as_str().to_string(),
        };
        tracing::debug!(role_arn = %request.role_arn, session = %request.session_name, "assuming role");
        Ok(self.token_service.assume_role(&request).await?)
    }

    /// Converts credentials into a console sign-in URL.
    ///
    /// # Errors
    ///
    /// Returns [`FederationError::Aws`] when the sign-in endpoint fails.
    pub async fn console_url(
        &self,
        credentials: &Credentials,
        callback_url: &str,
    ) -> Result<ConsoleSigninUrl, FederationError> {
        let session = encode_signin_session(credentials)?;
        let token = self.signin.signin_token(&session).await?;
        if token.is_empty() {
            return Err(TokenServiceError::transport("sign-in endpoint returned an empty token").into());
        }
        Ok(build_console_url(&token, callback_url))
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
