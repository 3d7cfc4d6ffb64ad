// crates/federation-providers/src/ldap.rs
// ============================================================================
// Module: LDAP Group Source
// Description: Transitive group membership from an Active Directory server.
// Purpose: Resolve a principal's groups without relying on host NSS setup.
// Dependencies: federation-core, ldap3, serde, tokio
// ============================================================================

//! ## Overview
//! Binds with a service DN, finds the user entry by `userPrincipalName`, and
//! searches groups whose `member` attribute contains the user's DN through
//! the in-chain matching rule (`1.2.840.113556.1.4.1941`), so nested
//! memberships are included. Each group contributes its `name` attribute.
//!
//! Security posture: every value placed in a search filter is escaped. StartTLS
//! is applied on request unless the URI already uses `ldaps`. Server
//! certificates are always verified.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use federation_core::GroupLabel;
use federation_core::IdentityGroupSource;
use federation_core::Principal;
use federation_core::ProviderError;
use ldap3::Ldap;
use ldap3::LdapConnAsync;
use ldap3::LdapConnSettings;
use ldap3::LdapError;
use ldap3::LdapResult;
use ldap3::Scope;
use ldap3::SearchEntry;
use ldap3::SearchResult;
use ldap3::ldap_escape;
use serde::Deserialize;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Matching rule OID for transitive (`LDAP_MATCHING_RULE_IN_CHAIN`) membership.
pub const IN_CHAIN_MATCHING_RULE: &str = "1.2.840.113556.1.4.1941";

/// Options for the `ldap` provider.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LdapGroupsConfig {
    /// Server URI (`ldap://` or `ldaps://`).
    pub ldap_uri: String,
    /// Search base for user entries.
    pub ldap_base_users: String,
    /// Search base for group entries.
    pub ldap_base_groups: String,
    /// Service account DN used for the simple bind.
    pub ldap_bind_dn: String,
    /// Service account password.
    pub ldap_bind_password: String,
    /// Upgrade `ldap://` connections with StartTLS.
    #[serde(default)]
    pub ldap_starttls: bool,
    /// Connect and per-operation timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub ldap_timeout_ms: u64,
}

impl fmt::Debug for LdapGroupsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LdapGroupsConfig")
            .field("ldap_uri", &self.ldap_uri)
            .field("ldap_base_users", &self.ldap_base_users)
            .field("ldap_base_groups", &self.ldap_base_groups)
            .field("ldap_bind_dn", &self.ldap_bind_dn)
            .field("ldap_bind_password", &"<redacted>")
            .field("ldap_starttls", &self.ldap_starttls)
            .field("ldap_timeout_ms", &self.ldap_timeout_ms)
            .finish()
    }
}

/// Default LDAP timeout.
const fn default_timeout_ms() -> u64 {
    5_000
}

// ============================================================================
// SECTION: Filters
// ============================================================================

/// Builds the user lookup filter; the user name is lowercased and escaped.
#[must_use]
pub fn user_filter(user: &str) -> String {
    format!("(&(objectClass=user)(userPrincipalName={}))", ldap_escape(user.to_lowercase()))
}

/// Builds the transitive group membership filter for a user DN.
#[must_use]
pub fn group_filter(user_dn: &str) -> String {
    format!("(&(objectClass=group)(member:{IN_CHAIN_MATCHING_RULE}:={}))", ldap_escape(user_dn))
}

/// Returns whether StartTLS applies to a URI.
#[must_use]
pub fn uses_starttls(uri: &str, requested: bool) -> bool {
    requested && !uri.to_ascii_lowercase().starts_with("ldaps:")
}

// ============================================================================
// SECTION: Source
// ============================================================================

/// Group source backed by an LDAP directory.
pub struct LdapGroupSource {
    /// Connection and search options.
    config: LdapGroupsConfig,
}

impl LdapGroupSource {
    /// Creates the source from its options.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Configuration`] when the URI scheme is not
    /// `ldap` or `ldaps`, a base or the bind DN is empty, or the timeout is zero.
    pub fn new(config: LdapGroupsConfig) -> Result<Self, ProviderError> {
        let uri = config.ldap_uri.to_ascii_lowercase();
        if !uri.starts_with("ldap://") && !uri.starts_with("ldaps://") {
            return Err(ProviderError::Configuration(format!(
                "ldap_uri must use ldap:// or ldaps://: {}",
                config.ldap_uri
            )));
        }
        for (key, value) in [
            ("ldap_base_users", &config.ldap_base_users),
            ("ldap_base_groups", &config.ldap_base_groups),
            ("ldap_bind_dn", &config.ldap_bind_dn),
        ] {
            if value.trim().is_empty() {
                return Err(ProviderError::Configuration(format!("{key} must not be empty")));
            }
        }
        if config.ldap_timeout_ms == 0 {
            return Err(ProviderError::Configuration(
                "ldap_timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            config,
        })
    }

    /// Returns the connect and per-operation timeout.
    const fn timeout(&self) -> Duration {
        Duration::from_millis(self.config.ldap_timeout_ms)
    }

    /// Opens a connection and spawns its driver task.
    async fn connect(&self) -> Result<Ldap, ProviderError> {
        let settings = LdapConnSettings::new()
            .set_conn_timeout(self.timeout())
            .set_starttls(uses_starttls(&self.config.ldap_uri, self.config.ldap_starttls));
        let (conn, ldap) = LdapConnAsync::with_settings(settings, &self.config.ldap_uri)
            .await
            .map_err(|err| unavailable(&format!("connect to {}", self.config.ldap_uri), &err))?;
        tokio::spawn(async move {
            if let Err(err) = conn.drive().await {
                tracing::warn!(error = %err, "ldap connection closed with an error");
            }
        });
        Ok(ldap)
    }

    /// Binds, finds the user DN, and collects transitive group names.
    async fn lookup(&self, ldap: &mut Ldap, user: &str) -> Result<BTreeSet<GroupLabel>, ProviderError> {
        let timeout = self.timeout();
        ldap.with_timeout(timeout)
            .simple_bind(&self.config.ldap_bind_dn, &self.config.ldap_bind_password)
            .await
            .and_then(LdapResult::success)
            .map_err(|err| unavailable("bind", &err))?;

        let filter = user_filter(user);
        tracing::debug!(%filter, "ldap user search");
        let (users, _) = ldap
            .with_timeout(timeout)
            .search(&self.config.ldap_base_users, Scope::Subtree, &filter, vec!["dn"])
            .await
            .and_then(SearchResult::success)
            .map_err(|err| unavailable("user search", &err))?;
        let user_dn = users
            .into_iter()
            .next()
            .map(|entry| SearchEntry::construct(entry).dn)
            .ok_or_else(|| ProviderError::Unavailable(format!("no LDAP entry for user '{user}'")))?;

        let filter = group_filter(&user_dn);
        tracing::debug!(%filter, "ldap group search");
        let (groups, _) = ldap
            .with_timeout(timeout)
            .search(&self.config.ldap_base_groups, Scope::Subtree, &filter, vec!["name"])
            .await
            .and_then(SearchResult::success)
            .map_err(|err| unavailable("group search", &err))?;
        Ok(groups
            .into_iter()
            .filter_map(|entry| {
                let mut entry = SearchEntry::construct(entry);
                entry.attrs.remove("name")?.into_iter().next()
            })
            .map(GroupLabel::from)
            .collect())
    }
}

/// Maps an LDAP failure to an unavailable identity source.
fn unavailable(operation: &str, err: &LdapError) -> ProviderError {
    ProviderError::Unavailable(format!("ldap {operation} failed: {err}"))
}

#[async_trait]
impl IdentityGroupSource for LdapGroupSource {
    async fn group_list(
        &self,
        principal: &Principal,
    ) -> Result<BTreeSet<GroupLabel>, ProviderError> {
        let user = principal.as_str().to_lowercase();
        let mut ldap = self.connect().await?;
        let result = self.lookup(&mut ldap, &user).await;
        if let Err(err) = ldap.unbind().await {
            tracing::debug!(error = %err, "ldap unbind failed");
        }
        result
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::group_filter;
    use super::user_filter;
    use super::uses_starttls;

    #[test]
    fn user_filter_lowercases_and_escapes() {
        assert_eq!(
            user_filter("MMuster@Example.COM"),
            "(&(objectClass=user)(userPrincipalName=mmuster@example.com))"
        );
        assert_eq!(
            user_filter("*)(objectClass=*"),
            "(&(objectClass=user)(userPrincipalName=\\2a\\29\\28objectclass=\\2a))"
        );
    }

    #[test]
    fn group_filter_uses_in_chain_rule_and_escapes_dn() {
        assert_eq!(
            group_filter("CN=Muster\\, Max (ext),OU=Users,DC=corp"),
            "(&(objectClass=group)(member:1.2.840.113556.1.4.1941:=\
             CN=Muster\\5c, Max \\28ext\\29,OU=Users,DC=corp))"
        );
    }

    #[test]
    fn starttls_is_skipped_for_ldaps() {
        assert!(uses_starttls("ldap://dc.example.com", true));
        assert!(!uses_starttls("ldaps://dc.example.com", true));
        assert!(!uses_starttls("LDAPS://dc.example.com", true));
        assert!(!uses_starttls("ldap://dc.example.com", false));
    }
}
