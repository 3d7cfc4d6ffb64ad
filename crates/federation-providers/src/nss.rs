// crates/federation-providers/src/nss.rs
// ============================================================================
// Module: NSS Group Source
// Description: Group membership via the system name service switch.
// Purpose: Reach SSSD and LDAP-backed directories through `id` and `getent`.
// Dependencies: federation-core, serde, tokio
// ============================================================================

//! ## Overview
//! Runs `<program> <args...> -- <principal>` (default `id -G`) to list the
//! principal's numeric group ids, then `<getent_program> <getent_args...>
//! <gid...>` (default `getent group`) to name them. Names are taken from the
//! first field of each group database line, so names containing spaces stay
//! whole.
//!
//! Security posture: the principal is passed as a single argument after `--`
//! and principals starting with `-` are rejected; no shell is involved. The
//! id listing must be purely numeric, and name lines are only accepted for
//! gids that were requested.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use async_trait::async_trait;
use federation_core::GroupLabel;
use federation_core::IdentityGroupSource;
use federation_core::Principal;
use federation_core::ProviderError;
use serde::Deserialize;
use tokio::process::Command;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// `getent` exit status when one or more keys were not found.
const GETENT_KEY_NOT_FOUND: i32 = 2;

/// Options for the `nss_groups` provider.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NssGroupsConfig {
    /// Program listing numeric group ids.
    #[serde(default = "default_program")]
    pub program: String,
    /// Arguments placed before `--` and the principal.
    #[serde(default = "default_args")]
    pub args: Vec<String>,
    /// Program mapping group ids to group database lines.
    #[serde(default = "default_getent_program")]
    pub getent_program: String,
    /// Arguments placed before the group ids.
    #[serde(default = "default_getent_args")]
    pub getent_args: Vec<String>,
}

impl Default for NssGroupsConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            args: default_args(),
            getent_program: default_getent_program(),
            getent_args: default_getent_args(),
        }
    }
}

/// Default id listing program.
fn default_program() -> String {
    "id".to_string()
}

/// Default id listing arguments (numeric supplementary groups).
fn default_args() -> Vec<String> {
    vec!["-G".to_string()]
}

/// Default group database lookup program.
fn default_getent_program() -> String {
    "getent".to_string()
}

/// Default group database lookup arguments.
fn default_getent_args() -> Vec<String> {
    vec!["group".to_string()]
}

// ============================================================================
// SECTION: Parsing
// ============================================================================

/// Parses the whitespace-separated id listing.
///
/// # Errors
///
/// Returns [`ProviderError::Unavailable`] when any token is not a group id.
pub fn parse_group_ids(output: &str) -> Result<BTreeSet<u32>, ProviderError> {
    output
        .split_whitespace()
        .map(|token| {
            token.parse::<u32>().map_err(|_| {
                ProviderError::Unavailable(format!("group listing returned a non-numeric id: '{token}'"))
            })
        })
        .collect()
}

/// Extracts group names from group database lines for the requested gids.
///
/// Lines are `name:passwd:gid:members`; malformed lines and lines for gids
/// that were not requested are skipped.
#[must_use]
pub fn parse_group_names(output: &str, requested: &BTreeSet<u32>) -> BTreeSet<GroupLabel> {
    output
        .lines()
        .filter_map(|line| {
            let mut fields = line.split(':');
            let name = fields.next()?;
            let gid = fields.nth(1)?.trim().parse::<u32>().ok()?;
            (!name.is_empty() && requested.contains(&gid)).then(|| GroupLabel::from(name))
        })
        .collect()
}

// ============================================================================
// SECTION: Source
// ============================================================================

/// Group source backed by NSS lookup commands.
pub struct NssGroupSource {
    /// Lookup commands.
    config: NssGroupsConfig,
}

impl NssGroupSource {
    /// Creates the source from its options.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Configuration`] when either program is empty.
    pub fn new(config: NssGroupsConfig) -> Result<Self, ProviderError> {
        if config.program.trim().is_empty() || config.getent_program.trim().is_empty() {
            return Err(ProviderError::Configuration(
                "nss_groups program and getent_program must not be empty".to_string(),
            ));
        }
        Ok(Self {
            config,
        })
    }

    /// Lists the principal's numeric group ids.
    async fn group_ids(&self, user: &str) -> Result<BTreeSet<u32>, ProviderError> {
        let output = Command::new(&self.config.program)
            .args(&self.config.args)
            .arg("--")
            .arg(user)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|err| {
                ProviderError::Unavailable(format!("failed to run {}: {err}", self.config.program))
            })?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ProviderError::Unavailable(format!(
                "group lookup for '{user}' failed ({}): {}",
                output.status,
                stderr.trim()
            )));
        }
        parse_group_ids(&String::from_utf8_lossy(&output.stdout))
    }

    /// Maps group ids to group names.
    async fn group_names(&self, gids: &BTreeSet<u32>) -> Result<BTreeSet<GroupLabel>, ProviderError> {
        let output = Command::new(&self.config.getent_program)
            .args(&self.config.getent_args)
            .args(gids.iter().map(u32::to_string))
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|err| {
                ProviderError::Unavailable(format!(
                    "failed to run {}: {err}",
                    self.config.getent_program
                ))
            })?;
        if !output.status.success() && output.status.code() != Some(GETENT_KEY_NOT_FOUND) {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ProviderError::Unavailable(format!(
                "group name lookup failed ({}): {}",
                output.status,
                stderr.trim()
            )));
        }
        let names = parse_group_names(&String::from_utf8_lossy(&output.stdout), gids);
        if names.len() < gids.len() {
            tracing::debug!(requested = gids.len(), named = names.len(), "some group ids have no name");
        }
        Ok(names)
    }
}

#[async_trait]
impl IdentityGroupSource for NssGroupSource {
    async fn group_list(
        &self,
        principal: &Principal,
    ) -> Result<BTreeSet<GroupLabel>, ProviderError> {
        let user = principal.as_str();
        if user.is_empty() || user.starts_with('-') {
            return Err(ProviderError::Unavailable(format!("invalid user name: '{user}'")));
        }
        let gids = self.group_ids(user).await?;
        if gids.is_empty() {
            return Ok(BTreeSet::new());
        }
        self.group_names(&gids).await
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only assertions.")]

    use super::*;

    #[test]
    fn group_ids_must_be_numeric() {
        assert_eq!(parse_group_ids(" 10 20\n10 ").unwrap(), BTreeSet::from([10, 20]));
        assert!(matches!(parse_group_ids("10 wheel"), Err(ProviderError::Unavailable(_))));
    }

    #[test]
    fn group_names_keep_spaces_and_skip_unrequested() {
        let output = "contractors aws-prod-admin:x:1001:\nbroken line\naws-ops-admin:*:4242:bob\n";
        let names = parse_group_names(output, &BTreeSet::from([1001]));
        assert_eq!(names, BTreeSet::from([GroupLabel::from("contractors aws-prod-admin")]));
    }
}
