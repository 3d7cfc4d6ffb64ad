// crates/federation-core/src/runtime/resolver.rs
// ============================================================================
// Module: Group Regex Resolver
// Description: Turns raw group labels into account/role permissions.
// Purpose: Apply a configured, anchored pattern to untrusted directory groups.
// Dependencies: regex, tracing, crate::core
// ============================================================================

//! ## Overview
//! [`GroupRegexResolver`] applies a single pattern with the named captures
//! `account` and `role` to every group label of a principal. Matching groups
//! become permission entries; non-matching groups are skipped with a trace.
//! Invariants:
//! - The pattern is anchored at both ends before compilation.
//! - Missing named captures are rejected at construction time.
//! - Matching is case-sensitive unless the pattern itself says otherwise.
//! - The resulting registry does not depend on group order.
//!
//! Security posture: an unanchored pattern could authorize an account or role
//! through a partial match on a crafted group name; see [`anchor_pattern`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use async_trait::async_trait;
use regex::Regex;

use crate::core::GroupLabel;
use crate::core::PermissionEntry;
use crate::core::PermissionRegistry;
use crate::core::Principal;
use crate::interfaces::IdentityGroupSource;
use crate::interfaces::PermissionProvider;
use crate::interfaces::ProviderError;
use crate::runtime::error::FederationError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Named capture holding the account alias.
pub const ACCOUNT_CAPTURE: &str = "account";
/// Named capture holding the role name.
pub const ROLE_CAPTURE: &str = "role";

// ============================================================================
// SECTION: Anchoring
// ============================================================================

/// Anchors a pattern with `^` and `$` unless already present.
///
/// The operation is idempotent: anchoring an anchored pattern returns it
/// unchanged.
#[must_use]
pub fn anchor_pattern(pattern: &str) -> String {
    let mut anchored = String::with_capacity(pattern.len() + 2);
    if !pattern.starts_with('^') {
        anchored.push('^');
    }
    anchored.push_str(pattern);
    if !pattern.ends_with('$') {
        anchored.push('$');
    }
    anchored
}

// ============================================================================
// SECTION: Resolver
// ============================================================================

/// Resolves group labels into a permission registry with a named-capture pattern.
///
/// # Invariants
/// - `regex` is compiled from the anchored form of the configured pattern.
/// - `regex` always exposes the `account` and `role` captures.
#[derive(Debug, Clone)]
pub struct GroupRegexResolver {
    /// Compiled, anchored pattern.
    regex: Regex,
}

impl GroupRegexResolver {
    /// Compiles and validates a group pattern.
    ///
    /// # Errors
    ///
    /// Returns [`FederationError::Configuration`] when the pattern is empty,
    /// fails to compile, or lacks the `account` or `role` capture.
    pub fn new(pattern: &str) -> Result<Self, FederationError> {
        if pattern.trim().is_empty() {
            return Err(FederationError::Configuration(
                "group pattern must not be empty".to_string(),
            ));
        }
        let anchored = anchor_pattern(pattern);
        let regex = Regex::new(&anchored).map_err(|err| {
            FederationError::Configuration(format!("invalid group pattern \"{anchored}\": {err}"))
        })?;
        let names: BTreeSet<&str> = regex.capture_names().flatten().collect();
        for required in [ACCOUNT_CAPTURE, ROLE_CAPTURE] {
            if !names.contains(required) {
                return Err(FederationError::Configuration(format!(
                    "group pattern \"{anchored}\" is missing the named capture \"{required}\""
                )));
            }
        }
        Ok(Self {
            regex,
        })
    }

    /// Returns the anchored pattern text.
    #[must_use]
    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    /// Matches a single group label, returning the derived entry when it matches.
    #[must_use]
    pub fn match_group(&self, group: &GroupLabel) -> Option<PermissionEntry> {
        let captures = self.regex.captures(group.as_str())?;
        let account = captures.name(ACCOUNT_CAPTURE)?.as_str();
        let role = captures.name(ROLE_CAPTURE)?.as_str();
        let reason = format!(
            "user is in group \"{group}\" which matches regexp \"{}\"",
            self.regex.as_str()
        );
        Some(PermissionEntry::new(account, role, reason))
    }

    /// Resolves every group label of a principal into a registry.
    pub fn resolve<'a, I>(&self, principal: &Principal, groups: I) -> PermissionRegistry
    where
        I: IntoIterator<Item = &'a GroupLabel>,
    {
        groups
            .into_iter()
            .filter_map(|group| {
                let entry = self.match_group(group);
                match &entry {
                    Some(entry) => tracing::debug!(
                        principal = %principal,
                        account = %entry.account,
                        role = %entry.role,
                        reason = %entry.reason,
                        "group grants access"
                    ),
                    None => tracing::debug!(
                        principal = %principal,
                        group = %group,
                        pattern = %self.regex.as_str(),
                        "group did not match pattern"
                    ),
                }
                entry
            })
            .collect()
    }
}

// ============================================================================
// SECTION: Group Permission Provider
// ============================================================================

/// Permission provider combining a group source with a regex resolver.
pub struct GroupPermissionProvider<S> {
    /// Backend returning raw group labels.
    source: S,
    /// Pattern applied to each group label.
    resolver: GroupRegexResolver,
}

impl<S: IdentityGroupSource> GroupPermissionProvider<S> {
    /// Creates a provider from a group source and a compiled resolver.
    #[must_use]
    pub const fn new(source: S, resolver: GroupRegexResolver) -> Self {
        Self {
            source,
            resolver,
        }
    }

    /// Returns the resolver in use.
    #[must_use]
    pub const fn resolver(&self) -> &GroupRegexResolver {
        &self.resolver
    }
}

#[async_trait]
impl<S: IdentityGroupSource> PermissionProvider for GroupPermissionProvider<S> {
    async fn accounts_and_roles(
        &self,
        principal: &Principal,
    ) -> Result<PermissionRegistry, ProviderError> {
        let groups = self.source.group_list(principal).await?;
        Ok(self.resolver.resolve(principal, &groups))
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::anchor_pattern;

    #[test]
    fn anchor_adds_both_anchors() {
        assert_eq!(anchor_pattern("a-(?P<role>.*)"), "^a-(?P<role>.*)$");
    }

    #[test]
    fn anchor_keeps_existing_anchors() {
        assert_eq!(anchor_pattern("^abc$"), "^abc$");
        assert_eq!(anchor_pattern("^abc"), "^abc$");
        assert_eq!(anchor_pattern("abc$"), "^abc$");
    }

    #[test]
    fn anchor_handles_empty_pattern() {
        assert_eq!(anchor_pattern(""), "^$");
        assert_eq!(anchor_pattern(&anchor_pattern("")), "^$");
    }
}
