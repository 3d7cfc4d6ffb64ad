// crates/federation-providers/src/local_groups.rs
// ============================================================================
// Module: Local Group Source
// Description: Group membership from a local group database file.
// Purpose: Resolve a principal's supplementary groups from `/etc/group`.
// Dependencies: federation-core, serde, tokio
// ============================================================================

//! ## Overview
//! Reads a file in the `name:passwd:gid:member,member` format and returns the
//! names of groups listing the principal as a member. Member names compare
//! case-insensitively. Malformed lines are skipped.
//!
//! Security posture: the file is re-read on every lookup; nothing is cached.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::path::PathBuf;

use async_trait::async_trait;
use federation_core::GroupLabel;
use federation_core::IdentityGroupSource;
use federation_core::Principal;
use federation_core::ProviderError;
use serde::Deserialize;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Options for the `local_groups` provider.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LocalGroupsConfig {
    /// Group database path.
    #[serde(default = "default_group_file")]
    pub group_file: PathBuf,
}

impl Default for LocalGroupsConfig {
    fn default() -> Self {
        Self {
            group_file: default_group_file(),
        }
    }
}

/// Default group database path.
fn default_group_file() -> PathBuf {
    PathBuf::from("/etc/group")
}

// ============================================================================
// SECTION: Source
// ============================================================================

/// Group source backed by a local group database file.
pub struct LocalGroupSource {
    /// Group file location.
    config: LocalGroupsConfig,
}

impl LocalGroupSource {
    /// Creates the source from its options.
    #[must_use]
    pub const fn new(config: LocalGroupsConfig) -> Self {
        Self {
            config,
        }
    }
}

#[async_trait]
impl IdentityGroupSource for LocalGroupSource {
    async fn group_list(
        &self,
        principal: &Principal,
    ) -> Result<BTreeSet<GroupLabel>, ProviderError> {
        let content = tokio::fs::read_to_string(&self.config.group_file).await.map_err(|err| {
            ProviderError::Unavailable(format!(
                "failed to read group file {}: {err}",
                self.config.group_file.display()
            ))
        })?;
        Ok(groups_for_member(&content, principal.as_str()))
    }
}

/// Returns the groups of a group database listing `member`.
#[must_use]
pub fn groups_for_member(content: &str, member: &str) -> BTreeSet<GroupLabel> {
    let member = member.to_lowercase();
    content
        .lines()
        .filter(|line| !line.trim_start().starts_with('#'))
        .filter_map(|line| {
            let fields: Vec<&str> = line.split(':').collect();
            let [name, _, _, members] = fields.as_slice() else {
                return None;
            };
            if name.is_empty() {
                return None;
            }
            members
                .split(',')
                .map(str::trim)
                .any(|candidate| !candidate.is_empty() && candidate.to_lowercase() == member)
                .then(|| GroupLabel::from(*name))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::groups_for_member;

    const GROUPS: &str = "\
root:x:0:
aws-prod-admin:x:1001:alice,Bob
aws-dev-readonly:x:1002: bob , carol
broken-line
# comment:x:1:bob
aws-test-admin:x:1003:bobby
";

    #[test]
    fn member_match_is_case_insensitive() {
        let groups = groups_for_member(GROUPS, "BOB");
        let names: Vec<&str> = groups.iter().map(|group| group.as_str()).collect();
        assert_eq!(names, ["aws-dev-readonly", "aws-prod-admin"]);
    }

    #[test]
    fn malformed_and_comment_lines_are_skipped() {
        assert!(groups_for_member("broken-line\n# c:x:1:dave\n", "dave").is_empty());
    }

    #[test]
    fn unknown_member_has_no_groups() {
        assert!(groups_for_member(GROUPS, "mallory").is_empty());
    }
}
