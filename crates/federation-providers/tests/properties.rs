// crates/federation-providers/tests/properties.rs
// ============================================================================
// Module: Provider Parsing Properties
// Description: Generated inputs for group database and host name parsing.
// ============================================================================
//! ## Overview
//! Checks the pure parsing helpers behind the group and host providers over
//! generated group databases and host names.

#![allow(clippy::unwrap_used, reason = "Tests use unwrap on deterministic fixtures.")]

use std::collections::BTreeSet;

use federation_core::GroupLabel;
use federation_providers::host::normalize_location_type;
use federation_providers::local_groups::groups_for_member;
use federation_providers::nss::parse_group_names;
use proptest::prelude::*;

fn group_file(entries: &[(String, Vec<String>)]) -> String {
    entries
        .iter()
        .enumerate()
        .map(|(gid, (name, members))| format!("{name}:x:{gid}:{}\n", members.join(",")))
        .collect()
}

proptest! {
    #[test]
    fn host_roles_keep_six_characters(host in "[a-z0-9]{8}") {
        let normalized = normalize_location_type(&host);
        prop_assert_eq!(normalized.chars().count(), 6);
        if host.starts_with("ber") || host.starts_with("ham") {
            prop_assert_eq!(normalized, format!("pro{}", &host[3..6]));
        } else {
            prop_assert_eq!(normalized, &host[..6]);
        }
    }

    #[test]
    fn member_lookup_matches_listed_groups(
        entries in proptest::collection::vec(
            ("[a-z]{1,6}(-[a-z]{1,4})?", proptest::collection::vec("[a-z]{1,5}", 0..4)),
            0..10,
        ),
        member in "[a-z]{1,5}",
    ) {
        let content = group_file(&entries);
        let expected: BTreeSet<GroupLabel> = entries
            .iter()
            .filter(|(_, members)| members.contains(&member))
            .map(|(name, _)| GroupLabel::from(name.as_str()))
            .collect();
        prop_assert_eq!(&groups_for_member(&content, &member), &expected);
        prop_assert_eq!(&groups_for_member(&content, &member.to_uppercase()), &expected);
    }

    #[test]
    fn group_names_are_taken_whole_for_requested_ids(
        entries in proptest::collection::vec(("[a-z][a-z ]{0,10}", 0u32..50), 0..10),
        requested in proptest::collection::btree_set(0u32..50, 0..10),
    ) {
        let output: String =
            entries.iter().map(|(name, gid)| format!("{name}:x:{gid}:\n")).collect();
        let expected: BTreeSet<GroupLabel> = entries
            .iter()
            .filter(|(_, gid)| requested.contains(gid))
            .map(|(name, _)| GroupLabel::from(name.as_str()))
            .collect();
        prop_assert_eq!(parse_group_names(&output, &requested), expected);
    }
}
