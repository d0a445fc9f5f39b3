//! Property-based tests using the `proptest` crate.
//!
//! These exercise the codec, the grant validation rules and the search
//! windowing over generated inputs.

use crate::{
    core::OrgAuthz,
    error::Error,
    grant::{NO_EXPIRY, OrgPermRequest},
    membership::dedup_roles,
    object::OrgType,
    permission::{self, PermissionValue},
    role::Role,
    search::{PageWindow, SearchParams, SearchRequest},
    storage::{DirectoryDepartment, DirectoryUser},
    subject::Subject,
};
use proptest::prelude::*;
use std::collections::BTreeSet;

fn org_type_strategy() -> impl Strategy<Value = OrgType> {
    prop_oneof![
        Just(OrgType::User),
        Just(OrgType::Department),
        Just(OrgType::Group),
    ]
}

fn role_token_strategy() -> impl Strategy<Value = &'static str> {
    prop::sample::select(Role::registry().entries().iter().map(|(token, _)| *token).collect::<Vec<_>>())
}

fn subject_type_strategy() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec!["realname", "app", "anonymous"])
}

/// Names that are not registered permission names.
fn unknown_name_strategy() -> impl Strategy<Value = String> {
    "[a-z_]{1,16}".prop_filter("must not be a registered name", |name| {
        !PermissionValue::registered_names().any(|known| known == name.as_str())
    })
}

fn name_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z]{1,12}"
}

proptest! {
    #[test]
    fn prop_encode_decode_roundtrip(names in prop::collection::vec(Just("read"), 0..4)) {
        let value = permission::encode(&names).unwrap();
        let decoded = permission::decode(value);
        let expected: BTreeSet<&str> = names.iter().copied().collect();
        prop_assert_eq!(decoded.into_iter().collect::<BTreeSet<_>>(), expected);
    }

    #[test]
    fn prop_unknown_names_rejected(known in prop::collection::vec(Just("read"), 0..3), unknown in unknown_name_strategy()) {
        let mut names: Vec<String> = known.iter().map(|n| n.to_string()).collect();
        names.push(unknown.clone());
        prop_assert_eq!(permission::encode(&names), Err(Error::InvalidPermissionName(unknown)));
    }

    #[test]
    fn prop_decode_ignores_unregistered_bits(raw in any::<u32>()) {
        let names = permission::decode(PermissionValue::from_raw(raw));
        prop_assert_eq!(names.contains(&"read"), raw & 1 == 1);
        prop_assert!(names.len() <= 1);
    }

    #[test]
    fn prop_set_is_all_or_nothing(
        subject_type in subject_type_strategy(),
        objects in prop::collection::btree_set(org_type_strategy(), 1..4),
        bad_index in any::<prop::sample::Index>(),
    ) {
        let authz = OrgAuthz::new();
        let objects: Vec<OrgType> = objects.into_iter().collect();
        let url: Vec<&str> = objects.iter().map(OrgType::as_str).collect();

        // Poison one record with an unknown permission name.
        let poisoned = bad_index.index(objects.len());
        let grants: Vec<OrgPermRequest> = objects
            .iter()
            .enumerate()
            .map(|(i, object)| {
                let perm = if i == poisoned { "write" } else { "read" };
                OrgPermRequest::new(object.as_str(), [perm])
            })
            .collect();

        let result = authz.set_org_perm("s1", subject_type, &url, &grants);
        prop_assert_eq!(result, Err(Error::InvalidPermissionName("write".to_string())));
        prop_assert_eq!(authz.storage().subject_count(), 0);

        // The same request without the poisoned record is stored in full.
        let clean: Vec<OrgPermRequest> = objects
            .iter()
            .map(|object| OrgPermRequest::new(object.as_str(), ["read"]))
            .collect();
        let rows = authz.set_org_perm("s1", subject_type, &url, &clean).unwrap();
        prop_assert_eq!(rows.len(), objects.len());
        prop_assert!(rows.iter().all(|row| row.end_time == NO_EXPIRY));

        let stored = authz.get_org_perms::<&str>("s1", subject_type, &[]).unwrap();
        prop_assert_eq!(stored.len(), objects.len());
    }

    #[test]
    fn prop_set_requires_matching_objects(
        url in prop::collection::btree_set(org_type_strategy(), 0..4),
        body in prop::collection::btree_set(org_type_strategy(), 0..4),
    ) {
        let authz = OrgAuthz::new();
        let url_tokens: Vec<&str> = url.iter().map(OrgType::as_str).collect();
        let grants: Vec<OrgPermRequest> = body
            .iter()
            .map(|object| OrgPermRequest::new(object.as_str(), ["read"]))
            .collect();

        let result = authz.set_org_perm("s1", "realname", &url_tokens, &grants);
        if url == body {
            prop_assert!(result.is_ok());
        } else {
            prop_assert!(matches!(result, Err(Error::ConsistencyViolation(_))));
            prop_assert_eq!(authz.storage().subject_count(), 0);
        }
    }

    #[test]
    fn prop_delete_tolerates_repeats(objects in prop::collection::vec(org_type_strategy(), 1..8)) {
        let authz = OrgAuthz::new();
        let all = [OrgType::User, OrgType::Department, OrgType::Group];
        let tokens: Vec<&str> = all.iter().map(OrgType::as_str).collect();
        let grants: Vec<OrgPermRequest> = all
            .iter()
            .map(|object| OrgPermRequest::new(object.as_str(), ["read"]))
            .collect();
        authz.set_org_perm("s1", "app", &tokens, &grants).unwrap();

        let doomed: Vec<&str> = objects.iter().map(OrgType::as_str).collect();
        authz.delete_org_perm("s1", "app", &doomed).unwrap();

        let remaining: BTreeSet<OrgType> = authz
            .get_org_perms::<&str>("s1", "app", &[])
            .unwrap()
            .into_iter()
            .map(|perm| perm.object)
            .collect();
        let removed: BTreeSet<OrgType> = objects.into_iter().collect();
        let expected: BTreeSet<OrgType> = all.into_iter().filter(|o| !removed.contains(o)).collect();
        prop_assert_eq!(remaining, expected);
    }

    #[test]
    fn prop_role_dedup_preserves_first_seen(tokens in prop::collection::vec(role_token_strategy(), 0..12)) {
        let roles = dedup_roles(&tokens).unwrap();

        let mut seen = Vec::new();
        for token in &tokens {
            let role = Role::parse(token).unwrap();
            if !seen.contains(&role) {
                seen.push(role);
            }
        }
        prop_assert_eq!(&roles, &seen);

        let authz = OrgAuthz::new();
        let resolved = authz.get_members_by_roles(&tokens).unwrap();
        prop_assert_eq!(resolved.iter().map(|entry| entry.role).collect::<Vec<_>>(), seen);
    }

    #[test]
    fn prop_limit_bounds(limit in -5i64..1100, offset in -5i64..50) {
        let request = SearchRequest::new("sys_admin", "a")
            .with_type("user")
            .with_limit(limit)
            .with_offset(offset);
        let result = SearchParams::validate(&request, false, 20, 1000);
        let valid = (1..=1000).contains(&limit) && offset >= 0;
        prop_assert_eq!(result.is_ok(), valid);
        if !valid {
            prop_assert!(matches!(result, Err(Error::InvalidRange { .. })), "unexpected {:?}", result);
        }
    }

    #[test]
    fn prop_page_window_totals(len in 0usize..60, offset in 0usize..80, limit in 1usize..30) {
        let page = PageWindow::new(offset, limit).page((0..len).collect::<Vec<_>>());
        prop_assert_eq!(page.total_count, len as u64);
        prop_assert_eq!(page.entries.len(), len.saturating_sub(offset).min(limit));
        prop_assert!(page.entries.iter().all(|i| *i >= offset));
    }

    #[test]
    fn prop_search_totals_are_independent(
        user_names in prop::collection::vec(name_strategy(), 0..15),
        depart_names in prop::collection::vec(name_strategy(), 0..15),
        limit in 1i64..10,
    ) {
        let authz = OrgAuthz::new();
        let storage = authz.storage();
        storage.assign_role(Role::SuperAdmin, "root");
        for (i, name) in user_names.iter().enumerate() {
            storage.add_user(DirectoryUser::new(format!("u{i}"), format!("x{name}")));
        }
        for (i, name) in depart_names.iter().enumerate() {
            storage.add_department(DirectoryDepartment::new(format!("d{i}"), format!("x{name}")));
        }

        let request = SearchRequest::new("super_admin", "x")
            .with_type("user")
            .with_type("department")
            .with_limit(limit);
        let result = authz.search_in_org_tree(&Subject::realname("root"), &request).unwrap();

        prop_assert_eq!(result.user_total(), user_names.len() as u64);
        prop_assert_eq!(result.depart_total(), depart_names.len() as u64);
        prop_assert!(result.user_entries().len() as i64 <= limit);
        prop_assert!(result.depart_entries().len() as i64 <= limit);
    }
}
