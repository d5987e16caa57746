//! Proptest generators for property-based testing.

use proptest::prelude::*;

use walkway_core::{AccessLevel, AclEntry, AclScope, ArchetypeId, RootId};

/// Generate a random RootId.
pub fn root_id() -> impl Strategy<Value = RootId> {
    any::<[u8; 16]>().prop_map(RootId::from_bytes)
}

/// Generate a random ArchetypeId.
pub fn archetype_id() -> impl Strategy<Value = ArchetypeId> {
    any::<[u8; 16]>().prop_map(ArchetypeId::from_bytes)
}

/// Generate any access level.
pub fn access_level() -> impl Strategy<Value = AccessLevel> {
    prop::sample::select(AccessLevel::ALL.to_vec())
}

/// Generate `Public` or a root scope drawn from `roots`.
pub fn scope_among(roots: Vec<RootId>) -> impl Strategy<Value = AclScope> {
    let root = prop::sample::select(roots).prop_map(AclScope::Root);
    prop_oneof![1 => Just(AclScope::Public), 3 => root]
}

/// Generate an ACL of up to `max` entries, at most one per scope.
pub fn acl(max: usize) -> impl Strategy<Value = Vec<AclEntry>> {
    prop::collection::btree_map(
        prop_oneof![Just(AclScope::Public), root_id().prop_map(AclScope::Root)],
        access_level(),
        0..=max,
    )
    .prop_map(|scopes| {
        scopes
            .into_iter()
            .map(|(scope, level)| AclEntry::new(scope, level))
            .collect()
    })
}

/// One grant-management step.
#[derive(Debug, Clone)]
pub enum AclOp {
    Grant(AclScope, AccessLevel),
    Revoke(AclScope),
}

/// Generate a sequence of grant/revoke steps over a small set of roots.
pub fn acl_ops(roots: Vec<RootId>, max: usize) -> impl Strategy<Value = Vec<AclOp>> {
    let op = prop_oneof![
        3 => (scope_among(roots.clone()), access_level()).prop_map(|(s, l)| AclOp::Grant(s, l)),
        1 => scope_among(roots).prop_map(AclOp::Revoke),
    ];
    prop::collection::vec(op, 0..=max)
}

/// Generate raw request body bytes of at least one byte.
pub fn body(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 1..=max_len.max(1))
}

/// Generate a walker name usable as a path segment.
pub fn walker_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,23}".prop_map(String::from)
}
