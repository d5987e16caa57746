//! Effective access computation.
//!
//! The free functions are pure: they take the owner and the ACL entries
//! and never touch storage. [`AccessEvaluator`] fetches both per call.

use tracing::warn;
use walkway_core::{AccessLevel, AclEntry, ArchetypeId, RootId};
use walkway_store::{AclReader, ArchetypeDirectory};

/// What a subject may do with one archetype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    /// May move across or through the object.
    pub traverse: bool,
    /// May read the object's content.
    pub read: bool,
    /// May mutate the object.
    pub write: bool,
}

impl Capabilities {
    /// Everything allowed.
    pub const OWNER: Self = Self {
        traverse: true,
        read: true,
        write: true,
    };

    /// Nothing allowed.
    pub const NONE: Self = Self {
        traverse: false,
        read: false,
        write: false,
    };

    /// Whether these capabilities satisfy `required`.
    ///
    /// `Connect` maps to traversal, `Read` to content, `Write` to mutation.
    pub fn permits(&self, required: AccessLevel) -> bool {
        match required {
            AccessLevel::NoAccess => true,
            AccessLevel::Read => self.read,
            AccessLevel::Connect => self.traverse,
            AccessLevel::Write => self.write,
        }
    }
}

/// Effective level of `subject` on an archetype owned by `owner`.
///
/// Owners get `Write`. Everyone else gets the maximum of `NoAccess` and
/// every applicable entry (`Public` and `Root(subject)`).
pub fn effective_level(subject: &RootId, owner: Option<&RootId>, entries: &[AclEntry]) -> AccessLevel {
    if owner == Some(subject) {
        return AccessLevel::Write;
    }

    entries
        .iter()
        .filter(|e| e.scope.applies_to(subject))
        .map(|e| e.level)
        .fold(AccessLevel::NoAccess, AccessLevel::max)
}

/// Per-operation capabilities of `subject`.
///
/// Traversal and mutation follow the effective level. Content reads need
/// ownership or an applicable grant that carries content (`Read` or
/// `Write`), so a `Connect`-only grant never exposes field values.
pub fn capabilities(subject: &RootId, owner: Option<&RootId>, entries: &[AclEntry]) -> Capabilities {
    if owner == Some(subject) {
        return Capabilities::OWNER;
    }

    let level = effective_level(subject, owner, entries);
    let read = entries
        .iter()
        .any(|e| e.scope.applies_to(subject) && e.level.grants_content());

    Capabilities {
        traverse: level >= AccessLevel::Connect,
        read,
        write: level >= AccessLevel::Write,
    }
}

/// Storage-backed evaluator consulted by the traversal engine.
///
/// Read-only and infallible from the caller's side: a storage failure is
/// logged and evaluates to no access.
pub struct AccessEvaluator<A, D> {
    acl: A,
    directory: D,
}

impl<A: AclReader, D: ArchetypeDirectory> AccessEvaluator<A, D> {
    /// Create an evaluator over an ACL reader and a graph directory.
    pub fn new(acl: A, directory: D) -> Self {
        Self { acl, directory }
    }

    /// The ACL reader.
    pub fn acl(&self) -> &A {
        &self.acl
    }

    /// The archetype directory.
    pub fn directory(&self) -> &D {
        &self.directory
    }

    /// Owner of an archetype, if the directory knows it.
    pub fn owner_of(&self, archetype: &ArchetypeId) -> Option<RootId> {
        match self.directory.archetype(archetype) {
            Ok(found) => found.map(|a| a.owner),
            Err(e) => {
                warn!(%archetype, error = %e, "owner lookup failed");
                None
            }
        }
    }

    fn entries(&self, archetype: &ArchetypeId) -> Option<Vec<AclEntry>> {
        match self.acl.acl_entries(archetype) {
            Ok(entries) => Some(entries),
            Err(e) => {
                warn!(%archetype, error = %e, "acl lookup failed, denying");
                None
            }
        }
    }

    /// Effective level of `subject` on `archetype`. Never fails.
    pub fn effective_level(&self, subject: &RootId, archetype: &ArchetypeId) -> AccessLevel {
        let owner = self.owner_of(archetype);
        if owner.as_ref() == Some(subject) {
            return AccessLevel::Write;
        }
        match self.entries(archetype) {
            Some(entries) => effective_level(subject, owner.as_ref(), &entries),
            None => AccessLevel::NoAccess,
        }
    }

    /// Per-operation capabilities of `subject` on `archetype`. Never fails.
    pub fn capabilities(&self, subject: &RootId, archetype: &ArchetypeId) -> Capabilities {
        let owner = self.owner_of(archetype);
        if owner.as_ref() == Some(subject) {
            return Capabilities::OWNER;
        }
        match self.entries(archetype) {
            Some(entries) => capabilities(subject, owner.as_ref(), &entries),
            None => Capabilities::NONE,
        }
    }

    /// Whether `subject` holds `required` on `archetype`.
    pub fn check_access(&self, subject: &RootId, archetype: &ArchetypeId, required: AccessLevel) -> bool {
        self.capabilities(subject, archetype).permits(required)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use walkway_core::AclScope;

    fn root(n: u8) -> RootId {
        RootId::from_bytes([n; 16])
    }

    fn level() -> impl Strategy<Value = AccessLevel> {
        prop::sample::select(AccessLevel::ALL.to_vec())
    }

    #[test]
    fn test_owner_gets_write() {
        let owner = root(1);
        let entries = vec![AclEntry::public(AccessLevel::NoAccess)];
        assert_eq!(
            effective_level(&owner, Some(&owner), &entries),
            AccessLevel::Write
        );
    }

    #[test]
    fn test_no_entries_is_no_access() {
        assert_eq!(effective_level(&root(2), Some(&root(1)), &[]), AccessLevel::NoAccess);
    }

    #[test]
    fn test_root_read_does_not_lower_public_write() {
        let subject = root(2);
        let entries = vec![
            AclEntry::public(AccessLevel::Write),
            AclEntry::root(subject, AccessLevel::Read),
        ];
        assert_eq!(
            effective_level(&subject, Some(&root(1)), &entries),
            AccessLevel::Write
        );
    }

    #[test]
    fn test_other_roots_entries_ignored() {
        let entries = vec![AclEntry::root(root(3), AccessLevel::Write)];
        assert_eq!(
            effective_level(&root(2), Some(&root(1)), &entries),
            AccessLevel::NoAccess
        );
    }

    #[test]
    fn test_connect_only_hides_content() {
        let subject = root(2);
        let entries = vec![AclEntry::public(AccessLevel::Connect)];
        let caps = capabilities(&subject, Some(&root(1)), &entries);
        assert!(caps.traverse);
        assert!(!caps.read);
        assert!(!caps.write);
        assert!(!caps.permits(AccessLevel::Read));
    }

    #[test]
    fn test_connect_plus_public_read_reads() {
        let subject = root(2);
        let entries = vec![
            AclEntry::public(AccessLevel::Read),
            AclEntry::root(subject, AccessLevel::Connect),
        ];
        let caps = capabilities(&subject, Some(&root(1)), &entries);
        assert!(caps.read);
        assert!(caps.traverse);
        assert!(!caps.write);
    }

    #[test]
    fn test_read_only_grant_does_not_traverse() {
        let caps = capabilities(
            &root(2),
            Some(&root(1)),
            &[AclEntry::public(AccessLevel::Read)],
        );
        assert!(caps.read);
        assert!(!caps.traverse);
    }

    proptest! {
        #[test]
        fn test_effective_level_is_max_of_applicable(public in proptest::option::of(level()), own in proptest::option::of(level())) {
            let subject = root(2);
            let mut entries = Vec::new();
            if let Some(l) = public {
                entries.push(AclEntry::public(l));
            }
            if let Some(l) = own {
                entries.push(AclEntry::new(AclScope::Root(subject), l));
            }

            let expected = public
                .into_iter()
                .chain(own)
                .fold(AccessLevel::NoAccess, AccessLevel::max);
            prop_assert_eq!(effective_level(&subject, Some(&root(1)), &entries), expected);
        }

        #[test]
        fn test_raising_public_never_lowers(before in level(), after in level(), own in proptest::option::of(level())) {
            prop_assume!(after >= before);
            let subject = root(2);
            let mut low = vec![AclEntry::public(before)];
            let mut high = vec![AclEntry::public(after)];
            if let Some(l) = own {
                low.push(AclEntry::root(subject, l));
                high.push(AclEntry::root(subject, l));
            }
            prop_assert!(
                effective_level(&subject, Some(&root(1)), &high)
                    >= effective_level(&subject, Some(&root(1)), &low)
            );
        }

        #[test]
        fn test_owner_always_write(entries in proptest::collection::vec(level(), 0..4)) {
            let owner = root(1);
            let acl: Vec<AclEntry> = entries
                .into_iter()
                .enumerate()
                .map(|(i, l)| if i == 0 { AclEntry::public(l) } else { AclEntry::root(root(i as u8 + 1), l) })
                .collect();
            prop_assert_eq!(effective_level(&owner, Some(&owner), &acl), AccessLevel::Write);
        }
    }
}
