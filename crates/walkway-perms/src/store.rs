//! Grant and revoke operations over an ACL backend.

use tracing::{debug, info};
use walkway_core::{AccessLevel, AclEntry, AclScope, ArchetypeId, RootId};
use walkway_store::{AclWriter, UpsertOutcome};

use crate::error::Result;

/// Durable mapping from `(archetype, scope)` to access level.
///
/// Every method is one atomic backend call; there is nothing to roll back
/// if the caller is cancelled around it.
pub struct PermissionStore<W> {
    backend: W,
}

impl<W: AclWriter> PermissionStore<W> {
    /// Wrap an ACL backend.
    pub fn new(backend: W) -> Self {
        Self { backend }
    }

    /// The underlying backend.
    pub fn backend(&self) -> &W {
        &self.backend
    }

    /// Upsert one entry. Repeating a grant replaces its level.
    pub fn grant(
        &self,
        archetype: &ArchetypeId,
        scope: AclScope,
        level: AccessLevel,
    ) -> Result<UpsertOutcome> {
        let outcome = self.backend.upsert_acl(archetype, AclEntry::new(scope, level))?;
        debug!(%archetype, %scope, %level, ?outcome, "granted");
        Ok(outcome)
    }

    /// Remove the entry for `scope`. Revoking an absent entry is a no-op.
    pub fn revoke(&self, archetype: &ArchetypeId, scope: &AclScope) -> Result<()> {
        if let Some(previous) = self.backend.remove_acl(archetype, scope)? {
            info!(%archetype, %scope, %previous, "revoked");
        }
        Ok(())
    }

    /// Grant `level` to everyone.
    pub fn set_public(&self, archetype: &ArchetypeId, level: AccessLevel) -> Result<UpsertOutcome> {
        self.grant(archetype, AclScope::Public, level)
    }

    /// Remove the public grant.
    pub fn unset_public(&self, archetype: &ArchetypeId) -> Result<()> {
        self.revoke(archetype, &AclScope::Public)
    }

    /// Grant `level` to one root.
    pub fn allow_root(
        &self,
        archetype: &ArchetypeId,
        root: RootId,
        level: AccessLevel,
    ) -> Result<UpsertOutcome> {
        self.grant(archetype, AclScope::Root(root), level)
    }

    /// Remove the grant for one root.
    ///
    /// The whole entry goes regardless of `level`; the subject falls back
    /// to whatever other grants still apply.
    pub fn disallow_root(&self, archetype: &ArchetypeId, root: RootId, level: AccessLevel) -> Result<()> {
        debug!(%archetype, %root, %level, "disallow root");
        self.revoke(archetype, &AclScope::Root(root))
    }

    /// Current entries: `Public` first, then roots by id.
    pub fn entries(&self, archetype: &ArchetypeId) -> Result<Vec<AclEntry>> {
        Ok(self.backend.acl_entries(archetype)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use walkway_store::MemoryStore;

    #[test]
    fn test_grant_is_replacing_upsert() {
        let perms = PermissionStore::new(MemoryStore::new());
        let node = ArchetypeId::generate();

        perms.grant(&node, AclScope::Public, AccessLevel::Read).unwrap();
        perms.grant(&node, AclScope::Public, AccessLevel::Write).unwrap();

        assert_eq!(
            perms.entries(&node).unwrap(),
            vec![AclEntry::public(AccessLevel::Write)]
        );
    }

    #[test]
    fn test_revoke_twice_same_as_once() {
        let perms = PermissionStore::new(MemoryStore::new());
        let node = ArchetypeId::generate();
        let root = RootId::generate();

        perms.allow_root(&node, root, AccessLevel::Write).unwrap();
        perms.set_public(&node, AccessLevel::Read).unwrap();

        perms.revoke(&node, &AclScope::Root(root)).unwrap();
        let once = perms.entries(&node).unwrap();
        perms.revoke(&node, &AclScope::Root(root)).unwrap();
        assert_eq!(perms.entries(&node).unwrap(), once);
        assert_eq!(once, vec![AclEntry::public(AccessLevel::Read)]);
    }

    #[test]
    fn test_revoke_on_unknown_archetype_is_ok() {
        let perms = PermissionStore::new(MemoryStore::new());
        perms.unset_public(&ArchetypeId::generate()).unwrap();
    }
}
