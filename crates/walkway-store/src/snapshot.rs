//! Read-only ACL snapshot.
//!
//! A frozen copy of ACL state, e.g. for replicas or offline evaluation.
//! It implements [`AclReader`] only; there is no way to grant against it.

use std::collections::{BTreeMap, HashMap};

use walkway_core::{AccessLevel, AclEntry, AclScope, ArchetypeId};

use crate::error::Result;
use crate::traits::AclReader;

/// Immutable ACL side table.
#[derive(Debug, Clone, Default)]
pub struct SnapshotStore {
    acl: HashMap<ArchetypeId, BTreeMap<AclScope, AccessLevel>>,
}

impl SnapshotStore {
    /// Build a snapshot. Later entries for the same scope win.
    pub fn from_entries(entries: impl IntoIterator<Item = (ArchetypeId, AclEntry)>) -> Self {
        let mut acl: HashMap<ArchetypeId, BTreeMap<AclScope, AccessLevel>> = HashMap::new();
        for (id, entry) in entries {
            acl.entry(id).or_default().insert(entry.scope, entry.level);
        }
        Self { acl }
    }

    /// Number of archetypes with at least one entry.
    pub fn len(&self) -> usize {
        self.acl.len()
    }

    /// Returns `true` if the snapshot holds no entries.
    pub fn is_empty(&self) -> bool {
        self.acl.is_empty()
    }
}

impl AclReader for SnapshotStore {
    fn acl_entries(&self, archetype: &ArchetypeId) -> Result<Vec<AclEntry>> {
        Ok(self
            .acl
            .get(archetype)
            .map(|scopes| {
                scopes
                    .iter()
                    .map(|(scope, level)| AclEntry::new(*scope, *level))
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::traits::AclWriter;
    use walkway_core::RootId;

    #[test]
    fn test_snapshot_of_memory_store() {
        let store = MemoryStore::new();
        let node = ArchetypeId::generate();
        let root = RootId::generate();
        store
            .upsert_acl(&node, AclEntry::public(AccessLevel::Read))
            .unwrap();
        store
            .upsert_acl(&node, AclEntry::root(root, AccessLevel::Write))
            .unwrap();

        let snapshot = SnapshotStore::from_entries(store.export_acl().unwrap());
        assert_eq!(snapshot.len(), 1);
        assert_eq!(
            snapshot.acl_entries(&node).unwrap(),
            store.acl_entries(&node).unwrap()
        );

        // Later mutations do not leak into the snapshot.
        store.remove_acl(&node, &AclScope::Public).unwrap();
        assert_eq!(
            snapshot.acl_level(&node, &AclScope::Public).unwrap(),
            Some(AccessLevel::Read)
        );
    }
}
