//! In-memory implementation of the store traits.
//!
//! Same semantics as SQLite, no persistence. Thread-safe via `RwLock`:
//! lookups share the read lock, every mutation holds the write lock for
//! its whole read-modify-write.

use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::debug;
use walkway_core::{
    AccessLevel, AclEntry, AclScope, ApiKeyId, Archetype, ArchetypeId, RootId, SecretHash,
};

use crate::error::{Result, StoreError};
use crate::traits::{
    AclReader, AclWriter, ApiKeyRecord, ApiKeyStore, ArchetypeDirectory, DeleteOutcome,
    UpsertOutcome,
};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    /// ACL side table: archetype -> scope -> level.
    acl: HashMap<ArchetypeId, BTreeMap<AclScope, AccessLevel>>,

    /// API keys indexed by id.
    keys: HashMap<ApiKeyId, ApiKeyRecord>,

    /// Index: secret hash -> key id.
    by_hash: HashMap<SecretHash, ApiKeyId>,

    /// Archetype reference records, standing in for the graph store.
    archetypes: HashMap<ArchetypeId, Archetype>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an archetype so its owner can be looked up.
    pub fn register_archetype(&self, archetype: Archetype) -> Result<()> {
        let mut inner = self.write()?;
        inner.archetypes.insert(archetype.id, archetype);
        Ok(())
    }

    /// Every `(archetype, entry)` pair currently stored.
    pub fn export_acl(&self) -> Result<Vec<(ArchetypeId, AclEntry)>> {
        let inner = self.read()?;
        Ok(inner
            .acl
            .iter()
            .flat_map(|(id, scopes)| {
                scopes
                    .iter()
                    .map(move |(scope, level)| (*id, AclEntry::new(*scope, *level)))
            })
            .collect())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryStoreInner>> {
        self.inner
            .read()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryStoreInner>> {
        self.inner
            .write()
            .map_err(|e| StoreError::Poisoned(e.to_string()))
    }
}

impl AclReader for MemoryStore {
    fn acl_entries(&self, archetype: &ArchetypeId) -> Result<Vec<AclEntry>> {
        let inner = self.read()?;
        Ok(inner
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

    fn acl_level(&self, archetype: &ArchetypeId, scope: &AclScope) -> Result<Option<AccessLevel>> {
        let inner = self.read()?;
        Ok(inner
            .acl
            .get(archetype)
            .and_then(|scopes| scopes.get(scope).copied()))
    }
}

impl AclWriter for MemoryStore {
    fn upsert_acl(&self, archetype: &ArchetypeId, entry: AclEntry) -> Result<UpsertOutcome> {
        let mut inner = self.write()?;
        let scopes = inner.acl.entry(*archetype).or_default();

        let outcome = match scopes.insert(entry.scope, entry.level) {
            None => UpsertOutcome::Inserted,
            Some(previous) if previous == entry.level => UpsertOutcome::Unchanged,
            Some(previous) => UpsertOutcome::Replaced { previous },
        };

        debug!(%archetype, scope = %entry.scope, level = %entry.level, ?outcome, "acl upsert");
        Ok(outcome)
    }

    fn remove_acl(&self, archetype: &ArchetypeId, scope: &AclScope) -> Result<Option<AccessLevel>> {
        let mut inner = self.write()?;

        let Some(scopes) = inner.acl.get_mut(archetype) else {
            return Ok(None);
        };
        let removed = scopes.remove(scope);
        if scopes.is_empty() {
            inner.acl.remove(archetype);
        }

        Ok(removed)
    }
}

impl ApiKeyStore for MemoryStore {
    fn insert_api_key(&self, record: &ApiKeyRecord) -> Result<()> {
        let mut inner = self.write()?;

        if inner.keys.contains_key(&record.id) || inner.by_hash.contains_key(&record.secret_hash) {
            return Err(StoreError::Duplicate(format!("api key {}", record.id)));
        }

        inner.by_hash.insert(record.secret_hash, record.id);
        inner.keys.insert(record.id, record.clone());
        Ok(())
    }

    fn api_key_by_hash(&self, hash: &SecretHash) -> Result<Option<ApiKeyRecord>> {
        let inner = self.read()?;
        Ok(inner
            .by_hash
            .get(hash)
            .and_then(|id| inner.keys.get(id))
            .cloned())
    }

    fn api_key(&self, id: &ApiKeyId) -> Result<Option<ApiKeyRecord>> {
        let inner = self.read()?;
        Ok(inner.keys.get(id).cloned())
    }

    fn api_keys_for(&self, root: &RootId) -> Result<Vec<ApiKeyRecord>> {
        let inner = self.read()?;
        let mut keys: Vec<ApiKeyRecord> = inner
            .keys
            .values()
            .filter(|k| &k.root == root)
            .cloned()
            .collect();
        keys.sort_by_key(|k| (k.created_at, k.id));
        Ok(keys)
    }

    fn delete_api_key(&self, id: &ApiKeyId, requester: &RootId) -> Result<DeleteOutcome> {
        let mut inner = self.write()?;

        let Some(record) = inner.keys.get(id) else {
            return Ok(DeleteOutcome::NotFound);
        };
        if &record.root != requester {
            return Ok(DeleteOutcome::NotOwner);
        }

        let hash = record.secret_hash;
        inner.keys.remove(id);
        inner.by_hash.remove(&hash);
        Ok(DeleteOutcome::Deleted)
    }
}

impl ArchetypeDirectory for MemoryStore {
    fn archetype(&self, id: &ArchetypeId) -> Result<Option<Archetype>> {
        let inner = self.read()?;
        Ok(inner.archetypes.get(id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(root: RootId, secret: &str, created_at: i64) -> ApiKeyRecord {
        ApiKeyRecord {
            id: ApiKeyId::derive(secret),
            root,
            name: secret.to_string(),
            secret_hash: SecretHash::of(secret),
            created_at,
            expires_at: None,
        }
    }

    #[test]
    fn test_upsert_replaces() {
        let store = MemoryStore::new();
        let node = ArchetypeId::generate();

        let r1 = store
            .upsert_acl(&node, AclEntry::public(AccessLevel::Read))
            .unwrap();
        assert_eq!(r1, UpsertOutcome::Inserted);

        let r2 = store
            .upsert_acl(&node, AclEntry::public(AccessLevel::Write))
            .unwrap();
        assert_eq!(
            r2,
            UpsertOutcome::Replaced {
                previous: AccessLevel::Read
            }
        );

        let r3 = store
            .upsert_acl(&node, AclEntry::public(AccessLevel::Write))
            .unwrap();
        assert_eq!(r3, UpsertOutcome::Unchanged);

        assert_eq!(
            store.acl_entries(&node).unwrap(),
            vec![AclEntry::public(AccessLevel::Write)]
        );
    }

    #[test]
    fn test_entries_public_first() {
        let store = MemoryStore::new();
        let node = ArchetypeId::generate();
        let root = RootId::generate();

        store
            .upsert_acl(&node, AclEntry::root(root, AccessLevel::Connect))
            .unwrap();
        store
            .upsert_acl(&node, AclEntry::public(AccessLevel::Read))
            .unwrap();

        let entries = store.acl_entries(&node).unwrap();
        assert_eq!(entries[0].scope, AclScope::Public);
        assert_eq!(entries[1].scope, AclScope::Root(root));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let store = MemoryStore::new();
        let node = ArchetypeId::generate();
        store
            .upsert_acl(&node, AclEntry::public(AccessLevel::Read))
            .unwrap();

        assert_eq!(
            store.remove_acl(&node, &AclScope::Public).unwrap(),
            Some(AccessLevel::Read)
        );
        assert_eq!(store.remove_acl(&node, &AclScope::Public).unwrap(), None);
        assert!(store.acl_entries(&node).unwrap().is_empty());
    }

    #[test]
    fn test_api_key_lifecycle() {
        let store = MemoryStore::new();
        let alice = RootId::generate();
        let bob = RootId::generate();
        let k = key(alice, "wk_a", 10);

        store.insert_api_key(&k).unwrap();
        assert!(matches!(
            store.insert_api_key(&k),
            Err(StoreError::Duplicate(_))
        ));

        assert_eq!(store.api_key_by_hash(&k.secret_hash).unwrap(), Some(k.clone()));
        assert_eq!(
            store.delete_api_key(&k.id, &bob).unwrap(),
            DeleteOutcome::NotOwner
        );
        assert_eq!(
            store.delete_api_key(&k.id, &alice).unwrap(),
            DeleteOutcome::Deleted
        );
        assert_eq!(
            store.delete_api_key(&k.id, &alice).unwrap(),
            DeleteOutcome::NotFound
        );
        assert_eq!(store.api_key_by_hash(&k.secret_hash).unwrap(), None);
    }

    #[test]
    fn test_keys_listed_oldest_first() {
        let store = MemoryStore::new();
        let alice = RootId::generate();
        store.insert_api_key(&key(alice, "wk_2", 20)).unwrap();
        store.insert_api_key(&key(alice, "wk_1", 10)).unwrap();
        store
            .insert_api_key(&key(RootId::generate(), "wk_x", 5))
            .unwrap();

        let names: Vec<String> = store
            .api_keys_for(&alice)
            .unwrap()
            .into_iter()
            .map(|k| k.name)
            .collect();
        assert_eq!(names, vec!["wk_1", "wk_2"]);
    }

    proptest::proptest! {
        #[test]
        fn test_acl_matches_model(ops in proptest::collection::vec((0u8..3, proptest::option::of(0usize..4)), 0..24)) {
            let store = MemoryStore::new();
            let node = ArchetypeId::generate();
            let scopes = [
                AclScope::Public,
                AclScope::Root(RootId::from_bytes([1; 16])),
                AclScope::Root(RootId::from_bytes([2; 16])),
            ];
            let mut model: BTreeMap<AclScope, AccessLevel> = BTreeMap::new();

            for (scope, level) in ops {
                let scope = scopes[scope as usize];
                match level {
                    Some(i) => {
                        let level = AccessLevel::ALL[i];
                        store.upsert_acl(&node, AclEntry::new(scope, level)).unwrap();
                        model.insert(scope, level);
                    }
                    None => {
                        let removed = store.remove_acl(&node, &scope).unwrap();
                        proptest::prop_assert_eq!(removed, model.remove(&scope));
                    }
                }
            }

            let mut entries = store.acl_entries(&node).unwrap();
            entries.sort_by_key(|e| e.scope);
            let expected: Vec<AclEntry> = model
                .into_iter()
                .map(|(scope, level)| AclEntry::new(scope, level))
                .collect();
            proptest::prop_assert_eq!(entries, expected);
        }
    }
}
