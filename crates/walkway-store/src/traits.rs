//! Backend traits: the abstract interfaces for ACL and API key persistence.
//!
//! The traits are split by capability. A backend that cannot mutate ACLs
//! simply does not implement [`AclWriter`].

use std::sync::Arc;

use walkway_core::{AccessLevel, AclEntry, AclScope, ApiKeyId, Archetype, ArchetypeId, RootId, SecretHash};

use crate::error::Result;

/// Result of upserting an ACL entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// No entry existed for the scope.
    Inserted,
    /// An entry existed and its level was replaced.
    Replaced {
        /// The level before the upsert.
        previous: AccessLevel,
    },
    /// An entry existed with the same level.
    Unchanged,
}

/// Result of deleting an API key on behalf of a requester.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The key existed, was owned by the requester, and is gone.
    Deleted,
    /// No key with that id exists.
    NotFound,
    /// The key exists but belongs to another root. Nothing was deleted.
    NotOwner,
}

/// A persisted API key. The plaintext secret is never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiKeyRecord {
    /// Public id, derived from the secret at creation time.
    pub id: ApiKeyId,
    /// The owning root.
    pub root: RootId,
    /// Display name.
    pub name: String,
    /// Digest of the secret.
    pub secret_hash: SecretHash,
    /// Creation time (Unix ms).
    pub created_at: i64,
    /// Expiry time (Unix ms); `None` means the key never expires.
    pub expires_at: Option<i64>,
}

impl ApiKeyRecord {
    /// Returns `true` if the key is past its expiry at `now`.
    pub fn is_expired(&self, now: i64) -> bool {
        matches!(self.expires_at, Some(expires) if now > expires)
    }
}

/// Read access to ACL entries.
pub trait AclReader: Send + Sync {
    /// All entries for an archetype: `Public` first, then roots by id.
    fn acl_entries(&self, archetype: &ArchetypeId) -> Result<Vec<AclEntry>>;

    /// The level granted to one scope, if an entry exists.
    fn acl_level(&self, archetype: &ArchetypeId, scope: &AclScope) -> Result<Option<AccessLevel>> {
        Ok(self
            .acl_entries(archetype)?
            .into_iter()
            .find(|e| &e.scope == scope)
            .map(|e| e.level))
    }
}

/// Mutation of ACL entries. Each call is atomic for its record.
pub trait AclWriter: AclReader {
    /// Insert or replace the entry for `entry.scope`.
    fn upsert_acl(&self, archetype: &ArchetypeId, entry: AclEntry) -> Result<UpsertOutcome>;

    /// Remove the entry for `scope`, returning the removed level if any.
    fn remove_acl(&self, archetype: &ArchetypeId, scope: &AclScope) -> Result<Option<AccessLevel>>;
}

/// API key persistence.
pub trait ApiKeyStore: Send + Sync {
    /// Insert a new key. Fails with `Duplicate` if the id or hash exists.
    fn insert_api_key(&self, record: &ApiKeyRecord) -> Result<()>;

    /// Look up a key by the digest of its secret.
    fn api_key_by_hash(&self, hash: &SecretHash) -> Result<Option<ApiKeyRecord>>;

    /// Look up a key by id.
    fn api_key(&self, id: &ApiKeyId) -> Result<Option<ApiKeyRecord>>;

    /// All keys owned by a root, oldest first.
    fn api_keys_for(&self, root: &RootId) -> Result<Vec<ApiKeyRecord>>;

    /// Delete a key if `requester` owns it. Check and delete are one unit.
    fn delete_api_key(&self, id: &ApiKeyId, requester: &RootId) -> Result<DeleteOutcome>;
}

/// Owner lookup for archetypes, provided by the graph store.
pub trait ArchetypeDirectory: Send + Sync {
    /// The reference record for an archetype, if known.
    fn archetype(&self, id: &ArchetypeId) -> Result<Option<Archetype>>;
}

impl<T: AclReader + ?Sized> AclReader for Arc<T> {
    fn acl_entries(&self, archetype: &ArchetypeId) -> Result<Vec<AclEntry>> {
        (**self).acl_entries(archetype)
    }

    fn acl_level(&self, archetype: &ArchetypeId, scope: &AclScope) -> Result<Option<AccessLevel>> {
        (**self).acl_level(archetype, scope)
    }
}

impl<T: AclWriter + ?Sized> AclWriter for Arc<T> {
    fn upsert_acl(&self, archetype: &ArchetypeId, entry: AclEntry) -> Result<UpsertOutcome> {
        (**self).upsert_acl(archetype, entry)
    }

    fn remove_acl(&self, archetype: &ArchetypeId, scope: &AclScope) -> Result<Option<AccessLevel>> {
        (**self).remove_acl(archetype, scope)
    }
}

impl<T: ApiKeyStore + ?Sized> ApiKeyStore for Arc<T> {
    fn insert_api_key(&self, record: &ApiKeyRecord) -> Result<()> {
        (**self).insert_api_key(record)
    }

    fn api_key_by_hash(&self, hash: &SecretHash) -> Result<Option<ApiKeyRecord>> {
        (**self).api_key_by_hash(hash)
    }

    fn api_key(&self, id: &ApiKeyId) -> Result<Option<ApiKeyRecord>> {
        (**self).api_key(id)
    }

    fn api_keys_for(&self, root: &RootId) -> Result<Vec<ApiKeyRecord>> {
        (**self).api_keys_for(root)
    }

    fn delete_api_key(&self, id: &ApiKeyId, requester: &RootId) -> Result<DeleteOutcome> {
        (**self).delete_api_key(id, requester)
    }
}

impl<T: ArchetypeDirectory + ?Sized> ArchetypeDirectory for Arc<T> {
    fn archetype(&self, id: &ArchetypeId) -> Result<Option<Archetype>> {
        (**self).archetype(id)
    }
}
