//! API key lifecycle: create, list, revoke, resolve.
//!
//! The plaintext secret leaves this module exactly once, in the
//! [`IssuedApiKey`] returned by [`ApiKeyManager::create`]. Only its
//! [`SecretHash`] is stored. Expiry is checked on resolution, never purged
//! eagerly, so listing still shows expired keys until they are revoked.

use serde::{Serialize, Serializer};
use tracing::{debug, info, warn};
use walkway_core::{generate_secret, ApiKeyId, RootId, SecretHash, SharedClock, MILLIS_PER_DAY};
use walkway_store::{ApiKeyRecord, ApiKeyStore, DeleteOutcome};

use crate::error::{AuthError, Result};

/// Prefix of every issued API key.
pub const API_KEY_PREFIX: &str = "wk_";

fn hex_id<S: Serializer>(id: &ApiKeyId, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_str(&id.to_hex())
}

/// A freshly created key, including the only copy of its secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssuedApiKey {
    /// Plaintext key. Shown once.
    pub api_key: String,
    /// Public id.
    #[serde(serialize_with = "hex_id")]
    pub api_key_id: ApiKeyId,
    /// Display name.
    pub name: String,
    /// Creation time (Unix ms).
    pub created_at: i64,
    /// Expiry time (Unix ms), or `None` for a permanent key.
    pub expires_at: Option<i64>,
}

/// Key metadata as returned by listing. Never carries the secret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiKey {
    /// Public id.
    #[serde(serialize_with = "hex_id")]
    pub id: ApiKeyId,
    /// Display name.
    pub name: String,
    /// Creation time (Unix ms).
    pub created_at: i64,
    /// Expiry time (Unix ms), or `None` for a permanent key.
    pub expires_at: Option<i64>,
    /// Whether the key was past its expiry when listed.
    pub expired: bool,
}

impl ApiKey {
    fn from_record(record: ApiKeyRecord, now: i64) -> Self {
        let expired = record.is_expired(now);
        Self {
            id: record.id,
            name: record.name,
            created_at: record.created_at,
            expires_at: record.expires_at,
            expired,
        }
    }
}

/// The identity behind a presented key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedKey {
    /// Owner of the key; the acting subject for the request.
    pub root: RootId,
    /// The key that matched.
    pub key_id: ApiKeyId,
}

/// Issues, lists, revokes and resolves API keys.
pub struct ApiKeyManager<S> {
    store: S,
    clock: SharedClock,
    default_expiry_days: u32,
}

impl<S: ApiKeyStore> ApiKeyManager<S> {
    /// Create a manager over `store`.
    pub fn new(store: S, clock: SharedClock, default_expiry_days: u32) -> Self {
        Self {
            store,
            clock,
            default_expiry_days,
        }
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Lifetime applied when `create` is given none.
    pub fn default_expiry_days(&self) -> u32 {
        self.default_expiry_days
    }

    /// Issue a new key for `root`.
    ///
    /// `expiry_days` of `None` uses the configured default; `Some(0)`
    /// creates a permanent key.
    pub fn create(&self, root: RootId, name: &str, expiry_days: Option<u32>) -> Result<IssuedApiKey> {
        let days = expiry_days.unwrap_or(self.default_expiry_days);
        let now = self.clock.now_millis();
        let expires_at = match days {
            0 => None,
            days => Some(now.saturating_add(i64::from(days) * MILLIS_PER_DAY)),
        };

        let api_key = generate_secret(API_KEY_PREFIX);
        let record = ApiKeyRecord {
            id: ApiKeyId::derive(&api_key),
            root,
            name: name.to_string(),
            secret_hash: SecretHash::of(&api_key),
            created_at: now,
            expires_at,
        };
        self.store.insert_api_key(&record)?;
        info!(key_id = %record.id, %root, days, "api key created");

        Ok(IssuedApiKey {
            api_key,
            api_key_id: record.id,
            name: record.name,
            created_at: now,
            expires_at,
        })
    }

    /// Metadata of every key owned by `root`, oldest first.
    pub fn list(&self, root: &RootId) -> Result<Vec<ApiKey>> {
        let now = self.clock.now_millis();
        Ok(self
            .store
            .api_keys_for(root)?
            .into_iter()
            .map(|record| ApiKey::from_record(record, now))
            .collect())
    }

    /// Hard-delete a key owned by `requester`.
    pub fn revoke(&self, key_id: &ApiKeyId, requester: &RootId) -> Result<()> {
        match self.store.delete_api_key(key_id, requester)? {
            DeleteOutcome::Deleted => {
                info!(%key_id, root = %requester, "api key revoked");
                Ok(())
            }
            DeleteOutcome::NotFound => Err(AuthError::KeyNotFound(*key_id)),
            DeleteOutcome::NotOwner => {
                warn!(%key_id, root = %requester, "revoke refused: not owner");
                Err(AuthError::NotKeyOwner(*key_id))
            }
        }
    }

    /// Find the owner of a presented key.
    pub fn resolve(&self, presented: &str) -> Result<ResolvedKey> {
        let record = self
            .store
            .api_key_by_hash(&SecretHash::of(presented))?
            .ok_or(AuthError::UnknownApiKey)?;
        if record.is_expired(self.clock.now_millis()) {
            return Err(AuthError::Expired(format!("api key {}", record.id)));
        }
        debug!(key_id = %record.id, root = %record.root, "api key resolved");
        Ok(ResolvedKey {
            root: record.root,
            key_id: record.id,
        })
    }
}
