//! Credential hashing.
//!
//! Credentials are stored as keyed Blake3 digests. Domain separation keeps
//! the stored hash and the derived API key id from ever colliding.

use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::ApiKeyId;

const SECRET_HASH_CONTEXT: &str = "walkway 2024 api-key secret hash v1";
const KEY_ID_CONTEXT: &str = "walkway 2024 api-key id v1";

/// A 32-byte digest of a credential secret.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SecretHash(pub [u8; 32]);

impl SecretHash {
    /// Hash a presented secret.
    pub fn of(secret: &str) -> Self {
        let mut hasher = blake3::Hasher::new_derive_key(SECRET_HASH_CONTEXT);
        hasher.update(secret.as_bytes());
        Self(*hasher.finalize().as_bytes())
    }

    /// Create from raw bytes.
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for SecretHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretHash({})", &self.to_hex()[..16])
    }
}

impl ApiKeyId {
    /// Derive the public id of a key from its secret.
    pub fn derive(secret: &str) -> Self {
        let mut hasher = blake3::Hasher::new_derive_key(KEY_ID_CONTEXT);
        hasher.update(secret.as_bytes());
        let mut id = [0u8; 16];
        id.copy_from_slice(&hasher.finalize().as_bytes()[..16]);
        Self(id)
    }
}

/// Generate a new random secret: `prefix` followed by 64 hex characters.
pub fn generate_secret(prefix: &str) -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    format!("{prefix}{}", hex::encode(bytes))
}
