//! Error types for the auth module.

use thiserror::Error;
use walkway_core::{ApiKeyId, ErrorKind};
use walkway_store::StoreError;

/// Errors that can occur during authentication and key management.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No credential was presented.
    #[error("missing credential: {0}")]
    MissingCredential(String),

    /// The credential is malformed or its signature does not verify.
    #[error("invalid credential: {0}")]
    InvalidCredential(String),

    /// The credential is past its expiry.
    #[error("credential expired: {0}")]
    Expired(String),

    /// Webhook body signature mismatch.
    #[error("invalid webhook signature")]
    InvalidSignature,

    /// No API key matches the presented secret.
    #[error("api key not found")]
    UnknownApiKey,

    /// No API key with this id.
    #[error("api key not found: {0}")]
    KeyNotFound(ApiKeyId),

    /// The requester does not own the key.
    #[error("api key {0} is owned by another root")]
    NotKeyOwner(ApiKeyId),

    /// Invalid configuration.
    #[error("invalid auth configuration: {0}")]
    Config(String),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

impl AuthError {
    /// Taxonomy kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::MissingCredential(_) | AuthError::InvalidCredential(_) => {
                ErrorKind::Unauthorized
            }
            AuthError::Expired(_) => ErrorKind::Expired,
            AuthError::InvalidSignature => ErrorKind::InvalidSignature,
            AuthError::UnknownApiKey | AuthError::KeyNotFound(_) => ErrorKind::NotFound,
            AuthError::NotKeyOwner(_) => ErrorKind::Forbidden,
            AuthError::Config(_) => ErrorKind::Internal,
            AuthError::Store(e) => e.kind(),
        }
    }
}

/// Result type for auth operations.
pub type Result<T> = std::result::Result<T, AuthError>;
