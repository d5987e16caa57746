//! Error types for the permissions module.

use thiserror::Error;
use walkway_core::{ArchetypeId, ErrorKind, RootId};
use walkway_store::StoreError;

/// Errors that can occur during permission operations.
#[derive(Debug, Error)]
pub enum PermsError {
    /// Archetype unknown to the graph directory.
    #[error("archetype not found: {0}")]
    ArchetypeNotFound(ArchetypeId),

    /// Requester may not change the ACL of an archetype it does not own.
    #[error("root {requester} does not own archetype {archetype}")]
    NotOwner {
        requester: RootId,
        archetype: ArchetypeId,
    },

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

impl PermsError {
    /// Taxonomy kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            PermsError::ArchetypeNotFound(_) => ErrorKind::NotFound,
            PermsError::NotOwner { .. } => ErrorKind::Forbidden,
            PermsError::Store(e) => e.kind(),
        }
    }
}

/// Result type for permission operations.
pub type Result<T> = std::result::Result<T, PermsError>;
