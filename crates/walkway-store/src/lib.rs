//! # Walkway Store
//!
//! Persistence for ACL entries and API keys behind capability-tagged traits.
//!
//! ## Overview
//!
//! Each backend implements only the traits for the operations it really
//! supports, so calling an unsupported operation is a compile error rather
//! than a runtime surprise:
//!
//! | Backend | [`AclReader`] | [`AclWriter`] | [`ApiKeyStore`] | [`ArchetypeDirectory`] |
//! |---|---|---|---|---|
//! | [`MemoryStore`] | yes | yes | yes | yes |
//! | [`SqliteStore`] | yes | yes | yes | no |
//! | [`SnapshotStore`] | yes | no | no | no |
//!
//! The archetype directory is normally provided by the external graph
//! store; [`MemoryStore`] offers one for tests and embedded use.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use walkway_store::{AclWriter, SqliteStore};
//! use walkway_core::{AclEntry, AccessLevel, ArchetypeId};
//!
//! let store = SqliteStore::open("walkway.db").unwrap();
//! let node = ArchetypeId::generate();
//! store.upsert_acl(&node, AclEntry::public(AccessLevel::Read)).unwrap();
//! ```
//!
//! ## Design Notes
//!
//! - **Upsert, not append**: one entry per `(archetype, scope)`
//! - **Idempotent removal**: removing an absent entry is not an error
//! - **Atomic per record**: every mutation is a single critical section or
//!   a single SQLite transaction

pub mod error;
pub mod memory;
pub mod migration;
pub mod snapshot;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use snapshot::SnapshotStore;
pub use sqlite::SqliteStore;
pub use traits::{
    AclReader, AclWriter, ApiKeyRecord, ApiKeyStore, ArchetypeDirectory, DeleteOutcome,
    UpsertOutcome,
};
