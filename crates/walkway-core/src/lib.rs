//! # Walkway Core
//!
//! Pure primitives for the Walkway access-control layer: identities,
//! archetype references, access levels and ACL entries.
//!
//! This crate contains no I/O, no storage, no networking.
//!
//! ## Key Types
//!
//! - [`RootId`] - A per-user identity and the graph partition it owns
//! - [`ArchetypeId`] - Opaque id of a node or edge in the object graph
//! - [`AccessLevel`] - Totally ordered grant level (`NoAccess < Read < Connect < Write`)
//! - [`AclScope`] / [`AclEntry`] - One grant on one archetype
//! - [`SecretHash`] - Keyed Blake3 digest used to store credentials
//! - [`Clock`] - Time source, swappable in tests via [`ManualClock`]

pub mod access;
pub mod clock;
pub mod crypto;
pub mod error;
pub mod types;

pub use access::{AccessLevel, AclEntry, AclScope, Archetype};
pub use clock::{Clock, ManualClock, SharedClock, SystemClock, MILLIS_PER_DAY};
pub use crypto::{generate_secret, SecretHash};
pub use error::{CoreError, ErrorKind};
pub use types::{ApiKeyId, ArchetypeId, RootId};
