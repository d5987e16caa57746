//! # Walkway Permissions
//!
//! Who may read, traverse and write archetypes of the object graph.
//!
//! ## Overview
//!
//! Permissions are a side table of ACL entries keyed by archetype id (see
//! `walkway-store`). This crate adds the two halves on top of it:
//!
//! - [`PermissionStore`]: grant and revoke entries (replacing upserts,
//!   idempotent removals)
//! - [`AccessEvaluator`]: combine ownership and grants into one effective
//!   level per `(subject, archetype)`, consulted on every object visit
//!
//! ## Evaluation
//!
//! ```text
//! owner(subject, A)            -> Write
//! otherwise                    -> max(NoAccess, Public entry, Root(subject) entry)
//! ```
//!
//! The maximum always wins: a root-specific `Read` never lowers a public
//! `Write`.
//!
//! ## Traversal
//!
//! [`TraversalGuard`] re-evaluates each object independently and never
//! holds a lock across objects. A denied object is skipped, not fatal.

pub mod error;
pub mod evaluator;
pub mod store;
pub mod traversal;

pub use error::{PermsError, Result};
pub use evaluator::{capabilities, effective_level, AccessEvaluator, Capabilities};
pub use store::PermissionStore;
pub use traversal::{TraversalGuard, VisitDecision};
