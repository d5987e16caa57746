//! # Walkway Testkit
//!
//! Testing utilities for Walkway.
//!
//! ## Overview
//!
//! - **Fixtures**: a ready [`TestGateway`] over an in-memory store and a
//!   manual clock, plus helpers for archetypes, sessions and signed
//!   webhook requests
//! - **Generators**: proptest strategies for ids, levels, scopes, ACLs
//!   and request bodies
//!
//! ## Test Fixtures
//!
//! ```rust
//! use walkway_testkit::TestGateway;
//! use walkway::{AccessLevel, RootId};
//!
//! let t = TestGateway::new();
//! let owner = RootId::generate();
//! let node = t.archetype(owner);
//! assert_eq!(t.gateway.effective_level(&owner, &node), AccessLevel::Write);
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use walkway_testkit::generators::{access_level, acl};
//!
//! proptest! {
//!     #[test]
//!     fn never_above_write(entries in acl(4), level in access_level()) {
//!         // ...
//!     }
//! }
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::{standard_walkers, webhook_body, TestGateway, TEST_EPOCH, TEST_TOKEN_SECRET};
