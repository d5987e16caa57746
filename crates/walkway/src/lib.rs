//! # Walkway
//!
//! Secure invocation of graph walkers over the network, and access control
//! over the object graph they traverse.
//!
//! ## Overview
//!
//! ```text
//! request -> EndpointRegistry::lookup -> InvocationAuthenticator -> walker runs
//!                                                                    |
//!                                 AccessEvaluator::check_access <----+ per object
//! ```
//!
//! [`Gateway`] ties the component crates together:
//!
//! - **Front-end**: [`Gateway::authorize`], [`Gateway::handle`],
//!   [`Gateway::lookup_endpoint`]
//! - **Traversal engine**: [`Gateway::check_access`], [`Gateway::guard`]
//! - **Owners**: grant and revoke on their archetypes
//! - **API keys and sessions**: create, list, revoke, issue
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use walkway::{Gateway, GatewayConfig};
//! use walkway::routes::WalkerSpec;
//! use walkway::store::MemoryStore;
//!
//! let config = GatewayConfig::from_toml_str("[token]\nsecret = \"change-me\"\n").unwrap();
//! let store = Arc::new(MemoryStore::new());
//! let gateway = Gateway::new(
//!     config,
//!     store.clone(),
//!     store,
//!     [WalkerSpec::builder("create_post").build().unwrap()],
//! )
//! .unwrap();
//! ```
//!
//! ## Re-exports
//!
//! - `walkway::core` - Ids, access levels, ACL entries, clocks
//! - `walkway::store` - Backend traits, memory/SQLite/snapshot backends
//! - `walkway::perms` - Permission store, evaluator, traversal guard
//! - `walkway::auth` - API keys, signatures, sessions, authenticator
//! - `walkway::routes` - Walker specs and the endpoint registry

pub mod config;
pub mod error;
pub mod gateway;
pub mod telemetry;

pub use walkway_auth as auth;
pub use walkway_core as core;
pub use walkway_perms as perms;
pub use walkway_routes as routes;
pub use walkway_store as store;

pub use config::{GatewayConfig, TelemetryConfig};
pub use error::{GatewayError, Result};
pub use gateway::{CreateApiKeyRequest, Gateway, Invocation};

pub use walkway_auth::{Decision, Headers, Rejection};
pub use walkway_core::{AccessLevel, AclScope, ArchetypeId, ErrorKind, RootId};
pub use walkway_routes::{Method, Visibility, WalkerSpec};
