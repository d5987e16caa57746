//! # Walkway Routes
//!
//! The endpoint exposure policy: which walkers are reachable, at which
//! `(method, path)`, behind which authentication tier.
//!
//! ## Overview
//!
//! Walkers are declared as immutable [`WalkerSpec`] values and registered
//! once at startup. [`EndpointRegistry::build`] derives each path,
//! rejects ambiguous route tables, and adds the built-in API key and SSO
//! routes. After that the registry is only queried.
//!
//! | Declaration | Path family | Tier |
//! |---|---|---|
//! | regular, `Public` | `/walker/{name}` | none |
//! | regular, `Protected` | `/walker/{name}` | bearer token |
//! | webhook | `/webhook/{name}` | API key + signature |
//! | `Private` | not exposed | internal only |
//!
//! ## Usage
//!
//! ```rust
//! use walkway_routes::{EndpointRegistry, Method, WalkerSpec};
//!
//! let registry = EndpointRegistry::build([
//!     WalkerSpec::builder("create_post").build().unwrap(),
//!     WalkerSpec::builder("github_push").webhook().build().unwrap(),
//! ])
//! .unwrap();
//!
//! assert!(registry.lookup(Method::Post, "/webhook/github_push").is_ok());
//! assert!(registry.lookup(Method::Post, "/walker/github_push").is_err());
//! ```

pub mod error;
pub mod pattern;
pub mod registry;
pub mod spec;

pub use error::{Result, RouteError};
pub use pattern::PathPattern;
pub use registry::{BuiltinRoute, Endpoint, EndpointRegistry, EndpointTarget, RouteMatch};
pub use spec::{Method, Visibility, WalkerSpec, WalkerSpecBuilder, WALKER_PREFIX, WEBHOOK_PREFIX};
