//! Error types for route registration and lookup.

use thiserror::Error;
use walkway_core::ErrorKind;

use crate::spec::Method;

/// Errors raised while building or querying the route table.
#[derive(Debug, Error)]
pub enum RouteError {
    /// Two endpoints with the same method can match the same path and
    /// neither is more specific.
    #[error("route conflict: {method} {path} is claimed by both {existing} and {incoming}")]
    Conflict {
        method: Method,
        path: String,
        existing: String,
        incoming: String,
    },

    /// Two walkers share a name.
    #[error("duplicate walker name: {0}")]
    DuplicateWalker(String),

    /// A declaration is malformed.
    #[error("invalid walker spec: {0}")]
    InvalidSpec(String),

    /// A path pattern is malformed.
    #[error("invalid path pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// No endpoint matches.
    #[error("no endpoint for {method} {path}")]
    NotFound { method: Method, path: String },

    /// Unrecognized HTTP method.
    #[error("unsupported method: {0}")]
    UnknownMethod(String),
}

impl RouteError {
    /// Taxonomy kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            RouteError::Conflict { .. } | RouteError::DuplicateWalker(_) => ErrorKind::Conflict,
            RouteError::NotFound { .. } | RouteError::UnknownMethod(_) => ErrorKind::NotFound,
            RouteError::InvalidSpec(_) | RouteError::InvalidPattern { .. } => ErrorKind::Internal,
        }
    }
}

/// Result type for route operations.
pub type Result<T> = std::result::Result<T, RouteError>;
