//! Error types for the gateway.

use thiserror::Error;
use walkway_auth::{AuthError, Rejection};
use walkway_core::ErrorKind;
use walkway_perms::PermsError;
use walkway_routes::RouteError;
use walkway_store::StoreError;

/// Errors surfaced by [`Gateway`](crate::Gateway).
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Authentication or API key error.
    #[error("auth error: {0}")]
    Auth(#[from] AuthError),

    /// Permission error.
    #[error("permission error: {0}")]
    Perms(#[from] PermsError),

    /// Route registration or lookup error.
    #[error("route error: {0}")]
    Route(#[from] RouteError),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// The request was turned away before any walker ran.
    #[error("rejected: {0}")]
    Rejected(Rejection),

    /// Malformed request body or parameter.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Runtime failure, e.g. a blocking task that did not complete.
    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Taxonomy kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            GatewayError::Config(_) | GatewayError::Internal(_) => ErrorKind::Internal,
            GatewayError::Auth(e) => e.kind(),
            GatewayError::Perms(e) => e.kind(),
            GatewayError::Route(e) => e.kind(),
            GatewayError::Store(e) => e.kind(),
            GatewayError::Rejected(r) => r.kind,
            GatewayError::InvalidRequest(_) => ErrorKind::InvalidRequest,
        }
    }

    /// HTTP status for this error.
    pub fn status(&self) -> u16 {
        self.kind().status()
    }
}

impl From<Rejection> for GatewayError {
    fn from(r: Rejection) -> Self {
        GatewayError::Rejected(r)
    }
}

/// Result type for gateway operations.
pub type Result<T> = std::result::Result<T, GatewayError>;
