//! Error types for Walkway Core, plus the shared failure taxonomy.

use std::fmt;

use thiserror::Error;

/// Core errors: malformed ids and values.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid id: {0}")]
    InvalidId(String),

    #[error("invalid access level: {0}")]
    InvalidLevel(String),
}

/// The failure taxonomy every Walkway error maps onto.
///
/// Front-ends use [`ErrorKind::status`] to pick a response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Missing, malformed or otherwise invalid credential.
    Unauthorized,
    /// Valid identity, insufficient permission or not the owner.
    Forbidden,
    /// Credential past its expiry.
    Expired,
    /// Webhook HMAC mismatch.
    InvalidSignature,
    /// Unknown object, key or endpoint.
    NotFound,
    /// Duplicate route at registration time.
    Conflict,
    /// Malformed request body or parameter.
    InvalidRequest,
    /// Operation not offered by the configured backend.
    UnsupportedOperation,
    /// Storage or runtime failure.
    Internal,
}

impl ErrorKind {
    /// HTTP status code for this kind.
    pub const fn status(self) -> u16 {
        match self {
            ErrorKind::Unauthorized | ErrorKind::Expired | ErrorKind::InvalidSignature => 401,
            ErrorKind::Forbidden => 403,
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict => 409,
            ErrorKind::InvalidRequest => 400,
            ErrorKind::UnsupportedOperation => 501,
            ErrorKind::Internal => 500,
        }
    }

    /// Stable machine-readable name.
    pub const fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::Expired => "expired",
            ErrorKind::InvalidSignature => "invalid_signature",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::InvalidRequest => "invalid_request",
            ErrorKind::UnsupportedOperation => "unsupported_operation",
            ErrorKind::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
