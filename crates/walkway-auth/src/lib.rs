//! # Walkway Auth
//!
//! The entry gate for walker invocations.
//!
//! ## Overview
//!
//! Two parallel credential paths resolve a request to an acting root:
//!
//! ```text
//! regular walker  --Authorization: Bearer <token>-->  SessionTokens::validate  --> root
//! webhook walker  --X-API-Key + X-Webhook-Signature--> ApiKeyManager::resolve
//!                                                      + WebhookSignatureVerifier --> key owner
//! ```
//!
//! [`InvocationAuthenticator`] picks the path from the endpoint's
//! [`AuthTier`] and returns a [`Decision`]. Every rejection happens before
//! any walker code runs.
//!
//! ## Key Types
//!
//! - [`ApiKeyManager`] - Issue, list, revoke and resolve API keys
//! - [`WebhookSignatureVerifier`] - HMAC-SHA256 over the raw request body
//! - [`SessionTokens`] - Signed, time-bounded bearer tokens (never stored)
//! - [`InvocationAuthenticator`] - Per-request decision procedure

pub mod api_key;
pub mod authenticator;
pub mod config;
pub mod error;
pub mod headers;
pub mod signature;
pub mod token;

pub use api_key::{ApiKey, ApiKeyManager, IssuedApiKey, ResolvedKey, API_KEY_PREFIX};
pub use authenticator::{AuthTier, Credential, Decision, InvocationAuthenticator, Rejection};
pub use config::{ApiKeyConfig, AuthConfig, SecretSource, TokenAlgorithm, TokenConfig, WebhookConfig};
pub use error::{AuthError, Result};
pub use headers::Headers;
pub use signature::WebhookSignatureVerifier;
pub use token::{SessionClaims, SessionTokens};
