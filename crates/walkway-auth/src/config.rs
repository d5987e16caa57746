//! Authentication settings.
//!
//! Resolved once at startup and injected by value. Nothing in this crate
//! reads the environment.

use serde::{Deserialize, Serialize};

use crate::error::{AuthError, Result};

/// Default bearer token lifetime: one day.
pub const DEFAULT_TOKEN_EXPIRY_SECS: u64 = 86_400;

/// Default webhook signature header.
pub const DEFAULT_SIGNATURE_HEADER: &str = "X-Webhook-Signature";

/// Default webhook API key header.
pub const DEFAULT_API_KEY_HEADER: &str = "X-API-Key";

/// Default API key lifetime in days.
pub const DEFAULT_API_KEY_EXPIRY_DAYS: u32 = 30;

/// Signing algorithm for bearer tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenAlgorithm {
    /// HMAC-SHA256 keyed with the configured secret.
    #[default]
    Hs256,
    /// Ed25519; the secret is a hex-encoded 32-byte seed.
    EdDsa,
}

impl TokenAlgorithm {
    /// Name carried in token claims.
    pub const fn as_str(self) -> &'static str {
        match self {
            TokenAlgorithm::Hs256 => "HS256",
            TokenAlgorithm::EdDsa => "EdDSA",
        }
    }
}

/// Bearer token settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenConfig {
    /// Signing secret.
    pub secret: String,
    /// Signing algorithm.
    pub algorithm: TokenAlgorithm,
    /// Token lifetime in seconds.
    pub expiry_secs: u64,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            algorithm: TokenAlgorithm::default(),
            expiry_secs: DEFAULT_TOKEN_EXPIRY_SECS,
        }
    }
}

/// Which secret keys the webhook HMAC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecretSource {
    /// The presented API key itself.
    #[default]
    ApiKey,
    /// The process-wide `webhook.secret`.
    Global,
}

/// Webhook settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    /// Process-wide HMAC secret, used when `secret_source` is `global`.
    pub secret: Option<String>,
    /// Header carrying the hex HMAC of the body.
    pub signature_header: String,
    /// Header carrying the API key.
    pub api_key_header: String,
    /// Whether to check body signatures at all.
    pub verify_signature: bool,
    /// Which secret keys the HMAC.
    pub secret_source: SecretSource,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            secret: None,
            signature_header: DEFAULT_SIGNATURE_HEADER.to_string(),
            api_key_header: DEFAULT_API_KEY_HEADER.to_string(),
            verify_signature: true,
            secret_source: SecretSource::default(),
        }
    }
}

/// API key settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiKeyConfig {
    /// Lifetime used when a create request names none. `0` means permanent.
    pub default_expiry_days: u32,
}

impl Default for ApiKeyConfig {
    fn default() -> Self {
        Self {
            default_expiry_days: DEFAULT_API_KEY_EXPIRY_DAYS,
        }
    }
}

/// All authentication settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Bearer tokens.
    pub token: TokenConfig,
    /// Webhook invocation.
    pub webhook: WebhookConfig,
    /// API key issuance.
    pub api_key: ApiKeyConfig,
}

impl AuthConfig {
    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<()> {
        if self.token.secret.is_empty() {
            return Err(AuthError::Config("token.secret must not be empty".into()));
        }
        if self.token.algorithm == TokenAlgorithm::EdDsa {
            let seed = hex::decode(&self.token.secret)
                .map_err(|e| AuthError::Config(format!("token.secret is not hex: {e}")))?;
            if seed.len() != 32 {
                return Err(AuthError::Config(format!(
                    "ed_dsa token.secret must be 32 bytes, got {}",
                    seed.len()
                )));
            }
        }
        if self.webhook.secret_source == SecretSource::Global
            && self.webhook.secret.as_deref().map_or(true, str::is_empty)
        {
            return Err(AuthError::Config(
                "webhook.secret_source = \"global\" requires webhook.secret".into(),
            ));
        }
        if self.webhook.signature_header.is_empty() || self.webhook.api_key_header.is_empty() {
            return Err(AuthError::Config("webhook header names must not be empty".into()));
        }
        Ok(())
    }
}
