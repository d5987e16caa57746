//! Gateway configuration.
//!
//! Parsed and validated once at startup, then handed to [`Gateway`] by
//! value. Sections:
//!
//! ```toml
//! [token]
//! secret = "change-me"
//! algorithm = "hs256"        # or "ed_dsa" (secret = 32-byte hex seed)
//! expiry_secs = 86400
//!
//! [webhook]
//! secret = "shared"          # only needed for secret_source = "global"
//! signature_header = "X-Webhook-Signature"
//! api_key_header = "X-API-Key"
//! verify_signature = true
//! secret_source = "api_key"  # or "global"
//!
//! [api_key]
//! default_expiry_days = 30   # 0 = permanent
//!
//! [telemetry]
//! filter = "info"
//! ```
//!
//! [`Gateway`]: crate::Gateway

use serde::{Deserialize, Serialize};
use walkway_auth::{AuthConfig, AuthError};

use crate::error::{GatewayError, Result};

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// `tracing-subscriber` env-filter directive.
    pub filter: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

/// Everything the gateway needs, resolved once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// `[token]`, `[webhook]` and `[api_key]`.
    #[serde(flatten)]
    pub auth: AuthConfig,
    /// `[telemetry]`.
    pub telemetry: TelemetryConfig,
}

impl GatewayConfig {
    /// Parse TOML and validate.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(s).map_err(|e| GatewayError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check every section.
    pub fn validate(&self) -> Result<()> {
        self.auth.validate().map_err(|e| match e {
            AuthError::Config(msg) => GatewayError::Config(msg),
            other => GatewayError::Auth(other),
        })
    }

    /// A config with just a token secret, for tests and embedding.
    pub fn with_token_secret(secret: impl Into<String>) -> Self {
        let mut config = Self::default();
        config.auth.token.secret = secret.into();
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use walkway_auth::{SecretSource, TokenAlgorithm};

    #[test]
    fn test_full_toml() {
        let config = GatewayConfig::from_toml_str(
            r#"
            [token]
            secret = "t0ken"
            expiry_secs = 3600

            [webhook]
            secret = "shared"
            signature_header = "X-Hub-Signature-256"
            secret_source = "global"

            [api_key]
            default_expiry_days = 0

            [telemetry]
            filter = "walkway=debug"
            "#,
        )
        .unwrap();

        assert_eq!(config.auth.token.secret, "t0ken");
        assert_eq!(config.auth.token.algorithm, TokenAlgorithm::Hs256);
        assert_eq!(config.auth.token.expiry_secs, 3600);
        assert_eq!(config.auth.webhook.secret_source, SecretSource::Global);
        assert_eq!(config.auth.webhook.signature_header, "X-Hub-Signature-256");
        assert_eq!(config.auth.webhook.api_key_header, "X-API-Key");
        assert!(config.auth.webhook.verify_signature);
        assert_eq!(config.auth.api_key.default_expiry_days, 0);
        assert_eq!(config.telemetry.filter, "walkway=debug");
    }

    #[test]
    fn test_minimal_toml_uses_defaults() {
        let config = GatewayConfig::from_toml_str("[token]\nsecret = \"x\"\n").unwrap();
        assert_eq!(config.auth.token.expiry_secs, 86_400);
        assert_eq!(config.auth.api_key.default_expiry_days, 30);
        assert_eq!(config.telemetry.filter, "info");
    }

    #[test]
    fn test_invalid_configs() {
        assert!(matches!(
            GatewayConfig::from_toml_str(""),
            Err(GatewayError::Config(_))
        ));
        assert!(matches!(
            GatewayConfig::from_toml_str("[token]\nsecret = \"x\"\nalgorithm = \"rs256\"\n"),
            Err(GatewayError::Config(_))
        ));
        assert!(GatewayConfig::from_toml_str(
            "[token]\nsecret = \"x\"\n[webhook]\nsecret_source = \"global\"\n"
        )
        .is_err());
    }
}
