//! Per-request authentication.
//!
//! Each call is independent: `Unauthenticated -> Authenticated | Anonymous
//! | Rejected`. Nothing is cached between requests, and a rejection always
//! happens before any walker code runs.
//!
//! Webhook requests are checked in order: API key header present
//! (`Unauthorized`), JSON body (`InvalidRequest`), key resolves
//! (`Unauthorized`/`Expired`), then the body signature when enabled
//! (`InvalidSignature`).

use std::fmt;

use tracing::{debug, warn};
use walkway_core::{ApiKeyId, ErrorKind, RootId};
use walkway_store::ApiKeyStore;

use crate::api_key::ApiKeyManager;
use crate::config::{SecretSource, WebhookConfig};
use crate::error::AuthError;
use crate::headers::Headers;
use crate::signature::WebhookSignatureVerifier;
use crate::token::SessionTokens;

/// Authentication requirement of an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthTier {
    /// No credential needed; a valid bearer token still identifies the caller.
    Public,
    /// Bearer session token required.
    Protected,
    /// API key required, plus a body signature when enabled.
    Webhook,
}

impl AuthTier {
    /// Lowercase name for logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            AuthTier::Public => "public",
            AuthTier::Protected => "protected",
            AuthTier::Webhook => "webhook",
        }
    }
}

impl fmt::Display for AuthTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which credential identified the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Credential {
    /// A bearer session token.
    Session,
    /// An API key.
    ApiKey(ApiKeyId),
}

/// Why a request was turned away.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    /// Failure class; `kind.status()` is the response status.
    pub kind: ErrorKind,
    /// Human-readable reason. Never contains the credential.
    pub reason: String,
}

impl Rejection {
    /// Create a rejection.
    pub fn new(kind: ErrorKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            reason: reason.into(),
        }
    }

    /// HTTP status for this rejection.
    pub fn status(&self) -> u16 {
        self.kind.status()
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.reason)
    }
}

impl From<AuthError> for Rejection {
    fn from(e: AuthError) -> Self {
        let kind = match e {
            // An unknown key is a bad credential, not a missing resource.
            AuthError::UnknownApiKey => ErrorKind::Unauthorized,
            ref other => other.kind(),
        };
        Rejection::new(kind, e.to_string())
    }
}

/// Outcome of authenticating one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// The request acts as `root`.
    Authenticated {
        /// The acting subject.
        root: RootId,
        /// How it was identified.
        via: Credential,
    },
    /// Public endpoint, no usable credential.
    Anonymous,
    /// The request must not proceed.
    Rejected(Rejection),
}

impl Decision {
    /// The acting root, if authenticated.
    pub fn root(&self) -> Option<RootId> {
        match self {
            Decision::Authenticated { root, .. } => Some(*root),
            _ => None,
        }
    }

    /// Returns `true` unless rejected.
    pub fn is_allowed(&self) -> bool {
        !matches!(self, Decision::Rejected(_))
    }

    fn reject(kind: ErrorKind, reason: impl Into<String>) -> Self {
        Decision::Rejected(Rejection::new(kind, reason))
    }
}

/// The entry gate: resolves a request to an acting root or rejects it.
pub struct InvocationAuthenticator<S> {
    tokens: SessionTokens,
    keys: ApiKeyManager<S>,
    webhook: WebhookConfig,
}

impl<S: ApiKeyStore> InvocationAuthenticator<S> {
    /// Create an authenticator.
    pub fn new(tokens: SessionTokens, keys: ApiKeyManager<S>, webhook: WebhookConfig) -> Self {
        Self {
            tokens,
            keys,
            webhook,
        }
    }

    /// Session token issuer/validator.
    pub fn tokens(&self) -> &SessionTokens {
        &self.tokens
    }

    /// API key manager.
    pub fn keys(&self) -> &ApiKeyManager<S> {
        &self.keys
    }

    /// Webhook settings in effect.
    pub fn webhook_config(&self) -> &WebhookConfig {
        &self.webhook
    }

    /// Authenticate a request against an endpoint of tier `tier`.
    ///
    /// `body` must be the raw bytes as received.
    pub fn authenticate(&self, tier: AuthTier, headers: &Headers, body: &[u8]) -> Decision {
        let decision = match tier {
            AuthTier::Public => self.public(headers),
            AuthTier::Protected => self.protected(headers),
            AuthTier::Webhook => self.webhook(headers, body),
        };
        match &decision {
            Decision::Authenticated { root, via } => debug!(%tier, %root, ?via, "authenticated"),
            Decision::Anonymous => debug!(%tier, "anonymous"),
            Decision::Rejected(r) => warn!(%tier, kind = %r.kind, reason = %r.reason, "rejected"),
        }
        decision
    }

    fn public(&self, headers: &Headers) -> Decision {
        match headers.bearer() {
            Some(token) if !token.is_empty() => match self.tokens.validate(token) {
                Ok(claims) => Decision::Authenticated {
                    root: claims.sub,
                    via: Credential::Session,
                },
                Err(e) => {
                    debug!(error = %e, "ignoring bad credential on public endpoint");
                    Decision::Anonymous
                }
            },
            _ => Decision::Anonymous,
        }
    }

    fn protected(&self, headers: &Headers) -> Decision {
        let token = match headers.bearer() {
            None => return Decision::reject(ErrorKind::Unauthorized, "missing bearer token"),
            Some("") => return Decision::reject(ErrorKind::Unauthorized, "empty bearer token"),
            Some(token) => token,
        };
        match self.tokens.validate(token) {
            Ok(claims) => Decision::Authenticated {
                root: claims.sub,
                via: Credential::Session,
            },
            Err(e) => Decision::Rejected(e.into()),
        }
    }

    fn webhook(&self, headers: &Headers, body: &[u8]) -> Decision {
        let presented = match headers.get(&self.webhook.api_key_header) {
            Some(key) if !key.trim().is_empty() => key.trim(),
            _ => {
                return Decision::reject(
                    ErrorKind::Unauthorized,
                    format!("missing {} header", self.webhook.api_key_header),
                )
            }
        };

        if !headers.is_json() {
            return Decision::reject(
                ErrorKind::InvalidRequest,
                "webhook body must be sent as application/json",
            );
        }

        let resolved = match self.keys.resolve(presented) {
            Ok(resolved) => resolved,
            Err(e) => return Decision::Rejected(e.into()),
        };

        if self.webhook.verify_signature {
            let Some(signature) = headers.get(&self.webhook.signature_header) else {
                return Decision::reject(
                    ErrorKind::InvalidSignature,
                    format!("missing {} header", self.webhook.signature_header),
                );
            };
            let secret = match self.webhook.secret_source {
                SecretSource::ApiKey => presented.as_bytes(),
                SecretSource::Global => match self.webhook.secret.as_deref() {
                    Some(secret) => secret.as_bytes(),
                    None => {
                        return Decision::reject(ErrorKind::Internal, "webhook secret not configured")
                    }
                },
            };
            if !WebhookSignatureVerifier::verify(body, secret, signature) {
                return Decision::Rejected(AuthError::InvalidSignature.into());
            }
        }

        Decision::Authenticated {
            root: resolved.root,
            via: Credential::ApiKey(resolved.key_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use walkway_core::{ManualClock, SharedClock};
    use walkway_store::MemoryStore;

    use crate::config::TokenConfig;

    const BODY: &[u8] = br#"{"ping":true}"#;

    fn authenticator(webhook: WebhookConfig) -> (InvocationAuthenticator<MemoryStore>, ManualClock) {
        let clock = ManualClock::new(1_700_000_000_000);
        let shared: SharedClock = Arc::new(clock.clone());
        let tokens = SessionTokens::new(
            &TokenConfig {
                secret: "test-secret".into(),
                ..Default::default()
            },
            shared.clone(),
        )
        .unwrap();
        let keys = ApiKeyManager::new(MemoryStore::new(), shared, 30);
        (InvocationAuthenticator::new(tokens, keys, webhook), clock)
    }

    fn bearer(token: &str) -> Headers {
        Headers::new().with("Authorization", format!("Bearer {token}"))
    }

    fn hook(key: &str) -> Headers {
        Headers::new()
            .with("Content-Type", "application/json")
            .with("X-API-Key", key)
    }

    #[test]
    fn test_protected_requires_valid_token() {
        let (auth, clock) = authenticator(WebhookConfig::default());
        let root = RootId::generate();
        let token = auth.tokens().issue(root).unwrap();

        assert_eq!(
            auth.authenticate(AuthTier::Protected, &bearer(&token), b""),
            Decision::Authenticated {
                root,
                via: Credential::Session
            }
        );

        let missing = auth.authenticate(AuthTier::Protected, &Headers::new(), b"");
        assert!(matches!(missing, Decision::Rejected(ref r) if r.kind == ErrorKind::Unauthorized));

        let garbage = auth.authenticate(AuthTier::Protected, &bearer("xyz"), b"");
        assert!(matches!(garbage, Decision::Rejected(ref r) if r.kind == ErrorKind::Unauthorized));

        clock.advance_days(2);
        let expired = auth.authenticate(AuthTier::Protected, &bearer(&token), b"");
        assert!(matches!(expired, Decision::Rejected(ref r) if r.kind == ErrorKind::Expired && r.status() == 401));
    }

    #[test]
    fn test_public_downgrades_bad_credentials() {
        let (auth, _) = authenticator(WebhookConfig::default());
        let root = RootId::generate();
        let token = auth.tokens().issue(root).unwrap();

        assert_eq!(
            auth.authenticate(AuthTier::Public, &Headers::new(), b""),
            Decision::Anonymous
        );
        assert_eq!(
            auth.authenticate(AuthTier::Public, &bearer("junk"), b""),
            Decision::Anonymous
        );
        assert_eq!(
            auth.authenticate(AuthTier::Public, &bearer(&token), b"").root(),
            Some(root)
        );
    }

    #[test]
    fn test_webhook_with_key_signature() {
        let (auth, _) = authenticator(WebhookConfig::default());
        let owner = RootId::generate();
        let issued = auth.keys().create(owner, "hook", None).unwrap();
        let sig = WebhookSignatureVerifier::sign(BODY, issued.api_key.as_bytes());

        let headers = Headers::new()
            .with("content-type", "application/json")
            .with("x-api-key", issued.api_key.clone())
            .with("x-webhook-signature", sig);
        assert_eq!(
            auth.authenticate(AuthTier::Webhook, &headers, BODY),
            Decision::Authenticated {
                root: owner,
                via: Credential::ApiKey(issued.api_key_id)
            }
        );

        let tampered = auth.authenticate(AuthTier::Webhook, &headers, br#"{"ping":false}"#);
        assert!(matches!(tampered, Decision::Rejected(ref r) if r.kind == ErrorKind::InvalidSignature));

        let unsigned = hook(&issued.api_key);
        let decision = auth.authenticate(AuthTier::Webhook, &unsigned, BODY);
        assert!(matches!(decision, Decision::Rejected(ref r) if r.kind == ErrorKind::InvalidSignature));
    }

    #[test]
    fn test_webhook_missing_key_is_unauthorized() {
        let (auth, _) = authenticator(WebhookConfig::default());
        let issued = auth.keys().create(RootId::generate(), "hook", None).unwrap();
        let sig = WebhookSignatureVerifier::sign(BODY, issued.api_key.as_bytes());

        let headers = Headers::new().with("X-Webhook-Signature", sig);
        let decision = auth.authenticate(AuthTier::Webhook, &headers, BODY);
        assert!(matches!(decision, Decision::Rejected(ref r) if r.kind == ErrorKind::Unauthorized));

        // A bearer token does not open the webhook path.
        let token = auth.tokens().issue(RootId::generate()).unwrap();
        let decision = auth.authenticate(AuthTier::Webhook, &bearer(&token), BODY);
        assert!(matches!(decision, Decision::Rejected(ref r) if r.kind == ErrorKind::Unauthorized));
    }

    #[test]
    fn test_webhook_unknown_and_expired_keys() {
        let (auth, clock) = authenticator(WebhookConfig {
            verify_signature: false,
            ..Default::default()
        });
        let unknown = hook("wk_unknown");
        let decision = auth.authenticate(AuthTier::Webhook, &unknown, BODY);
        assert!(matches!(decision, Decision::Rejected(ref r) if r.kind == ErrorKind::Unauthorized));

        let issued = auth.keys().create(RootId::generate(), "hook", Some(1)).unwrap();
        let headers = hook(&issued.api_key);
        assert!(auth.authenticate(AuthTier::Webhook, &headers, BODY).is_allowed());

        clock.advance_days(2);
        let decision = auth.authenticate(AuthTier::Webhook, &headers, BODY);
        assert!(matches!(decision, Decision::Rejected(ref r) if r.kind == ErrorKind::Expired));
    }

    #[test]
    fn test_webhook_global_secret() {
        let (auth, _) = authenticator(WebhookConfig {
            secret: Some("shared".into()),
            secret_source: SecretSource::Global,
            signature_header: "X-Hub-Signature-256".into(),
            ..Default::default()
        });
        let issued = auth.keys().create(RootId::generate(), "hook", None).unwrap();

        let good = hook(&issued.api_key)
            .with("X-Hub-Signature-256", WebhookSignatureVerifier::sign(BODY, b"shared"));
        assert!(auth.authenticate(AuthTier::Webhook, &good, BODY).is_allowed());

        let keyed = hook(&issued.api_key)
            .with(
                "X-Hub-Signature-256",
                WebhookSignatureVerifier::sign(BODY, issued.api_key.as_bytes()),
            );
        assert!(!auth.authenticate(AuthTier::Webhook, &keyed, BODY).is_allowed());
    }

    #[test]
    fn test_webhook_requires_json_body() {
        let (auth, _) = authenticator(WebhookConfig::default());
        let issued = auth.keys().create(RootId::generate(), "hook", None).unwrap();
        let sig = WebhookSignatureVerifier::sign(BODY, issued.api_key.as_bytes());

        let form = Headers::new()
            .with("Content-Type", "application/x-www-form-urlencoded")
            .with("X-API-Key", issued.api_key.clone())
            .with("X-Webhook-Signature", sig.clone());
        let decision = auth.authenticate(AuthTier::Webhook, &form, BODY);
        assert!(matches!(decision, Decision::Rejected(ref r) if r.kind == ErrorKind::InvalidRequest && r.status() == 400));

        let untyped = Headers::new()
            .with("X-API-Key", issued.api_key.clone())
            .with("X-Webhook-Signature", sig.clone());
        assert!(!auth.authenticate(AuthTier::Webhook, &untyped, BODY).is_allowed());

        // The missing key is reported first, whatever the body looks like.
        let keyless = Headers::new().with("Content-Type", "text/plain");
        let decision = auth.authenticate(AuthTier::Webhook, &keyless, BODY);
        assert!(matches!(decision, Decision::Rejected(ref r) if r.kind == ErrorKind::Unauthorized));

        let json = hook(&issued.api_key).with("X-Webhook-Signature", sig);
        assert!(auth.authenticate(AuthTier::Webhook, &json, BODY).is_allowed());
    }
}
