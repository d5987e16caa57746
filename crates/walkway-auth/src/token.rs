//! Bearer session tokens.
//!
//! Tokens are standard JWTs (HS256 or EdDSA) carrying `sub`, `iat` and
//! `exp` in Unix seconds. They are never stored: validation needs only the
//! configured key and the clock. Expiry is checked against the injected
//! [`Clock`](walkway_core::Clock), so the library's own wall-clock check
//! is turned off.

use ed25519_dalek::pkcs8::EncodePrivateKey;
use ed25519_dalek::SigningKey;
use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use walkway_core::{RootId, SharedClock};

use crate::config::{TokenAlgorithm, TokenConfig};
use crate::error::{AuthError, Result};

/// Claims carried by a session token. Times are Unix seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// The acting root.
    pub sub: RootId,
    /// Issued at.
    pub iat: i64,
    /// Expires at.
    pub exp: i64,
}

impl SessionClaims {
    /// Returns `true` once `now_millis` is past `exp`.
    pub fn is_expired_at(&self, now_millis: i64) -> bool {
        now_millis > self.exp.saturating_mul(1000)
    }
}

/// Issues and validates bearer tokens.
pub struct SessionTokens {
    header: Header,
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    expiry_secs: i64,
    clock: SharedClock,
}

impl SessionTokens {
    /// Build from configuration.
    pub fn new(config: &TokenConfig, clock: SharedClock) -> Result<Self> {
        if config.secret.is_empty() {
            return Err(AuthError::Config("token secret must not be empty".into()));
        }
        let (algorithm, encoding, decoding) = match config.algorithm {
            TokenAlgorithm::Hs256 => (
                Algorithm::HS256,
                EncodingKey::from_secret(config.secret.as_bytes()),
                DecodingKey::from_secret(config.secret.as_bytes()),
            ),
            TokenAlgorithm::EdDsa => {
                let seed: [u8; 32] = hex::decode(&config.secret)
                    .ok()
                    .and_then(|bytes| bytes.try_into().ok())
                    .ok_or_else(|| {
                        AuthError::Config("ed_dsa secret must be 32 hex-encoded bytes".into())
                    })?;
                let signing = SigningKey::from_bytes(&seed);
                let der = signing
                    .to_pkcs8_der()
                    .map_err(|e| AuthError::Config(format!("ed_dsa key encoding: {e}")))?;
                (
                    Algorithm::EdDSA,
                    EncodingKey::from_ed_der(der.as_bytes()),
                    DecodingKey::from_ed_der(signing.verifying_key().as_bytes()),
                )
            }
        };
        let expiry_secs = i64::try_from(config.expiry_secs)
            .map_err(|_| AuthError::Config("token expiry out of range".into()))?;

        let mut validation = Validation::new(algorithm);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Ok(Self {
            header: Header::new(algorithm),
            encoding,
            decoding,
            validation,
            expiry_secs,
            clock,
        })
    }

    /// Mint a token for `root`, valid from now for the configured window.
    pub fn issue(&self, root: RootId) -> Result<String> {
        let iat = self.clock.now_millis().div_euclid(1000);
        let claims = SessionClaims {
            sub: root,
            iat,
            exp: iat.saturating_add(self.expiry_secs),
        };
        encode(&self.header, &claims, &self.encoding)
            .map_err(|e| AuthError::Config(format!("sign session token: {e}")))
    }

    /// Check signature, algorithm and expiry, returning the claims.
    ///
    /// A well-signed token past `exp` yields [`AuthError::Expired`];
    /// anything malformed, badly signed or signed with another algorithm
    /// yields [`AuthError::InvalidCredential`].
    pub fn validate(&self, token: &str) -> Result<SessionClaims> {
        let claims = decode::<SessionClaims>(token, &self.decoding, &self.validation)
            .map_err(|e| match e.kind() {
                JwtErrorKind::ExpiredSignature => AuthError::Expired("session token".into()),
                _ => AuthError::InvalidCredential(format!("session token: {e}")),
            })?
            .claims;
        if claims.is_expired_at(self.clock.now_millis()) {
            return Err(AuthError::Expired("session token".into()));
        }
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use walkway_core::ManualClock;

    fn tokens(algorithm: TokenAlgorithm, clock: &ManualClock) -> SessionTokens {
        let secret = match algorithm {
            TokenAlgorithm::Hs256 => "hs-secret".to_string(),
            TokenAlgorithm::EdDsa => "07".repeat(32),
        };
        let config = TokenConfig {
            secret,
            algorithm,
            expiry_secs: 60,
        };
        SessionTokens::new(&config, Arc::new(clock.clone())).unwrap()
    }

    #[test]
    fn test_issue_validate_both_algorithms() {
        for algorithm in [TokenAlgorithm::Hs256, TokenAlgorithm::EdDsa] {
            let clock = ManualClock::new(1_000);
            let tokens = tokens(algorithm, &clock);
            let root = RootId::generate();

            let token = tokens.issue(root).unwrap();
            assert_eq!(token.split('.').count(), 3);
            let claims = tokens.validate(&token).unwrap();
            assert_eq!(claims.sub, root);
            assert_eq!(claims.iat, 1);
            assert_eq!(claims.exp, 61);
        }
    }

    #[test]
    fn test_standard_jwt_interop() {
        // A token minted by any HS256 JWT issuer with the same secret is accepted.
        let clock = ManualClock::new(0);
        let tokens = tokens(TokenAlgorithm::Hs256, &clock);
        let root = RootId::generate();
        let foreign = encode(
            &Header::new(Algorithm::HS256),
            &SessionClaims { sub: root, iat: 0, exp: 30 },
            &EncodingKey::from_secret(b"hs-secret"),
        )
        .unwrap();
        assert_eq!(tokens.validate(&foreign).unwrap().sub, root);
    }

    #[test]
    fn test_expired_is_distinct() {
        let clock = ManualClock::new(0);
        let tokens = tokens(TokenAlgorithm::Hs256, &clock);
        let token = tokens.issue(RootId::generate()).unwrap();

        clock.set(60_000);
        tokens.validate(&token).unwrap();
        clock.advance(1);
        assert!(matches!(tokens.validate(&token), Err(AuthError::Expired(_))));
    }

    #[test]
    fn test_tampered_or_foreign_tokens_rejected() {
        let clock = ManualClock::new(0);
        let tokens = tokens(TokenAlgorithm::Hs256, &clock);
        let token = tokens.issue(RootId::generate()).unwrap();

        let (signed, sig) = token.rsplit_once('.').unwrap();
        let other = tokens.issue(RootId::generate()).unwrap();
        let (other_signed, _) = other.rsplit_once('.').unwrap();
        let spliced = format!("{other_signed}.{sig}");
        assert!(matches!(
            tokens.validate(&spliced),
            Err(AuthError::InvalidCredential(_))
        ));
        assert!(tokens.validate(signed).is_err());
        assert!(tokens.validate("").is_err());
        assert!(tokens.validate("a.b.c").is_err());

        let foreign = SessionTokens::new(
            &TokenConfig {
                secret: "other".into(),
                ..Default::default()
            },
            Arc::new(clock.clone()),
        )
        .unwrap();
        assert!(matches!(
            foreign.validate(&token),
            Err(AuthError::InvalidCredential(_))
        ));
    }

    #[test]
    fn test_algorithm_mismatch_rejected() {
        let clock = ManualClock::new(0);
        let hs = tokens(TokenAlgorithm::Hs256, &clock);
        let ed = tokens(TokenAlgorithm::EdDsa, &clock);
        let token = ed.issue(RootId::generate()).unwrap();
        assert!(matches!(hs.validate(&token), Err(AuthError::InvalidCredential(_))));
        let token = hs.issue(RootId::generate()).unwrap();
        assert!(matches!(ed.validate(&token), Err(AuthError::InvalidCredential(_))));
    }

    #[test]
    fn test_bad_eddsa_seed_rejected() {
        let config = TokenConfig {
            secret: "abcd".into(),
            algorithm: TokenAlgorithm::EdDsa,
            ..Default::default()
        };
        assert!(matches!(
            SessionTokens::new(&config, Arc::new(ManualClock::new(0))),
            Err(AuthError::Config(_))
        ));
    }
}
