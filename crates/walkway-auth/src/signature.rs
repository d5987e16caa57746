//! Webhook body signatures.
//!
//! HMAC-SHA256 over the exact raw body bytes, hex-encoded. The body is
//! never reparsed before hashing.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Optional scheme prefix some senders put in front of the hex digest.
const SCHEME_PREFIX: &str = "sha256=";

/// Computes and checks webhook body signatures.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebhookSignatureVerifier;

impl WebhookSignatureVerifier {
    fn mac(body: &[u8], secret: &[u8]) -> [u8; 32] {
        // HMAC accepts keys of any length, including empty ones.
        let mut mac = match HmacSha256::new_from_slice(secret) {
            Ok(mac) => mac,
            Err(_) => unreachable!("hmac takes keys of any length"),
        };
        mac.update(body);
        mac.finalize().into_bytes().into()
    }

    /// Lowercase hex HMAC-SHA256 of `body` under `secret`.
    pub fn sign(body: &[u8], secret: &[u8]) -> String {
        hex::encode(Self::mac(body, secret))
    }

    /// Whether `presented` is the signature of `body` under `secret`.
    ///
    /// Accepts upper or lower case hex and an optional `sha256=` prefix.
    /// The digest comparison is constant time.
    pub fn verify(body: &[u8], secret: &[u8], presented: &str) -> bool {
        let presented = presented.trim();
        let presented = presented.strip_prefix(SCHEME_PREFIX).unwrap_or(presented);
        let Ok(presented) = hex::decode(presented) else {
            return false;
        };
        if presented.len() != 32 {
            return false;
        }
        let expected = Self::mac(body, secret);
        expected[..].ct_eq(presented.as_slice()).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const BODY: &[u8] = br#"{"event":"push","ref":"main"}"#;

    #[test]
    fn test_known_vector() {
        // RFC 4231 test case 2.
        assert_eq!(
            WebhookSignatureVerifier::sign(b"what do ya want for nothing?", b"Jefe"),
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn test_sign_then_verify() {
        let sig = WebhookSignatureVerifier::sign(BODY, b"key");
        assert!(WebhookSignatureVerifier::verify(BODY, b"key", &sig));
        assert!(WebhookSignatureVerifier::verify(BODY, b"key", &sig.to_uppercase()));
        assert!(WebhookSignatureVerifier::verify(BODY, b"key", &format!("sha256={sig}")));
    }

    #[test]
    fn test_wrong_key_or_garbage_fails() {
        let sig = WebhookSignatureVerifier::sign(BODY, b"key");
        assert!(!WebhookSignatureVerifier::verify(BODY, b"other", &sig));
        assert!(!WebhookSignatureVerifier::verify(BODY, b"key", "not-hex"));
        assert!(!WebhookSignatureVerifier::verify(BODY, b"key", &sig[..32]));
        assert!(!WebhookSignatureVerifier::verify(BODY, b"key", ""));
    }

    #[test]
    fn test_whitespace_change_invalidates() {
        let sig = WebhookSignatureVerifier::sign(BODY, b"key");
        let reformatted = br#"{"event": "push","ref":"main"}"#;
        assert!(!WebhookSignatureVerifier::verify(reformatted, b"key", &sig));
    }

    proptest! {
        #[test]
        fn test_any_byte_flip_invalidates(
            body in proptest::collection::vec(any::<u8>(), 1..256),
            index in any::<prop::sample::Index>(),
            flip in 1u8..=255,
        ) {
            let sig = WebhookSignatureVerifier::sign(&body, b"secret");
            prop_assert_eq!(&sig, &WebhookSignatureVerifier::sign(&body, b"secret"));

            let mut tampered = body.clone();
            let i = index.index(tampered.len());
            tampered[i] ^= flip;
            prop_assert!(!WebhookSignatureVerifier::verify(&tampered, b"secret", &sig));
        }
    }
}
