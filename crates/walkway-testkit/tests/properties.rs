//! Property tests for the access-control and invocation invariants.

use bytes::Bytes;
use proptest::prelude::*;
use walkway::auth::WebhookSignatureVerifier;
use walkway::core::MILLIS_PER_DAY;
use walkway::{AccessLevel, AclScope, Decision, ErrorKind, Headers, Method, RootId};
use walkway_testkit::generators::{access_level, body, walker_name, AclOp};
use walkway_testkit::TestGateway;

fn apply(t: &TestGateway, owner: &RootId, node: &walkway::ArchetypeId, ops: &[AclOp]) {
    for op in ops {
        match op {
            AclOp::Grant(scope, level) => {
                t.gateway.grant(owner, node, *scope, *level).unwrap();
            }
            AclOp::Revoke(scope) => t.gateway.revoke(owner, node, scope).unwrap(),
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn owner_is_always_write(steps in proptest::collection::vec((0usize..4, proptest::option::of(access_level())), 0..12)) {
        let t = TestGateway::new();
        let owner = RootId::generate();
        let node = t.archetype(owner);
        let scopes = [
            AclScope::Public,
            AclScope::Root(owner),
            AclScope::Root(RootId::generate()),
            AclScope::Root(RootId::generate()),
        ];

        let ops: Vec<AclOp> = steps
            .into_iter()
            .map(|(i, level)| match level {
                Some(level) => AclOp::Grant(scopes[i], level),
                None => AclOp::Revoke(scopes[i]),
            })
            .collect();
        apply(&t, &owner, &node, &ops);
        prop_assert_eq!(t.gateway.effective_level(&owner, &node), AccessLevel::Write);
    }

    #[test]
    fn effective_level_is_max_of_public_and_root(public in proptest::option::of(access_level()), own in proptest::option::of(access_level())) {
        let t = TestGateway::new();
        let owner = RootId::generate();
        let subject = RootId::generate();
        let node = t.archetype(owner);
        if let Some(level) = public {
            t.gateway.set_public(&owner, &node, level).unwrap();
        }
        if let Some(level) = own {
            t.gateway.allow_root(&owner, &node, subject, level).unwrap();
        }

        let expected = public.into_iter().chain(own).fold(AccessLevel::NoAccess, AccessLevel::max);
        prop_assert_eq!(t.gateway.effective_level(&subject, &node), expected);

        // Removing the root grant falls back to the public one.
        t.gateway.disallow_root(&owner, &node, subject, AccessLevel::Write).unwrap();
        prop_assert_eq!(
            t.gateway.effective_level(&subject, &node),
            public.unwrap_or(AccessLevel::NoAccess)
        );
    }

    #[test]
    fn revoke_twice_equals_once(level in access_level(), revoke_public in any::<bool>()) {
        let t = TestGateway::new();
        let owner = RootId::generate();
        let other = RootId::generate();
        let node = t.archetype(owner);
        t.gateway.set_public(&owner, &node, level).unwrap();
        t.gateway.allow_root(&owner, &node, other, level).unwrap();

        let scope = if revoke_public { AclScope::Public } else { AclScope::Root(other) };
        t.gateway.revoke(&owner, &node, &scope).unwrap();
        let once = t.gateway.acl_entries(&owner, &node).unwrap();
        t.gateway.revoke(&owner, &node, &scope).unwrap();
        prop_assert_eq!(t.gateway.acl_entries(&owner, &node).unwrap(), once);
    }

    #[test]
    fn webhook_walkers_never_at_walker_path(name in walker_name()) {
        let t = TestGateway::with_walkers(
            walkway::GatewayConfig::with_token_secret("p"),
            vec![walkway::WalkerSpec::builder(name.clone()).webhook().build().unwrap()],
        );
        let walker_path = format!("/walker/{name}");
        let webhook_path = format!("/webhook/{name}");
        prop_assert!(t.gateway.lookup_endpoint(Method::Post, &walker_path).is_err());
        prop_assert!(t.gateway.lookup_endpoint(Method::Post, &webhook_path).is_ok());
    }

    #[test]
    fn any_byte_change_rejects_webhook(data in body(128), index in any::<prop::sample::Index>(), flip in 1u8..=255) {
        let t = TestGateway::new();
        let owner = RootId::generate();
        let key = t.api_key(owner);
        let headers = t.webhook_headers(&key, &data);

        let ok = t.gateway.authorize_blocking(Method::Post, "/webhook/on_push", &headers, &data);
        prop_assert_eq!(ok.root(), Some(owner));

        let mut tampered = data.clone();
        let i = index.index(tampered.len());
        tampered[i] ^= flip;
        let bad = t.gateway.authorize_blocking(Method::Post, "/webhook/on_push", &headers, &tampered);
        prop_assert!(matches!(bad, Decision::Rejected(ref r) if r.kind == ErrorKind::InvalidSignature));
    }

    #[test]
    fn missing_api_key_always_unauthorized(data in body(64), sign_anyway in any::<bool>()) {
        let t = TestGateway::new();
        let mut headers = Headers::new();
        if sign_anyway {
            let key = t.api_key(RootId::generate());
            headers.insert("X-Webhook-Signature", WebhookSignatureVerifier::sign(&data, key.api_key.as_bytes()));
        }
        let decision = t.gateway.authorize_blocking(Method::Post, "/webhook/on_push", &headers, &data);
        prop_assert!(matches!(decision, Decision::Rejected(ref r) if r.kind == ErrorKind::Unauthorized));
    }

    #[test]
    fn key_expiry_boundary(days in 1u32..400, extra_ms in 1i64..MILLIS_PER_DAY) {
        let t = TestGateway::new();
        let owner = RootId::generate();
        let issued = t.gateway.create_api_key(owner, "k", Some(days)).unwrap();
        let data = b"{}";
        let headers = t.webhook_headers(&issued, data);

        t.clock.advance_days(i64::from(days));
        let at_expiry = t.gateway.authorize_blocking(Method::Post, "/webhook/on_push", &headers, data);
        prop_assert_eq!(at_expiry.root(), Some(owner));

        t.clock.advance(extra_ms);
        let after = t.gateway.authorize_blocking(Method::Post, "/webhook/on_push", &headers, data);
        prop_assert!(matches!(after, Decision::Rejected(ref r) if r.kind == ErrorKind::Expired));
    }
}

#[tokio::test]
async fn permanent_keys_outlive_any_clock() {
    let t = TestGateway::new();
    let owner = RootId::generate();
    let issued = t.gateway.create_api_key(owner, "forever", Some(0)).unwrap();
    let data = walkway_testkit::webhook_body("ping");
    let headers = t.webhook_headers(&issued, &data);

    for years in [1, 10, 1000] {
        t.clock.advance_days(365 * years);
        let decision = t
            .gateway
            .authorize(Method::Post, "/webhook/on_push", headers.clone(), Bytes::from(data.clone()))
            .await;
        assert_eq!(decision.root(), Some(owner));
    }
}
