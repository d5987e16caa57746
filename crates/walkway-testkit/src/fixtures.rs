//! Test fixtures and helpers.

use std::sync::Arc;

use walkway::{Gateway, GatewayConfig};
use walkway_auth::{Headers, IssuedApiKey, WebhookSignatureVerifier};
use walkway_core::{Archetype, ArchetypeId, ManualClock, RootId};
use walkway_routes::{Method, WalkerSpec};
use walkway_store::MemoryStore;

/// Start time of every fixture clock: 2023-11-14T22:13:20Z.
pub const TEST_EPOCH: i64 = 1_700_000_000_000;

/// Token secret used by fixtures.
pub const TEST_TOKEN_SECRET: &str = "walkway-testkit-secret";

/// Walkers covering every tier:
///
/// - `create_post`: protected, `POST /walker/create_post`
/// - `feed`: public, `GET /walker/feed`
/// - `on_push`: webhook, `POST /webhook/on_push`
/// - `reindex`: private
pub fn standard_walkers() -> Vec<WalkerSpec> {
    [
        WalkerSpec::builder("create_post"),
        WalkerSpec::builder("feed").public().method(Method::Get),
        WalkerSpec::builder("on_push").webhook(),
        WalkerSpec::builder("reindex").private(),
    ]
    .into_iter()
    .map(|b| b.build().expect("fixture walker specs are valid"))
    .collect()
}

/// A gateway over one shared [`MemoryStore`] with a manual clock.
pub struct TestGateway {
    pub gateway: Gateway<Arc<MemoryStore>, Arc<MemoryStore>>,
    pub store: Arc<MemoryStore>,
    pub clock: ManualClock,
}

impl TestGateway {
    /// Default config and [`standard_walkers`].
    pub fn new() -> Self {
        Self::with_config(GatewayConfig::with_token_secret(TEST_TOKEN_SECRET))
    }

    /// Custom config with [`standard_walkers`].
    pub fn with_config(config: GatewayConfig) -> Self {
        Self::with_walkers(config, standard_walkers())
    }

    /// Custom config and walkers.
    pub fn with_walkers(config: GatewayConfig, walkers: Vec<WalkerSpec>) -> Self {
        let store = Arc::new(MemoryStore::new());
        let clock = ManualClock::new(TEST_EPOCH);
        let gateway = Gateway::with_clock(
            config,
            store.clone(),
            store.clone(),
            walkers,
            Arc::new(clock.clone()),
        )
        .expect("fixture gateway builds");
        Self {
            gateway,
            store,
            clock,
        }
    }

    /// Register a fresh archetype owned by `owner`.
    pub fn archetype(&self, owner: RootId) -> ArchetypeId {
        let id = ArchetypeId::generate();
        self.store
            .register_archetype(Archetype::new(id, "Node", owner))
            .expect("memory store accepts archetypes");
        id
    }

    /// Headers carrying a fresh session for `root`.
    pub fn bearer(&self, root: RootId) -> Headers {
        let token = self
            .gateway
            .issue_session(root)
            .expect("fixture token issues");
        Headers::new().with("Authorization", format!("Bearer {token}"))
    }

    /// Issue a key for `root` with the default lifetime.
    pub fn api_key(&self, root: RootId) -> IssuedApiKey {
        self.gateway
            .create_api_key(root, "fixture", None)
            .expect("fixture key issues")
    }

    /// Webhook headers for `body`, signed with the key itself.
    pub fn webhook_headers(&self, key: &IssuedApiKey, body: &[u8]) -> Headers {
        let config = &self.gateway.config().auth.webhook;
        Headers::new()
            .with("Content-Type", "application/json")
            .with(config.api_key_header.clone(), key.api_key.clone())
            .with(
                config.signature_header.clone(),
                WebhookSignatureVerifier::sign(body, key.api_key.as_bytes()),
            )
    }
}

impl Default for TestGateway {
    fn default() -> Self {
        Self::new()
    }
}

/// A JSON webhook body.
pub fn webhook_body(event: &str) -> Vec<u8> {
    serde_json::to_vec(&serde_json::json!({ "event": event, "delivery": 1 }))
        .unwrap_or_default()
}
