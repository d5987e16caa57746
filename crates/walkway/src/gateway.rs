//! The Gateway: everything the HTTP front-end and the traversal engine
//! call into.
//!
//! Backends are synchronous and every mutation is one atomic unit, so the
//! async entry points run the whole request on the blocking pool. A caller
//! that drops the future before it completes gets either the full effect
//! or none of it.

use std::collections::BTreeMap;
use std::sync::Arc;

use bytes::Bytes;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use walkway_auth::{
    ApiKey, ApiKeyManager, Decision, Headers, InvocationAuthenticator, IssuedApiKey, Rejection,
    SessionTokens,
};
use walkway_core::{
    AccessLevel, AclEntry, AclScope, ApiKeyId, ArchetypeId, ErrorKind, RootId, SharedClock,
    SystemClock,
};
use walkway_perms::{AccessEvaluator, Capabilities, PermissionStore, PermsError, TraversalGuard};
use walkway_routes::{
    BuiltinRoute, EndpointRegistry, EndpointTarget, Method, RouteMatch, WalkerSpec,
};
use walkway_store::{AclWriter, ApiKeyStore, ArchetypeDirectory, UpsertOutcome};

use crate::config::GatewayConfig;
use crate::error::{GatewayError, Result};

/// Body of `POST /api-key/create`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateApiKeyRequest {
    /// Display name.
    pub name: String,
    /// Lifetime in days; `0` is permanent, absent uses the configured default.
    #[serde(default)]
    pub expiry_days: Option<u32>,
}

/// What an authorized request resolved to.
#[derive(Debug, Clone)]
pub enum Invocation {
    /// Run this walker. `subject` is `None` on an anonymous public call.
    Walker {
        walker: Arc<WalkerSpec>,
        subject: Option<RootId>,
        params: BTreeMap<String, String>,
    },
    /// A built-in route, already handled.
    Builtin { route: BuiltinRoute, response: Value },
}

/// The access-control and secure-invocation layer.
///
/// Cheap to clone; clones share state.
pub struct Gateway<S, D> {
    inner: Arc<GatewayInner<S, D>>,
}

struct GatewayInner<S, D> {
    config: GatewayConfig,
    registry: EndpointRegistry,
    auth: InvocationAuthenticator<Arc<S>>,
    perms: PermissionStore<Arc<S>>,
    evaluator: AccessEvaluator<Arc<S>, D>,
}

impl<S, D> Clone for Gateway<S, D> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S, D> Gateway<S, D>
where
    S: AclWriter + ApiKeyStore + 'static,
    D: ArchetypeDirectory + 'static,
{
    /// Build a gateway on the system clock.
    ///
    /// Fails on invalid configuration or an ambiguous route table; the
    /// process must not start serving in either case.
    pub fn new(
        config: GatewayConfig,
        store: S,
        directory: D,
        walkers: impl IntoIterator<Item = WalkerSpec>,
    ) -> Result<Self> {
        Self::with_clock(config, store, directory, walkers, Arc::new(SystemClock))
    }

    /// Build a gateway on an explicit clock.
    pub fn with_clock(
        config: GatewayConfig,
        store: S,
        directory: D,
        walkers: impl IntoIterator<Item = WalkerSpec>,
        clock: SharedClock,
    ) -> Result<Self> {
        config.validate()?;
        let store = Arc::new(store);

        let tokens = SessionTokens::new(&config.auth.token, clock.clone())?;
        let keys = ApiKeyManager::new(
            store.clone(),
            clock,
            config.auth.api_key.default_expiry_days,
        );
        let auth = InvocationAuthenticator::new(tokens, keys, config.auth.webhook.clone());
        let registry = EndpointRegistry::build(walkers)?;
        info!(endpoints = registry.len(), "gateway ready");

        Ok(Self {
            inner: Arc::new(GatewayInner {
                config,
                registry,
                auth,
                perms: PermissionStore::new(store.clone()),
                evaluator: AccessEvaluator::new(store, directory),
            }),
        })
    }

    /// The configuration in effect.
    pub fn config(&self) -> &GatewayConfig {
        &self.inner.config
    }

    /// The route table.
    pub fn registry(&self) -> &EndpointRegistry {
        &self.inner.registry
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Front-end
    // ─────────────────────────────────────────────────────────────────────────

    /// Find the endpoint for `(method, path)`.
    pub fn lookup_endpoint(&self, method: Method, path: &str) -> Result<RouteMatch<'_>> {
        Ok(self.inner.registry.lookup(method, path)?)
    }

    /// Authenticate a request for the endpoint it targets.
    ///
    /// An unknown route is rejected with `NotFound`. `body` must be the raw
    /// bytes as received.
    pub async fn authorize(&self, method: Method, path: &str, headers: Headers, body: Bytes) -> Decision {
        let gateway = self.clone();
        let path = path.to_string();
        let task =
            tokio::task::spawn_blocking(move || gateway.authorize_blocking(method, &path, &headers, &body));
        match task.await {
            Ok(decision) => decision,
            Err(e) => Decision::Rejected(Rejection::new(
                ErrorKind::Internal,
                format!("authorization task failed: {e}"),
            )),
        }
    }

    /// [`Gateway::authorize`] on the calling thread.
    pub fn authorize_blocking(&self, method: Method, path: &str, headers: &Headers, body: &[u8]) -> Decision {
        match self.inner.registry.lookup(method, path) {
            Ok(matched) => self.inner.auth.authenticate(matched.tier(), headers, body),
            Err(e) => {
                warn!(%method, path, "no endpoint");
                Decision::Rejected(Rejection::new(e.kind(), e.to_string()))
            }
        }
    }

    /// Route, authenticate and, for built-in routes, execute a request.
    ///
    /// Walker routes resolve to [`Invocation::Walker`] for the traversal
    /// engine to run. Every failure happens before any walker code runs.
    pub async fn handle(&self, method: Method, path: &str, headers: Headers, body: Bytes) -> Result<Invocation> {
        let gateway = self.clone();
        let path = path.to_string();
        tokio::task::spawn_blocking(move || gateway.handle_blocking(method, &path, &headers, &body))
            .await
            .map_err(|e| GatewayError::Internal(format!("request task failed: {e}")))?
    }

    /// [`Gateway::handle`] on the calling thread.
    pub fn handle_blocking(&self, method: Method, path: &str, headers: &Headers, body: &[u8]) -> Result<Invocation> {
        let matched = self.inner.registry.lookup(method, path)?;
        let subject = match self.inner.auth.authenticate(matched.tier(), headers, body) {
            Decision::Authenticated { root, .. } => Some(root),
            Decision::Anonymous => None,
            Decision::Rejected(rejection) => return Err(rejection.into()),
        };

        match &matched.endpoint.target {
            EndpointTarget::Walker(walker) => Ok(Invocation::Walker {
                walker: Arc::clone(walker),
                subject,
                params: matched.params.clone(),
            }),
            EndpointTarget::Builtin(route) => {
                let response = self.run_builtin(*route, subject, &matched.params, body)?;
                Ok(Invocation::Builtin {
                    route: *route,
                    response,
                })
            }
        }
    }

    fn run_builtin(
        &self,
        route: BuiltinRoute,
        subject: Option<RootId>,
        params: &BTreeMap<String, String>,
        body: &[u8],
    ) -> Result<Value> {
        let require_root = || {
            subject.ok_or_else(|| {
                GatewayError::Rejected(Rejection::new(ErrorKind::Unauthorized, "session required"))
            })
        };

        match route {
            BuiltinRoute::ApiKeyCreate => {
                let root = require_root()?;
                let request: CreateApiKeyRequest = serde_json::from_slice(body)
                    .map_err(|e| GatewayError::InvalidRequest(format!("create api key: {e}")))?;
                let issued = self.create_api_key(root, &request.name, request.expiry_days)?;
                to_json(&issued)
            }
            BuiltinRoute::ApiKeyList => {
                let root = require_root()?;
                let keys = self.list_api_keys(&root)?;
                Ok(json!({ "keys": to_json(&keys)? }))
            }
            BuiltinRoute::ApiKeyRevoke => {
                let root = require_root()?;
                let id = ApiKeyId::from_hex(path_param(params, "id")?)
                    .map_err(|e| GatewayError::InvalidRequest(e.to_string()))?;
                self.revoke_api_key(&id, &root)?;
                Ok(json!({ "revoked": id.to_hex() }))
            }
            BuiltinRoute::SsoLogin | BuiltinRoute::SsoRegister | BuiltinRoute::SsoCallback => {
                // The identity provider exchange happens in the front-end;
                // this only validates the route and reports what matched.
                let action = match route {
                    BuiltinRoute::SsoLogin => "login",
                    BuiltinRoute::SsoRegister => "register",
                    _ => "callback",
                };
                Ok(json!({
                    "platform": path_param(params, "platform")?,
                    "action": action,
                    "root": subject.map(|r| r.to_string()),
                }))
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Sessions and API keys
    // ─────────────────────────────────────────────────────────────────────────

    /// Mint a bearer token for `root`, e.g. once an SSO callback completes.
    pub fn issue_session(&self, root: RootId) -> Result<String> {
        let token = self.inner.auth.tokens().issue(root)?;
        debug!(%root, "session issued");
        Ok(token)
    }

    fn keys(&self) -> &ApiKeyManager<Arc<S>> {
        self.inner.auth.keys()
    }

    /// Issue an API key for `root`. See [`ApiKeyManager::create`].
    pub fn create_api_key(&self, root: RootId, name: &str, expiry_days: Option<u32>) -> Result<IssuedApiKey> {
        Ok(self.keys().create(root, name, expiry_days)?)
    }

    /// Metadata of `root`'s keys, oldest first.
    pub fn list_api_keys(&self, root: &RootId) -> Result<Vec<ApiKey>> {
        Ok(self.keys().list(root)?)
    }

    /// Delete a key owned by `requester`.
    pub fn revoke_api_key(&self, key_id: &ApiKeyId, requester: &RootId) -> Result<()> {
        Ok(self.keys().revoke(key_id, requester)?)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Traversal
    // ─────────────────────────────────────────────────────────────────────────

    /// The evaluator the traversal engine consults.
    pub fn evaluator(&self) -> &AccessEvaluator<Arc<S>, D> {
        &self.inner.evaluator
    }

    /// Whether `subject` holds `required` on `archetype`. Never fails.
    pub fn check_access(&self, subject: &RootId, archetype: &ArchetypeId, required: AccessLevel) -> bool {
        self.inner.evaluator.check_access(subject, archetype, required)
    }

    /// Effective level of `subject` on `archetype`. Never fails.
    pub fn effective_level(&self, subject: &RootId, archetype: &ArchetypeId) -> AccessLevel {
        self.inner.evaluator.effective_level(subject, archetype)
    }

    /// Traverse/read/write capabilities of `subject` on `archetype`.
    pub fn capabilities(&self, subject: &RootId, archetype: &ArchetypeId) -> Capabilities {
        self.inner.evaluator.capabilities(subject, archetype)
    }

    /// A per-object guard for one walker run.
    pub fn guard(&self, subject: RootId) -> TraversalGuard<'_, Arc<S>, D> {
        TraversalGuard::new(&self.inner.evaluator, subject)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Grant management
    // ─────────────────────────────────────────────────────────────────────────

    /// The permission store, without ownership checks.
    ///
    /// For trusted callers such as the graph store itself.
    pub fn permissions(&self) -> &PermissionStore<Arc<S>> {
        &self.inner.perms
    }

    fn require_owner(&self, requester: &RootId, archetype: &ArchetypeId) -> Result<()> {
        let found = self
            .inner
            .evaluator
            .directory()
            .archetype(archetype)
            .map_err(PermsError::from)?;
        match found {
            None => Err(PermsError::ArchetypeNotFound(*archetype).into()),
            Some(a) if &a.owner == requester => Ok(()),
            Some(_) => {
                warn!(%requester, %archetype, "acl change refused: not owner");
                Err(PermsError::NotOwner {
                    requester: *requester,
                    archetype: *archetype,
                }
                .into())
            }
        }
    }

    /// Upsert a grant on an archetype `requester` owns.
    pub fn grant(
        &self,
        requester: &RootId,
        archetype: &ArchetypeId,
        scope: AclScope,
        level: AccessLevel,
    ) -> Result<UpsertOutcome> {
        self.require_owner(requester, archetype)?;
        Ok(self.inner.perms.grant(archetype, scope, level)?)
    }

    /// Remove a grant on an archetype `requester` owns. Idempotent.
    pub fn revoke(&self, requester: &RootId, archetype: &ArchetypeId, scope: &AclScope) -> Result<()> {
        self.require_owner(requester, archetype)?;
        Ok(self.inner.perms.revoke(archetype, scope)?)
    }

    pub fn set_public(&self, requester: &RootId, archetype: &ArchetypeId, level: AccessLevel) -> Result<UpsertOutcome> {
        self.grant(requester, archetype, AclScope::Public, level)
    }

    pub fn unset_public(&self, requester: &RootId, archetype: &ArchetypeId) -> Result<()> {
        self.revoke(requester, archetype, &AclScope::Public)
    }

    pub fn allow_root(
        &self,
        requester: &RootId,
        archetype: &ArchetypeId,
        root: RootId,
        level: AccessLevel,
    ) -> Result<UpsertOutcome> {
        self.grant(requester, archetype, AclScope::Root(root), level)
    }

    pub fn disallow_root(
        &self,
        requester: &RootId,
        archetype: &ArchetypeId,
        root: RootId,
        level: AccessLevel,
    ) -> Result<()> {
        self.require_owner(requester, archetype)?;
        Ok(self.inner.perms.disallow_root(archetype, root, level)?)
    }

    /// Current entries of an archetype `requester` owns.
    pub fn acl_entries(&self, requester: &RootId, archetype: &ArchetypeId) -> Result<Vec<AclEntry>> {
        self.require_owner(requester, archetype)?;
        Ok(self.inner.perms.entries(archetype)?)
    }
}

fn path_param<'a>(params: &'a BTreeMap<String, String>, name: &str) -> Result<&'a str> {
    params
        .get(name)
        .map(String::as_str)
        .ok_or_else(|| GatewayError::InvalidRequest(format!("missing path parameter {name}")))
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| GatewayError::Internal(format!("encode response: {e}")))
}
