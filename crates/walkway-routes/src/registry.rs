//! The route table.
//!
//! Built once at startup, read-only afterwards. An ambiguous table never
//! gets built: two endpoints with the same method whose patterns can match
//! a common path fail [`EndpointRegistry::build`] with
//! [`RouteError::Conflict`], unless one strictly refines the other
//! (`/api-key/list` refines `/api-key/{id}`).

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, error, info};
use walkway_auth::AuthTier;

use crate::error::{Result, RouteError};
use crate::pattern::PathPattern;
use crate::spec::{Method, WalkerSpec};

/// Routes served by the gateway itself rather than by a walker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuiltinRoute {
    /// `POST /api-key/create`
    ApiKeyCreate,
    /// `GET /api-key/list`
    ApiKeyList,
    /// `DELETE /api-key/{id}`
    ApiKeyRevoke,
    /// `GET /sso/{platform}/login`
    SsoLogin,
    /// `GET /sso/{platform}/register`
    SsoRegister,
    /// `GET /sso/{platform}/login/callback`
    SsoCallback,
}

impl BuiltinRoute {
    /// Every built-in route, in registration order.
    pub const ALL: [BuiltinRoute; 6] = [
        BuiltinRoute::ApiKeyCreate,
        BuiltinRoute::ApiKeyList,
        BuiltinRoute::ApiKeyRevoke,
        BuiltinRoute::SsoLogin,
        BuiltinRoute::SsoRegister,
        BuiltinRoute::SsoCallback,
    ];

    /// HTTP method of the route.
    pub const fn method(self) -> Method {
        match self {
            BuiltinRoute::ApiKeyCreate => Method::Post,
            BuiltinRoute::ApiKeyList => Method::Get,
            BuiltinRoute::ApiKeyRevoke => Method::Delete,
            BuiltinRoute::SsoLogin | BuiltinRoute::SsoRegister | BuiltinRoute::SsoCallback => {
                Method::Get
            }
        }
    }

    /// Path pattern of the route.
    pub const fn path(self) -> &'static str {
        match self {
            BuiltinRoute::ApiKeyCreate => "/api-key/create",
            BuiltinRoute::ApiKeyList => "/api-key/list",
            BuiltinRoute::ApiKeyRevoke => "/api-key/{id}",
            BuiltinRoute::SsoLogin => "/sso/{platform}/login",
            BuiltinRoute::SsoRegister => "/sso/{platform}/register",
            BuiltinRoute::SsoCallback => "/sso/{platform}/login/callback",
        }
    }

    /// API key management needs a session; SSO flows start without one.
    pub const fn tier(self) -> AuthTier {
        match self {
            BuiltinRoute::ApiKeyCreate | BuiltinRoute::ApiKeyList | BuiltinRoute::ApiKeyRevoke => {
                AuthTier::Protected
            }
            BuiltinRoute::SsoLogin | BuiltinRoute::SsoRegister | BuiltinRoute::SsoCallback => {
                AuthTier::Public
            }
        }
    }
}

/// What an endpoint dispatches to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndpointTarget {
    /// A declared walker.
    Walker(Arc<WalkerSpec>),
    /// A gateway-provided route.
    Builtin(BuiltinRoute),
}

impl fmt::Display for EndpointTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndpointTarget::Walker(spec) => write!(f, "walker {}", spec.name()),
            EndpointTarget::Builtin(route) => write!(f, "builtin {route:?}"),
        }
    }
}

/// One exposed `(method, path)`.
#[derive(Debug, Clone)]
pub struct Endpoint {
    /// HTTP method.
    pub method: Method,
    /// Path pattern.
    pub pattern: PathPattern,
    /// Credential the request must carry.
    pub tier: AuthTier,
    /// What the request dispatches to.
    pub target: EndpointTarget,
}

/// A successful lookup.
#[derive(Debug, Clone)]
pub struct RouteMatch<'a> {
    /// The matched endpoint.
    pub endpoint: &'a Endpoint,
    /// Values captured by `{param}` segments.
    pub params: BTreeMap<String, String>,
}

impl RouteMatch<'_> {
    /// Authentication tier of the matched endpoint.
    pub fn tier(&self) -> AuthTier {
        self.endpoint.tier
    }

    /// The walker, unless this is a built-in route.
    pub fn walker(&self) -> Option<&WalkerSpec> {
        match &self.endpoint.target {
            EndpointTarget::Walker(spec) => Some(spec),
            EndpointTarget::Builtin(_) => None,
        }
    }

    /// The built-in route, if this is one.
    pub fn builtin(&self) -> Option<BuiltinRoute> {
        match self.endpoint.target {
            EndpointTarget::Builtin(route) => Some(route),
            EndpointTarget::Walker(_) => None,
        }
    }

    /// A captured path parameter.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }
}

/// Immutable route table plus the set of declared walkers.
#[derive(Debug, Clone, Default)]
pub struct EndpointRegistry {
    endpoints: Vec<Endpoint>,
    walkers: BTreeMap<String, Arc<WalkerSpec>>,
}

impl EndpointRegistry {
    /// Register every walker plus the built-in routes.
    ///
    /// Private walkers are recorded for internal invocation but get no
    /// endpoint.
    pub fn build(specs: impl IntoIterator<Item = WalkerSpec>) -> Result<Self> {
        let mut registry = Self::default();
        for route in BuiltinRoute::ALL {
            let pattern = PathPattern::parse(route.path())?;
            registry.add(Endpoint {
                method: route.method(),
                pattern,
                tier: route.tier(),
                target: EndpointTarget::Builtin(route),
            })?;
        }
        for spec in specs {
            registry.register(spec)?;
        }
        Ok(registry)
    }

    fn register(&mut self, spec: WalkerSpec) -> Result<()> {
        // Declarations may come from config rather than the builder.
        let pattern = spec.pattern()?;
        if self.walkers.contains_key(spec.name()) {
            error!(walker = spec.name(), "duplicate walker name");
            return Err(RouteError::DuplicateWalker(spec.name().to_string()));
        }
        let spec = Arc::new(spec);
        self.walkers.insert(spec.name().to_string(), spec.clone());

        let Some(tier) = spec.auth_tier() else {
            debug!(walker = spec.name(), "private walker, not exposed");
            return Ok(());
        };
        self.add(Endpoint {
            method: spec.method(),
            pattern,
            tier,
            target: EndpointTarget::Walker(spec),
        })
    }

    fn add(&mut self, endpoint: Endpoint) -> Result<()> {
        if let Some(existing) = self
            .endpoints
            .iter()
            .find(|e| e.method == endpoint.method && e.pattern.is_ambiguous_with(&endpoint.pattern))
        {
            error!(
                method = %endpoint.method,
                path = %endpoint.pattern,
                existing = %existing.target,
                incoming = %endpoint.target,
                "route conflict"
            );
            return Err(RouteError::Conflict {
                method: endpoint.method,
                path: endpoint.pattern.to_string(),
                existing: existing.target.to_string(),
                incoming: endpoint.target.to_string(),
            });
        }
        info!(method = %endpoint.method, path = %endpoint.pattern, tier = %endpoint.tier, "route registered");
        self.endpoints.push(endpoint);
        Ok(())
    }

    /// Find the endpoint for a request.
    ///
    /// When several patterns match, they refine one another, and the one
    /// with the most literal segments wins: `/api-key/list` beats
    /// `/api-key/{id}`.
    pub fn lookup(&self, method: Method, path: &str) -> Result<RouteMatch<'_>> {
        self.endpoints
            .iter()
            .filter(|e| e.method == method)
            .filter_map(|e| e.pattern.matches(path).map(|params| (e, params)))
            .max_by_key(|(e, _)| e.pattern.specificity())
            .map(|(endpoint, params)| RouteMatch { endpoint, params })
            .ok_or_else(|| RouteError::NotFound {
                method,
                path: path.to_string(),
            })
    }

    /// A declared walker by name, including private ones.
    pub fn walker(&self, name: &str) -> Option<&WalkerSpec> {
        self.walkers.get(name).map(Arc::as_ref)
    }

    /// Every exposed endpoint, in registration order.
    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }

    /// Number of exposed endpoints.
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    /// Returns `true` if nothing is exposed.
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}
