//! Walker declarations.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use walkway_auth::AuthTier;

use crate::error::{Result, RouteError};
use crate::pattern::PathPattern;

/// Path family of regular walkers.
pub const WALKER_PREFIX: &str = "/walker/";

/// Path family of webhook walkers.
pub const WEBHOOK_PREFIX: &str = "/webhook/";

/// HTTP method of an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    /// `GET`
    Get,
    /// `POST`, the default for walkers.
    #[default]
    Post,
    /// `PUT`
    Put,
    /// `PATCH`
    Patch,
    /// `DELETE`
    Delete,
}

impl Method {
    /// Uppercase method name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = RouteError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "PATCH" => Ok(Method::Patch),
            "DELETE" => Ok(Method::Delete),
            _ => Err(RouteError::UnknownMethod(s.to_string())),
        }
    }
}

/// Who may invoke a walker over the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    /// Anyone; no credential required.
    Public,
    /// Holders of a valid session.
    #[default]
    Protected,
    /// Nobody; internal invocation only.
    Private,
}

/// An immutable walker declaration.
///
/// Built once with [`WalkerSpec::builder`] during startup registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalkerSpec {
    name: String,
    visibility: Visibility,
    method: Method,
    path: Option<String>,
    webhook: bool,
}

impl WalkerSpec {
    /// Start declaring a walker called `name`.
    pub fn builder(name: impl Into<String>) -> WalkerSpecBuilder {
        WalkerSpecBuilder {
            spec: WalkerSpec {
                name: name.into(),
                visibility: Visibility::default(),
                method: Method::default(),
                path: None,
                webhook: false,
            },
        }
    }

    /// The walker's name, unique across the registry.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Who may invoke it over the network.
    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// HTTP method it is served under.
    pub fn method(&self) -> Method {
        self.method
    }

    /// Returns `true` for webhook walkers.
    pub fn is_webhook(&self) -> bool {
        self.webhook
    }

    /// The explicit path override, if any.
    pub fn explicit_path(&self) -> Option<&str> {
        self.path.as_deref()
    }

    /// The path this walker is served at: the override, or the default of
    /// its path family.
    pub fn path(&self) -> String {
        match &self.path {
            Some(path) => path.clone(),
            None if self.webhook => format!("{WEBHOOK_PREFIX}{}", self.name),
            None => format!("{WALKER_PREFIX}{}", self.name),
        }
    }

    /// Authentication tier, or `None` for private walkers.
    pub fn auth_tier(&self) -> Option<AuthTier> {
        match (self.visibility, self.webhook) {
            (Visibility::Private, _) => None,
            (_, true) => Some(AuthTier::Webhook),
            (Visibility::Public, false) => Some(AuthTier::Public),
            (Visibility::Protected, false) => Some(AuthTier::Protected),
        }
    }

    /// Parse the serving path and check it stays inside its family.
    ///
    /// A webhook walker must live under `/webhook/`. A regular walker must
    /// not match any path there, so its first segment can be neither
    /// `webhook` nor a parameter.
    pub fn pattern(&self) -> Result<PathPattern> {
        let pattern = PathPattern::parse(&self.path())?;
        let family = WEBHOOK_PREFIX.trim_matches('/');
        let inside = if self.webhook {
            pattern.starts_with_literal(family) && pattern.segment_count() >= 2
        } else {
            !pattern.may_start_with(family)
        };
        if !inside {
            return Err(RouteError::InvalidSpec(format!(
                "{}: path {:?} is outside its family ({})",
                self.name,
                pattern.as_str(),
                if self.webhook {
                    "webhook walkers live under /webhook/"
                } else {
                    "/webhook/ is reserved for webhook walkers"
                }
            )));
        }
        Ok(pattern)
    }
}

/// Builder for [`WalkerSpec`].
#[derive(Debug, Clone)]
pub struct WalkerSpecBuilder {
    spec: WalkerSpec,
}

impl WalkerSpecBuilder {
    /// Set the visibility tier.
    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.spec.visibility = visibility;
        self
    }

    /// Shorthand for `visibility(Visibility::Public)`.
    pub fn public(self) -> Self {
        self.visibility(Visibility::Public)
    }

    /// Shorthand for `visibility(Visibility::Private)`.
    pub fn private(self) -> Self {
        self.visibility(Visibility::Private)
    }

    /// Serve under `method` instead of `POST`.
    pub fn method(mut self, method: Method) -> Self {
        self.spec.method = method;
        self
    }

    /// Serve at `path` instead of the family default.
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.spec.path = Some(path.into());
        self
    }

    /// Mark as a webhook walker.
    pub fn webhook(mut self) -> Self {
        self.spec.webhook = true;
        self
    }

    /// Validate and freeze the declaration.
    ///
    /// Fails if the name is not a plain path segment, the path is not a
    /// valid pattern, or the path leaves its family (see
    /// [`WalkerSpec::pattern`]).
    pub fn build(self) -> Result<WalkerSpec> {
        let spec = self.spec;
        if spec.name.is_empty()
            || spec
                .name
                .contains(|c: char| c == '/' || c == '{' || c == '}' || c.is_whitespace())
        {
            return Err(RouteError::InvalidSpec(format!(
                "walker name {:?} must be a non-empty path segment",
                spec.name
            )));
        }
        spec.pattern()?;
        Ok(spec)
    }
}
