//! Access levels, grant scopes and ACL entries.
//!
//! Access control is expressed as a side table of [`AclEntry`] records keyed
//! by [`ArchetypeId`]. Archetypes never embed their own ACL state, so the
//! permission layer stays out of the graph's ownership and cycle structure.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;
use crate::types::{ArchetypeId, RootId};

/// Grant level on an archetype.
///
/// Totally ordered: `NoAccess < Read < Connect < Write`. The numeric values
/// are stable and used by persistent backends.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[repr(i8)]
pub enum AccessLevel {
    /// No access at all.
    #[default]
    NoAccess = -1,
    /// May read content.
    Read = 0,
    /// May traverse across or through the object without reading it.
    Connect = 1,
    /// May mutate.
    Write = 2,
}

impl AccessLevel {
    /// All levels in ascending order.
    pub const ALL: [AccessLevel; 4] = [
        AccessLevel::NoAccess,
        AccessLevel::Read,
        AccessLevel::Connect,
        AccessLevel::Write,
    ];

    /// Stable numeric value.
    pub const fn to_i8(self) -> i8 {
        self as i8
    }

    /// Parse from the stable numeric value.
    pub fn from_i8(value: i8) -> Option<Self> {
        match value {
            -1 => Some(Self::NoAccess),
            0 => Some(Self::Read),
            1 => Some(Self::Connect),
            2 => Some(Self::Write),
            _ => None,
        }
    }

    /// Returns `true` if this level carries content visibility.
    ///
    /// `Connect` is deliberately excluded: it permits passage only.
    pub const fn grants_content(self) -> bool {
        matches!(self, Self::Read | Self::Write)
    }

    /// Lowercase name used in logs and config.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NoAccess => "no_access",
            Self::Read => "read",
            Self::Connect => "connect",
            Self::Write => "write",
        }
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccessLevel {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "no_access" | "noaccess" => Ok(Self::NoAccess),
            "read" => Ok(Self::Read),
            "connect" => Ok(Self::Connect),
            "write" => Ok(Self::Write),
            other => Err(CoreError::InvalidLevel(other.to_string())),
        }
    }
}

/// Who a grant applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AclScope {
    /// Every subject.
    Public,
    /// One specific root.
    Root(RootId),
}

impl AclScope {
    /// Returns `true` if this scope applies to `subject`.
    pub fn applies_to(&self, subject: &RootId) -> bool {
        match self {
            AclScope::Public => true,
            AclScope::Root(root) => root == subject,
        }
    }

    /// The root this scope names, if any.
    pub fn root(&self) -> Option<&RootId> {
        match self {
            AclScope::Public => None,
            AclScope::Root(root) => Some(root),
        }
    }
}

impl fmt::Display for AclScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AclScope::Public => f.write_str("public"),
            AclScope::Root(root) => write!(f, "root:{root}"),
        }
    }
}

/// One grant on one archetype.
///
/// At most one entry exists per `(archetype, scope)`; granting the same
/// scope again replaces the level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AclEntry {
    /// Who the grant applies to.
    pub scope: AclScope,
    /// The granted level.
    pub level: AccessLevel,
}

impl AclEntry {
    /// Create a new entry.
    pub const fn new(scope: AclScope, level: AccessLevel) -> Self {
        Self { scope, level }
    }

    /// Shorthand for a public grant.
    pub const fn public(level: AccessLevel) -> Self {
        Self::new(AclScope::Public, level)
    }

    /// Shorthand for a root-specific grant.
    pub const fn root(root: RootId, level: AccessLevel) -> Self {
        Self::new(AclScope::Root(root), level)
    }
}

/// Reference record for a node or edge of the persistent graph.
///
/// Owned by the graph store. The access-control layer reads it to learn
/// the owner and never creates or deletes one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Archetype {
    /// Stable id.
    pub id: ArchetypeId,
    /// Type tag (node or edge archetype name).
    pub kind: String,
    /// The owning root.
    pub owner: RootId,
}

impl Archetype {
    /// Create a reference record.
    pub fn new(id: ArchetypeId, kind: impl Into<String>, owner: RootId) -> Self {
        Self {
            id,
            kind: kind.into(),
            owner,
        }
    }
}
