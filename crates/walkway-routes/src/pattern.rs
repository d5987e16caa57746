//! Path patterns with `{param}` segments.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::{Result, RouteError};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Segment {
    Literal(String),
    Param(String),
}

/// A parsed route path such as `/sso/{platform}/login`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathPattern {
    raw: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Parse a pattern. It must start with `/`; params are whole segments.
    pub fn parse(raw: &str) -> Result<Self> {
        let invalid = |reason: &str| RouteError::InvalidPattern {
            pattern: raw.to_string(),
            reason: reason.to_string(),
        };
        let rest = raw.strip_prefix('/').ok_or_else(|| invalid("must start with '/'"))?;

        let mut segments = Vec::new();
        let mut names = Vec::new();
        for part in split(rest) {
            if let Some(name) = part.strip_prefix('{').and_then(|p| p.strip_suffix('}')) {
                if name.is_empty() || name.contains(['{', '}']) {
                    return Err(invalid("empty or nested parameter"));
                }
                if names.contains(&name) {
                    return Err(invalid("repeated parameter name"));
                }
                names.push(name);
                segments.push(Segment::Param(name.to_string()));
            } else if part.contains(['{', '}']) {
                return Err(invalid("parameters must span a whole segment"));
            } else if part.is_empty() {
                return Err(invalid("empty segment"));
            } else {
                segments.push(Segment::Literal(part.to_string()));
            }
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    /// The pattern as written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Number of literal segments; more literals means a more specific route.
    pub fn specificity(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| matches!(s, Segment::Literal(_)))
            .count()
    }

    /// Number of segments; `/` has none.
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Returns `true` if the first segment is the literal `name`.
    pub fn starts_with_literal(&self, name: &str) -> bool {
        matches!(self.segments.first(), Some(Segment::Literal(lit)) if lit == name)
    }

    /// Returns `true` if some path whose first segment is `name` matches,
    /// either through that literal or through a leading parameter.
    pub fn may_start_with(&self, name: &str) -> bool {
        match self.segments.first() {
            Some(Segment::Literal(lit)) => lit == name,
            Some(Segment::Param(_)) => true,
            None => false,
        }
    }

    /// Returns `true` if at least one request path matches both patterns.
    ///
    /// Parameter names are irrelevant: `/a/{x}` overlaps `/a/{y}`, and
    /// `/items/{id}` overlaps `/{kind}/latest` at `/items/latest`.
    pub fn overlaps(&self, other: &PathPattern) -> bool {
        self.segments.len() == other.segments.len()
            && self
                .segments
                .iter()
                .zip(&other.segments)
                .all(|pair| match pair {
                    (Segment::Literal(a), Segment::Literal(b)) => a == b,
                    _ => true,
                })
    }

    /// Returns `true` if `self` matches a strict subset of what `other`
    /// matches: it keeps every literal of `other` and pins at least one of
    /// its parameters.
    pub fn refines(&self, other: &PathPattern) -> bool {
        self.segments.len() == other.segments.len()
            && self.specificity() > other.specificity()
            && self
                .segments
                .iter()
                .zip(&other.segments)
                .all(|pair| match pair {
                    (_, Segment::Param(_)) => true,
                    (Segment::Literal(a), Segment::Literal(b)) => a == b,
                    (Segment::Param(_), Segment::Literal(_)) => false,
                })
    }

    /// Returns `true` if some path matches both patterns and neither one
    /// refines the other, so no match could be preferred.
    pub fn is_ambiguous_with(&self, other: &PathPattern) -> bool {
        self.overlaps(other) && !self.refines(other) && !other.refines(self)
    }

    /// Match a request path, returning captured parameters.
    ///
    /// A single trailing slash is ignored.
    pub fn matches(&self, path: &str) -> Option<BTreeMap<String, String>> {
        let path = path.split(['?', '#']).next().unwrap_or(path);
        let rest = path.strip_prefix('/')?;
        let rest = rest.strip_suffix('/').unwrap_or(rest);
        let parts: Vec<&str> = split(rest).collect();
        if parts.len() != self.segments.len() {
            return None;
        }

        let mut params = BTreeMap::new();
        for (segment, part) in self.segments.iter().zip(parts) {
            match segment {
                Segment::Literal(lit) if lit == part => {}
                Segment::Param(name) if !part.is_empty() => {
                    params.insert(name.clone(), part.to_string());
                }
                _ => return None,
            }
        }
        Some(params)
    }
}

fn split(rest: &str) -> impl Iterator<Item = &str> {
    // "" is the root path, not one empty segment.
    (!rest.is_empty())
        .then(|| rest.split('/'))
        .into_iter()
        .flatten()
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
