//! Per-object checks for the traversal engine.
//!
//! The engine calls into the guard once per object it is about to visit.
//! Each call is independent: nothing is cached or locked between objects.

use tracing::trace;
use walkway_core::{AccessLevel, ArchetypeId, RootId};
use walkway_store::{AclReader, ArchetypeDirectory};

use crate::evaluator::AccessEvaluator;

/// How a walker may treat one visited object.
///
/// Visiting needs at least `Connect`; the content variants then say what
/// else the subject may do once there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitDecision {
    /// Not reachable; drop it from the traversal result.
    Skip,
    /// May be passed through, but its fields must not be exposed.
    PassThrough,
    /// Content readable, not writable.
    Read,
    /// Content readable and writable.
    Write,
}

impl VisitDecision {
    /// Returns `true` if field values may be exposed.
    pub fn exposes_content(self) -> bool {
        matches!(self, VisitDecision::Read | VisitDecision::Write)
    }
}

/// Traversal-time permission checks on behalf of one subject.
pub struct TraversalGuard<'a, A, D> {
    evaluator: &'a AccessEvaluator<A, D>,
    subject: RootId,
}

impl<'a, A: AclReader, D: ArchetypeDirectory> TraversalGuard<'a, A, D> {
    /// Create a guard for `subject`.
    pub fn new(evaluator: &'a AccessEvaluator<A, D>, subject: RootId) -> Self {
        Self { evaluator, subject }
    }

    /// The acting subject.
    pub fn subject(&self) -> &RootId {
        &self.subject
    }

    /// Decide how the walker may treat `archetype`.
    ///
    /// A subject that cannot traverse to the object gets `Skip`, even when a
    /// `Read` grant would let it read the object by id; use
    /// [`TraversalGuard::allows`] for that.
    pub fn visit(&self, archetype: &ArchetypeId) -> VisitDecision {
        let caps = self.evaluator.capabilities(&self.subject, archetype);
        let decision = if !caps.traverse {
            VisitDecision::Skip
        } else if caps.write {
            VisitDecision::Write
        } else if caps.read {
            VisitDecision::Read
        } else {
            VisitDecision::PassThrough
        };
        trace!(subject = %self.subject, %archetype, ?decision, "visit");
        decision
    }

    /// Whether the subject holds `required` on `archetype`.
    pub fn allows(&self, archetype: &ArchetypeId, required: AccessLevel) -> bool {
        self.evaluator.check_access(&self.subject, archetype, required)
    }

    /// Keep the objects that satisfy `required`, in input order.
    ///
    /// Denied objects are skipped; the traversal as a whole continues.
    pub fn filter<'i, I>(&self, archetypes: I, required: AccessLevel) -> Vec<ArchetypeId>
    where
        I: IntoIterator<Item = &'i ArchetypeId>,
    {
        archetypes
            .into_iter()
            .filter(|id| self.allows(id, required))
            .copied()
            .collect()
    }
}
