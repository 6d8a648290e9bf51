//! Resolved claim records
//!
//! These are the read-only projections the rest of the system works with: a
//! justification span, a predicate-role tag, and the fully resolved
//! cluster-membership record. The original annotation graph is never
//! consulted again once records are built.

use crate::graph::{vocab, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// An evidentiary text span backing a claim
///
/// Offsets are inclusive-inclusive character positions into the referenced
/// document's full text. At least one of `parent_id` (the document) or
/// `child_id` (the source segment) is always present — a node with no
/// evidence at all resolves to `None` at the call site, never to a
/// zero-filled `Justification`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Justification {
    /// Parent document identifier
    pub parent_id: Option<String>,
    /// Child/source segment identifier
    pub child_id: Option<String>,
    /// First character of the span
    pub span_start: usize,
    /// Last character of the span (inclusive)
    pub span_end: usize,
}

impl Justification {
    /// The identifier to resolve against the document store: the child
    /// segment when present, the parent document otherwise
    pub fn document_ref(&self) -> Option<&str> {
        self.child_id.as_deref().or(self.parent_id.as_deref())
    }
}

impl std::fmt::Display for Justification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let doc = self.document_ref().unwrap_or("?");
        write!(f, "{}:{}:{}", doc, self.span_start, self.span_end)
    }
}

/// Role a statement's predicate plays, resolved once at parse time
///
/// Downstream code matches on this tag instead of re-deriving the role from
/// predicate-string suffixes at every call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PredicateRole {
    /// An is-a type assertion; consumed during assembly, never emitted
    Type,
    /// A Place argument (predicate fragment ends in `_Place`, or is `Place`)
    Place,
    /// Any other argument or relation slot
    Argument,
}

impl PredicateRole {
    /// Classify a predicate IRI
    pub fn of(predicate: &NodeId) -> Self {
        if predicate.as_str() == vocab::RDF_TYPE {
            return Self::Type;
        }
        let label = predicate_label(predicate);
        if label == "Place" {
            Self::Place
        } else {
            Self::Argument
        }
    }
}

/// The display label of a predicate: the fragment's last `_`-separated
/// segment (`Conflict.Attack_Attacker` renders as `Attacker`)
pub fn predicate_label(predicate: &NodeId) -> &str {
    let fragment = predicate.fragment();
    match fragment.rsplit_once('_') {
        Some((_, label)) => label,
        None => fragment,
    }
}

/// A fully resolved cluster-membership statement
///
/// Identity is the full tuple: duplicate records collapse under set
/// semantics. `role` is never [`PredicateRole::Type`] — type statements are
/// consumed to populate `cluster_type` and `object_types` instead.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ClusterRecord {
    /// The owning same-as cluster
    pub cluster_id: NodeId,
    /// The cluster's prototype type
    pub cluster_type: NodeId,
    /// The cluster member this statement hangs off
    pub member_id: NodeId,
    /// The member's own informative justification (`None` = no evidence)
    pub member_justification: Option<Justification>,
    /// The statement's predicate
    pub predicate: NodeId,
    /// Predicate role tag, resolved at parse time
    pub role: PredicateRole,
    /// The statement's object
    pub object_id: NodeId,
    /// Rendered type names of the object, sorted
    pub object_types: BTreeSet<String>,
    /// `hasName` values of the object, sorted
    pub object_names: BTreeSet<String>,
    /// `handle` values of the object's owning cluster, sorted
    pub object_handles: BTreeSet<String>,
    /// The object's informative justification (`None` = no evidence)
    pub object_justification: Option<Justification>,
}

impl ClusterRecord {
    /// Rendered cluster type, e.g. `Conflict.Attack`
    pub fn rendered_type(&self) -> &str {
        self.cluster_type.fragment()
    }

    /// Rendered predicate label, e.g. `Attacker` or `Place`
    pub fn predicate_label(&self) -> &str {
        predicate_label(&self.predicate)
    }
}
