//! Triple store over the annotation graph
//!
//! The resolver only needs a read-only query surface: forward lookups,
//! reverse lookups, an exactly-one lookup that fails on ambiguity, and a
//! membership test. `AnnotationGraph` is that seam; `MemoryGraph` is the
//! in-process implementation, loaded from a serialized triple list (RDF
//! parsing itself is an upstream concern).

use super::node::{NodeId, Term};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::{Read, Write};
use thiserror::Error;

/// Errors that can occur during graph queries and loading
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("expected at most one object for ({subject}, {predicate}), found {found}")]
    AmbiguousObject {
        subject: String,
        predicate: String,
        found: usize,
    },

    #[error("expected at most one subject for ({predicate}, {object}), found {found}")]
    AmbiguousSubject {
        predicate: String,
        object: String,
        found: usize,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for graph operations
pub type GraphResult<T> = Result<T, GraphError>;

/// Read-only query surface over the annotation graph
///
/// Result ordering is unspecified; callers that need determinism sort
/// explicitly.
pub trait AnnotationGraph {
    /// All objects of triples with the given subject and predicate
    fn objects(&self, subject: &str, predicate: &str) -> Vec<Term>;

    /// All subjects of triples with the given predicate and node object
    fn subjects(&self, predicate: &str, object: &str) -> Vec<NodeId>;

    /// The single object of (subject, predicate), if any
    ///
    /// Fails when more than one object exists: callers use this for
    /// schema positions that carry an exactly-one contract.
    fn unique_object(&self, subject: &str, predicate: &str) -> GraphResult<Option<Term>>;

    /// The single subject of (predicate, object), if any; fails on ambiguity
    fn unique_subject(&self, predicate: &str, object: &str) -> GraphResult<Option<NodeId>>;

    /// Whether the triple (subject, predicate, node object) is present
    fn contains(&self, subject: &str, predicate: &str, object: &str) -> bool;
}

/// A single triple as stored and serialized
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Triple {
    #[serde(rename = "s")]
    pub subject: NodeId,
    #[serde(rename = "p")]
    pub predicate: NodeId,
    #[serde(rename = "o")]
    pub object: Term,
}

/// In-memory annotation graph with set semantics and append-only mutation
///
/// Duplicate inserts are ignored. There is no delete: the only writer after
/// load is the place-inference write-back, which appends new triples and
/// never edits existing ones.
#[derive(Debug, Default)]
pub struct MemoryGraph {
    triples: Vec<Triple>,
    /// Indexes map onto positions in `triples`, preserving insertion order
    by_subject_predicate: HashMap<(String, String), Vec<usize>>,
    by_predicate_object: HashMap<(String, String), Vec<usize>>,
}

impl MemoryGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a triple; returns false if it was already present
    pub fn insert(
        &mut self,
        subject: impl Into<NodeId>,
        predicate: impl Into<NodeId>,
        object: Term,
    ) -> bool {
        let triple = Triple {
            subject: subject.into(),
            predicate: predicate.into(),
            object,
        };
        if self.has_triple(&triple) {
            return false;
        }
        let idx = self.triples.len();
        self.by_subject_predicate
            .entry((
                triple.subject.as_str().to_string(),
                triple.predicate.as_str().to_string(),
            ))
            .or_default()
            .push(idx);
        if let Term::Node(object_id) = &triple.object {
            self.by_predicate_object
                .entry((
                    triple.predicate.as_str().to_string(),
                    object_id.as_str().to_string(),
                ))
                .or_default()
                .push(idx);
        }
        self.triples.push(triple);
        true
    }

    /// Insert a triple whose object is another node
    pub fn insert_node(
        &mut self,
        subject: impl Into<NodeId>,
        predicate: impl Into<NodeId>,
        object: impl Into<NodeId>,
    ) -> bool {
        self.insert(subject, predicate, Term::Node(object.into()))
    }

    /// Insert a triple whose object is a literal
    pub fn insert_literal(
        &mut self,
        subject: impl Into<NodeId>,
        predicate: impl Into<NodeId>,
        value: impl Into<String>,
    ) -> bool {
        self.insert(subject, predicate, Term::Literal(value.into()))
    }

    /// Number of triples in the graph
    pub fn len(&self) -> usize {
        self.triples.len()
    }

    /// Whether the graph is empty
    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    /// All triples in insertion order
    pub fn triples(&self) -> impl Iterator<Item = &Triple> {
        self.triples.iter()
    }

    /// Load a graph from a JSON triple list
    pub fn from_json_reader(reader: impl Read) -> GraphResult<Self> {
        let triples: Vec<Triple> = serde_json::from_reader(reader)?;
        let mut graph = Self::new();
        for triple in triples {
            graph.insert(triple.subject, triple.predicate, triple.object);
        }
        Ok(graph)
    }

    /// Serialize the graph as a JSON triple list
    pub fn to_json_writer(&self, writer: impl Write) -> GraphResult<()> {
        serde_json::to_writer_pretty(writer, &self.triples)?;
        Ok(())
    }

    fn has_triple(&self, triple: &Triple) -> bool {
        self.by_subject_predicate
            .get(&(
                triple.subject.as_str().to_string(),
                triple.predicate.as_str().to_string(),
            ))
            .map(|indexes| indexes.iter().any(|&i| self.triples[i].object == triple.object))
            .unwrap_or(false)
    }

    fn forward(&self, subject: &str, predicate: &str) -> &[usize] {
        self.by_subject_predicate
            .get(&(subject.to_string(), predicate.to_string()))
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    fn reverse(&self, predicate: &str, object: &str) -> &[usize] {
        self.by_predicate_object
            .get(&(predicate.to_string(), object.to_string()))
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }
}

impl AnnotationGraph for MemoryGraph {
    fn objects(&self, subject: &str, predicate: &str) -> Vec<Term> {
        self.forward(subject, predicate)
            .iter()
            .map(|&i| self.triples[i].object.clone())
            .collect()
    }

    fn subjects(&self, predicate: &str, object: &str) -> Vec<NodeId> {
        self.reverse(predicate, object)
            .iter()
            .map(|&i| self.triples[i].subject.clone())
            .collect()
    }

    fn unique_object(&self, subject: &str, predicate: &str) -> GraphResult<Option<Term>> {
        let indexes = self.forward(subject, predicate);
        match indexes.len() {
            0 => Ok(None),
            1 => Ok(Some(self.triples[indexes[0]].object.clone())),
            found => Err(GraphError::AmbiguousObject {
                subject: subject.to_string(),
                predicate: predicate.to_string(),
                found,
            }),
        }
    }

    fn unique_subject(&self, predicate: &str, object: &str) -> GraphResult<Option<NodeId>> {
        let indexes = self.reverse(predicate, object);
        match indexes.len() {
            0 => Ok(None),
            1 => Ok(Some(self.triples[indexes[0]].subject.clone())),
            found => Err(GraphError::AmbiguousSubject {
                predicate: predicate.to_string(),
                object: object.to_string(),
                found,
            }),
        }
    }

    fn contains(&self, subject: &str, predicate: &str, object: &str) -> bool {
        self.forward(subject, predicate)
            .iter()
            .any(|&i| match &self.triples[i].object {
                Term::Node(id) => id.as_str() == object,
                Term::Literal(_) => false,
            })
    }
}
