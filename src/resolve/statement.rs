//! Statement parsing
//!
//! Turns a node's outgoing reified statements into typed records with the
//! object's metadata resolved: names, cluster-level handles, rendered types,
//! and informative justification. Statements are enumerated in ascending
//! node-id order so downstream output is reproducible across runs.

use super::justification::resolve_justification;
use super::record::{Justification, PredicateRole};
use super::ResolveError;
use crate::graph::{vocab, AnnotationGraph, NodeId, Term};
use std::collections::BTreeSet;

/// A parsed outgoing statement with resolved object metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementRecord {
    /// The reified statement node
    pub statement_id: NodeId,
    /// The statement's predicate
    pub predicate: NodeId,
    /// Predicate role tag
    pub role: PredicateRole,
    /// The statement's object
    pub object_id: NodeId,
    /// `hasName` values of the object, sorted
    pub object_names: BTreeSet<String>,
    /// `handle` values of the object's owning cluster, sorted
    pub object_handles: BTreeSet<String>,
    /// Rendered type names of the object, sorted
    pub object_types: BTreeSet<String>,
    /// The object's informative justification
    pub object_justification: Option<Justification>,
}

/// Parse every outgoing statement of `node`, in ascending statement-id order
///
/// Type statements are not filtered here; the assembler consumes them.
pub fn parse_statements(
    graph: &impl AnnotationGraph,
    node: &NodeId,
) -> Result<Vec<StatementRecord>, ResolveError> {
    let mut statement_ids = graph.subjects(vocab::RDF_SUBJECT, node.as_str());
    statement_ids.sort();
    statement_ids.dedup();

    let mut records = Vec::with_capacity(statement_ids.len());
    for statement_id in statement_ids {
        let predicate = statement_node(graph, &statement_id, vocab::RDF_PREDICATE)?;
        let object_id = statement_node(graph, &statement_id, vocab::RDF_OBJECT)?;
        let role = PredicateRole::of(&predicate);

        records.push(StatementRecord {
            object_names: literal_set(graph.objects(object_id.as_str(), vocab::HAS_NAME)),
            object_handles: owning_cluster_handles(graph, &object_id)?,
            object_types: object_types(graph, &object_id)?,
            object_justification: resolve_justification(graph, &object_id)?,
            statement_id,
            predicate,
            role,
            object_id,
        });
    }
    Ok(records)
}

/// Rendered is-a types of `object`, gathered from its type statements
fn object_types(
    graph: &impl AnnotationGraph,
    object: &NodeId,
) -> Result<BTreeSet<String>, ResolveError> {
    let mut statements = graph.subjects(vocab::RDF_SUBJECT, object.as_str());
    statements.sort();
    statements.dedup();

    let mut types = BTreeSet::new();
    for statement in statements {
        if !graph.contains(statement.as_str(), vocab::RDF_PREDICATE, vocab::RDF_TYPE) {
            continue;
        }
        let type_id = statement_node(graph, &statement, vocab::RDF_OBJECT)?;
        types.insert(type_id.fragment().to_string());
    }
    Ok(types)
}

/// `handle` values of the cluster that owns `object`
///
/// Handles are cluster-level metadata: they hang off the same-as cluster,
/// not off the member entity itself. An object outside any cluster has no
/// handles.
fn owning_cluster_handles(
    graph: &impl AnnotationGraph,
    object: &NodeId,
) -> Result<BTreeSet<String>, ResolveError> {
    let membership = match first_sorted(graph.subjects(vocab::CLUSTER_MEMBER, object.as_str())) {
        Some(membership) => membership,
        None => return Ok(BTreeSet::new()),
    };
    let cluster = match graph
        .unique_object(membership.as_str(), vocab::CLUSTER)?
        .and_then(|term| term.as_node().cloned())
    {
        Some(cluster) => cluster,
        None => return Ok(BTreeSet::new()),
    };
    Ok(literal_set(graph.objects(cluster.as_str(), vocab::HANDLE)))
}

fn statement_node(
    graph: &impl AnnotationGraph,
    statement: &NodeId,
    position: &'static str,
) -> Result<NodeId, ResolveError> {
    let term = graph
        .unique_object(statement.as_str(), position)?
        .ok_or_else(|| ResolveError::MalformedStatement {
            statement: statement.clone(),
            position,
        })?;
    match term {
        Term::Node(id) => Ok(id),
        Term::Literal(_) => Err(ResolveError::MalformedStatement {
            statement: statement.clone(),
            position,
        }),
    }
}

fn literal_set(terms: Vec<Term>) -> BTreeSet<String> {
    terms
        .into_iter()
        .map(|term| term.as_text().to_string())
        .collect()
}

fn first_sorted(mut nodes: Vec<NodeId>) -> Option<NodeId> {
    nodes.sort();
    nodes.into_iter().next()
}
