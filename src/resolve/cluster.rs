//! Cluster assembly
//!
//! Groups a same-as cluster's member statements into [`ClusterRecord`]s.
//! The cluster's type comes from its prototype, which must carry exactly one
//! type statement; anything else is a fatal input error. Missing evidence on
//! a member or object degrades the record with a warning instead of aborting
//! the run.

use super::justification::resolve_justification;
use super::record::{ClusterRecord, PredicateRole};
use super::statement::parse_statements;
use super::{ResolveError, Warning};
use crate::graph::{vocab, AnnotationGraph, NodeId, Term};
use std::collections::HashSet;
use tracing::warn;

/// Which member class a resolution pass is restricted to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterKind {
    Event,
    Relation,
}

impl ClusterKind {
    /// The annotation class every member of a qualifying cluster must carry
    pub fn class_iri(self) -> &'static str {
        match self {
            Self::Event => vocab::EVENT,
            Self::Relation => vocab::RELATION,
        }
    }
}

/// The outcome of an assembly pass: records plus accumulated warnings
#[derive(Debug, Default)]
pub struct Assembly {
    pub records: Vec<ClusterRecord>,
    pub warnings: Vec<Warning>,
}

/// All same-as clusters in the graph, sorted by id
pub fn same_as_clusters(graph: &impl AnnotationGraph) -> Vec<NodeId> {
    let mut clusters = graph.subjects(vocab::RDF_TYPE, vocab::SAME_AS_CLUSTER);
    clusters.sort();
    clusters.dedup();
    clusters
}

/// Members of a cluster, reached through its membership join nodes, sorted
pub fn members_of(graph: &impl AnnotationGraph, cluster: &NodeId) -> Vec<NodeId> {
    let mut members = Vec::new();
    for membership in graph.subjects(vocab::CLUSTER, cluster.as_str()) {
        for term in graph.objects(membership.as_str(), vocab::CLUSTER_MEMBER) {
            if let Term::Node(member) = term {
                members.push(member);
            }
        }
    }
    members.sort();
    members.dedup();
    members
}

/// Clusters whose members are *all* of the given kind
///
/// A cluster mixing member classes qualifies for neither pass and is
/// silently dropped.
pub fn clusters_of_kind(
    graph: &impl AnnotationGraph,
    clusters: &[NodeId],
    kind: ClusterKind,
) -> Vec<NodeId> {
    clusters
        .iter()
        .filter(|cluster| {
            members_of(graph, cluster)
                .iter()
                .all(|member| graph.contains(member.as_str(), vocab::RDF_TYPE, kind.class_iri()))
        })
        .cloned()
        .collect()
}

/// Assemble the given clusters into records
///
/// Type statements are consumed (they already shaped `cluster_type` and
/// `object_types`); every other statement becomes a record. Duplicate
/// records collapse.
pub fn assemble(
    graph: &impl AnnotationGraph,
    clusters: &[NodeId],
) -> Result<Assembly, ResolveError> {
    let mut assembly = Assembly::default();
    let mut seen: HashSet<ClusterRecord> = HashSet::new();

    for cluster in clusters {
        let cluster_type = prototype_type(graph, cluster)?;

        for member in members_of(graph, cluster) {
            let member_justification = resolve_justification(graph, &member)?;

            for statement in parse_statements(graph, &member)? {
                if statement.role == PredicateRole::Type {
                    continue;
                }
                if member_justification.is_none() || statement.object_justification.is_none() {
                    warn!(
                        member = %member,
                        object = %statement.object_id,
                        "could not find informative justification; link may render incorrectly"
                    );
                    assembly.warnings.push(Warning::MissingJustification {
                        member: member.clone(),
                        object: statement.object_id.clone(),
                    });
                }
                let record = ClusterRecord {
                    cluster_id: cluster.clone(),
                    cluster_type: cluster_type.clone(),
                    member_id: member.clone(),
                    member_justification: member_justification.clone(),
                    predicate: statement.predicate,
                    role: statement.role,
                    object_id: statement.object_id,
                    object_types: statement.object_types,
                    object_names: statement.object_names,
                    object_handles: statement.object_handles,
                    object_justification: statement.object_justification,
                };
                if seen.insert(record.clone()) {
                    assembly.records.push(record);
                }
            }
        }
    }
    Ok(assembly)
}

/// The single type of the cluster's single prototype
///
/// Zero or multiple prototypes, and zero or multiple prototype type
/// statements, are fatal input-data errors.
fn prototype_type(
    graph: &impl AnnotationGraph,
    cluster: &NodeId,
) -> Result<NodeId, ResolveError> {
    let prototype = graph
        .unique_object(cluster.as_str(), vocab::PROTOTYPE)?
        .and_then(|term| term.as_node().cloned())
        .ok_or_else(|| ResolveError::MissingPrototype {
            cluster: cluster.clone(),
        })?;

    let mut statements = graph.subjects(vocab::RDF_SUBJECT, prototype.as_str());
    statements.sort();
    statements.dedup();

    let mut types = Vec::new();
    for statement in statements {
        if !graph.contains(statement.as_str(), vocab::RDF_PREDICATE, vocab::RDF_TYPE) {
            continue;
        }
        if let Some(Term::Node(type_id)) =
            graph.unique_object(statement.as_str(), vocab::RDF_OBJECT)?
        {
            types.push(type_id);
        }
    }

    match types.len() {
        1 => Ok(types.remove(0)),
        found => Err(ResolveError::PrototypeTypeCardinality {
            cluster: cluster.clone(),
            found,
        }),
    }
}
