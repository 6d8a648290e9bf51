//! Cluster resolution and argument inference
//!
//! The core pipeline: same-as clusters are assembled into claim records
//! (relations first, then events), event clusters missing a Place argument
//! get one inferred from relation evidence, and the result is a named
//! [`Hypothesis`] ready for rendering. One graph in, one record set out;
//! everything is computed in a single synchronous pass.

mod cluster;
mod justification;
mod place;
mod record;
mod statement;

pub use cluster::{assemble, clusters_of_kind, members_of, same_as_clusters, Assembly, ClusterKind};
pub use justification::resolve_justification;
pub use place::{infer_places, Inference};
pub use record::{predicate_label, ClusterRecord, Justification, PredicateRole};
pub use statement::{parse_statements, StatementRecord};

use crate::graph::{vocab, AnnotationGraph, GraphError, MemoryGraph, NodeId};
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

/// System identifier stamped on write-back triples
pub const INFERENCE_SYSTEM: &str = "urn:attestor:system:place-inference";

/// Placeholder confidence for write-back justifications
const INFERENCE_CONFIDENCE: &str = "1.0";

/// Fatal input errors; any of these aborts the whole-file run
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error("cluster {cluster} must have exactly one prototype")]
    MissingPrototype { cluster: NodeId },

    #[error("cluster {cluster} prototype must carry exactly one type statement, found {found}")]
    PrototypeTypeCardinality { cluster: NodeId, found: usize },

    #[error("informative justification of {node} is malformed: {detail}")]
    MalformedJustification { node: NodeId, detail: String },

    #[error("statement {statement} lacks a node in its {position} position")]
    MalformedStatement {
        statement: NodeId,
        position: &'static str,
    },
}

/// Result type for resolution operations
pub type ResolveResult<T> = Result<T, ResolveError>;

/// Degraded-evidence conditions: reported to the operator, never fatal
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// A member or object resolved to the null justification sentinel
    MissingJustification { member: NodeId, object: NodeId },
    /// The graph declares no hypothesis node
    MissingHypothesisName,
    /// Step-5 inference found no location evidence in the event's document
    NoPlaceEvidence { cluster: NodeId },
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingJustification { member, object } => write!(
                f,
                "could not find informative justification for {} -> {}; link may render incorrectly",
                member.local_name(),
                object.local_name()
            ),
            Self::MissingHypothesisName => {
                write!(f, "graph declares no hypothesis node; report will be unnamed")
            }
            Self::NoPlaceEvidence { cluster } => write!(
                f,
                "no location evidence for event cluster {}; omitted Place record",
                cluster.local_name()
            ),
        }
    }
}

/// Records of one cluster, for grouped rendering
#[derive(Debug)]
pub struct ClusterGroup<'a> {
    pub cluster_id: &'a NodeId,
    pub cluster_type: &'a NodeId,
    pub records: Vec<&'a ClusterRecord>,
}

/// A fully resolved hypothesis: named event and relation record sets
///
/// `events` already contains the synthesized Place records;
/// `inferred_places` tracks them separately for the optional write-back.
#[derive(Debug)]
pub struct Hypothesis {
    pub name: String,
    pub events: Vec<ClusterRecord>,
    pub relations: Vec<ClusterRecord>,
    pub inferred_places: Vec<ClusterRecord>,
    pub warnings: Vec<Warning>,
}

impl Hypothesis {
    /// Resolve the whole graph: both assembly passes plus place inference
    pub fn from_graph(graph: &impl AnnotationGraph) -> ResolveResult<Self> {
        let clusters = same_as_clusters(graph);
        debug!(clusters = clusters.len(), "resolving same-as clusters");

        let relation_clusters = clusters_of_kind(graph, &clusters, ClusterKind::Relation);
        let mut relation_assembly = assemble(graph, &relation_clusters)?;
        debug!(
            clusters = relation_clusters.len(),
            records = relation_assembly.records.len(),
            "assembled relation pass"
        );

        let event_clusters = clusters_of_kind(graph, &clusters, ClusterKind::Event);
        let mut event_assembly = assemble(graph, &event_clusters)?;
        debug!(
            clusters = event_clusters.len(),
            records = event_assembly.records.len(),
            "assembled event pass"
        );

        let inference = infer_places(&event_assembly.records, &relation_assembly.records);
        debug!(inferred = inference.records.len(), "inferred Place records");

        let mut events = event_assembly.records;
        events.extend(inference.records.iter().cloned());

        let mut warnings = Vec::new();
        warnings.append(&mut relation_assembly.warnings);
        warnings.append(&mut event_assembly.warnings);
        warnings.extend(inference.warnings);

        let mut hypothesis_nodes = graph.subjects(vocab::RDF_TYPE, vocab::HYPOTHESIS);
        hypothesis_nodes.sort();
        let name = match hypothesis_nodes.first() {
            Some(node) => node.to_string(),
            None => {
                warn!("graph declares no hypothesis node");
                warnings.push(Warning::MissingHypothesisName);
                String::from("(unnamed hypothesis)")
            }
        };

        Ok(Self {
            name,
            events,
            relations: relation_assembly.records,
            inferred_places: inference.records,
            warnings,
        })
    }

    /// Event records grouped by cluster, in assembly order
    pub fn events_by_cluster(&self) -> Vec<ClusterGroup<'_>> {
        group_records(&self.events)
    }

    /// Relation records grouped by cluster, in assembly order
    pub fn relations_by_cluster(&self) -> Vec<ClusterGroup<'_>> {
        group_records(&self.relations)
    }
}

fn group_records(records: &[ClusterRecord]) -> Vec<ClusterGroup<'_>> {
    let mut groups: Vec<ClusterGroup> = Vec::new();
    for record in records {
        match groups
            .iter_mut()
            .find(|group| group.cluster_id == &record.cluster_id)
        {
            Some(group) => group.records.push(record),
            None => groups.push(ClusterGroup {
                cluster_id: &record.cluster_id,
                cluster_type: &record.cluster_type,
                records: vec![record],
            }),
        }
    }
    groups
}

/// Persist inferred Place records back into the graph, append-only
///
/// For each synthesized record this adds an argument-assertion statement, a
/// text-justification node and a compound-justification wrapper linking the
/// two, stamped with a placeholder system identifier and confidence.
/// Existing triples are never edited or deleted. Returns the number of
/// triples appended.
pub fn persist_inferences(graph: &mut MemoryGraph, inferred: &[ClusterRecord]) -> usize {
    let before = graph.len();

    for record in inferred {
        let assertion = NodeId::new(format!("urn:attestor:assertion:{}", Uuid::new_v4()));
        graph.insert_node(assertion.clone(), vocab::RDF_TYPE, vocab::RDF_STATEMENT);
        graph.insert_node(assertion.clone(), vocab::RDF_SUBJECT, record.member_id.clone());
        graph.insert_node(assertion.clone(), vocab::RDF_PREDICATE, record.predicate.clone());
        graph.insert_node(assertion.clone(), vocab::RDF_OBJECT, record.object_id.clone());
        graph.insert_node(assertion.clone(), vocab::SYSTEM, INFERENCE_SYSTEM);

        let Some(justification) = &record.object_justification else {
            continue;
        };
        let text = NodeId::new(format!("urn:attestor:justification:{}", Uuid::new_v4()));
        graph.insert_node(text.clone(), vocab::RDF_TYPE, vocab::TEXT_JUSTIFICATION);
        graph.insert_literal(
            text.clone(),
            vocab::START_OFFSET,
            justification.span_start.to_string(),
        );
        graph.insert_literal(
            text.clone(),
            vocab::END_OFFSET_INCLUSIVE,
            justification.span_end.to_string(),
        );
        if let Some(child) = &justification.child_id {
            graph.insert_literal(text.clone(), vocab::SOURCE, child.clone());
        }
        if let Some(parent) = &justification.parent_id {
            graph.insert_literal(text.clone(), vocab::SOURCE_DOCUMENT, parent.clone());
        }
        graph.insert_node(text.clone(), vocab::SYSTEM, INFERENCE_SYSTEM);

        let compound = NodeId::new(format!("urn:attestor:justification:{}", Uuid::new_v4()));
        graph.insert_node(compound.clone(), vocab::RDF_TYPE, vocab::COMPOUND_JUSTIFICATION);
        graph.insert_node(compound.clone(), vocab::CONTAINED_JUSTIFICATION, text);
        graph.insert_literal(compound.clone(), vocab::CONFIDENCE_VALUE, INFERENCE_CONFIDENCE);
        graph.insert_node(compound.clone(), vocab::SYSTEM, INFERENCE_SYSTEM);

        graph.insert_node(assertion, vocab::JUSTIFIED_BY, compound);
    }

    graph.len() - before
}
