//! Common test utilities for building annotation graphs
//!
//! Assembles the triple patterns the resolver expects: same-as clusters with
//! prototypes, membership join nodes, reified statements, and informative
//! justifications.

// Not every test binary uses every helper.
#![allow(dead_code)]

use attestor::{vocab, MemoryGraph};

/// Test ontology namespace
pub const ONT: &str = "https://example.org/ont#";

/// Full IRI for a test ontology name
pub fn ont(name: &str) -> String {
    format!("{ONT}{name}")
}

/// Incremental builder over a [`MemoryGraph`]
#[derive(Default)]
pub struct GraphBuilder {
    graph: MemoryGraph,
    statements: usize,
    memberships: usize,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn build(self) -> MemoryGraph {
        self.graph
    }

    /// Declare the hypothesis node
    pub fn hypothesis(&mut self, id: &str) -> &mut Self {
        self.graph.insert_node(id, vocab::RDF_TYPE, vocab::HYPOTHESIS);
        self
    }

    /// Declare a same-as cluster with its prototype and prototype type
    pub fn cluster(&mut self, cluster: &str, prototype: &str, cluster_type: &str) -> &mut Self {
        self.graph
            .insert_node(cluster, vocab::RDF_TYPE, vocab::SAME_AS_CLUSTER);
        self.graph.insert_node(cluster, vocab::PROTOTYPE, prototype);
        self.type_statement(prototype, cluster_type);
        self
    }

    /// Attach a member to a cluster through a membership join node
    pub fn member(&mut self, cluster: &str, member: &str, class_iri: &str) -> &mut Self {
        self.memberships += 1;
        let membership = format!("memberships/{:03}", self.memberships);
        self.graph.insert_node(membership.as_str(), vocab::CLUSTER, cluster);
        self.graph
            .insert_node(membership.as_str(), vocab::CLUSTER_MEMBER, member);
        self.graph.insert_node(member, vocab::RDF_TYPE, class_iri);
        self
    }

    /// Add a reified is-a type statement
    pub fn type_statement(&mut self, subject: &str, type_iri: &str) -> &mut Self {
        self.statement(subject, vocab::RDF_TYPE, type_iri);
        self
    }

    /// Add a reified argument statement
    pub fn argument(&mut self, subject: &str, predicate: &str, object: &str) -> &mut Self {
        self.statement(subject, predicate, object);
        self
    }

    /// Attach an informative justification with the given document and span
    pub fn justify(&mut self, node: &str, doc: &str, start: usize, end: usize) -> &mut Self {
        let justification = format!("justifications/{node}");
        self.graph
            .insert_node(node, vocab::INFORMATIVE_JUSTIFICATION, justification.as_str());
        self.graph
            .insert_node(justification.as_str(), vocab::RDF_TYPE, vocab::TEXT_JUSTIFICATION);
        self.graph
            .insert_literal(justification.as_str(), vocab::SOURCE_DOCUMENT, doc);
        self.graph
            .insert_literal(justification.as_str(), vocab::START_OFFSET, start.to_string());
        self.graph.insert_literal(
            justification.as_str(),
            vocab::END_OFFSET_INCLUSIVE,
            end.to_string(),
        );
        self
    }

    /// Add a `hasName` value to a node
    pub fn name(&mut self, node: &str, name: &str) -> &mut Self {
        self.graph.insert_literal(node, vocab::HAS_NAME, name);
        self
    }

    /// Add a `handle` value to a cluster
    pub fn handle(&mut self, cluster: &str, handle: &str) -> &mut Self {
        self.graph.insert_literal(cluster, vocab::HANDLE, handle);
        self
    }

    fn statement(&mut self, subject: &str, predicate: &str, object: &str) {
        self.statements += 1;
        let statement = format!("statements/{:03}", self.statements);
        self.graph
            .insert_node(statement.as_str(), vocab::RDF_SUBJECT, subject);
        self.graph
            .insert_node(statement.as_str(), vocab::RDF_PREDICATE, predicate);
        self.graph
            .insert_node(statement.as_str(), vocab::RDF_OBJECT, object);
    }
}

/// A fully wired event cluster with one member and typed argument entities
///
/// Creates `cluster`, its prototype, one member (`{cluster}-m`), and for each
/// `(predicate, object, object_type)` triple an argument statement plus the
/// object's own type statement.
pub fn event_cluster(
    builder: &mut GraphBuilder,
    cluster: &str,
    event_type: &str,
    arguments: &[(&str, &str, &str)],
) {
    let member = format!("{cluster}-m");
    builder
        .cluster(cluster, &format!("{cluster}-proto"), &ont(event_type))
        .member(cluster, &member, vocab::EVENT)
        .type_statement(&member, &ont(event_type));
    for (predicate, object, object_type) in arguments {
        builder
            .argument(&member, &ont(&format!("{event_type}_{predicate}")), object)
            .type_statement(object, &ont(object_type));
    }
}

/// A fully wired relation cluster with one member and typed arguments
pub fn relation_cluster(
    builder: &mut GraphBuilder,
    cluster: &str,
    relation_type: &str,
    arguments: &[(&str, &str, &str)],
) {
    let member = format!("{cluster}-m");
    builder
        .cluster(cluster, &format!("{cluster}-proto"), &ont(relation_type))
        .member(cluster, &member, vocab::RELATION)
        .type_statement(&member, &ont(relation_type));
    for (predicate, object, object_type) in arguments {
        builder
            .argument(&member, &ont(&format!("{relation_type}_{predicate}")), object)
            .type_statement(object, &ont(object_type));
    }
}
