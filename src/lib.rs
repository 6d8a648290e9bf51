//! Attestor: Claim-Evidence Report Engine
//!
//! Consumes a graph of semantic-annotation triples (entities, events,
//! relations, same-as clusters, justifications) and produces a report
//! linking each claim to its supporting text span.
//!
//! # Core Concepts
//!
//! - **Clusters**: same-as groupings of coreferent mentions, assembled into
//!   typed claim records
//! - **Justifications**: the designated evidence span behind each claim
//! - **Place inference**: event clusters missing a Place argument get one
//!   synthesized from relation evidence and document-level frequency
//!
//! # Example
//!
//! ```
//! use attestor::{Hypothesis, MemoryGraph};
//!
//! let graph = MemoryGraph::new();
//! let hypothesis = Hypothesis::from_graph(&graph).unwrap();
//! assert!(hypothesis.events.is_empty());
//! ```

pub mod corpus;
pub mod graph;
pub mod report;
pub mod resolve;

pub use corpus::{CorpusError, CorpusResult, Document, DocumentStore, SqliteCorpus};
pub use graph::{vocab, AnnotationGraph, GraphError, GraphResult, MemoryGraph, NodeId, Term, Triple};
pub use report::{ReportError, ReportOptions, ReportResult, ReportWriter};
pub use resolve::{
    ClusterRecord, Hypothesis, Justification, PredicateRole, ResolveError, ResolveResult, Warning,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
