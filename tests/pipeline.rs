//! End-to-end pipeline tests: assembly determinism, type filtering,
//! degraded-evidence handling, and the write-back of inferred triples.

mod common;

use attestor::resolve::persist_inferences;
use attestor::{vocab, AnnotationGraph, Hypothesis, MemoryGraph, PredicateRole, Warning};
use common::{event_cluster, relation_cluster, GraphBuilder};

fn attack_graph() -> MemoryGraph {
    let mut builder = GraphBuilder::new();
    builder.hypothesis("hypotheses/h1");
    event_cluster(
        &mut builder,
        "clusters/c1",
        "Conflict.Attack",
        &[
            ("Attacker", "entities/e1", "PER"),
            ("Target", "entities/e2", "GPE"),
        ],
    );
    builder.justify("clusters/c1-m", "D1", 0, 9);
    builder.justify("entities/e1", "D1", 12, 15);
    builder.justify("entities/e2", "D1", 20, 25);
    builder.name("entities/e1", "the insurgents");
    builder.name("entities/e2", "Kyiv");
    builder.build()
}

#[test]
fn pipeline_is_deterministic_across_runs() {
    let graph = attack_graph();
    let first = Hypothesis::from_graph(&graph).unwrap();
    let second = Hypothesis::from_graph(&graph).unwrap();

    assert_eq!(first.name, second.name);
    assert_eq!(first.events, second.events);
    assert_eq!(first.relations, second.relations);
    assert_eq!(first.warnings, second.warnings);
}

#[test]
fn pipeline_is_insensitive_to_triple_insertion_order() {
    let graph = attack_graph();

    // Rebuild the same graph with every triple inserted in reverse order
    let mut reversed = MemoryGraph::new();
    let triples: Vec<_> = graph.triples().cloned().collect();
    for triple in triples.into_iter().rev() {
        reversed.insert(triple.subject, triple.predicate, triple.object);
    }

    let from_original = Hypothesis::from_graph(&graph).unwrap();
    let from_reversed = Hypothesis::from_graph(&reversed).unwrap();
    assert_eq!(from_original.events, from_reversed.events);
    assert_eq!(from_original.relations, from_reversed.relations);
}

#[test]
fn no_record_carries_the_type_predicate() {
    let mut builder = GraphBuilder::new();
    builder.hypothesis("hypotheses/h1");
    event_cluster(
        &mut builder,
        "clusters/c1",
        "Conflict.Attack",
        &[("Target", "entities/e2", "GPE")],
    );
    relation_cluster(
        &mut builder,
        "relations/r1",
        "Physical.LocatedNear",
        &[
            ("EntityOrFiller", "entities/e2", "GPE"),
            ("Place", "entities/loc1", "GPE"),
        ],
    );
    let graph = builder.build();
    let hypothesis = Hypothesis::from_graph(&graph).unwrap();

    assert!(!hypothesis.events.is_empty());
    assert!(!hypothesis.relations.is_empty());
    for record in hypothesis.events.iter().chain(hypothesis.relations.iter()) {
        assert_ne!(record.predicate.as_str(), vocab::RDF_TYPE);
        assert_ne!(record.role, PredicateRole::Type);
    }
}

#[test]
fn missing_justification_warns_but_still_emits_record() {
    let mut builder = GraphBuilder::new();
    builder.hypothesis("hypotheses/h1");
    event_cluster(
        &mut builder,
        "clusters/c1",
        "Conflict.Attack",
        &[("Attacker", "entities/e1", "PER")],
    );
    // Neither the member nor the entity carries a justification
    let graph = builder.build();
    let hypothesis = Hypothesis::from_graph(&graph).unwrap();

    let attacker: Vec<_> = hypothesis
        .events
        .iter()
        .filter(|record| record.predicate_label() == "Attacker")
        .collect();
    assert_eq!(attacker.len(), 1);
    assert_eq!(attacker[0].member_justification, None);
    assert_eq!(attacker[0].object_justification, None);
    assert!(hypothesis
        .warnings
        .iter()
        .any(|warning| matches!(warning, Warning::MissingJustification { .. })));
}

#[test]
fn object_metadata_is_sorted() {
    let mut builder = GraphBuilder::new();
    builder.hypothesis("hypotheses/h1");
    event_cluster(
        &mut builder,
        "clusters/c1",
        "Conflict.Attack",
        &[("Attacker", "entities/e1", "PER")],
    );
    builder.justify("clusters/c1-m", "D1", 0, 9);
    builder.justify("entities/e1", "D1", 12, 15);
    // Inserted out of lexicographic order
    builder.name("entities/e1", "zulu");
    builder.name("entities/e1", "alpha");
    builder.name("entities/e1", "mike");
    let graph = builder.build();
    let hypothesis = Hypothesis::from_graph(&graph).unwrap();

    let names: Vec<_> = hypothesis.events[0].object_names.iter().collect();
    assert_eq!(names, ["alpha", "mike", "zulu"]);
}

#[test]
fn handles_come_from_the_owning_cluster() {
    let mut builder = GraphBuilder::new();
    builder.hypothesis("hypotheses/h1");
    event_cluster(
        &mut builder,
        "clusters/c1",
        "Conflict.Attack",
        &[("Attacker", "entities/e1", "PER")],
    );
    builder.justify("clusters/c1-m", "D1", 0, 9);
    builder.justify("entities/e1", "D1", 12, 15);
    builder.member("clusters/entity-1", "entities/e1", vocab::ENTITY);
    builder.handle("clusters/entity-1", "the militia");
    let graph = builder.build();
    let hypothesis = Hypothesis::from_graph(&graph).unwrap();

    let handles: Vec<_> = hypothesis.events[0].object_handles.iter().collect();
    assert_eq!(handles, ["the militia"]);
}

#[test]
fn mixed_clusters_are_silently_excluded() {
    let mut builder = GraphBuilder::new();
    builder.hypothesis("hypotheses/h1");
    event_cluster(
        &mut builder,
        "clusters/c1",
        "Conflict.Attack",
        &[("Target", "entities/e2", "GPE")],
    );
    // A relation smuggled into the event cluster makes it mixed
    builder.member("clusters/c1", "relations/r1-m", vocab::RELATION);
    let graph = builder.build();
    let hypothesis = Hypothesis::from_graph(&graph).unwrap();

    assert!(hypothesis.events.is_empty());
    assert!(hypothesis.relations.is_empty());
}

#[test]
fn hypothesis_name_comes_from_the_graph() {
    let graph = attack_graph();
    let hypothesis = Hypothesis::from_graph(&graph).unwrap();
    assert_eq!(hypothesis.name, "hypotheses/h1");
}

#[test]
fn missing_hypothesis_node_warns_and_uses_placeholder() {
    let mut builder = GraphBuilder::new();
    event_cluster(
        &mut builder,
        "clusters/c1",
        "Conflict.Attack",
        &[("Target", "entities/e2", "GPE")],
    );
    builder.justify("clusters/c1-m", "D1", 0, 9);
    builder.justify("entities/e2", "D1", 20, 25);
    let graph = builder.build();
    let hypothesis = Hypothesis::from_graph(&graph).unwrap();

    assert_eq!(hypothesis.name, "(unnamed hypothesis)");
    assert!(hypothesis
        .warnings
        .iter()
        .any(|warning| matches!(warning, Warning::MissingHypothesisName)));
}

#[test]
fn multiple_prototypes_abort_the_run() {
    let mut builder = GraphBuilder::new();
    builder.hypothesis("hypotheses/h1");
    event_cluster(
        &mut builder,
        "clusters/c1",
        "Conflict.Attack",
        &[("Target", "entities/e2", "GPE")],
    );
    let mut graph = builder.build();
    graph.insert_node("clusters/c1", vocab::PROTOTYPE, "clusters/c1-proto2");

    assert!(Hypothesis::from_graph(&graph).is_err());
}

#[test]
fn write_back_appends_and_never_removes() {
    let mut graph = attack_graph();
    let hypothesis = Hypothesis::from_graph(&graph).unwrap();
    // The Target argument doubles as the inferred Place
    assert_eq!(hypothesis.inferred_places.len(), 1);

    let before = graph.len();
    let appended = persist_inferences(&mut graph, &hypothesis.inferred_places);
    assert!(appended > 0);
    assert_eq!(graph.len(), before + appended);

    // An argument assertion now exists, stamped with the inference system
    let assertions = graph.subjects(vocab::RDF_TYPE, vocab::RDF_STATEMENT);
    assert!(assertions
        .iter()
        .any(|node| node.as_str().starts_with("urn:attestor:assertion:")));

    // The graph still resolves; the persisted Place is now an explicit
    // argument, so nothing is left to infer
    let resolved_again = Hypothesis::from_graph(&graph).unwrap();
    assert_eq!(resolved_again.relations, hypothesis.relations);
    assert!(resolved_again.inferred_places.is_empty());
}
