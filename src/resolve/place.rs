//! Place inference for event clusters
//!
//! An event cluster that carries no Place argument gets one synthesized from
//! relation evidence, its own arguments, or document-level frequency, in
//! strict priority order:
//!
//! 1. a `Physical.LocatedNear` relation anchored on identical evidence at
//!    both ends (object justification and member justification),
//! 2. a `LocatedNear` relation sharing only the object-level evidence (first
//!    qualifying relation cluster wins),
//! 3. a containment/affiliation relation (`PartWhole`,
//!    `OrganizationAffiliation`, and `Sponsorship` for `Contact*` events)
//!    whose member carries a place-typed object,
//! 4. one of the event's own argument fillers with a place type (the filler
//!    then serves its original predicate and Place simultaneously),
//! 5. the most frequent `LocatedNear` Place filler in the event's source
//!    document, ties broken by first encounter, optionally widened to a
//!    containing location.
//!
//! Events typed `Movement.Transport` are exempt: a place argument is
//! structurally ambiguous for transport events. Evidence correlation is by
//! exact structural equality of justifications; a missing justification
//! never counts as a match.

use super::record::{ClusterRecord, Justification, PredicateRole};
use super::Warning;
use crate::graph::NodeId;
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::warn;

const LOCATED_NEAR: &str = "Physical.LocatedNear";
const MOVEMENT_TRANSPORT: &str = "Movement.Transport";
const CONTACT_PREFIX: &str = "Contact";
const PLACE_TYPES: [&str; 3] = ["FAC", "GPE", "LOC"];

/// The outcome of the inference pass: synthesized records plus warnings
#[derive(Debug, Default)]
pub struct Inference {
    pub records: Vec<ClusterRecord>,
    pub warnings: Vec<Warning>,
}

/// Relation families the inference engine cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RelationKind {
    LocatedNear,
    PartWhole,
    OrgAffiliation,
    Sponsorship,
}

impl RelationKind {
    fn classify(rendered_type: &str) -> Option<Self> {
        if rendered_type == LOCATED_NEAR {
            Some(Self::LocatedNear)
        } else if rendered_type.starts_with("PartWhole") {
            Some(Self::PartWhole)
        } else if rendered_type.starts_with("OrganizationAffiliation") {
            Some(Self::OrgAffiliation)
        } else if rendered_type.contains("Sponsorship") {
            Some(Self::Sponsorship)
        } else {
            None
        }
    }
}

/// A relevant relation cluster's records, in assembly order
struct RelationGroup<'a> {
    kind: RelationKind,
    members: Vec<&'a ClusterRecord>,
}

/// Synthesize Place records for event clusters lacking one
///
/// `relations` must be the assembled relation-record set; the engine
/// correlates justifications against it. Synthesized records are returned,
/// not inserted — the caller appends them to the event set.
pub fn infer_places(events: &[ClusterRecord], relations: &[ClusterRecord]) -> Inference {
    let groups = group_relations(relations);
    let index = LocationIndex::build(&groups);
    let mut inference = Inference::default();

    for cluster in group_by_cluster(events) {
        let Some(base) = cluster.first() else { continue };
        if cluster.iter().any(|record| record.role == PredicateRole::Place) {
            continue;
        }
        if base.cluster_type.fragment().contains(MOVEMENT_TRANSPORT) {
            continue;
        }

        let synthesized = place_from_relations(&cluster, &groups)
            .or_else(|| place_from_argument(&cluster))
            .or_else(|| place_from_document(&cluster, &index));
        match synthesized {
            Some(record) => inference.records.push(record),
            None => {
                warn!(
                    cluster = %base.cluster_id,
                    "no location evidence for event cluster; omitting Place record"
                );
                inference.warnings.push(Warning::NoPlaceEvidence {
                    cluster: base.cluster_id.clone(),
                });
            }
        }
    }
    inference
}

/// Steps 1-3: relation-based evidence
fn place_from_relations(
    event: &[&ClusterRecord],
    groups: &[RelationGroup<'_>],
) -> Option<ClusterRecord> {
    let base = *event.first()?;
    let event_type = base.cluster_type.fragment();
    let mut deferred: Vec<&RelationGroup> = Vec::new();
    let mut affiliated: Vec<&ClusterRecord> = Vec::new();

    for group in groups {
        match group.kind {
            RelationKind::LocatedNear => {
                for relation_member in &group.members {
                    for &event_member in event {
                        if !same_evidence(
                            &relation_member.object_justification,
                            &event_member.object_justification,
                        ) {
                            continue;
                        }
                        if same_evidence(
                            &relation_member.member_justification,
                            &event_member.member_justification,
                        ) {
                            // Both ends of the relation anchor on the exact
                            // evidence of this event member.
                            if let Some(place) = place_member(group) {
                                return Some(place_record(event_member, place));
                            }
                        } else {
                            deferred.push(group);
                        }
                    }
                }
            }
            RelationKind::PartWhole | RelationKind::OrgAffiliation => {
                collect_affiliated(group, event, &mut affiliated);
            }
            RelationKind::Sponsorship => {
                if event_type.starts_with(CONTACT_PREFIX) {
                    collect_affiliated(group, event, &mut affiliated);
                }
            }
        }
    }

    if let Some(&group) = deferred.first() {
        // Looser match: only the object-level evidence lines up. The first
        // qualifying relation cluster is taken; when it carries no Place
        // member the chain skips straight to the argument fallback, matching
        // the precedence LocatedNear evidence has over affiliation evidence.
        return place_member(group).map(|place| place_record(base, place));
    }

    affiliated
        .iter()
        .copied()
        .find(|member| has_place_type(&member.object_types))
        .map(|member| place_record(base, member))
}

/// Step 4: an existing argument filler doubles as the Place
fn place_from_argument(event: &[&ClusterRecord]) -> Option<ClusterRecord> {
    event
        .iter()
        .copied()
        .find(|member| has_place_type(&member.object_types))
        .map(|member| place_record(member, member))
}

/// Step 5: most frequent location in the event's source document
fn place_from_document(event: &[&ClusterRecord], index: &LocationIndex) -> Option<ClusterRecord> {
    let base = *event.first()?;
    let document = base.object_justification.as_ref()?.parent_id.as_deref()?;
    let top = index.most_frequent(document)?;
    let filler = index.resolve_broader(top);
    Some(place_record_from_data(base, filler))
}

fn collect_affiliated<'a>(
    group: &RelationGroup<'a>,
    event: &[&ClusterRecord],
    affiliated: &mut Vec<&'a ClusterRecord>,
) {
    let shares_evidence = group.members.iter().any(|member| {
        event.iter().any(|event_member| {
            same_evidence(
                &member.object_justification,
                &event_member.object_justification,
            )
        })
    });
    if shares_evidence {
        affiliated.extend(group.members.iter().copied());
    }
}

fn place_member<'a>(group: &RelationGroup<'a>) -> Option<&'a ClusterRecord> {
    group
        .members
        .iter()
        .find(|member| member.role == PredicateRole::Place)
        .copied()
}

/// Structural equality of evidence; the null sentinel never matches
fn same_evidence(a: &Option<Justification>, b: &Option<Justification>) -> bool {
    matches!((a, b), (Some(a), Some(b)) if a == b)
}

fn has_place_type(types: &BTreeSet<String>) -> bool {
    types
        .iter()
        .any(|rendered| PLACE_TYPES.iter().any(|place| rendered.contains(place)))
}

fn place_predicate(base: &ClusterRecord) -> NodeId {
    NodeId::new(format!("{}_Place", base.cluster_type))
}

fn place_record(base: &ClusterRecord, filler: &ClusterRecord) -> ClusterRecord {
    ClusterRecord {
        cluster_id: base.cluster_id.clone(),
        cluster_type: base.cluster_type.clone(),
        member_id: base.member_id.clone(),
        member_justification: base.member_justification.clone(),
        predicate: place_predicate(base),
        role: PredicateRole::Place,
        object_id: filler.object_id.clone(),
        object_types: filler.object_types.clone(),
        object_names: filler.object_names.clone(),
        object_handles: filler.object_handles.clone(),
        object_justification: filler.object_justification.clone(),
    }
}

fn place_record_from_data(base: &ClusterRecord, filler: &PlaceData) -> ClusterRecord {
    ClusterRecord {
        cluster_id: base.cluster_id.clone(),
        cluster_type: base.cluster_type.clone(),
        member_id: base.member_id.clone(),
        member_justification: base.member_justification.clone(),
        predicate: place_predicate(base),
        role: PredicateRole::Place,
        object_id: filler.object_id.clone(),
        object_types: filler.object_types.clone(),
        object_names: filler.object_names.clone(),
        object_handles: filler.object_handles.clone(),
        object_justification: Some(filler.justification.clone()),
    }
}

/// Event records grouped by cluster, preserving assembly order
fn group_by_cluster(records: &[ClusterRecord]) -> Vec<Vec<&ClusterRecord>> {
    let mut groups: Vec<Vec<&ClusterRecord>> = Vec::new();
    let mut index: HashMap<&NodeId, usize> = HashMap::new();
    for record in records {
        match index.get(&record.cluster_id) {
            Some(&i) => groups[i].push(record),
            None => {
                index.insert(&record.cluster_id, groups.len());
                groups.push(vec![record]);
            }
        }
    }
    groups
}

/// Relevant relation clusters in assembly order
fn group_relations(relations: &[ClusterRecord]) -> Vec<RelationGroup<'_>> {
    let mut groups: Vec<RelationGroup> = Vec::new();
    let mut index: HashMap<&NodeId, usize> = HashMap::new();
    for record in relations {
        let Some(kind) = RelationKind::classify(record.cluster_type.fragment()) else {
            continue;
        };
        match index.get(&record.cluster_id) {
            Some(&i) => groups[i].members.push(record),
            None => {
                index.insert(&record.cluster_id, groups.len());
                groups.push(RelationGroup {
                    kind,
                    members: vec![record],
                });
            }
        }
    }
    groups
}

/// Filler metadata carried by the location index
#[derive(Debug, Clone, PartialEq, Eq)]
struct PlaceData {
    object_id: NodeId,
    object_types: BTreeSet<String>,
    object_names: BTreeSet<String>,
    object_handles: BTreeSet<String>,
    justification: Justification,
}

impl PlaceData {
    fn from_record(record: &ClusterRecord) -> Option<Self> {
        let justification = record.object_justification.clone()?;
        Some(Self {
            object_id: record.object_id.clone(),
            object_types: record.object_types.clone(),
            object_names: record.object_names.clone(),
            object_handles: record.object_handles.clone(),
            justification,
        })
    }
}

/// Document-level location evidence, built immutably in one pass and handed
/// to the inference step by reference
struct LocationIndex {
    /// Per-document Place-filler occurrences, in first-encounter order
    occurrences: HashMap<String, Vec<Justification>>,
    /// Filler metadata keyed by its justification
    data: HashMap<Justification, PlaceData>,
    /// Contained location -> containing location, from PartWhole and
    /// OrganizationAffiliation relations
    broader: HashMap<Justification, PlaceData>,
}

impl LocationIndex {
    fn build(groups: &[RelationGroup<'_>]) -> Self {
        let mut occurrences: HashMap<String, Vec<Justification>> = HashMap::new();
        let mut data: HashMap<Justification, PlaceData> = HashMap::new();
        let mut broader: HashMap<Justification, PlaceData> = HashMap::new();

        for group in groups {
            match group.kind {
                RelationKind::LocatedNear => {
                    for &member in &group.members {
                        if member.role != PredicateRole::Place {
                            continue;
                        }
                        let Some(place) = PlaceData::from_record(member) else {
                            continue;
                        };
                        if let Some(document) = place.justification.parent_id.clone() {
                            occurrences
                                .entry(document)
                                .or_default()
                                .push(place.justification.clone());
                            data.entry(place.justification.clone()).or_insert(place);
                        }
                    }
                }
                RelationKind::PartWhole | RelationKind::OrgAffiliation => {
                    let Some(container) =
                        place_member(group).and_then(PlaceData::from_record)
                    else {
                        continue;
                    };
                    for member in &group.members {
                        if member.role == PredicateRole::Place {
                            continue;
                        }
                        if !has_place_type(&member.object_types) {
                            continue;
                        }
                        if let Some(contained) = &member.object_justification {
                            broader
                                .entry(contained.clone())
                                .or_insert_with(|| container.clone());
                        }
                    }
                }
                RelationKind::Sponsorship => {}
            }
        }

        Self {
            occurrences,
            data,
            broader,
        }
    }

    /// The most frequent Place filler in `document`; ties go to the filler
    /// encountered first
    fn most_frequent(&self, document: &str) -> Option<&PlaceData> {
        let occurrences = self.occurrences.get(document)?;
        let mut counts: Vec<(&Justification, usize)> = Vec::new();
        for justification in occurrences {
            match counts.iter_mut().find(|(key, _)| *key == justification) {
                Some(entry) => entry.1 += 1,
                None => counts.push((justification, 1)),
            }
        }
        let mut best: Option<(&Justification, usize)> = None;
        for (justification, count) in counts {
            if best.map_or(true, |(_, best_count)| count > best_count) {
                best = Some((justification, count));
            }
        }
        best.and_then(|(justification, _)| self.data.get(justification))
    }

    /// Follow the containment map to the widest known location
    ///
    /// The map is expected acyclic but comes from unverified input; a
    /// visited set stops runaway chains.
    fn resolve_broader<'a>(&'a self, start: &'a PlaceData) -> &'a PlaceData {
        let mut current = start;
        let mut visited: HashSet<&Justification> = HashSet::new();
        while let Some(next) = self.broader.get(&current.justification) {
            if !visited.insert(&current.justification) {
                break;
            }
            current = next;
        }
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn justification(doc: &str, start: usize, end: usize) -> Justification {
        Justification {
            parent_id: Some(doc.to_string()),
            child_id: None,
            span_start: start,
            span_end: end,
        }
    }

    fn record(
        cluster: &str,
        cluster_type: &str,
        predicate: &str,
        object: &str,
        types: &[&str],
        object_justification: Option<Justification>,
    ) -> ClusterRecord {
        let predicate = NodeId::new(format!("https://example.org/ont#{}", predicate));
        let role = PredicateRole::of(&predicate);
        ClusterRecord {
            cluster_id: NodeId::from(cluster),
            cluster_type: NodeId::new(format!("https://example.org/ont#{}", cluster_type)),
            member_id: NodeId::new(format!("{}/member", cluster)),
            member_justification: object_justification.clone(),
            predicate,
            role,
            object_id: NodeId::from(object),
            object_types: types.iter().map(|t| t.to_string()).collect(),
            object_names: BTreeSet::new(),
            object_handles: BTreeSet::new(),
            object_justification,
        }
    }

    #[test]
    fn test_relation_kind_classification() {
        assert_eq!(
            RelationKind::classify("Physical.LocatedNear"),
            Some(RelationKind::LocatedNear)
        );
        assert_eq!(
            RelationKind::classify("PartWhole.Subsidiary"),
            Some(RelationKind::PartWhole)
        );
        assert_eq!(
            RelationKind::classify("OrganizationAffiliation.EmploymentMembership"),
            Some(RelationKind::OrgAffiliation)
        );
        assert_eq!(
            RelationKind::classify("GeneralAffiliation.Sponsorship"),
            Some(RelationKind::Sponsorship)
        );
        assert_eq!(RelationKind::classify("Conflict.Attack"), None);
    }

    #[test]
    fn test_place_type_substring_match() {
        let types: BTreeSet<String> = ["GPE.UrbanArea"].iter().map(|t| t.to_string()).collect();
        assert!(has_place_type(&types));

        let non_place: BTreeSet<String> = ["PER"].iter().map(|t| t.to_string()).collect();
        assert!(!has_place_type(&non_place));
    }

    #[test]
    fn test_sentinel_never_matches() {
        let j = justification("DOC1", 0, 4);
        assert!(!same_evidence(&None, &None));
        assert!(!same_evidence(&Some(j.clone()), &None));
        assert!(same_evidence(&Some(j.clone()), &Some(j)));
    }

    #[test]
    fn test_most_frequent_ties_break_by_first_encounter() {
        let a = justification("DOC1", 0, 4);
        let b = justification("DOC1", 10, 14);
        let relations = vec![
            record("rel/1", "Physical.LocatedNear", "Physical.LocatedNear_Place", "loc-a", &["GPE"], Some(a.clone())),
            record("rel/2", "Physical.LocatedNear", "Physical.LocatedNear_Place", "loc-b", &["GPE"], Some(b.clone())),
            record("rel/3", "Physical.LocatedNear", "Physical.LocatedNear_Place", "loc-b", &["GPE"], Some(b)),
        ];
        // rel/2 and rel/3 both contribute loc-b; frequencies are a=1, b=2
        let groups = group_relations(&relations);
        let index = LocationIndex::build(&groups);
        let top = index.most_frequent("DOC1").unwrap();
        assert_eq!(top.object_id, NodeId::from("loc-b"));

        // With equal counts, the first-encountered filler wins
        let tied = vec![
            record("rel/1", "Physical.LocatedNear", "Physical.LocatedNear_Place", "loc-a", &["GPE"], Some(a.clone())),
            record("rel/2", "Physical.LocatedNear", "Physical.LocatedNear_Place", "loc-b", &["GPE"], Some(justification("DOC1", 10, 14))),
        ];
        let groups = group_relations(&tied);
        let index = LocationIndex::build(&groups);
        assert_eq!(index.most_frequent("DOC1").unwrap().object_id, NodeId::from("loc-a"));
    }

    #[test]
    fn test_broader_resolution_stops_on_cycle() {
        let inner = justification("DOC1", 0, 4);
        let outer = justification("DOC1", 10, 14);
        let relations = vec![
            // inner is part of outer...
            record("rel/1", "PartWhole.Subsidiary", "PartWhole.Subsidiary_Part", "city", &["GPE"], Some(inner.clone())),
            record("rel/1", "PartWhole.Subsidiary", "PartWhole.Subsidiary_Place", "country", &["GPE"], Some(outer.clone())),
            // ...and outer claims to be part of inner, forming a cycle
            record("rel/2", "PartWhole.Subsidiary", "PartWhole.Subsidiary_Part", "country", &["GPE"], Some(outer)),
            record("rel/2", "PartWhole.Subsidiary", "PartWhole.Subsidiary_Place", "city", &["GPE"], Some(inner.clone())),
        ];
        let groups = group_relations(&relations);
        let index = LocationIndex::build(&groups);
        let start = PlaceData {
            object_id: NodeId::from("city"),
            object_types: BTreeSet::new(),
            object_names: BTreeSet::new(),
            object_handles: BTreeSet::new(),
            justification: inner,
        };
        // Must terminate despite the cycle
        let resolved = index.resolve_broader(&start);
        assert!(resolved.object_id == NodeId::from("country") || resolved.object_id == NodeId::from("city"));
    }

    #[test]
    fn test_transport_events_exempt() {
        let j = justification("DOC1", 0, 4);
        let events = vec![record(
            "ev/1",
            "Movement.Transport",
            "Movement.Transport_Vehicle",
            "truck",
            &["VEH"],
            Some(j.clone()),
        )];
        let relations = vec![
            record("rel/1", "Physical.LocatedNear", "Physical.LocatedNear_EntityOrFiller", "truck", &["VEH"], Some(j.clone())),
            record("rel/1", "Physical.LocatedNear", "Physical.LocatedNear_Place", "depot", &["FAC"], Some(justification("DOC1", 10, 14))),
        ];
        let inference = infer_places(&events, &relations);
        assert!(inference.records.is_empty());
        assert!(inference.warnings.is_empty());
    }

    #[test]
    fn test_no_evidence_warns_and_omits() {
        let events = vec![record(
            "ev/1",
            "Conflict.Attack",
            "Conflict.Attack_Attacker",
            "e1",
            &["PER"],
            Some(justification("DOC1", 0, 4)),
        )];
        let inference = infer_places(&events, &[]);
        assert!(inference.records.is_empty());
        assert_eq!(inference.warnings.len(), 1);
        assert!(matches!(inference.warnings[0], Warning::NoPlaceEvidence { .. }));
    }
}
