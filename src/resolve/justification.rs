//! Informative-justification resolution
//!
//! Every annotated node may carry at most one `informativeJustification`
//! link in the scope of a resolution pass. Absence is not an error — the
//! caller decides whether missing evidence is worth a warning. A present
//! justification must be well-formed: both offsets, end >= start, and at
//! least one source reference.

use super::record::Justification;
use super::ResolveError;
use crate::graph::{vocab, AnnotationGraph, NodeId, Term};

/// Resolve the informative justification of `node`
///
/// Returns `Ok(None)` when the node carries no informative justification.
/// Fails when more than one is linked, or when the linked justification is
/// structurally malformed.
pub fn resolve_justification(
    graph: &impl AnnotationGraph,
    node: &NodeId,
) -> Result<Option<Justification>, ResolveError> {
    let linked = graph.unique_object(node.as_str(), vocab::INFORMATIVE_JUSTIFICATION)?;
    let justification_id = match linked {
        None => return Ok(None),
        Some(Term::Node(id)) => id,
        Some(Term::Literal(_)) => {
            return Err(ResolveError::MalformedJustification {
                node: node.clone(),
                detail: "informativeJustification must reference a node".into(),
            })
        }
    };

    let span_start = offset(graph, node, &justification_id, vocab::START_OFFSET)?;
    let span_end = offset(graph, node, &justification_id, vocab::END_OFFSET_INCLUSIVE)?;
    if span_end < span_start {
        return Err(ResolveError::MalformedJustification {
            node: node.clone(),
            detail: format!("span end {} precedes span start {}", span_end, span_start),
        });
    }

    let child_id = graph
        .unique_object(justification_id.as_str(), vocab::SOURCE)?
        .map(|term| term.as_text().to_string());
    let parent_id = graph
        .unique_object(justification_id.as_str(), vocab::SOURCE_DOCUMENT)?
        .map(|term| term.as_text().to_string());

    if child_id.is_none() && parent_id.is_none() {
        return Err(ResolveError::MalformedJustification {
            node: node.clone(),
            detail: "requires offsets and a source reference".into(),
        });
    }

    Ok(Some(Justification {
        parent_id,
        child_id,
        span_start,
        span_end,
    }))
}

fn offset(
    graph: &impl AnnotationGraph,
    node: &NodeId,
    justification_id: &NodeId,
    predicate: &str,
) -> Result<usize, ResolveError> {
    let malformed = |detail: String| ResolveError::MalformedJustification {
        node: node.clone(),
        detail,
    };
    let term = graph
        .unique_object(justification_id.as_str(), predicate)?
        .ok_or_else(|| malformed(format!("missing {}", NodeId::new(predicate).fragment())))?;
    let value = term
        .as_int()
        .ok_or_else(|| malformed(format!("non-integer {}", NodeId::new(predicate).fragment())))?;
    usize::try_from(value)
        .map_err(|_| malformed(format!("negative {}", NodeId::new(predicate).fragment())))
}
