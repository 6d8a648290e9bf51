//! Node identifiers and term values in the annotation graph

use serde::{Deserialize, Serialize};

/// Identifier of a node in the annotation graph (an IRI or blank-node label)
///
/// Serializes as a plain string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Create a NodeId from a string
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The fragment of the identifier after `#`, or the whole identifier
    /// when there is no fragment
    ///
    /// Ontology types render this way: the cluster type
    /// `...Ontology#Conflict.Attack` renders as `Conflict.Attack`.
    pub fn fragment(&self) -> &str {
        match self.0.rsplit_once('#') {
            Some((_, fragment)) => fragment,
            None => &self.0,
        }
    }

    /// The last path segment of the identifier, used for compact display of
    /// member and cluster ids
    pub fn local_name(&self) -> &str {
        match self.0.rsplit_once('/') {
            Some((_, name)) => name,
            None => &self.0,
        }
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&String> for NodeId {
    fn from(s: &String) -> Self {
        Self(s.clone())
    }
}

impl AsRef<str> for NodeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The object position of a triple: either another node or a literal value
///
/// Numeric literals (span offsets) are carried as strings and parsed at the
/// point of use; the graph itself is untyped.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Term {
    /// Reference to another node
    Node(NodeId),
    /// Literal value (string or stringified number)
    Literal(String),
}

impl Term {
    /// Create a node term
    pub fn node(id: impl Into<NodeId>) -> Self {
        Self::Node(id.into())
    }

    /// Create a literal term
    pub fn literal(value: impl Into<String>) -> Self {
        Self::Literal(value.into())
    }

    /// The node id, if this term is a node
    pub fn as_node(&self) -> Option<&NodeId> {
        match self {
            Self::Node(id) => Some(id),
            Self::Literal(_) => None,
        }
    }

    /// The textual content of the term: a literal's value, or a node's id
    pub fn as_text(&self) -> &str {
        match self {
            Self::Node(id) => id.as_str(),
            Self::Literal(value) => value,
        }
    }

    /// Parse the term as an integer, if it is an integer literal
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Literal(value) => value.trim().parse().ok(),
            Self::Node(_) => None,
        }
    }
}

impl std::fmt::Display for Term {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_text())
    }
}
