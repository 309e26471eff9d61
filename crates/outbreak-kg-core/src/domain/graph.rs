//! Node and edge records produced by the assemblers

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::concept::{ConceptType, Curie};

/// Label written in the third column of a node table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeLabel {
    Concept(ConceptType),
    /// A source document
    Alert,
}

impl NodeLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Concept(concept_type) => concept_type.as_str(),
            Self::Alert => "alert",
        }
    }
}

impl fmt::Display for NodeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A row of a node table
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeRecord {
    pub curie: Curie,
    pub name: String,
    pub label: NodeLabel,
}

impl NodeRecord {
    pub fn concept(curie: Curie, name: impl Into<String>, concept_type: ConceptType) -> Self {
        Self {
            curie,
            name: name.into(),
            label: NodeLabel::Concept(concept_type),
        }
    }

    pub fn alert(curie: Curie, name: impl Into<String>) -> Self {
        Self {
            curie,
            name: name.into(),
            label: NodeLabel::Alert,
        }
    }
}

/// Node records unique by curie
///
/// The first record registered for a curie wins; later records with a
/// different name or label for the same curie are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeSet {
    nodes: BTreeMap<Curie, NodeRecord>,
}

impl NodeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node, returning false when its curie was already present
    pub fn insert(&mut self, record: NodeRecord) -> bool {
        match self.nodes.entry(record.curie.clone()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(record);
                true
            }
        }
    }

    pub fn get(&self, curie: &Curie) -> Option<&NodeRecord> {
        self.nodes.get(curie)
    }

    pub fn contains(&self, curie: &Curie) -> bool {
        self.nodes.contains_key(curie)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Records in curie order
    pub fn iter(&self) -> impl Iterator<Item = &NodeRecord> {
        self.nodes.values()
    }
}

impl FromIterator<NodeRecord> for NodeSet {
    fn from_iter<I: IntoIterator<Item = NodeRecord>>(iter: I) -> Self {
        let mut set = Self::new();
        for record in iter {
            set.insert(record);
        }
        set
    }
}

/// Relationship type written in the `:TYPE` column of an edge table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeType {
    OccursWith,
    Isa,
    Mentions,
}

impl EdgeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OccursWith => "occurs_with",
            Self::Isa => "isa",
            Self::Mentions => "mentions",
        }
    }
}

impl fmt::Display for EdgeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Unordered pair of concept curies, stored with the smaller curie first
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConceptPair {
    first: Curie,
    second: Curie,
}

impl ConceptPair {
    pub fn new(a: Curie, b: Curie) -> Self {
        if a <= b {
            Self { first: a, second: b }
        } else {
            Self { first: b, second: a }
        }
    }

    pub fn first(&self) -> &Curie {
        &self.first
    }

    pub fn second(&self) -> &Curie {
        &self.second
    }
}

/// Aggregated co-occurrence between two concepts
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct CooccurrenceEdge {
    pub source: Curie,
    pub target: Curie,
    /// Number of interesting occurrences across the corpus
    pub count: u64,
}

/// `child` is-a `parent`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HierarchyEdge {
    pub child: Curie,
    pub parent: Curie,
}

/// A document mentions a concept
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MentionEdge {
    pub document: Curie,
    pub concept: Curie,
}
