//! Concept identity, mentions and documents
//!
//! A concept is identified by its (namespace, identifier) pair, rendered as a
//! curie. Every set or map of concepts in this crate keys on [`Curie`], never on
//! the display name, so two mentions of the same concept with different
//! spellings collapse to one node.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Compact namespaced identifier, `namespace:identifier`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Curie {
    namespace: String,
    identifier: String,
}

impl Curie {
    /// Create a curie from its two parts
    pub fn new(namespace: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            identifier: identifier.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }
}

impl fmt::Display for Curie {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.identifier)
    }
}

/// A grounded entity mention attributed to one document
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Mention {
    /// Ontology namespace (e.g. `MESH`)
    pub namespace: String,
    /// Identifier within the namespace
    pub identifier: String,
    /// Display name as grounded by the NER stage
    pub name: String,
}

impl Mention {
    pub fn new(
        namespace: impl Into<String>,
        identifier: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            identifier: identifier.into(),
            name: name.into(),
        }
    }

    /// Concept identity of this mention
    pub fn curie(&self) -> Curie {
        Curie::new(&self.namespace, &self.identifier)
    }
}

/// A source document (alert) and the mentions grounded in it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Archive number of the alert
    pub id: String,
    pub mentions: Vec<Mention>,
}

impl Document {
    pub fn new(id: impl Into<String>, mentions: Vec<Mention>) -> Self {
        Self {
            id: id.into(),
            mentions,
        }
    }

    /// Node identity of the document under the given curie prefix
    pub fn curie(&self, prefix: &str) -> Curie {
        Curie::new(prefix, &self.id)
    }
}

/// Derived type of a concept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConceptType {
    Disease,
    Pathogen,
    Geolocation,
    /// Matches none of the classifier predicates
    Untyped,
}

impl ConceptType {
    /// Label written to node tables
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disease => "disease",
            Self::Pathogen => "pathogen",
            Self::Geolocation => "geoloc",
            Self::Untyped => "untyped",
        }
    }

    /// Parse from string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "disease" => Some(Self::Disease),
            "pathogen" => Some(Self::Pathogen),
            "geoloc" | "geolocation" => Some(Self::Geolocation),
            "untyped" => Some(Self::Untyped),
            _ => None,
        }
    }

    pub fn is_typed(&self) -> bool {
        !matches!(self, Self::Untyped)
    }
}

impl fmt::Display for ConceptType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
