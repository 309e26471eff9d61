//! Ontology service interface
//!
//! The classifier and the hierarchy assembler consume an ontology through the
//! [`Ontology`] trait: name resolution, subsumption tests, the disease
//! capability, a full identifier listing and direct-parent lookup. Every call
//! is fallible so that a backend that cannot be reached stops the run instead
//! of silently classifying everything as untyped.
//!
//! [`TreeNumberOntology`] is the bundled backend: a MeSH-style ontology loaded
//! from a JSON term file, where subsumption is derived from tree numbers.

mod tree;

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::Curie;
use crate::error::Result;

pub use tree::{OntologyTerm, TreeNumberOntology};

/// Relation followed by [`Ontology::direct_parents`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Relation {
    Isa,
    PartOf,
}

impl Relation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Isa => "isa",
            Self::PartOf => "partof",
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Capabilities the graph builder needs from an ontology
///
/// Implementations answer `false` / empty for namespaces they do not cover;
/// an `Err` means the service itself is unusable.
pub trait Ontology: Send + Sync {
    /// Display name of a term, if known
    fn resolve_name(&self, namespace: &str, id: &str) -> Result<Option<String>>;

    /// Whether `id` is `root_id` or one of its is-a descendants
    fn is_descendant_of(&self, namespace: &str, id: &str, root_id: &str) -> Result<bool>;

    /// Whether the term is a disease concept
    fn is_disease_concept(&self, namespace: &str, id: &str) -> Result<bool>;

    /// Every known (identifier, name) pair of the ontology's namespace
    fn list_all_identifiers(&self) -> Result<Vec<(String, String)>>;

    /// Immediate parents of a term along `relation`
    fn direct_parents(&self, namespace: &str, id: &str, relation: Relation)
    -> Result<BTreeSet<Curie>>;
}
