//! Graph domain types
//!
//! - **Curie / Mention / Document**: the assembler inputs
//! - **ConceptType**: explicit classification result
//! - **NodeRecord / NodeSet**: node table rows, unique by curie
//! - **CooccurrenceEdge / HierarchyEdge / MentionEdge**: edge table rows

mod concept;
mod graph;

pub use concept::{ConceptType, Curie, Document, Mention};
pub use graph::{
    ConceptPair, CooccurrenceEdge, EdgeType, HierarchyEdge, MentionEdge, NodeLabel, NodeRecord,
    NodeSet,
};
