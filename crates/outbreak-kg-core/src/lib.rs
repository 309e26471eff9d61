//! outbreak-kg Core Library
//!
//! This crate builds an outbreak knowledge graph from grounded alert
//! mentions and a biomedical ontology, including:
//! - Concept classification (disease, pathogen, geolocation) and the stoplist
//! - Ontology backend (MeSH-style tree numbers)
//! - Mention source loading
//! - Graph assembly (co-occurrence, ontology hierarchy, document mentions)
//! - Table export (graph database bulk-import TSV + manifest)
//! - Commands (build, status, classify)

pub mod assemble;
pub mod classify;
pub mod commands;
pub mod config;
pub mod domain;
pub mod error;
pub mod export;
pub mod ingest;
pub mod ontology;

pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::classify::{ClassificationPriority, ConceptClassifier, Stoplist};
    pub use crate::config::Config;
    pub use crate::domain::{ConceptType, Curie, Document, Mention, NodeRecord};
    pub use crate::error::{Error, Result};
    pub use crate::ontology::{Ontology, TreeNumberOntology};
}
