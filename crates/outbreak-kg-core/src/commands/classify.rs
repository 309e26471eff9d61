//! Single-concept classification lookup

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;

use crate::classify::{ClassificationPriority, ConceptClassifier, TypeFlags};
use crate::config::Config;
use crate::domain::{ConceptType, Curie};
use crate::error::{Error, Result};
use crate::ontology::TreeNumberOntology;

#[derive(Debug, Clone, Serialize)]
pub struct ClassificationReport {
    pub curie: String,
    pub name: Option<String>,
    pub flags: TypeFlags,
    /// Type used for co-occurrence nodes
    pub cooccurrence_type: ConceptType,
    /// Type used for hierarchy and mentions nodes
    pub display_type: ConceptType,
}

/// Evaluate every predicate and both priorities for one concept
pub fn classify_concept(
    classifier: &ConceptClassifier,
    namespace: &str,
    id: &str,
) -> Result<ClassificationReport> {
    let flags = classifier.flags(namespace, id)?;
    let name = if namespace == classifier.roots().namespace {
        classifier.ontology().resolve_name(namespace, id)?
    } else {
        None
    };

    Ok(ClassificationReport {
        curie: Curie::new(namespace, id).to_string(),
        name,
        flags,
        cooccurrence_type: flags.resolve(ClassificationPriority::COOCCURRENCE),
        display_type: flags.resolve(ClassificationPriority::DISPLAY),
    })
}

/// Load the configured ontology and classify one concept
pub fn classify(
    config: &Config,
    ontology: Option<&Path>,
    namespace: &str,
    id: &str,
) -> Result<ClassificationReport> {
    let path = ontology
        .map(Path::to_path_buf)
        .or_else(|| config.ontology.path.clone())
        .ok_or_else(|| {
            Error::ConfigError(
                "No ontology file given. Pass --ontology or set ontology.path".to_string(),
            )
        })?;

    let ontology = TreeNumberOntology::load(
        &path,
        config.ontology.namespace.clone(),
        config.ontology.disease_tree_prefixes.clone(),
    )?;
    let classifier = ConceptClassifier::new(Arc::new(ontology), config.classifier_roots());
    classify_concept(&classifier, namespace, id)
}
