//! Concept classification
//!
//! Types a (namespace, identifier) pair as disease, pathogen or geolocation by
//! asking the ontology about a small set of root terms. Only one namespace is
//! supported at a time; anything outside it is untyped, never an error.
//!
//! A concept can satisfy several predicates at once (a term filed under both
//! a disease tree and a virus tree, say). Which label it gets is decided by an
//! explicit [`ClassificationPriority`]. The co-occurrence graph and the
//! ontology hierarchy deliberately use different orders.

mod stoplist;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::ConceptType;
use crate::error::Result;
use crate::ontology::Ontology;

pub use stoplist::{DEFAULT_STOPLIST, Stoplist};

/// MeSH "Geographic Locations"
pub const MESH_GEOGRAPHIC_LOCATIONS: &str = "D005842";
/// MeSH "Bacteria"
pub const MESH_BACTERIA: &str = "D001419";
/// MeSH "Viruses"
pub const MESH_VIRUSES: &str = "D014780";

/// Namespace and root terms the predicates test against
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifierRoots {
    /// The only namespace that can be classified
    pub namespace: String,
    /// A concept under any of these is a geolocation
    pub geolocation: Vec<String>,
    /// A concept under any of these is a pathogen
    pub pathogen: Vec<String>,
}

impl Default for ClassifierRoots {
    fn default() -> Self {
        Self {
            namespace: "MESH".to_string(),
            geolocation: vec![MESH_GEOGRAPHIC_LOCATIONS.to_string()],
            pathogen: vec![MESH_BACTERIA.to_string(), MESH_VIRUSES.to_string()],
        }
    }
}

/// Order in which predicates are consulted when labelling a concept
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassificationPriority([ConceptType; 3]);

impl ClassificationPriority {
    /// Pathogen, then geolocation, then disease.
    ///
    /// Labels co-occurrence endpoints by the type that made the pair interesting.
    pub const COOCCURRENCE: Self = Self([
        ConceptType::Pathogen,
        ConceptType::Geolocation,
        ConceptType::Disease,
    ]);

    /// Disease, then pathogen, then geolocation.
    ///
    /// Used for hierarchy and document-mention nodes, which are typed for display.
    pub const DISPLAY: Self = Self([
        ConceptType::Disease,
        ConceptType::Pathogen,
        ConceptType::Geolocation,
    ]);

    pub fn order(&self) -> &[ConceptType; 3] {
        &self.0
    }
}

/// Outcome of all three predicates for one concept
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TypeFlags {
    pub disease: bool,
    pub pathogen: bool,
    pub geolocation: bool,
}

impl TypeFlags {
    pub fn any(&self) -> bool {
        self.disease || self.pathogen || self.geolocation
    }

    fn has(&self, concept_type: ConceptType) -> bool {
        match concept_type {
            ConceptType::Disease => self.disease,
            ConceptType::Pathogen => self.pathogen,
            ConceptType::Geolocation => self.geolocation,
            ConceptType::Untyped => false,
        }
    }

    /// First type in `priority` whose predicate holds
    pub fn resolve(&self, priority: ClassificationPriority) -> ConceptType {
        priority
            .order()
            .iter()
            .copied()
            .find(|t| self.has(*t))
            .unwrap_or(ConceptType::Untyped)
    }
}

/// Disease / pathogen / geolocation predicates backed by an ontology
#[derive(Clone)]
pub struct ConceptClassifier {
    ontology: Arc<dyn Ontology>,
    roots: ClassifierRoots,
}

impl ConceptClassifier {
    pub fn new(ontology: Arc<dyn Ontology>, roots: ClassifierRoots) -> Self {
        Self { ontology, roots }
    }

    pub fn ontology(&self) -> &dyn Ontology {
        self.ontology.as_ref()
    }

    pub fn roots(&self) -> &ClassifierRoots {
        &self.roots
    }

    fn supports(&self, namespace: &str) -> bool {
        namespace == self.roots.namespace
    }

    fn under_any(&self, namespace: &str, id: &str, roots: &[String]) -> Result<bool> {
        for root in roots {
            if self.ontology.is_descendant_of(namespace, id, root)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    pub fn is_geolocation(&self, namespace: &str, id: &str) -> Result<bool> {
        if !self.supports(namespace) {
            return Ok(false);
        }
        self.under_any(namespace, id, &self.roots.geolocation)
    }

    pub fn is_pathogen(&self, namespace: &str, id: &str) -> Result<bool> {
        if !self.supports(namespace) {
            return Ok(false);
        }
        self.under_any(namespace, id, &self.roots.pathogen)
    }

    pub fn is_disease(&self, namespace: &str, id: &str) -> Result<bool> {
        if !self.supports(namespace) {
            return Ok(false);
        }
        self.ontology.is_disease_concept(namespace, id)
    }

    /// Evaluate all three predicates
    pub fn flags(&self, namespace: &str, id: &str) -> Result<TypeFlags> {
        if !self.supports(namespace) {
            return Ok(TypeFlags::default());
        }
        Ok(TypeFlags {
            disease: self.is_disease(namespace, id)?,
            pathogen: self.is_pathogen(namespace, id)?,
            geolocation: self.is_geolocation(namespace, id)?,
        })
    }

    /// Label a concept using the given priority
    pub fn classify(
        &self,
        namespace: &str,
        id: &str,
        priority: ClassificationPriority,
    ) -> Result<ConceptType> {
        Ok(self.flags(namespace, id)?.resolve(priority))
    }
}

impl std::fmt::Debug for ConceptClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConceptClassifier")
            .field("roots", &self.roots)
            .finish_non_exhaustive()
    }
}
