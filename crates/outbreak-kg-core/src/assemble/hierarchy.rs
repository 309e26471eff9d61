//! Ontology hierarchy assembly
//!
//! Walks every term of the ontology, keeps the ones typed as disease, pathogen
//! or geolocation, and links each kept term to its direct is-a parents.
//! Parents are linked whether or not they are typed themselves, so the edge
//! table can reference curies with no row in the node table. Those dangling
//! parents are counted and logged rather than dropped.

use std::collections::BTreeSet;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use crate::classify::{ClassificationPriority, ConceptClassifier};
use crate::domain::{Curie, HierarchyEdge, NodeRecord, NodeSet};
use crate::error::Result;
use crate::ontology::Relation;

/// Counters reported after assembly
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HierarchyStats {
    /// Terms listed by the ontology
    pub terms: usize,
    /// Terms kept as nodes
    pub classified: usize,
    /// Distinct parent curies with no node of their own
    pub dangling_parents: usize,
}

/// Assembled is-a hierarchy
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HierarchyGraph {
    pub nodes: NodeSet,
    pub edges: BTreeSet<HierarchyEdge>,
    pub stats: HierarchyStats,
}

impl HierarchyGraph {
    /// Parent curies referenced by edges but absent from the node set
    pub fn dangling_parents(&self) -> BTreeSet<&Curie> {
        self.edges
            .iter()
            .map(|e| &e.parent)
            .filter(|parent| !self.nodes.contains(parent))
            .collect()
    }
}

/// Builds the typed subtree of the ontology
pub struct HierarchyAssembler<'a> {
    classifier: &'a ConceptClassifier,
}

impl<'a> HierarchyAssembler<'a> {
    pub fn new(classifier: &'a ConceptClassifier) -> Self {
        Self { classifier }
    }

    fn assemble_term(&self, id: &str, name: &str) -> Result<Option<(NodeRecord, Vec<HierarchyEdge>)>> {
        let namespace = self.classifier.roots().namespace.as_str();
        let concept_type = self
            .classifier
            .classify(namespace, id, ClassificationPriority::DISPLAY)?;
        if !concept_type.is_typed() {
            return Ok(None);
        }

        let child = Curie::new(namespace, id);
        let edges = self
            .classifier
            .ontology()
            .direct_parents(namespace, id, Relation::Isa)?
            .into_iter()
            .map(|parent| HierarchyEdge {
                child: child.clone(),
                parent,
            })
            .collect();

        Ok(Some((NodeRecord::concept(child, name, concept_type), edges)))
    }

    /// Assemble the hierarchy over the whole ontology
    pub fn assemble(&self) -> Result<HierarchyGraph> {
        let terms = self.classifier.ontology().list_all_identifiers()?;

        let kept = terms
            .par_iter()
            .map(|(id, name)| self.assemble_term(id, name))
            .collect::<Result<Vec<_>>>()?;

        let mut graph = HierarchyGraph::default();
        for (node, edges) in kept.into_iter().flatten() {
            graph.nodes.insert(node);
            graph.edges.extend(edges);
        }

        graph.stats = HierarchyStats {
            terms: terms.len(),
            classified: graph.nodes.len(),
            dangling_parents: graph.dangling_parents().len(),
        };

        if graph.stats.dangling_parents > 0 {
            warn!(
                dangling = graph.stats.dangling_parents,
                "Hierarchy edges reference parents that are not typed nodes"
            );
        }
        info!(
            terms = graph.stats.terms,
            nodes = graph.nodes.len(),
            edges = graph.edges.len(),
            "Assembled ontology hierarchy"
        );

        Ok(graph)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::classify::ClassifierRoots;
    use crate::classify::test_support::sample_classifier;
    use crate::domain::{ConceptType, NodeLabel};
    use crate::ontology::{OntologyTerm, TreeNumberOntology};

    fn curie(id: &str) -> Curie {
        Curie::new("MESH", id)
    }

    #[test]
    fn test_untyped_terms_are_skipped() {
        let classifier = sample_classifier();
        let graph = HierarchyAssembler::new(&classifier).assemble().unwrap();

        // Animals (B01) and Health (N01.400) are neither disease, pathogen nor geolocation
        assert!(!graph.nodes.contains(&curie("D000818")));
        assert!(!graph.nodes.contains(&curie("D006262")));
        assert_eq!(graph.stats.terms, 12);
        assert_eq!(graph.stats.classified, 10);
    }

    #[test]
    fn test_edges_follow_direct_parents() {
        let classifier = sample_classifier();
        let graph = HierarchyAssembler::new(&classifier).assemble().unwrap();

        assert!(graph.edges.contains(&HierarchyEdge {
            child: curie("D004534"),
            parent: curie("D000349"),
        }));
        assert!(graph.edges.contains(&HierarchyEdge {
            child: curie("D018352"),
            parent: curie("D007239"),
        }));
        // No transitive shortcut to the root
        assert!(!graph.edges.contains(&HierarchyEdge {
            child: curie("D004534"),
            parent: curie("D005842"),
        }));
        assert_eq!(graph.edges.len(), 5);
        assert!(graph.dangling_parents().is_empty());
    }

    #[test]
    fn test_display_priority_labels() {
        let classifier = sample_classifier();
        let graph = HierarchyAssembler::new(&classifier).assemble().unwrap();
        assert_eq!(
            graph.nodes.get(&curie("D017934")).unwrap().label,
            NodeLabel::Concept(ConceptType::Pathogen)
        );
        assert_eq!(
            graph.nodes.get(&curie("D018352")).unwrap().label,
            NodeLabel::Concept(ConceptType::Disease)
        );
        assert_eq!(graph.nodes.get(&curie("D004534")).unwrap().name, "Egypt");
    }

    #[test]
    fn test_unclassified_parent_dangles() {
        let terms = vec![
            OntologyTerm {
                id: "Y".into(),
                name: "Generic parent".into(),
                tree_numbers: vec!["A01".into()],
            },
            OntologyTerm {
                id: "X".into(),
                name: "Some disease".into(),
                tree_numbers: vec!["A01.100".into()],
            },
        ];
        // Disease capability keyed on the child's exact position
        let ontology = TreeNumberOntology::from_terms("MESH", terms, vec!["A01.".into()]).unwrap();
        let classifier = ConceptClassifier::new(Arc::new(ontology), ClassifierRoots::default());

        let graph = HierarchyAssembler::new(&classifier).assemble().unwrap();

        assert_eq!(graph.nodes.len(), 1);
        assert!(graph.nodes.contains(&curie("X")));
        assert!(!graph.nodes.contains(&curie("Y")));
        assert_eq!(
            graph.edges.iter().collect::<Vec<_>>(),
            vec![&HierarchyEdge {
                child: curie("X"),
                parent: curie("Y"),
            }]
        );
        assert_eq!(graph.stats.dangling_parents, 1);
    }

    #[test]
    fn test_assembly_is_idempotent() {
        let classifier = sample_classifier();
        let assembler = HierarchyAssembler::new(&classifier);
        assert_eq!(assembler.assemble().unwrap(), assembler.assemble().unwrap());
    }
}
