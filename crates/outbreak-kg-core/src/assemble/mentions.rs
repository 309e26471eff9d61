//! Document-mentions graph assembly
//!
//! Links each alert to the typed concepts it mentions. Every document gets an
//! `alert` node, even one with no typed mentions. Concept nodes are written
//! alongside when `emit_concept_nodes` is set, which lets the mentions tables
//! load without the co-occurrence or hierarchy node tables. As in the
//! co-occurrence graph, a concept node takes the mention spelling of the first
//! document that mentions it.

use std::collections::BTreeSet;

use rayon::prelude::*;
use serde::Serialize;
use tracing::info;

use crate::classify::{ClassificationPriority, ConceptClassifier, Stoplist};
use crate::domain::{Document, MentionEdge, NodeRecord, NodeSet};
use crate::error::Result;

/// Counters reported after assembly
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MentionsStats {
    pub documents: usize,
    pub excluded_mentions: usize,
    pub untyped_mentions: usize,
}

/// Assembled document-mentions graph
#[derive(Debug, Clone, Default)]
pub struct MentionsGraph {
    /// Alert nodes, plus concept nodes when enabled
    pub nodes: NodeSet,
    pub edges: BTreeSet<MentionEdge>,
    pub stats: MentionsStats,
}

struct DocumentMentions {
    alert: NodeRecord,
    concepts: Vec<NodeRecord>,
    edges: Vec<MentionEdge>,
    excluded: usize,
    untyped: usize,
}

/// Builds alert → concept `mentions` edges
pub struct MentionsAssembler<'a> {
    classifier: &'a ConceptClassifier,
    stoplist: &'a Stoplist,
    document_prefix: String,
    emit_concept_nodes: bool,
}

impl<'a> MentionsAssembler<'a> {
    pub fn new(classifier: &'a ConceptClassifier, stoplist: &'a Stoplist) -> Self {
        Self {
            classifier,
            stoplist,
            document_prefix: "promed".to_string(),
            emit_concept_nodes: true,
        }
    }

    /// Curie namespace used for document nodes
    pub fn with_document_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.document_prefix = prefix.into();
        self
    }

    pub fn with_concept_nodes(mut self, enabled: bool) -> Self {
        self.emit_concept_nodes = enabled;
        self
    }

    fn assemble_document(&self, document: &Document) -> Result<DocumentMentions> {
        let document_curie = document.curie(&self.document_prefix);
        let mut result = DocumentMentions {
            alert: NodeRecord::alert(document_curie.clone(), &document.id),
            concepts: Vec::new(),
            edges: Vec::new(),
            excluded: 0,
            untyped: 0,
        };

        for mention in &document.mentions {
            if self.stoplist.is_excluded(&mention.name) {
                result.excluded += 1;
                continue;
            }
            let flags = self
                .classifier
                .flags(&mention.namespace, &mention.identifier)?;
            if !flags.any() {
                result.untyped += 1;
                continue;
            }

            result.edges.push(MentionEdge {
                document: document_curie.clone(),
                concept: mention.curie(),
            });
            if self.emit_concept_nodes {
                result.concepts.push(NodeRecord::concept(
                    mention.curie(),
                    &mention.name,
                    flags.resolve(ClassificationPriority::DISPLAY),
                ));
            }
        }

        Ok(result)
    }

    /// Assemble the graph over all documents
    pub fn assemble(&self, documents: &[Document]) -> Result<MentionsGraph> {
        let per_document = documents
            .par_iter()
            .map(|document| self.assemble_document(document))
            .collect::<Result<Vec<_>>>()?;

        let mut graph = MentionsGraph {
            stats: MentionsStats {
                documents: documents.len(),
                ..Default::default()
            },
            ..Default::default()
        };

        for result in per_document {
            graph.nodes.insert(result.alert);
            for concept in result.concepts {
                graph.nodes.insert(concept);
            }
            graph.edges.extend(result.edges);
            graph.stats.excluded_mentions += result.excluded;
            graph.stats.untyped_mentions += result.untyped;
        }

        info!(
            documents = graph.stats.documents,
            nodes = graph.nodes.len(),
            edges = graph.edges.len(),
            excluded = graph.stats.excluded_mentions,
            "Assembled document mentions"
        );

        Ok(graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::test_support::sample_classifier;
    use crate::domain::{Curie, Mention, NodeLabel};

    fn mesh(id: &str, name: &str) -> Mention {
        Mention::new("MESH", id, name)
    }

    fn corpus() -> Vec<Document> {
        vec![
            Document::new(
                "20160428.4189378",
                vec![
                    mesh("D004534", "Egypt"),
                    mesh("D017934", "Coronavirus"),
                    mesh("D017934", "coronavirus"),
                    mesh("D007239", "Disease"),
                    mesh("D000818", "Livestock"),
                    Mention::new("DOID", "D004534", "Egypt"),
                ],
            ),
            Document::new("20160429.1", vec![]),
        ]
    }

    #[test]
    fn test_alert_node_per_document() {
        let classifier = sample_classifier();
        let stoplist = Stoplist::default();
        let graph = MentionsAssembler::new(&classifier, &stoplist)
            .with_concept_nodes(false)
            .assemble(&corpus())
            .unwrap();

        assert_eq!(graph.nodes.len(), 2);
        let alert = graph
            .nodes
            .get(&Curie::new("promed", "20160429.1"))
            .unwrap();
        assert_eq!(alert.label, NodeLabel::Alert);
        assert_eq!(alert.name, "20160429.1");
    }

    #[test]
    fn test_edges_are_deduplicated_and_filtered() {
        let classifier = sample_classifier();
        let stoplist = Stoplist::default();
        let graph = MentionsAssembler::new(&classifier, &stoplist)
            .assemble(&corpus())
            .unwrap();

        let document = Curie::new("promed", "20160428.4189378");
        let targets: Vec<String> = graph
            .edges
            .iter()
            .filter(|e| e.document == document)
            .map(|e| e.concept.to_string())
            .collect();
        assert_eq!(targets, vec!["MESH:D004534", "MESH:D017934"]);

        assert_eq!(graph.stats.excluded_mentions, 1);
        // Livestock and the DOID mention
        assert_eq!(graph.stats.untyped_mentions, 2);
    }

    #[test]
    fn test_concept_nodes_when_enabled() {
        let classifier = sample_classifier();
        let stoplist = Stoplist::default();
        let graph = MentionsAssembler::new(&classifier, &stoplist)
            .with_document_prefix("alert")
            .assemble(&corpus())
            .unwrap();

        assert!(graph.nodes.contains(&Curie::new("alert", "20160428.4189378")));
        let concept = graph.nodes.get(&Curie::new("MESH", "D017934")).unwrap();
        assert_eq!(concept.label.as_str(), "pathogen");
        // First spelling wins
        assert_eq!(concept.name, "Coronavirus");
        assert!(!graph.nodes.contains(&Curie::new("MESH", "D007239")));

        // Every edge endpoint has a node
        for edge in &graph.edges {
            assert!(graph.nodes.contains(&edge.document));
            assert!(graph.nodes.contains(&edge.concept));
        }
    }
}
