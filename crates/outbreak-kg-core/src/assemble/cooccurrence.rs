//! Co-occurrence graph assembly
//!
//! Every pair of concepts mentioned together in one alert is a candidate.
//! A candidate becomes an occurrence when, read in some direction, it links
//! a geolocation to a pathogen, a disease to a pathogen, or a geolocation to a
//! disease. Occurrences are counted per unordered concept pair across the
//! whole corpus.
//!
//! Documents are processed in parallel; the per-document results are then
//! folded in document order, so the output does not depend on scheduling.
//!
//! Node names are the mention spellings, not ontology names. When a concept
//! is spelled differently across alerts, the first document in input order
//! names the node (the loader orders documents by archive number). The
//! hierarchy tables name the same curie with its ontology name, so names may
//! differ between tables; joins go through the curie.

use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::classify::{ClassificationPriority, ConceptClassifier, Stoplist, TypeFlags};
use crate::domain::{ConceptPair, CooccurrenceEdge, Curie, Document, Mention, NodeRecord, NodeSet};
use crate::error::Result;

/// How many occurrences a candidate pair contributes when it matches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountPolicy {
    /// One occurrence per matching orientation, so up to two per pair
    #[default]
    PerOrientation,
    /// At most one occurrence per candidate pair
    Single,
}

impl CountPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PerOrientation => "per_orientation",
            Self::Single => "single",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "per_orientation" => Some(Self::PerOrientation),
            "single" => Some(Self::Single),
            _ => None,
        }
    }
}

/// Directional rule: does `first` → `second` form an interesting link?
pub fn is_interesting(first: &TypeFlags, second: &TypeFlags) -> bool {
    (first.geolocation && second.pathogen)
        || (first.disease && second.pathogen)
        || (first.geolocation && second.disease)
}

/// Two distinct mentions from the same document, in canonical order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidatePair<'a> {
    pub first: &'a Mention,
    pub second: &'a Mention,
}

impl<'a> CandidatePair<'a> {
    /// Order the mentions by display name, then curie
    pub fn canonical(a: &'a Mention, b: &'a Mention) -> Self {
        let key = |m: &'a Mention| (m.name.as_str(), m.namespace.as_str(), m.identifier.as_str());
        if key(a) <= key(b) {
            Self { first: a, second: b }
        } else {
            Self { first: b, second: a }
        }
    }
}

/// All 2-combinations of `mentions`, canonicalized
pub fn candidate_pairs<'a>(mentions: &[&'a Mention]) -> Vec<CandidatePair<'a>> {
    let k = mentions.len();
    let mut pairs = Vec::with_capacity(k * k.saturating_sub(1) / 2);
    for (i, &a) in mentions.iter().enumerate() {
        for &b in &mentions[i + 1..] {
            pairs.push(CandidatePair::canonical(a, b));
        }
    }
    pairs
}

/// An interesting pair in the orientation that matched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterestingOccurrence {
    pub first: NodeRecord,
    pub second: NodeRecord,
}

impl InterestingOccurrence {
    pub fn pair(&self) -> ConceptPair {
        ConceptPair::new(self.first.curie.clone(), self.second.curie.clone())
    }
}

/// Result of scanning a single document
#[derive(Debug, Clone, Default)]
pub struct DocumentOccurrences {
    pub document_id: String,
    /// Mentions dropped by the stoplist
    pub excluded: usize,
    /// C(k, 2) for the k mentions that survived the stoplist
    pub candidates: usize,
    pub occurrences: Vec<InterestingOccurrence>,
}

/// Counters reported after assembly
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CooccurrenceStats {
    pub documents: usize,
    pub excluded_mentions: usize,
    pub candidate_pairs: usize,
    pub occurrences: usize,
}

/// Assembled co-occurrence graph
#[derive(Debug, Clone, Default)]
pub struct CooccurrenceGraph {
    pub nodes: NodeSet,
    /// One edge per unordered concept pair, sorted by (source, target)
    pub edges: Vec<CooccurrenceEdge>,
    pub stats: CooccurrenceStats,
}

impl CooccurrenceGraph {
    /// Count for a pair, in either order
    pub fn count(&self, a: &Curie, b: &Curie) -> Option<u64> {
        let pair = ConceptPair::new(a.clone(), b.clone());
        self.edges
            .iter()
            .find(|e| &e.source == pair.first() && &e.target == pair.second())
            .map(|e| e.count)
    }
}

/// Builds the weighted co-occurrence graph from documents
pub struct CooccurrenceAssembler<'a> {
    classifier: &'a ConceptClassifier,
    stoplist: &'a Stoplist,
    policy: CountPolicy,
}

impl<'a> CooccurrenceAssembler<'a> {
    pub fn new(classifier: &'a ConceptClassifier, stoplist: &'a Stoplist) -> Self {
        Self {
            classifier,
            stoplist,
            policy: CountPolicy::default(),
        }
    }

    pub fn with_count_policy(mut self, policy: CountPolicy) -> Self {
        self.policy = policy;
        self
    }

    fn node(mention: &Mention, flags: &TypeFlags) -> NodeRecord {
        NodeRecord::concept(
            mention.curie(),
            &mention.name,
            flags.resolve(ClassificationPriority::COOCCURRENCE),
        )
    }

    /// Find the interesting occurrences in one document
    pub fn assemble_document(&self, document: &Document) -> Result<DocumentOccurrences> {
        let kept: Vec<&Mention> = document
            .mentions
            .iter()
            .filter(|m| !self.stoplist.is_excluded(&m.name))
            .collect();
        let excluded = document.mentions.len() - kept.len();

        // Classify each mention once; pairs reuse the flags
        let mut flags: BTreeMap<&Mention, TypeFlags> = BTreeMap::new();
        for &mention in &kept {
            if !flags.contains_key(mention) {
                let f = self
                    .classifier
                    .flags(&mention.namespace, &mention.identifier)?;
                flags.insert(mention, f);
            }
        }

        let candidates = candidate_pairs(&kept);
        let mut occurrences = Vec::new();

        for pair in &candidates {
            let a = flags[pair.first];
            let b = flags[pair.second];

            for (first, first_flags, second, second_flags) in [
                (pair.first, &a, pair.second, &b),
                (pair.second, &b, pair.first, &a),
            ] {
                if !is_interesting(first_flags, second_flags) {
                    continue;
                }
                occurrences.push(InterestingOccurrence {
                    first: Self::node(first, first_flags),
                    second: Self::node(second, second_flags),
                });
                if self.policy == CountPolicy::Single {
                    break;
                }
            }
        }

        debug!(
            document = %document.id,
            excluded,
            candidates = candidates.len(),
            occurrences = occurrences.len(),
            "Scanned document"
        );

        Ok(DocumentOccurrences {
            document_id: document.id.clone(),
            excluded,
            candidates: candidates.len(),
            occurrences,
        })
    }

    /// Assemble the corpus-wide graph
    pub fn assemble(&self, documents: &[Document]) -> Result<CooccurrenceGraph> {
        let per_document = documents
            .par_iter()
            .map(|document| self.assemble_document(document))
            .collect::<Result<Vec<_>>>()?;

        let mut nodes = NodeSet::new();
        let mut counts: BTreeMap<ConceptPair, u64> = BTreeMap::new();
        let mut stats = CooccurrenceStats {
            documents: documents.len(),
            ..Default::default()
        };

        for result in per_document {
            stats.excluded_mentions += result.excluded;
            stats.candidate_pairs += result.candidates;
            stats.occurrences += result.occurrences.len();

            for occurrence in result.occurrences {
                *counts.entry(occurrence.pair()).or_insert(0) += 1;
                nodes.insert(occurrence.first);
                nodes.insert(occurrence.second);
            }
        }

        let edges: Vec<CooccurrenceEdge> = counts
            .into_iter()
            .map(|(pair, count)| CooccurrenceEdge {
                source: pair.first().clone(),
                target: pair.second().clone(),
                count,
            })
            .collect();

        info!(
            documents = stats.documents,
            candidates = stats.candidate_pairs,
            occurrences = stats.occurrences,
            nodes = nodes.len(),
            edges = edges.len(),
            policy = self.policy.as_str(),
            "Assembled co-occurrence graph"
        );

        Ok(CooccurrenceGraph {
            nodes,
            edges,
            stats,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::test_support::sample_classifier;
    use crate::domain::ConceptType;

    fn mesh(id: &str, name: &str) -> Mention {
        Mention::new("MESH", id, name)
    }

    fn curie(id: &str) -> Curie {
        Curie::new("MESH", id)
    }

    fn d1() -> Document {
        Document::new(
            "D1",
            vec![mesh("D001419", "Bacteria"), mesh("D005842", "Egypt")],
        )
    }

    #[test]
    fn test_candidate_pair_count_is_k_choose_2() {
        let mentions: Vec<Mention> = (0..6).map(|i| mesh(&format!("D{i}"), &format!("n{i}"))).collect();
        for k in 0..=mentions.len() {
            let refs: Vec<&Mention> = mentions[..k].iter().collect();
            assert_eq!(candidate_pairs(&refs).len(), k * k.saturating_sub(1) / 2);
        }
    }

    #[test]
    fn test_canonical_orientation_sorts_by_name() {
        let egypt = mesh("D005842", "Egypt");
        let bacteria = mesh("D001419", "Bacteria");
        let pair = CandidatePair::canonical(&egypt, &bacteria);
        assert_eq!(pair.first.name, "Bacteria");
        assert_eq!(pair, CandidatePair::canonical(&bacteria, &egypt));
    }

    #[test]
    fn test_directional_rule() {
        let geo = TypeFlags { geolocation: true, ..Default::default() };
        let pathogen = TypeFlags { pathogen: true, ..Default::default() };
        let disease = TypeFlags { disease: true, ..Default::default() };

        assert!(is_interesting(&geo, &pathogen));
        assert!(is_interesting(&disease, &pathogen));
        assert!(is_interesting(&geo, &disease));
        assert!(!is_interesting(&pathogen, &geo));
        assert!(!is_interesting(&pathogen, &disease));
        assert!(!is_interesting(&disease, &geo));
        assert!(!is_interesting(&geo, &geo));
    }

    #[test]
    fn test_geolocation_pathogen_scenario() {
        let classifier = sample_classifier();
        let stoplist = Stoplist::default();
        let graph = CooccurrenceAssembler::new(&classifier, &stoplist)
            .assemble(&[d1()])
            .unwrap();

        assert_eq!(graph.edges.len(), 1);
        assert_eq!(graph.count(&curie("D001419"), &curie("D005842")), Some(1));
        assert_eq!(graph.count(&curie("D005842"), &curie("D001419")), Some(1));

        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(
            graph.nodes.get(&curie("D001419")).unwrap().label.as_str(),
            "pathogen"
        );
        assert_eq!(
            graph.nodes.get(&curie("D005842")).unwrap().label.as_str(),
            "geoloc"
        );
    }

    #[test]
    fn test_first_document_names_the_node() {
        let classifier = sample_classifier();
        let stoplist = Stoplist::default();
        let respelled = Document::new(
            "D2",
            vec![mesh("D001419", "Bacteria"), mesh("D005842", "EGYPT")],
        );

        let graph = CooccurrenceAssembler::new(&classifier, &stoplist)
            .assemble(&[d1(), respelled.clone()])
            .unwrap();
        assert_eq!(graph.nodes.get(&curie("D005842")).unwrap().name, "Egypt");

        let graph = CooccurrenceAssembler::new(&classifier, &stoplist)
            .assemble(&[respelled, d1()])
            .unwrap();
        assert_eq!(graph.nodes.get(&curie("D005842")).unwrap().name, "EGYPT");
    }

    #[test]
    fn test_counts_accumulate_across_documents() {
        let classifier = sample_classifier();
        let stoplist = Stoplist::default();
        let mut d2 = d1();
        d2.id = "D2".to_string();

        let graph = CooccurrenceAssembler::new(&classifier, &stoplist)
            .assemble(&[d1(), d2])
            .unwrap();
        assert_eq!(graph.count(&curie("D001419"), &curie("D005842")), Some(2));
    }

    #[test]
    fn test_duplicate_mentions_within_document_count_separately() {
        let classifier = sample_classifier();
        let stoplist = Stoplist::default();
        let doc = Document::new(
            "D1",
            vec![
                mesh("D001419", "Bacteria"),
                mesh("D001419", "Bacteria"),
                mesh("D005842", "Egypt"),
            ],
        );

        let result = CooccurrenceAssembler::new(&classifier, &stoplist)
            .assemble_document(&doc)
            .unwrap();
        assert_eq!(result.candidates, 3);
        // Bacteria/Bacteria is not interesting; each Bacteria/Egypt pair is
        assert_eq!(result.occurrences.len(), 2);
    }

    #[test]
    fn test_stoplisted_mention_never_pairs() {
        let classifier = sample_classifier();
        let stoplist = Stoplist::default();
        // "Disease" would classify as a disease through D007239
        let doc = Document::new(
            "D1",
            vec![
                mesh("D007239", "Disease"),
                mesh("D005842", "Egypt"),
                mesh("D017934", "Coronavirus"),
            ],
        );

        let assembler = CooccurrenceAssembler::new(&classifier, &stoplist);
        let result = assembler.assemble_document(&doc).unwrap();
        assert_eq!(result.excluded, 1);
        assert_eq!(result.candidates, 1);

        let graph = assembler.assemble(&[doc]).unwrap();
        assert!(!graph.nodes.contains(&curie("D007239")));
        assert!(graph
            .edges
            .iter()
            .all(|e| e.source != curie("D007239") && e.target != curie("D007239")));
    }

    #[test]
    fn test_untyped_and_foreign_namespace_pairs_are_ignored() {
        let classifier = sample_classifier();
        let stoplist = Stoplist::empty();
        let doc = Document::new(
            "D1",
            vec![
                mesh("D000818", "Animals"),
                Mention::new("DOID", "D005842", "Egypt"),
                mesh("D017934", "Coronavirus"),
            ],
        );
        let graph = CooccurrenceAssembler::new(&classifier, &stoplist)
            .assemble(&[doc])
            .unwrap();
        assert!(graph.edges.is_empty());
        assert!(graph.nodes.is_empty());
        assert_eq!(graph.stats.candidate_pairs, 3);
    }

    #[test]
    fn test_disease_pathogen_and_geolocation_disease() {
        let classifier = sample_classifier();
        let stoplist = Stoplist::default();
        let doc = Document::new(
            "D1",
            vec![
                mesh("D018352", "Coronavirus Infections"),
                mesh("D017934", "Coronavirus"),
                mesh("D004534", "Egypt"),
            ],
        );
        let graph = CooccurrenceAssembler::new(&classifier, &stoplist)
            .assemble(&[doc])
            .unwrap();

        assert_eq!(graph.edges.len(), 3);
        assert_eq!(graph.count(&curie("D018352"), &curie("D017934")), Some(1));
        assert_eq!(graph.count(&curie("D004534"), &curie("D017934")), Some(1));
        assert_eq!(graph.count(&curie("D004534"), &curie("D018352")), Some(1));
        assert_eq!(
            graph.nodes.get(&curie("D018352")).unwrap().label,
            crate::domain::NodeLabel::Concept(ConceptType::Disease)
        );
    }

    /// Classifier where one term is both a disease and a geolocation root
    fn overlapping_classifier() -> ConceptClassifier {
        use crate::classify::ClassifierRoots;
        use crate::ontology::{OntologyTerm, TreeNumberOntology};
        use std::sync::Arc;

        let terms = vec![
            OntologyTerm {
                id: "X1".into(),
                name: "Both".into(),
                tree_numbers: vec!["C01".into()],
            },
            OntologyTerm {
                id: "X2".into(),
                name: "Other".into(),
                tree_numbers: vec!["C02".into()],
            },
        ];
        let ontology = TreeNumberOntology::from_terms("MESH", terms, vec!["C".into()]).unwrap();
        let roots = ClassifierRoots {
            namespace: "MESH".into(),
            geolocation: vec!["X1".into(), "X2".into()],
            pathogen: vec![],
        };
        ConceptClassifier::new(Arc::new(ontology), roots)
    }

    #[test]
    fn test_both_orientations_count_under_default_policy() {
        let classifier = overlapping_classifier();
        let stoplist = Stoplist::empty();
        let doc = Document::new("D1", vec![mesh("X1", "Both"), mesh("X2", "Other")]);

        let per_orientation = CooccurrenceAssembler::new(&classifier, &stoplist)
            .assemble(std::slice::from_ref(&doc))
            .unwrap();
        assert_eq!(per_orientation.count(&curie("X1"), &curie("X2")), Some(2));

        let single = CooccurrenceAssembler::new(&classifier, &stoplist)
            .with_count_policy(CountPolicy::Single)
            .assemble(&[doc])
            .unwrap();
        assert_eq!(single.count(&curie("X1"), &curie("X2")), Some(1));
    }

    #[test]
    fn test_aggregation_is_order_independent() {
        let classifier = sample_classifier();
        let stoplist = Stoplist::default();
        let documents = vec![
            d1(),
            Document::new(
                "D2",
                vec![mesh("D017934", "Coronavirus"), mesh("D004534", "Egypt")],
            ),
            Document::new(
                "D3",
                vec![
                    mesh("D004534", "Egypt"),
                    mesh("D001419", "Bacteria"),
                    mesh("D018352", "Coronavirus Infections"),
                ],
            ),
        ];
        let mut reversed = documents.clone();
        reversed.reverse();

        let assembler = CooccurrenceAssembler::new(&classifier, &stoplist);
        let forward = assembler.assemble(&documents).unwrap();
        let backward = assembler.assemble(&reversed).unwrap();

        assert_eq!(forward.edges, backward.edges);
        assert_eq!(forward.stats, backward.stats);
        let forward_ids: Vec<_> = forward.nodes.iter().map(|n| n.curie.clone()).collect();
        let backward_ids: Vec<_> = backward.nodes.iter().map(|n| n.curie.clone()).collect();
        assert_eq!(forward_ids, backward_ids);
    }

    #[test]
    fn test_count_policy_parse() {
        assert_eq!(CountPolicy::parse("single"), Some(CountPolicy::Single));
        assert_eq!(
            CountPolicy::parse(CountPolicy::PerOrientation.as_str()),
            Some(CountPolicy::PerOrientation)
        );
        assert_eq!(CountPolicy::parse("double"), None);
    }
}
