//! Graph build pipeline
//!
//! Loads the ontology and the mention source, runs the requested assemblers
//! and publishes each assembler's node/edge tables as one unit. The manifest
//! is updated after every successful publish, so a later failure does not
//! lose the entries of tables already in place.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::assemble::{
    CooccurrenceAssembler, CooccurrenceStats, HierarchyAssembler, HierarchyStats,
    MentionsAssembler, MentionsStats,
};
use crate::classify::{ConceptClassifier, Stoplist};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::export::{
    COOCCURRENCE_TABLES, ExportManifest, HIERARCHY_TABLES, MENTIONS_TABLES, PublishedTable, Table,
    TableExporter, TableNames,
};
use crate::ingest::{Corpus, load_corpus};
use crate::ontology::TreeNumberOntology;

/// Which graphs to build
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildTarget {
    #[default]
    All,
    Cooccurrence,
    Hierarchy,
    Mentions,
}

impl BuildTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Cooccurrence => "cooccurrence",
            Self::Hierarchy => "hierarchy",
            Self::Mentions => "mentions",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "all" => Some(Self::All),
            "cooccurrence" => Some(Self::Cooccurrence),
            "hierarchy" => Some(Self::Hierarchy),
            "mentions" => Some(Self::Mentions),
            _ => None,
        }
    }

    /// Whether building `self` builds `graph`
    pub fn includes(&self, graph: BuildTarget) -> bool {
        *self == Self::All || *self == graph
    }

    /// Whether a mention source is required
    pub fn needs_mentions(&self) -> bool {
        self.includes(Self::Cooccurrence) || self.includes(Self::Mentions)
    }
}

impl fmt::Display for BuildTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Inputs of one build; unset paths fall back to the configuration
#[derive(Debug, Clone, Default)]
pub struct BuildRequest {
    pub target: BuildTarget,
    pub ontology: Option<PathBuf>,
    pub mentions: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
}

/// What a build produced
#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
    pub target: BuildTarget,
    pub output_dir: PathBuf,
    pub documents: usize,
    /// Archive numbers of malformed documents that were skipped
    pub skipped_documents: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cooccurrence: Option<CooccurrenceStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hierarchy: Option<HierarchyStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mentions: Option<MentionsStats>,
    pub tables: Vec<PublishedTable>,
    /// Rows across every table in the manifest, including earlier builds
    pub total_rows: usize,
}

impl BuildReport {
    fn new(target: BuildTarget, output_dir: PathBuf, corpus: &Corpus) -> Self {
        Self {
            target,
            output_dir,
            documents: corpus.len(),
            skipped_documents: corpus.skipped.clone(),
            cooccurrence: None,
            hierarchy: None,
            mentions: None,
            tables: Vec::new(),
            total_rows: 0,
        }
    }
}

struct Pipeline<'a> {
    config: &'a Config,
    classifier: &'a ConceptClassifier,
    stoplist: &'a Stoplist,
    corpus: &'a Corpus,
    exporter: &'a TableExporter,
}

impl Pipeline<'_> {
    fn publish(
        &self,
        report: &mut BuildReport,
        names: TableNames,
        nodes: Table,
        edges: Table,
    ) -> Result<()> {
        let published = self.exporter.publish_graph(names, nodes, edges)?;
        let manifest = ExportManifest::update(self.exporter.output_dir(), &published)?;
        report.total_rows = manifest.total_rows;
        report.tables.extend(published);
        Ok(())
    }

    fn run(&self, target: BuildTarget, report: &mut BuildReport) -> Result<()> {
        if target.includes(BuildTarget::Cooccurrence) {
            let graph = CooccurrenceAssembler::new(self.classifier, self.stoplist)
                .with_count_policy(self.config.cooccurrence.count_policy)
                .assemble(&self.corpus.documents)?;
            self.publish(
                report,
                COOCCURRENCE_TABLES,
                Table::from_records(graph.nodes.iter()),
                Table::from_records(&graph.edges),
            )?;
            report.cooccurrence = Some(graph.stats);
        }

        if target.includes(BuildTarget::Hierarchy) {
            let graph = HierarchyAssembler::new(self.classifier).assemble()?;
            self.publish(
                report,
                HIERARCHY_TABLES,
                Table::from_records(graph.nodes.iter()),
                Table::from_records(&graph.edges),
            )?;
            report.hierarchy = Some(graph.stats);
        }

        if target.includes(BuildTarget::Mentions) {
            let graph = MentionsAssembler::new(self.classifier, self.stoplist)
                .with_document_prefix(self.config.mentions.document_prefix.clone())
                .with_concept_nodes(self.config.mentions.emit_concept_nodes)
                .assemble(&self.corpus.documents)?;
            self.publish(
                report,
                MENTIONS_TABLES,
                Table::from_records(graph.nodes.iter()),
                Table::from_records(&graph.edges),
            )?;
            report.mentions = Some(graph.stats);
        }

        Ok(())
    }
}

/// Build the graphs named by `request`
pub fn build(config: &Config, request: &BuildRequest) -> Result<BuildReport> {
    let target = request.target;
    let delimiter = config
        .delimiter()
        .map_err(|e| Error::ConfigError(e.to_string()))?;
    let ontology_path = request
        .ontology
        .clone()
        .or_else(|| config.ontology.path.clone())
        .ok_or_else(|| {
            Error::ConfigError(
                "No ontology file given. Pass --ontology or set ontology.path".to_string(),
            )
        })?;
    let output_dir = request
        .output_dir
        .clone()
        .unwrap_or_else(|| config.export.output_dir.clone());

    let corpus = if target.needs_mentions() {
        let path = request.mentions.as_deref().ok_or_else(|| {
            Error::InvalidInput(format!(
                "Building '{}' requires a mentions file (--mentions)",
                target
            ))
        })?;
        load_corpus(path)?
    } else {
        Corpus::default()
    };

    let ontology = TreeNumberOntology::load(
        &ontology_path,
        config.ontology.namespace.clone(),
        config.ontology.disease_tree_prefixes.clone(),
    )?;
    let classifier = ConceptClassifier::new(Arc::new(ontology), config.classifier_roots());
    let stoplist = config.stoplist();
    let exporter = TableExporter::new(&output_dir)
        .with_delimiter(delimiter)
        .with_sorted_rows(config.export.sort_rows);

    info!(
        graphs = %target,
        documents = corpus.len(),
        output = %output_dir.display(),
        "Building knowledge graph"
    );

    let pipeline = Pipeline {
        config,
        classifier: &classifier,
        stoplist: &stoplist,
        corpus: &corpus,
        exporter: &exporter,
    };
    let mut report = BuildReport::new(target, output_dir, &corpus);

    match config.build.threads {
        Some(threads) => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .map_err(|e| Error::Other(format!("Failed to start worker pool: {}", e)))?;
            pool.install(|| pipeline.run(target, &mut report))?;
        }
        None => pipeline.run(target, &mut report)?,
    }

    info!(
        tables = report.tables.len(),
        total_rows = report.total_rows,
        skipped = report.skipped_documents.len(),
        "Build complete"
    );

    Ok(report)
}
