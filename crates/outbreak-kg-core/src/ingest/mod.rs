//! Mention source loading
//!
//! Reads the NER stage's output: a JSON object mapping each alert's archive
//! number to its grounded terms,
//!
//! ```text
//! {
//!   "20160428.4189378": [["MESH", "D005842", "Egypt"], ["MESH", "D001419", "Bacteria"]],
//!   ...
//! }
//! ```
//!
//! A document whose value is not a list of `[namespace, identifier, name]`
//! string triples is skipped and reported; the rest of the corpus still loads.

use std::fs;
use std::path::Path;

use serde_json::Value;
use tracing::{info, warn};

use crate::domain::{Document, Mention};
use crate::error::{Error, Result};

/// Documents loaded from a mention source, in archive-number order
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    pub documents: Vec<Document>,
    /// Archive numbers of documents that were skipped as malformed
    pub skipped: Vec<String>,
}

impl Corpus {
    pub fn new(mut documents: Vec<Document>) -> Self {
        documents.sort_by(|a, b| a.id.cmp(&b.id));
        Self {
            documents,
            skipped: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Total mentions across all documents
    pub fn mention_count(&self) -> usize {
        self.documents.iter().map(|d| d.mentions.len()).sum()
    }
}

/// Load a mentions file from disk
pub fn load_corpus(path: &Path) -> Result<Corpus> {
    let contents = fs::read_to_string(path)
        .map_err(|e| Error::MentionsUnreadable(path.to_path_buf(), e.to_string()))?;
    let value: Value = serde_json::from_str(&contents)
        .map_err(|e| Error::MentionsUnreadable(path.to_path_buf(), e.to_string()))?;

    let corpus = parse_corpus(value)?;
    info!(
        path = %path.display(),
        documents = corpus.len(),
        mentions = corpus.mention_count(),
        skipped = corpus.skipped.len(),
        "Loaded mentions"
    );
    Ok(corpus)
}

/// Build a corpus from an already-parsed JSON value
pub fn parse_corpus(value: Value) -> Result<Corpus> {
    let Value::Object(entries) = value else {
        return Err(Error::InvalidInput(
            "mentions file must be a JSON object keyed by document id".to_string(),
        ));
    };

    let mut documents = Vec::with_capacity(entries.len());
    let mut skipped = Vec::new();

    for (id, raw) in entries {
        match parse_document(&id, &raw) {
            Ok(document) => documents.push(document),
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                warn!(document = %id, code = e.code(), error = %e, "Skipping document");
                skipped.push(id);
            }
        }
    }

    let mut corpus = Corpus::new(documents);
    skipped.sort();
    corpus.skipped = skipped;
    Ok(corpus)
}

fn parse_document(id: &str, raw: &Value) -> Result<Document> {
    if id.is_empty() {
        return Err(Error::MalformedDocument(id.to_string(), "empty document id".to_string()));
    }
    let Value::Array(items) = raw else {
        return Err(Error::MalformedDocument(
            id.to_string(),
            "expected a list of mentions".to_string(),
        ));
    };

    let mentions = items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            parse_mention(item).ok_or_else(|| {
                Error::MalformedDocument(
                    id.to_string(),
                    format!("mention {} is not a [namespace, identifier, name] triple", index),
                )
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Document::new(id, mentions))
}

fn parse_mention(item: &Value) -> Option<Mention> {
    let [namespace, identifier, name] = item.as_array()?.as_slice() else {
        return None;
    };
    let namespace = namespace.as_str().filter(|s| !s.is_empty())?;
    let identifier = identifier.as_str().filter(|s| !s.is_empty())?;
    let name = name.as_str()?;
    Some(Mention::new(namespace, identifier, name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_parse_well_formed_corpus() {
        let corpus = parse_corpus(json!({
            "D2": [["MESH", "D001419", "Bacteria"]],
            "D1": [["MESH", "D001419", "Bacteria"], ["MESH", "D005842", "Egypt"]],
            "D3": []
        }))
        .unwrap();

        let ids: Vec<&str> = corpus.documents.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["D1", "D2", "D3"]);
        assert_eq!(corpus.mention_count(), 3);
        assert!(corpus.skipped.is_empty());
        assert_eq!(
            corpus.documents[0].mentions[1],
            Mention::new("MESH", "D005842", "Egypt")
        );
    }

    #[test]
    fn test_malformed_documents_are_skipped() {
        let corpus = parse_corpus(json!({
            "good": [["MESH", "D001419", "Bacteria"]],
            "not-a-list": "MESH:D001419",
            "short-triple": [["MESH", "D001419"]],
            "non-string": [["MESH", 42, "Bacteria"]],
            "empty-id-part": [["MESH", "", "Bacteria"]]
        }))
        .unwrap();

        assert_eq!(corpus.len(), 1);
        assert_eq!(corpus.documents[0].id, "good");
        assert_eq!(
            corpus.skipped,
            vec!["empty-id-part", "non-string", "not-a-list", "short-triple"]
        );
    }

    #[test]
    fn test_duplicate_mentions_are_preserved() {
        let corpus = parse_corpus(json!({
            "D1": [["MESH", "D001419", "Bacteria"], ["MESH", "D001419", "Bacteria"]]
        }))
        .unwrap();
        assert_eq!(corpus.documents[0].mentions.len(), 2);
    }

    #[test]
    fn test_top_level_must_be_object() {
        let result = parse_corpus(json!([["MESH", "D001419", "Bacteria"]]));
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_load_corpus_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("terms_by_alert.json");
        fs::write(&path, r#"{"20160428.4189378": [["MESH", "D005842", "Egypt"]]}"#).unwrap();

        let corpus = load_corpus(&path).unwrap();
        assert_eq!(corpus.len(), 1);
        assert_eq!(corpus.documents[0].id, "20160428.4189378");
    }

    #[test]
    fn test_load_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let result = load_corpus(&temp_dir.path().join("missing.json"));
        assert!(matches!(result, Err(Error::MentionsUnreadable(..))));
    }
}
