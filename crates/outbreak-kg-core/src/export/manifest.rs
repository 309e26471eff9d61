//! Export manifest
//!
//! `_metadata.json` in the output directory records when each table was last
//! published, its row count and the SHA-256 of its bytes. Entries for tables
//! not touched by a run are kept, so building a single graph does not forget
//! the others.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

use super::PublishedTable;

/// Manifest file name within the output directory
pub const MANIFEST_FILE: &str = "_metadata.json";

/// Summary of one published table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSummary {
    /// Data rows, header excluded
    pub rows: usize,
    pub sha256: String,
    pub exported_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportManifest {
    /// Time of the most recent publish
    pub exported_at: DateTime<Utc>,
    pub tables: BTreeMap<String, TableSummary>,
    pub total_rows: usize,
}

impl Default for ExportManifest {
    fn default() -> Self {
        Self {
            exported_at: Utc::now(),
            tables: BTreeMap::new(),
            total_rows: 0,
        }
    }
}

impl ExportManifest {
    pub fn path(output_dir: &Path) -> PathBuf {
        output_dir.join(MANIFEST_FILE)
    }

    /// Read the manifest, if one exists
    pub fn load(output_dir: &Path) -> Result<Option<Self>> {
        let path = Self::path(output_dir);
        if !path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&contents)?))
    }

    /// Record freshly published tables
    pub fn record(&mut self, published: &[PublishedTable]) {
        let now = Utc::now();
        for table in published {
            self.tables.insert(
                table.file_name.clone(),
                TableSummary {
                    rows: table.rows,
                    sha256: table.sha256.clone(),
                    exported_at: now,
                },
            );
        }
        self.exported_at = now;
        self.total_rows = self.tables.values().map(|t| t.rows).sum();
    }

    /// Write the manifest, replacing any previous one in a single rename
    pub fn save(&self, output_dir: &Path) -> Result<()> {
        let export_err = |e: std::io::Error| Error::ExportFailed(output_dir.to_path_buf(), e.to_string());

        let mut file = tempfile::NamedTempFile::new_in(output_dir).map_err(export_err)?;
        serde_json::to_writer_pretty(&mut file, self)?;
        file.write_all(b"\n").map_err(export_err)?;
        file.persist(Self::path(output_dir))
            .map_err(|e| export_err(e.error))?;
        Ok(())
    }

    /// Load, record and save in one step
    pub fn update(output_dir: &Path, published: &[PublishedTable]) -> Result<Self> {
        let mut manifest = Self::load(output_dir)?.unwrap_or_default();
        manifest.record(published);
        manifest.save(output_dir)?;
        Ok(manifest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn published(name: &str, rows: usize) -> PublishedTable {
        PublishedTable {
            file_name: name.to_string(),
            path: PathBuf::from(name),
            rows,
            sha256: format!("{:064}", rows),
        }
    }

    #[test]
    fn test_missing_manifest() {
        let temp_dir = TempDir::new().unwrap();
        assert!(ExportManifest::load(temp_dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_update_merges_entries() {
        let temp_dir = TempDir::new().unwrap();

        ExportManifest::update(temp_dir.path(), &[published("nodes.tsv", 2), published("edges.tsv", 1)])
            .unwrap();
        let manifest = ExportManifest::update(
            temp_dir.path(),
            &[published("mesh_hierarchy_nodes.tsv", 10), published("nodes.tsv", 3)],
        )
        .unwrap();

        assert_eq!(manifest.tables.len(), 3);
        assert_eq!(manifest.tables["nodes.tsv"].rows, 3);
        assert_eq!(manifest.total_rows, 14);

        let reloaded = ExportManifest::load(temp_dir.path()).unwrap().unwrap();
        assert_eq!(reloaded, manifest);
    }
}
