//! Table export
//!
//! Turns assembled graphs into delimited node/edge tables and publishes them
//! to the output directory.
//!
//! # Scoped publish
//!
//! All tables of one publish call are rendered into a staging directory
//! created inside the output directory. Only once every table is written are
//! they renamed over their final paths. The tables they replace are first
//! moved aside into the staging directory; if any rename fails, the tables
//! already moved in are removed and the previous versions are moved back.
//! The staging directory is removed when it goes out of scope.
//!
//! ```text
//! kg/
//! ├── nodes.tsv / edges.tsv                                  (co-occurrence)
//! ├── mesh_hierarchy_nodes.tsv / mesh_hierarchy_edges.tsv    (hierarchy)
//! ├── promed_alert_nodes.tsv / promed_alert_edges.tsv        (mentions)
//! └── _metadata.json
//! ```

mod manifest;
mod table;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

pub use manifest::{ExportManifest, MANIFEST_FILE, TableSummary};
pub use table::{
    COOCCURRENCE_EDGE_HEADER, NODE_HEADER, RELATION_EDGE_HEADER, Table, TableRow,
};

/// File names of one assembler's node and edge tables
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableNames {
    pub nodes: &'static str,
    pub edges: &'static str,
}

pub const COOCCURRENCE_TABLES: TableNames = TableNames {
    nodes: "nodes.tsv",
    edges: "edges.tsv",
};

pub const HIERARCHY_TABLES: TableNames = TableNames {
    nodes: "mesh_hierarchy_nodes.tsv",
    edges: "mesh_hierarchy_edges.tsv",
};

pub const MENTIONS_TABLES: TableNames = TableNames {
    nodes: "promed_alert_nodes.tsv",
    edges: "promed_alert_edges.tsv",
};

/// A table that reached its final path
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishedTable {
    pub file_name: String,
    pub path: PathBuf,
    pub rows: usize,
    /// Hex SHA-256 of the file contents
    pub sha256: String,
}

/// One target replaced during a publish, kept until the publish succeeds
#[derive(Debug)]
struct Swap {
    target: PathBuf,
    /// Where the previous table was moved, if there was one
    backup: Option<PathBuf>,
    /// Whether the new table reached `target`
    placed: bool,
}

/// Writes tables into an output directory
#[derive(Debug, Clone)]
pub struct TableExporter {
    output_dir: PathBuf,
    delimiter: char,
    sort_rows: bool,
}

impl TableExporter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            delimiter: '\t',
            sort_rows: true,
        }
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Sort rows before writing so repeated runs produce identical files
    pub fn with_sorted_rows(mut self, sort_rows: bool) -> Self {
        self.sort_rows = sort_rows;
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn export_err(&self, e: impl std::fmt::Display) -> Error {
        Error::ExportFailed(self.output_dir.clone(), e.to_string())
    }

    /// Publish a set of tables together
    ///
    /// Either every table replaces its previous version or none does.
    pub fn publish(&self, tables: Vec<(&str, Table)>) -> Result<Vec<PublishedTable>> {
        fs::create_dir_all(&self.output_dir).map_err(|e| self.export_err(e))?;

        let staging = tempfile::Builder::new()
            .prefix(".staging-")
            .tempdir_in(&self.output_dir)
            .map_err(|e| self.export_err(e))?;

        let mut staged = Vec::with_capacity(tables.len());
        for (file_name, mut table) in tables {
            if self.sort_rows {
                table.sort_rows();
            }
            let bytes = table
                .to_bytes(self.delimiter)
                .map_err(|e| self.export_err(e))?;
            let staged_path = staging.path().join(file_name);
            fs::write(&staged_path, &bytes).map_err(|e| self.export_err(e))?;

            debug!(file = file_name, rows = table.len(), "Staged table");
            staged.push((
                staged_path,
                PublishedTable {
                    file_name: file_name.to_string(),
                    path: self.output_dir.join(file_name),
                    rows: table.len(),
                    sha256: hex::encode(Sha256::digest(&bytes)),
                },
            ));
        }

        let backup_dir = staging.path().join(".previous");
        fs::create_dir(&backup_dir).map_err(|e| self.export_err(e))?;

        let mut swaps = Vec::with_capacity(staged.len());
        for (staged_path, table) in &staged {
            let backup = backup_dir.join(&table.file_name);
            if let Err(e) = self.swap_in(staged_path, &table.path, &backup, &mut swaps) {
                self.roll_back(&swaps);
                return Err(e);
            }
        }

        let published: Vec<PublishedTable> = staged.into_iter().map(|(_, table)| table).collect();
        for table in &published {
            info!(path = %table.path.display(), rows = table.rows, "Published table");
        }
        Ok(published)
    }

    /// Move the current `target` to `backup`, then the staged file onto `target`
    fn swap_in(
        &self,
        staged_path: &Path,
        target: &Path,
        backup: &Path,
        swaps: &mut Vec<Swap>,
    ) -> Result<()> {
        if target.is_dir() {
            return Err(self.export_err(format!("{} is a directory", target.display())));
        }
        let had_previous = match fs::rename(target, backup) {
            Ok(()) => true,
            Err(e) if e.kind() == io::ErrorKind::NotFound => false,
            Err(e) => return Err(self.export_err(e)),
        };
        let mut swap = Swap {
            target: target.to_path_buf(),
            backup: had_previous.then(|| backup.to_path_buf()),
            placed: false,
        };

        let result = fs::rename(staged_path, target);
        swap.placed = result.is_ok();
        swaps.push(swap);
        result.map_err(|e| self.export_err(e))
    }

    /// Undo `swaps` in reverse order, restoring every previous table
    fn roll_back(&self, swaps: &[Swap]) {
        for swap in swaps.iter().rev() {
            if swap.placed {
                if let Err(e) = fs::remove_file(&swap.target) {
                    warn!(path = %swap.target.display(), error = %e, "Failed to remove new table");
                }
            }
            if let Some(backup) = &swap.backup {
                if let Err(e) = fs::rename(backup, &swap.target) {
                    warn!(path = %swap.target.display(), error = %e, "Failed to restore previous table");
                }
            }
        }
        debug!(tables = swaps.len(), "Rolled back publish");
    }

    /// Publish a node table and an edge table under `names`
    pub fn publish_graph(&self, names: TableNames, nodes: Table, edges: Table) -> Result<Vec<PublishedTable>> {
        self.publish(vec![(names.nodes, nodes), (names.edges, edges)])
    }
}
