//! Output directory status
//!
//! Compares the manifest with the tables on disk.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};
use crate::export::ExportManifest;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TableState {
    /// File matches the recorded digest
    Current,
    /// File changed since it was published
    Modified,
    Missing,
}

impl TableState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Current => "current",
            Self::Modified => "modified",
            Self::Missing => "missing",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TableStatus {
    pub file_name: String,
    pub rows: usize,
    pub sha256: String,
    pub exported_at: DateTime<Utc>,
    pub state: TableState,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub output_dir: PathBuf,
    pub exported_at: DateTime<Utc>,
    pub total_rows: usize,
    pub tables: Vec<TableStatus>,
}

impl StatusReport {
    /// Whether every recorded table is present and unchanged
    pub fn is_clean(&self) -> bool {
        self.tables.iter().all(|t| t.state == TableState::Current)
    }
}

fn table_state(path: &Path, expected: &str) -> Result<TableState> {
    if !path.exists() {
        return Ok(TableState::Missing);
    }
    let digest = hex::encode(Sha256::digest(fs::read(path)?));
    Ok(if digest == expected {
        TableState::Current
    } else {
        TableState::Modified
    })
}

/// Report the published tables of `output_dir`
pub fn status(output_dir: &Path) -> Result<StatusReport> {
    let manifest = ExportManifest::load(output_dir)?
        .ok_or_else(|| Error::ManifestNotFound(output_dir.to_path_buf()))?;

    let tables = manifest
        .tables
        .iter()
        .map(|(file_name, summary)| {
            Ok(TableStatus {
                file_name: file_name.clone(),
                rows: summary.rows,
                sha256: summary.sha256.clone(),
                exported_at: summary.exported_at,
                state: table_state(&output_dir.join(file_name), &summary.sha256)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(StatusReport {
        output_dir: output_dir.to_path_buf(),
        exported_at: manifest.exported_at,
        total_rows: manifest.total_rows,
        tables,
    })
}
