//! Error types for outbreak-kg

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using outbreak-kg's Error
pub type Result<T> = std::result::Result<T, Error>;

/// outbreak-kg error types with helpful messages and suggestions
#[derive(Error, Debug)]
pub enum Error {
    // Input errors (E100-E199)
    #[error("Malformed document '{0}': {1}")]
    MalformedDocument(String, String),

    #[error("Mentions file '{}' could not be read: {}", .0.display(), .1)]
    MentionsUnreadable(PathBuf, String),

    // Ontology errors (E200-E299)
    #[error("Ontology service unavailable: {0}. Check the `ontology.path` setting.")]
    OntologyUnavailable(String),

    // Export errors (E300-E399)
    #[error("Export to '{}' failed: {}", .0.display(), .1)]
    ExportFailed(PathBuf, String),

    #[error("No manifest found in '{}'. Run `outbreak-kg build` first.", .0.display())]
    ManifestNotFound(PathBuf),

    // Config errors (E600-E699)
    #[error("Configuration error: {0}")]
    ConfigError(String),

    // Input errors (E800-E899)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // Generic errors
    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Get error code for this error type
    pub fn code(&self) -> &'static str {
        match self {
            Self::MalformedDocument(..) => "E100",
            Self::MentionsUnreadable(..) => "E101",
            Self::OntologyUnavailable(_) => "E200",
            Self::ExportFailed(..) => "E300",
            Self::ManifestNotFound(_) => "E301",
            Self::ConfigError(_) => "E600",
            Self::InvalidInput(_) => "E800",
            Self::Json(_) => "E801",
            Self::Other(_) | Self::Io(_) => "E9999",
        }
    }

    /// Get suggestion for how to fix this error
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::OntologyUnavailable(_) => Some("outbreak-kg config get ontology.path".to_string()),
            Self::ExportFailed(path, _) => Some(format!(
                "Check that '{}' exists and is writable",
                path.display()
            )),
            Self::ManifestNotFound(path) => {
                Some(format!("outbreak-kg build all --output {}", path.display()))
            }
            Self::ConfigError(_) => Some("outbreak-kg config list".to_string()),
            _ => None,
        }
    }

    /// Whether the error aborts a build run
    ///
    /// Malformed documents are skipped by the loader; everything else stops the run.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::MalformedDocument(..))
    }
}
