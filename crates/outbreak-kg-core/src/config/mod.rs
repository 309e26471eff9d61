//! Configuration management with file persistence

use anyhow::{Context, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::assemble::CountPolicy;
use crate::classify::{
    ClassifierRoots, DEFAULT_STOPLIST, MESH_BACTERIA, MESH_GEOGRAPHIC_LOCATIONS, MESH_VIRUSES,
    Stoplist,
};

/// Environment variable overriding the config directory
pub const CONFIG_DIR_ENV: &str = "OUTBREAK_KG_CONFIG_DIR";

/// outbreak-kg configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub ontology: OntologyConfig,
    pub classifier: ClassifierConfig,
    pub stoplist: StoplistConfig,
    pub cooccurrence: CooccurrenceConfig,
    pub mentions: MentionsConfig,
    pub export: ExportConfig,
    pub build: BuildConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OntologyConfig {
    /// Curie namespace of the ontology's terms
    pub namespace: String,
    /// Term file used when `--ontology` is not given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Tree-number prefixes whose terms are diseases
    pub disease_tree_prefixes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub geolocation_roots: Vec<String>,
    pub pathogen_roots: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoplistConfig {
    pub terms: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CooccurrenceConfig {
    pub count_policy: CountPolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MentionsConfig {
    pub document_prefix: String,
    pub emit_concept_nodes: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub output_dir: PathBuf,
    pub delimiter: String,
    pub sort_rows: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Worker threads for per-document assembly; rayon's default when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threads: Option<usize>,
}

impl Default for OntologyConfig {
    fn default() -> Self {
        Self {
            namespace: "MESH".to_string(),
            path: None,
            disease_tree_prefixes: vec!["C".to_string()],
        }
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            geolocation_roots: vec![MESH_GEOGRAPHIC_LOCATIONS.to_string()],
            pathogen_roots: vec![MESH_BACTERIA.to_string(), MESH_VIRUSES.to_string()],
        }
    }
}

impl Default for StoplistConfig {
    fn default() -> Self {
        Self {
            terms: DEFAULT_STOPLIST.iter().map(|t| t.to_string()).collect(),
        }
    }
}

impl Default for MentionsConfig {
    fn default() -> Self {
        Self {
            document_prefix: "promed".to_string(),
            emit_concept_nodes: true,
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("kg"),
            delimiter: "\t".to_string(),
            sort_rows: true,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ontology: OntologyConfig::default(),
            classifier: ClassifierConfig::default(),
            stoplist: StoplistConfig::default(),
            cooccurrence: CooccurrenceConfig::default(),
            mentions: MentionsConfig::default(),
            export: ExportConfig::default(),
            build: BuildConfig::default(),
        }
    }
}

const KEYS: &[&str] = &[
    "ontology.namespace",
    "ontology.path",
    "ontology.disease_tree_prefixes",
    "classifier.geolocation_roots",
    "classifier.pathogen_roots",
    "stoplist.terms",
    "cooccurrence.count_policy",
    "mentions.document_prefix",
    "mentions.emit_concept_nodes",
    "export.output_dir",
    "export.delimiter",
    "export.sort_rows",
    "build.threads",
];

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_bool(key: &str, value: &str) -> anyhow::Result<bool> {
    value
        .parse()
        .with_context(|| format!("Invalid {} value: {} (expected true or false)", key, value))
}

/// Render a delimiter so tabs stay visible in `config list`
fn display_delimiter(delimiter: &str) -> String {
    match delimiter {
        "\t" => "\\t".to_string(),
        other => other.to_string(),
    }
}

fn unknown_key(key: &str) -> anyhow::Error {
    anyhow!(
        "Unknown configuration key: {}. Use `outbreak-kg config list` to see available keys.",
        key
    )
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> anyhow::Result<PathBuf> {
        let dir = if let Ok(custom_dir) = env::var(CONFIG_DIR_ENV) {
            PathBuf::from(custom_dir)
        } else {
            dirs::config_dir()
                .ok_or_else(|| anyhow!("Could not determine config directory"))?
                .join("outbreak-kg")
        };
        Ok(dir)
    }

    /// Get the config file path
    pub fn config_path() -> anyhow::Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from the default location, or defaults if absent
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from `path`, or defaults if the file doesn't exist
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            let config: Config = toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Save configuration to the default location
    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to `path`
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        self.validate()?;

        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create config directory: {}", dir.display()))?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.ontology.namespace.trim().is_empty() {
            return Err(anyhow!("ontology.namespace must not be empty"));
        }
        if self.classifier.geolocation_roots.is_empty() && self.classifier.pathogen_roots.is_empty()
        {
            return Err(anyhow!(
                "At least one of classifier.geolocation_roots or classifier.pathogen_roots must be set"
            ));
        }
        if self.mentions.document_prefix.is_empty() || self.mentions.document_prefix.contains(':') {
            return Err(anyhow!(
                "mentions.document_prefix must be non-empty and must not contain ':'"
            ));
        }
        self.delimiter()?;
        if self.build.threads == Some(0) {
            return Err(anyhow!("build.threads must be at least 1"));
        }
        Ok(())
    }

    /// The export delimiter as a single character
    pub fn delimiter(&self) -> anyhow::Result<char> {
        let mut chars = self.export.delimiter.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if c != '"' && c != '\n' && c != '\r' => Ok(c),
            _ => Err(anyhow!(
                "export.delimiter must be a single character other than a quote or line break, got {:?}",
                self.export.delimiter
            )),
        }
    }

    /// Classifier roots in the configured ontology namespace
    pub fn classifier_roots(&self) -> ClassifierRoots {
        ClassifierRoots {
            namespace: self.ontology.namespace.clone(),
            geolocation: self.classifier.geolocation_roots.clone(),
            pathogen: self.classifier.pathogen_roots.clone(),
        }
    }

    pub fn stoplist(&self) -> Stoplist {
        Stoplist::new(self.stoplist.terms.iter().cloned())
    }

    /// Get a configuration value by key
    pub fn get(&self, key: &str) -> anyhow::Result<String> {
        match key {
            "ontology.namespace" => Ok(self.ontology.namespace.clone()),
            "ontology.path" => Ok(self
                .ontology
                .path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(not set - pass --ontology)".to_string())),
            "ontology.disease_tree_prefixes" => Ok(self.ontology.disease_tree_prefixes.join(", ")),

            "classifier.geolocation_roots" => Ok(self.classifier.geolocation_roots.join(", ")),
            "classifier.pathogen_roots" => Ok(self.classifier.pathogen_roots.join(", ")),

            "stoplist.terms" => Ok(self.stoplist.terms.join(", ")),

            "cooccurrence.count_policy" => Ok(self.cooccurrence.count_policy.as_str().to_string()),

            "mentions.document_prefix" => Ok(self.mentions.document_prefix.clone()),
            "mentions.emit_concept_nodes" => Ok(self.mentions.emit_concept_nodes.to_string()),

            "export.output_dir" => Ok(self.export.output_dir.display().to_string()),
            "export.delimiter" => Ok(display_delimiter(&self.export.delimiter)),
            "export.sort_rows" => Ok(self.export.sort_rows.to_string()),

            "build.threads" => Ok(self
                .build
                .threads
                .map(|t| t.to_string())
                .unwrap_or_else(|| "(auto)".to_string())),

            _ => Err(unknown_key(key)),
        }
    }

    /// Set a configuration value by key
    ///
    /// List values are comma separated. The result is validated before it
    /// is applied, so a rejected value leaves the configuration unchanged.
    pub fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        let mut updated = self.clone();
        match key {
            "ontology.namespace" => {
                updated.ontology.namespace = value.trim().to_string();
            }
            "ontology.path" => {
                updated.ontology.path = if value.is_empty() {
                    None
                } else {
                    Some(PathBuf::from(value))
                };
            }
            "ontology.disease_tree_prefixes" => {
                updated.ontology.disease_tree_prefixes = parse_list(value);
            }

            "classifier.geolocation_roots" => {
                updated.classifier.geolocation_roots = parse_list(value);
            }
            "classifier.pathogen_roots" => {
                updated.classifier.pathogen_roots = parse_list(value);
            }

            "stoplist.terms" => {
                updated.stoplist.terms = parse_list(value);
            }

            "cooccurrence.count_policy" => {
                updated.cooccurrence.count_policy = CountPolicy::parse(value).ok_or_else(|| {
                    anyhow!(
                        "Invalid count policy: {}. Valid options: per_orientation, single",
                        value
                    )
                })?;
            }

            "mentions.document_prefix" => {
                updated.mentions.document_prefix = value.to_string();
            }
            "mentions.emit_concept_nodes" => {
                updated.mentions.emit_concept_nodes = parse_bool(key, value)?;
            }

            "export.output_dir" => {
                if value.is_empty() {
                    return Err(anyhow!("export.output_dir must not be empty"));
                }
                updated.export.output_dir = PathBuf::from(value);
            }
            "export.delimiter" => {
                updated.export.delimiter = match value {
                    "\\t" | "tab" => "\t".to_string(),
                    other => other.to_string(),
                };
            }
            "export.sort_rows" => {
                updated.export.sort_rows = parse_bool(key, value)?;
            }

            "build.threads" => {
                updated.build.threads = match value {
                    "" | "auto" => None,
                    n => Some(
                        n.parse()
                            .with_context(|| format!("Invalid threads value: {}", value))?,
                    ),
                };
            }

            _ => return Err(unknown_key(key)),
        }

        updated.validate()?;
        *self = updated;
        Ok(())
    }

    /// List all configuration keys and their values
    pub fn list(&self) -> anyhow::Result<Vec<(String, String)>> {
        KEYS.iter()
            .map(|key| {
                let value = self.get(key)?;
                Ok((key.to_string(), value))
            })
            .collect()
    }

    /// Reset configuration to defaults
    pub fn reset() -> anyhow::Result<()> {
        Self::reset_at(&Self::config_path()?)
    }

    /// Remove the config file at `path`, if any
    pub fn reset_at(path: &Path) -> anyhow::Result<()> {
        if path.exists() {
            fs::remove_file(path)
                .with_context(|| format!("Failed to remove config file: {}", path.display()))?;
        }
        Ok(())
    }
}
