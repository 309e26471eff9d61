//! Tree-number ontology backend
//!
//! MeSH places every descriptor at one or more positions in a set of trees,
//! each position written as a dotted tree number (`Z01.058.290`). Subsumption
//! follows directly: a term is-a another when one of its tree numbers equals,
//! or extends at a `.` boundary, one of the other's. The parent of a position
//! is the position with its last segment removed.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::domain::Curie;
use crate::error::{Error, Result};

use super::{Ontology, Relation};

/// One ontology term as stored in the term file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OntologyTerm {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub tree_numbers: Vec<String>,
}

/// In-memory ontology for a single namespace, indexed by tree number
#[derive(Debug, Clone)]
pub struct TreeNumberOntology {
    namespace: String,
    disease_prefixes: Vec<String>,
    names: BTreeMap<String, String>,
    tree_numbers: HashMap<String, Vec<String>>,
    owners: HashMap<String, String>,
}

impl TreeNumberOntology {
    /// Build the index from a list of terms
    ///
    /// Fails when two terms claim the same tree number.
    pub fn from_terms(
        namespace: impl Into<String>,
        terms: Vec<OntologyTerm>,
        disease_prefixes: Vec<String>,
    ) -> Result<Self> {
        let mut names = BTreeMap::new();
        let mut tree_numbers = HashMap::with_capacity(terms.len());
        let mut owners = HashMap::new();

        for term in terms {
            for tree_number in &term.tree_numbers {
                if let Some(previous) = owners.insert(tree_number.clone(), term.id.clone()) {
                    if previous != term.id {
                        return Err(Error::InvalidInput(format!(
                            "tree number {} assigned to both {} and {}",
                            tree_number, previous, term.id
                        )));
                    }
                }
            }
            tree_numbers.insert(term.id.clone(), term.tree_numbers);
            names.insert(term.id, term.name);
        }

        Ok(Self {
            namespace: namespace.into(),
            disease_prefixes,
            names,
            tree_numbers,
            owners,
        })
    }

    /// Load a JSON term file
    ///
    /// Any failure to read or parse the file makes the ontology unavailable.
    pub fn load(
        path: &Path,
        namespace: impl Into<String>,
        disease_prefixes: Vec<String>,
    ) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| Error::OntologyUnavailable(format!("{}: {}", path.display(), e)))?;
        let terms: Vec<OntologyTerm> = serde_json::from_str(&contents)
            .map_err(|e| Error::OntologyUnavailable(format!("{}: {}", path.display(), e)))?;

        let ontology = Self::from_terms(namespace, terms, disease_prefixes)?;
        info!(
            path = %path.display(),
            namespace = %ontology.namespace,
            terms = ontology.len(),
            "Loaded ontology"
        );
        Ok(ontology)
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    fn trees_of(&self, namespace: &str, id: &str) -> Option<&[String]> {
        if namespace != self.namespace {
            return None;
        }
        self.tree_numbers.get(id).map(Vec::as_slice)
    }
}

/// Whether tree position `child` lies at or below `ancestor`
fn is_under(child: &str, ancestor: &str) -> bool {
    match child.strip_prefix(ancestor) {
        Some(rest) => rest.is_empty() || rest.starts_with('.'),
        None => false,
    }
}

impl Ontology for TreeNumberOntology {
    fn resolve_name(&self, namespace: &str, id: &str) -> Result<Option<String>> {
        if namespace != self.namespace {
            return Ok(None);
        }
        Ok(self.names.get(id).cloned())
    }

    fn is_descendant_of(&self, namespace: &str, id: &str, root_id: &str) -> Result<bool> {
        let (Some(trees), Some(root_trees)) =
            (self.trees_of(namespace, id), self.trees_of(namespace, root_id))
        else {
            return Ok(false);
        };

        Ok(trees
            .iter()
            .any(|tree| root_trees.iter().any(|root| is_under(tree, root))))
    }

    fn is_disease_concept(&self, namespace: &str, id: &str) -> Result<bool> {
        let Some(trees) = self.trees_of(namespace, id) else {
            return Ok(false);
        };

        Ok(trees.iter().any(|tree| {
            self.disease_prefixes
                .iter()
                .any(|prefix| tree.starts_with(prefix.as_str()))
        }))
    }

    fn list_all_identifiers(&self) -> Result<Vec<(String, String)>> {
        Ok(self
            .names
            .iter()
            .map(|(id, name)| (id.clone(), name.clone()))
            .collect())
    }

    fn direct_parents(
        &self,
        namespace: &str,
        id: &str,
        relation: Relation,
    ) -> Result<BTreeSet<Curie>> {
        let mut parents = BTreeSet::new();
        // Tree numbers only encode is-a
        if relation != Relation::Isa {
            return Ok(parents);
        }
        let Some(trees) = self.trees_of(namespace, id) else {
            return Ok(parents);
        };

        for tree in trees {
            let Some((parent_tree, _)) = tree.rsplit_once('.') else {
                continue;
            };
            match self.owners.get(parent_tree) {
                Some(owner) => {
                    parents.insert(Curie::new(&self.namespace, owner));
                }
                None => debug!(id, parent_tree, "Parent tree number has no term"),
            }
        }
        Ok(parents)
    }
}
