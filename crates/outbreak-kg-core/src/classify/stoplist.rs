//! Generic display names excluded from document-derived graphs

use std::collections::HashSet;

/// Terms too common in alerts to carry signal
pub const DEFAULT_STOPLIST: &[&str] = &[
    "Disease",
    "Health",
    "Affected",
    "control",
    "Animals",
    "infection",
    "Viruses",
    "vaccination",
    "Vaccines",
    "Therapeutics",
    "Nature",
    "event",
    "Population",
    "Epidemiology",
    "Names",
    "submitted",
    "Laboratories",
    "Disease Outbreaks",
    "Central",
    "strain",
];

/// Exact, case-sensitive match on display names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stoplist {
    terms: HashSet<String>,
}

impl Stoplist {
    pub fn new<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            terms: terms.into_iter().map(Into::into).collect(),
        }
    }

    /// A stoplist that excludes nothing
    pub fn empty() -> Self {
        Self {
            terms: HashSet::new(),
        }
    }

    pub fn is_excluded(&self, name: &str) -> bool {
        self.terms.contains(name)
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

impl Default for Stoplist {
    fn default() -> Self {
        Self::new(DEFAULT_STOPLIST.iter().copied())
    }
}
