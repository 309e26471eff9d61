//! Graph assemblers
//!
//! Three independent assemblers share the concept classifier:
//!
//! ```text
//! documents ──► CooccurrenceAssembler ──► concept nodes + occurs_with edges
//! documents ──► MentionsAssembler     ──► alert nodes   + mentions edges
//! ontology  ──► HierarchyAssembler    ──► concept nodes + isa edges
//! ```

mod cooccurrence;
mod hierarchy;
mod mentions;

pub use cooccurrence::{
    CandidatePair, CooccurrenceAssembler, CooccurrenceGraph, CooccurrenceStats, CountPolicy,
    DocumentOccurrences, InterestingOccurrence, candidate_pairs, is_interesting,
};
pub use hierarchy::{HierarchyAssembler, HierarchyGraph, HierarchyStats};
pub use mentions::{MentionsAssembler, MentionsGraph, MentionsStats};
