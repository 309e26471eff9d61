//! Commands module - all operations as library functions
//!
//! These are the operations the CLI exposes.

pub mod build;
pub mod classify;
pub mod status;

pub use build::{BuildReport, BuildRequest, BuildTarget, build};
pub use classify::{ClassificationReport, classify, classify_concept};
pub use status::{StatusReport, TableState, TableStatus, status};
