//! rlink-match library interface
//!
//! Multi-pass record linkage between a funding roster and a corpus of
//! researcher profiles. Exposes the loaders, the cascade schedule, the
//! similarity scorers and the matcher for the binary and for testing.

pub mod keys;
pub mod loader;
pub mod matcher;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod report;
pub mod similarity;

pub use crate::matcher::{CascadeOutcome, MatchRecord, MatchSettings, Matcher};
pub use crate::pipeline::{reconcile, reconcile_files, write_outputs, Reconciliation};
