//! JSON run report
//!
//! Optional machine-readable summary of a run for downstream review:
//! input sizes, per-pass counters and totals.

use crate::matcher::{CascadeOutcome, PassSummary};
use crate::model::{ProfileSet, RosterSet};
use chrono::{DateTime, Utc};
use rlink_common::config::MatchingConfig;
use rlink_common::Result;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub generated_at: DateTime<Utc>,
    pub version: String,
    pub matching: MatchingConfig,
    pub roster_rows: usize,
    pub profile_rows: usize,
    pub matched: usize,
    pub residual: usize,
    pub unconsumed_profiles: usize,
    pub duplicates: usize,
    pub passes: Vec<PassSummary>,
}

impl RunReport {
    pub fn new(
        outcome: &CascadeOutcome,
        roster: &RosterSet,
        profiles: &ProfileSet,
        matching: &MatchingConfig,
    ) -> Self {
        Self {
            generated_at: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            matching: matching.clone(),
            roster_rows: roster.records.len(),
            profile_rows: profiles.records.len(),
            matched: outcome.matches.len(),
            residual: outcome.residual.len(),
            unconsumed_profiles: outcome.remaining_profiles.len(),
            duplicates: outcome.duplicate_count(),
            passes: outcome.passes.clone(),
        }
    }

    /// Pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
