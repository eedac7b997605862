//! Cascading matcher
//!
//! Reconciles roster rows with profile documents over a fixed schedule of
//! join keys, strictest first. Every pass:
//!
//! 1. Inner-joins the remaining roster and profile rows on the pass key
//! 2. Scores each candidate pair (name, institution, year gap, composite)
//! 3. Drops computed name scores under the threshold
//! 4. Resolves fan-out to one candidate per roster row
//! 5. Removes matched roster rows and consumed documents from later passes
//!
//! Passes work on index snapshots of the loaded sets and return new
//! snapshots; the loaded records are never mutated.

use crate::keys::{KeyPart, KeyTuple, MatchField, CASCADE};
use crate::model::{ProfileSet, RosterRowId, RosterSet};
use crate::similarity::similarity;
use rayon::prelude::*;
use rlink_common::config::{MatchingConfig, RosterColumns, ScorerKind};
use serde::Serialize;
use std::cmp::{Ordering, Reverse};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

/// Matching policy knobs
#[derive(Debug, Clone, PartialEq)]
pub struct MatchSettings {
    /// Computed name similarity below this is discarded
    pub name_threshold: u8,
    /// Composite score below this counts as low confidence in pass summaries
    pub low_score_threshold: f64,
    pub scorer: ScorerKind,
    /// Also resolve fan-in: at most one roster row per document per pass
    pub exclusive_documents: bool,
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self::from(&MatchingConfig::default())
    }
}

impl From<&MatchingConfig> for MatchSettings {
    fn from(config: &MatchingConfig) -> Self {
        Self {
            name_threshold: config.name_threshold,
            low_score_threshold: config.low_score_threshold,
            scorer: config.scorer,
            exclusive_documents: config.exclusive_documents,
        }
    }
}

/// One accepted roster/profile pairing
#[derive(Debug, Clone, PartialEq)]
pub struct MatchRecord {
    /// Position of the roster record in the loaded `RosterSet`
    pub roster_index: usize,
    /// Position of the profile record in the loaded `ProfileSet`
    pub profile_index: usize,
    pub roster_row_id: RosterRowId,
    pub doc_id: String,
    /// 0-based position of the pass in the schedule
    pub pass_index: usize,
    pub pass_key: String,
    pub name_similarity: u8,
    pub institution_similarity: u8,
    pub year_gap: u32,
    /// name_similarity × institution_similarity / 100
    pub score: f64,
    /// Roster row id appears more than once in the final table
    pub duplicate: bool,
}

impl MatchRecord {
    /// Preference order used to pick among candidates: higher name
    /// similarity, then smaller year gap, then higher institution similarity
    fn preference(&self) -> (u8, Reverse<u32>, u8) {
        (
            self.name_similarity,
            Reverse(self.year_gap),
            self.institution_similarity,
        )
    }
}

/// Composite of name and institution similarity, 0-100
pub fn composite_score(name_similarity: u8, institution_similarity: u8) -> f64 {
    f64::from(u32::from(name_similarity) * u32::from(institution_similarity)) / 100.0
}

/// Per-pass counters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PassSummary {
    pub pass_index: usize,
    pub key: String,
    /// Joined pairs before any filtering
    pub candidates: usize,
    /// Pairs dropped by the name threshold
    pub below_threshold: usize,
    pub matched: usize,
    /// Matches whose composite score is under the low-score threshold
    pub low_score: usize,
}

/// Result of one pass
#[derive(Debug, Clone)]
pub struct PassOutcome {
    pub matches: Vec<MatchRecord>,
    pub summary: PassSummary,
}

/// Result of the whole schedule
#[derive(Debug, Clone)]
pub struct CascadeOutcome {
    /// All passes' matches, in pass order
    pub matches: Vec<MatchRecord>,
    /// Roster indices never matched
    pub residual: Vec<usize>,
    /// Profile indices never consumed
    pub remaining_profiles: Vec<usize>,
    pub passes: Vec<PassSummary>,
}

impl CascadeOutcome {
    pub fn duplicate_count(&self) -> usize {
        self.matches.iter().filter(|m| m.duplicate).count()
    }
}

/// Run one pass over the given working snapshots
///
/// `working_roster` and `working_profiles` are indices into `roster.records`
/// and `profiles.records`, in table order.
#[allow(clippy::too_many_arguments)]
pub fn run_pass(
    pass_index: usize,
    key: KeyTuple,
    label: &str,
    roster: &RosterSet,
    profiles: &ProfileSet,
    working_roster: &[usize],
    working_profiles: &[usize],
    settings: &MatchSettings,
) -> PassOutcome {
    // Step 1: inner join on exact key equality
    let mut by_key: HashMap<Vec<KeyPart<'_>>, Vec<usize>> = HashMap::new();
    for &pi in working_profiles {
        by_key
            .entry(key.profile_key(&profiles.records[pi]))
            .or_default()
            .push(pi);
    }

    let candidates: Vec<(usize, usize)> = working_roster
        .iter()
        .flat_map(|&ri| {
            by_key
                .get(&key.roster_key(&roster.records[ri]))
                .into_iter()
                .flatten()
                .map(move |&pi| (ri, pi))
        })
        .collect();

    // Step 2: score every candidate (pure per pair)
    let name_keyed = key.contains(MatchField::FullName);
    let institution_keyed = key.contains(MatchField::Institution);
    let scored: Vec<Option<MatchRecord>> = candidates
        .par_iter()
        .map(|&(ri, pi)| {
            let r = &roster.records[ri];
            let p = &profiles.records[pi];

            let name_similarity = if name_keyed {
                100
            } else {
                let s = similarity(settings.scorer, &r.name, &p.name);
                if s < settings.name_threshold {
                    return None;
                }
                s
            };
            let institution_similarity = if institution_keyed {
                100
            } else {
                similarity(settings.scorer, &r.institution, &p.institution)
            };

            Some(MatchRecord {
                roster_index: ri,
                profile_index: pi,
                roster_row_id: r.row_id,
                doc_id: p.doc_id.clone(),
                pass_index,
                pass_key: label.to_string(),
                name_similarity,
                institution_similarity,
                year_gap: r.year.gap(p.year),
                score: composite_score(name_similarity, institution_similarity),
                duplicate: false,
            })
        })
        .collect();

    let total = scored.len();
    let accepted: Vec<MatchRecord> = scored.into_iter().flatten().collect();
    let below_threshold = total - accepted.len();

    // Step 3: one candidate per roster row
    let mut matches = if pass_index == 0 {
        keep_last_per_row(accepted)
    } else {
        keep_best_per_row(accepted)
    };
    if settings.exclusive_documents {
        matches = keep_best_per_document(matches);
    }

    let low_score = matches
        .iter()
        .filter(|m| m.score < settings.low_score_threshold)
        .count();

    let summary = PassSummary {
        pass_index,
        key: label.to_string(),
        candidates: total,
        below_threshold,
        matched: matches.len(),
        low_score,
    };

    PassOutcome { matches, summary }
}

/// Keep the last candidate of each roster row in table order
fn keep_last_per_row(candidates: Vec<MatchRecord>) -> Vec<MatchRecord> {
    let mut last: HashMap<RosterRowId, usize> = HashMap::with_capacity(candidates.len());
    for (pos, m) in candidates.iter().enumerate() {
        last.insert(m.roster_row_id, pos);
    }
    candidates
        .into_iter()
        .enumerate()
        .filter(|(pos, m)| last[&m.roster_row_id] == *pos)
        .map(|(_, m)| m)
        .collect()
}

/// Sort by (row id ↑, name ↑, gap ↓, institution ↑) and keep the last of
/// each row id group
fn keep_best_per_row(mut candidates: Vec<MatchRecord>) -> Vec<MatchRecord> {
    candidates.sort_by(|a, b| {
        a.roster_row_id
            .cmp(&b.roster_row_id)
            .then_with(|| a.preference().cmp(&b.preference()))
    });
    let mut kept: Vec<MatchRecord> = Vec::with_capacity(candidates.len());
    for m in candidates {
        match kept.last_mut() {
            Some(prev) if prev.roster_row_id == m.roster_row_id => *prev = m,
            _ => kept.push(m),
        }
    }
    kept
}

/// Keep the preferred roster row for each document; ties go to the lower
/// roster row id
fn keep_best_per_document(matches: Vec<MatchRecord>) -> Vec<MatchRecord> {
    let mut best: HashMap<&str, usize> = HashMap::with_capacity(matches.len());
    for (pos, m) in matches.iter().enumerate() {
        best.entry(m.doc_id.as_str())
            .and_modify(|b| {
                let current = &matches[*b];
                let better = match m.preference().cmp(&current.preference()) {
                    Ordering::Greater => true,
                    Ordering::Equal => m.roster_row_id < current.roster_row_id,
                    Ordering::Less => false,
                };
                if better {
                    *b = pos;
                }
            })
            .or_insert(pos);
    }
    let keep: HashSet<usize> = best.into_values().collect();
    matches
        .into_iter()
        .enumerate()
        .filter(|(pos, _)| keep.contains(pos))
        .map(|(_, m)| m)
        .collect()
}

/// The cascading matcher: schedule, labels and policy
#[derive(Debug, Clone)]
pub struct Matcher {
    cascade: Vec<KeyTuple>,
    labels: Vec<String>,
    settings: MatchSettings,
}

impl Matcher {
    /// Matcher over the standard eight-pass schedule
    pub fn new(columns: &RosterColumns, settings: MatchSettings) -> Self {
        Self::with_cascade(&CASCADE, columns, settings)
    }

    /// Matcher over a custom schedule
    pub fn with_cascade(cascade: &[KeyTuple], columns: &RosterColumns, settings: MatchSettings) -> Self {
        Self {
            cascade: cascade.to_vec(),
            labels: cascade.iter().map(|k| k.label(columns)).collect(),
            settings,
        }
    }

    /// Apply every pass in order and flag duplicated roster rows
    pub fn run(&self, roster: &RosterSet, profiles: &ProfileSet) -> CascadeOutcome {
        let mut working_roster: Vec<usize> = (0..roster.records.len()).collect();
        let mut working_profiles: Vec<usize> = (0..profiles.records.len()).collect();
        let mut matched_rows: HashSet<RosterRowId> = HashSet::new();
        let mut consumed_docs: HashSet<String> = HashSet::new();
        let mut matches: Vec<MatchRecord> = Vec::new();
        let mut passes = Vec::with_capacity(self.cascade.len());

        for (pass_index, (key, label)) in self.cascade.iter().zip(&self.labels).enumerate() {
            let outcome = run_pass(
                pass_index,
                *key,
                label,
                roster,
                profiles,
                &working_roster,
                &working_profiles,
                &self.settings,
            );

            for m in &outcome.matches {
                matched_rows.insert(m.roster_row_id);
                consumed_docs.insert(m.doc_id.clone());
            }
            matches.extend(outcome.matches);

            working_roster.retain(|&ri| !matched_rows.contains(&roster.records[ri].row_id));
            working_profiles.retain(|&pi| !consumed_docs.contains(&profiles.records[pi].doc_id));

            let s = &outcome.summary;
            info!(
                pass = pass_index,
                matched = s.matched,
                low_score = s.low_score,
                key = %label,
                "Match pass complete"
            );
            debug!(
                pass = pass_index,
                candidates = s.candidates,
                below_threshold = s.below_threshold,
                roster_remaining = working_roster.len(),
                profiles_remaining = working_profiles.len(),
                "Match pass detail"
            );
            passes.push(outcome.summary);
        }

        let mut occurrences: HashMap<RosterRowId, usize> = HashMap::new();
        for m in &matches {
            *occurrences.entry(m.roster_row_id).or_default() += 1;
        }
        for m in &mut matches {
            m.duplicate = occurrences[&m.roster_row_id] > 1;
        }

        info!(
            matched = matches.len(),
            residual = working_roster.len(),
            duplicates = matches.iter().filter(|m| m.duplicate).count(),
            "Cascade complete"
        );

        CascadeOutcome {
            matches,
            residual: working_roster,
            remaining_profiles: working_profiles,
            passes,
        }
    }
}
