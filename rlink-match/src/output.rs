//! Output tables
//!
//! The match table carries the full roster row and the full profile row of
//! every accepted pair, followed by the pass and score columns. The residual
//! table is the roster (same schema) restricted to rows no pass matched.

use crate::matcher::CascadeOutcome;
use crate::model::{ProfileSet, RosterSet};
use rlink_common::table::unique_name;
use rlink_common::{Result, Table};

/// Trailing columns of the match table, in order
pub const MATCH_COLUMNS: [&str; 7] = [
    "index_match",
    "key_match",
    "match_name",
    "match_institution",
    "match_year",
    "match",
    "duplicate",
];

/// Suffix given to a profile column whose name is already taken in the
/// match table
pub const PROFILE_SUFFIX: &str = "_profile";
/// Suffix given to a roster column named like one of [`MATCH_COLUMNS`]
pub const ROSTER_SUFFIX: &str = "_roster";

fn match_headers(roster: &RosterSet, profiles: &ProfileSet) -> Vec<String> {
    // The trailing columns keep their names; input columns give way
    let mut taken: Vec<String> = MATCH_COLUMNS.iter().map(|c| c.to_string()).collect();
    let mut headers = Vec::with_capacity(roster.headers.len() + profiles.headers.len() + taken.len());
    let sides = [(&roster.headers, ROSTER_SUFFIX), (&profiles.headers, PROFILE_SUFFIX)];
    for (side, suffix) in sides {
        for h in side {
            let name = unique_name(&taken, h, suffix);
            taken.push(name.clone());
            headers.push(name);
        }
    }
    headers.extend(MATCH_COLUMNS.iter().map(|c| c.to_string()));
    headers
}

/// Build the annotated match table
pub fn match_table(
    outcome: &CascadeOutcome,
    roster: &RosterSet,
    profiles: &ProfileSet,
) -> Result<Table> {
    let mut table = Table::new("matches", match_headers(roster, profiles));
    for m in &outcome.matches {
        let mut row = roster.records[m.roster_index].values.clone();
        row.extend(profiles.records[m.profile_index].values.iter().cloned());
        row.push(m.pass_index.to_string());
        row.push(m.pass_key.clone());
        row.push(m.name_similarity.to_string());
        row.push(m.institution_similarity.to_string());
        row.push(m.year_gap.to_string());
        row.push(m.score.to_string());
        row.push(m.duplicate.to_string());
        table.push_row(row)?;
    }
    Ok(table)
}

/// Build the residual roster table
pub fn residual_table(outcome: &CascadeOutcome, roster: &RosterSet) -> Result<Table> {
    let mut table = Table::new("residual", roster.headers.iter().cloned());
    for &ri in &outcome.residual {
        table.push_row(roster.records[ri].values.clone())?;
    }
    Ok(table)
}
