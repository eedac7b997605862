//! End-to-end reconciliation
//!
//! Load both tables, run the cascade, and render the output tables. All
//! outputs are built in memory before anything is written, so a run that
//! fails a precondition emits nothing.

use crate::loader::{load_profiles, load_roster};
use crate::matcher::{CascadeOutcome, MatchSettings, Matcher};
use crate::model::{ProfileSet, RosterSet};
use crate::output::{match_table, residual_table};
use crate::report::RunReport;
use rlink_common::config::TomlConfig;
use rlink_common::staging::StagedFiles;
use rlink_common::{Result, Table};
use std::path::Path;
use tracing::info;

/// Everything a run produces
#[derive(Debug, Clone)]
pub struct Reconciliation {
    pub roster: RosterSet,
    pub profiles: ProfileSet,
    pub outcome: CascadeOutcome,
    pub matches: Table,
    pub residual: Table,
}

impl Reconciliation {
    pub fn report(&self, config: &TomlConfig) -> RunReport {
        RunReport::new(&self.outcome, &self.roster, &self.profiles, &config.matching)
    }
}

/// Reconcile in-memory roster and profile tables
pub fn reconcile(roster: Table, profiles: Table, config: &TomlConfig) -> Result<Reconciliation> {
    config.validate()?;
    let roster = load_roster(roster, &config.roster)?;
    let profiles = load_profiles(profiles, &config.profile)?;

    let matcher = Matcher::new(&config.roster, MatchSettings::from(&config.matching));
    let outcome = matcher.run(&roster, &profiles);

    let matches = match_table(&outcome, &roster, &profiles)?;
    let residual = residual_table(&outcome, &roster)?;

    Ok(Reconciliation {
        roster,
        profiles,
        outcome,
        matches,
        residual,
    })
}

/// Read both inputs from disk and reconcile them
pub fn reconcile_files(roster: &Path, profiles: &Path, config: &TomlConfig) -> Result<Reconciliation> {
    let delimiter = config.output.delimiter_byte()?;
    let roster = Table::read_delimited("roster", roster, delimiter)?;
    let profiles = Table::read_delimited("profile", profiles, delimiter)?;
    reconcile(roster, profiles, config)
}

/// Write the match table, the residual table and the optional report
///
/// Every output is staged beside its target first and renamed into place
/// only once all of them were written; on any failure none appears.
pub fn write_outputs(run: &Reconciliation, config: &TomlConfig) -> Result<()> {
    let delimiter = config.output.delimiter_byte()?;
    let mut staged = StagedFiles::new();
    staged.stage_table(&run.matches, &config.output.matches, delimiter)?;
    staged.stage_table(&run.residual, &config.output.residual, delimiter)?;
    if let Some(path) = &config.output.report {
        staged.stage_bytes(path, run.report(config).to_json()?.as_bytes())?;
    }
    staged.commit()?;

    info!(
        matches = %config.output.matches.display(),
        residual = %config.output.residual.display(),
        "Output tables written"
    );
    if let Some(path) = &config.output.report {
        info!("Run report written to {}", path.display());
    }
    Ok(())
}
