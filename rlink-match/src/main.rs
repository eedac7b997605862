//! rlink-match - roster/profile reconciliation
//!
//! Reads a funding roster and a flattened profile corpus (delimited text),
//! links them with the eight-pass cascade and writes:
//! - the annotated match table
//! - the residual roster (rows with no profile counterpart)
//! - optionally, a JSON run report
//!
//! Either both tables are written or, on a precondition failure, none.

use anyhow::{Context, Result};
use clap::Parser;
use rlink_common::config::{ConfigSource, TomlConfig};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Command-line arguments for rlink-match
#[derive(Parser, Debug)]
#[command(name = "rlink-match")]
#[command(about = "Link a funding roster with researcher profile documents")]
#[command(version)]
struct Args {
    /// Roster export (delimited text with a header row)
    #[arg(env = "RLINK_ROSTER")]
    roster: PathBuf,

    /// Flattened profile corpus (delimited text with a header row)
    #[arg(env = "RLINK_PROFILES")]
    profiles: PathBuf,

    /// Configuration file (falls back to RLINK_CONFIG, then the user config dir)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Where to write the match table
    #[arg(long, env = "RLINK_MATCHES_OUT")]
    matches_out: Option<PathBuf>,

    /// Where to write the residual roster
    #[arg(long, env = "RLINK_RESIDUAL_OUT")]
    residual_out: Option<PathBuf>,

    /// Also write a JSON run report here
    #[arg(long)]
    report: Option<PathBuf>,

    /// Field delimiter for inputs and outputs (single character, or "tab")
    #[arg(short, long)]
    delimiter: Option<String>,

    /// Log level when RUST_LOG is not set (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

impl Args {
    /// CLI values win over the configuration file
    fn apply_overrides(&self, config: &mut TomlConfig) {
        if let Some(path) = &self.matches_out {
            config.output.matches = path.clone();
        }
        if let Some(path) = &self.residual_out {
            config.output.residual = path.clone();
        }
        if let Some(path) = &self.report {
            config.output.report = Some(path.clone());
        }
        if let Some(delimiter) = &self.delimiter {
            config.output.delimiter = delimiter.clone();
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Configuration is read before tracing so its log level can apply
    let resolved = TomlConfig::resolve(args.config.as_deref());

    let level = args
        .log_level
        .clone()
        .or_else(|| {
            resolved
                .as_ref()
                .ok()
                .map(|(config, _)| config.logging.level.clone())
        })
        .unwrap_or_else(|| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .init();

    info!("Starting rlink-match v{}", env!("CARGO_PKG_VERSION"));

    let (mut config, source) = resolved.context("Failed to load configuration")?;
    match &source {
        ConfigSource::File(path) => info!("Configuration: {}", path.display()),
        ConfigSource::Defaults => warn!("No configuration file found, using built-in defaults"),
    }
    args.apply_overrides(&mut config);
    config.validate().context("Invalid configuration")?;

    info!("Roster: {}", args.roster.display());
    info!("Profiles: {}", args.profiles.display());

    let run = rlink_match::reconcile_files(&args.roster, &args.profiles, &config)
        .context("Reconciliation failed")?;

    rlink_match::write_outputs(&run, &config).context("Failed to write outputs")?;

    info!(
        matched = run.outcome.matches.len(),
        residual = run.outcome.residual.len(),
        duplicates = run.outcome.duplicate_count(),
        "Done"
    );

    Ok(())
}
