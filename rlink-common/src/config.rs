//! Configuration loading
//!
//! Configuration file resolution priority:
//! 1. Command-line argument (highest priority)
//! 2. `RLINK_CONFIG` environment variable
//! 3. `<config_dir>/rlink/config.toml`
//! 4. Compiled defaults (fallback)
//!
//! A missing configuration file is not an error: compiled defaults are used
//! and the caller is told so through [`ConfigSource::Defaults`]. A file
//! that exists but cannot be read or parsed aborts the run.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit configuration file
pub const CONFIG_ENV_VAR: &str = "RLINK_CONFIG";

/// Where a resolved configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    /// No file found; compiled defaults
    Defaults,
}

/// Top-level TOML configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub roster: RosterColumns,
    pub profile: ProfileColumns,
    pub matching: MatchingConfig,
    pub output: OutputConfig,
    pub logging: LoggingConfig,
}

/// Column names of the funding roster export
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RosterColumns {
    pub name: String,
    pub institution: String,
    pub year: String,
    pub person_id: String,
}

impl Default for RosterColumns {
    fn default() -> Self {
        Self {
            name: "NM_DOCENTE".to_string(),
            institution: "NM_IES_TITULACAO".to_string(),
            year: "AN_TITULACAO".to_string(),
            person_id: "ID_PESSOA".to_string(),
        }
    }
}

/// Column names of the flattened profile corpus
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileColumns {
    pub doc_id: String,
    pub name: String,
    pub institution: String,
    pub year: String,
}

impl Default for ProfileColumns {
    fn default() -> Self {
        Self {
            doc_id: "FILE-NAME".to_string(),
            name: "NOME-COMPLETO".to_string(),
            institution: "NOME-INSTITUICAO".to_string(),
            year: "ANO-DE-OBTENCAO-DO-TITULO".to_string(),
        }
    }
}

/// Similarity function used for computed name/institution scores
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScorerKind {
    /// Sorted-token indel ratio
    #[default]
    TokenSort,
    /// Sorted tokens, normalized Levenshtein
    TokenSortLevenshtein,
    /// Sorted tokens, Jaro-Winkler
    TokenSortJaroWinkler,
}

/// Matching policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Computed name similarity below this is discarded (0-100)
    pub name_threshold: u8,
    /// Composite score below this is counted as a low-confidence match
    pub low_score_threshold: f64,
    pub scorer: ScorerKind,
    /// Keep at most one roster row per profile document within a pass
    pub exclusive_documents: bool,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            name_threshold: 75,
            low_score_threshold: 50.0,
            scorer: ScorerKind::TokenSort,
            exclusive_documents: false,
        }
    }
}

/// Output locations and format
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub matches: PathBuf,
    pub residual: PathBuf,
    /// Optional JSON run report
    pub report: Option<PathBuf>,
    /// Single ASCII character separating fields (input and output)
    pub delimiter: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            matches: PathBuf::from("match_roster_x_profiles.csv"),
            residual: PathBuf::from("roster_not_found_in_profiles.csv"),
            report: None,
            delimiter: ",".to_string(),
        }
    }
}

impl OutputConfig {
    pub fn delimiter_byte(&self) -> Result<u8> {
        parse_delimiter(&self.delimiter)
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Parse a delimiter given as text; it must be exactly one ASCII character
///
/// `\t` and `tab` are accepted for tab-separated files.
pub fn parse_delimiter(text: &str) -> Result<u8> {
    match text {
        "\\t" | "tab" => return Ok(b'\t'),
        _ => {}
    }
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii() => Ok(c as u8),
        _ => Err(Error::Config(format!(
            "Delimiter must be a single ASCII character, got {:?}",
            text
        ))),
    }
}

impl TomlConfig {
    /// Parse configuration text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: TomlConfig = toml::from_str(text)
            .map_err(|e| Error::Config(format!("Failed to parse TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from an explicit file
    pub fn load_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&text)
    }

    /// Path of the configuration file to use, following the priority order
    /// above; `None` means compiled defaults
    ///
    /// An explicitly named file (CLI or environment) is returned even if it
    /// does not exist so that loading it fails loudly; the per-user default
    /// location is only returned when present.
    pub fn locate(cli_path: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = cli_path {
            return Some(path.to_path_buf());
        }

        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            if !path.trim().is_empty() {
                return Some(PathBuf::from(path));
            }
        }

        default_config_path().filter(|path| path.exists())
    }

    /// Locate and load configuration, falling back to compiled defaults
    ///
    /// Nothing is logged here so callers can resolve configuration before
    /// installing a subscriber; report the returned [`ConfigSource`] instead.
    pub fn resolve(cli_path: Option<&Path>) -> Result<(Self, ConfigSource)> {
        match Self::locate(cli_path) {
            Some(path) => Ok((Self::load_file(&path)?, ConfigSource::File(path))),
            None => Ok((Self::default(), ConfigSource::Defaults)),
        }
    }

    /// Reject configurations the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.matching.name_threshold > 100 {
            return Err(Error::Config(format!(
                "matching.name_threshold must be 0-100, got {}",
                self.matching.name_threshold
            )));
        }
        if !(0.0..=100.0).contains(&self.matching.low_score_threshold) {
            return Err(Error::Config(format!(
                "matching.low_score_threshold must be 0-100, got {}",
                self.matching.low_score_threshold
            )));
        }
        self.output.delimiter_byte()?;

        let roster = [
            &self.roster.name,
            &self.roster.institution,
            &self.roster.year,
            &self.roster.person_id,
        ];
        for (i, a) in roster.iter().enumerate() {
            if a.trim().is_empty() {
                return Err(Error::Config("roster column names must not be empty".to_string()));
            }
            if roster[i + 1..].contains(a) {
                return Err(Error::Config(format!("roster column '{}' configured twice", a)));
            }
        }
        let profile = [
            &self.profile.doc_id,
            &self.profile.name,
            &self.profile.institution,
            &self.profile.year,
        ];
        if profile.iter().any(|c| c.trim().is_empty()) {
            return Err(Error::Config("profile column names must not be empty".to_string()));
        }
        Ok(())
    }
}

/// `<config_dir>/rlink/config.toml` for the current platform
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("rlink").join("config.toml"))
}
