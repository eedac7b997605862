//! Common error types for rlink

use thiserror::Error;

/// Common result type for rlink operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across rlink crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Delimited-text parse or write error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A table lacks a column the run depends on
    #[error("Missing column '{column}' in {table} table")]
    MissingColumn { table: String, column: String },

    /// Input data violates a precondition (ragged rows, duplicate keys)
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    pub fn missing_column(table: &str, column: &str) -> Self {
        Error::MissingColumn {
            table: table.to_string(),
            column: column.to_string(),
        }
    }
}
