//! # rlink Common Library
//!
//! Shared code for the roster/profile record-linkage tools:
//! - Error type and result alias
//! - TOML configuration loading
//! - In-memory tables and delimited-text I/O
//! - Staged, all-or-nothing output files
//! - Identity-field normalization

pub mod config;
pub mod error;
pub mod normalize;
pub mod staging;
pub mod table;

pub use error::{Error, Result};
pub use table::Table;
