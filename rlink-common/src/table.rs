//! In-memory tables and delimited-text I/O
//!
//! A [`Table`] is the exchange format between the record-linkage engine and
//! the outside world: a header row plus text cells, read and written
//! wholesale. Writes go through [`StagedFiles`] so a failed run never
//! leaves a truncated table behind.

use crate::staging::StagedFiles;
use crate::{Error, Result};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tracing::debug;

/// `name`, or `name` followed by `suffix` as often as needed to be absent
/// from `taken`
pub fn unique_name(taken: &[String], name: &str, suffix: &str) -> String {
    let mut candidate = name.to_string();
    while taken.contains(&candidate) {
        candidate.push_str(suffix);
    }
    candidate
}

/// Rectangular table of text cells
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    /// Label used in error messages ("roster", "profile", ...)
    label: String,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Create an empty table with the given headers
    pub fn new<S: Into<String>>(label: &str, headers: impl IntoIterator<Item = S>) -> Self {
        Self {
            label: label.to_string(),
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Vec<String>> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Append a row; its arity must match the header row
    pub fn push_row(&mut self, row: Vec<String>) -> Result<()> {
        if row.len() != self.headers.len() {
            return Err(Error::InvalidInput(format!(
                "{} table row has {} cells, expected {}",
                self.label,
                row.len(),
                self.headers.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    /// Position of a named column
    ///
    /// # Errors
    /// `Error::MissingColumn` when the header row has no such column.
    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| Error::missing_column(&self.label, name))
    }

    /// Rewrite every cell of a column in place
    pub fn map_column<F>(&mut self, name: &str, mut f: F) -> Result<()>
    where
        F: FnMut(&str) -> String,
    {
        let idx = self.column_index(name)?;
        for row in &mut self.rows {
            row[idx] = f(&row[idx]);
        }
        Ok(())
    }

    /// Parse delimited text with a mandatory header row
    ///
    /// # Errors
    /// `Error::InvalidInput` for a missing or repeated header, `Error::Csv`
    /// for ragged rows.
    pub fn from_reader<R: Read>(label: &str, reader: R, delimiter: u8) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .from_reader(reader);

        let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
        if headers.is_empty() {
            return Err(Error::InvalidInput(format!("{} table has no header row", label)));
        }
        for (i, h) in headers.iter().enumerate() {
            if headers[i + 1..].contains(h) {
                return Err(Error::InvalidInput(format!(
                    "{} table has column '{}' more than once",
                    label, h
                )));
            }
        }

        let mut table = Table::new(label, headers);
        for record in rdr.records() {
            let record = record?;
            table.rows.push(record.iter().map(str::to_string).collect());
        }

        Ok(table)
    }

    /// Read a delimited file from disk
    pub fn read_delimited(label: &str, path: &Path, delimiter: u8) -> Result<Self> {
        let file = File::open(path).map_err(|e| {
            Error::InvalidInput(format!("Cannot open {} table {}: {}", label, path.display(), e))
        })?;
        let table = Self::from_reader(label, file, delimiter)?;
        debug!(
            table = label,
            path = %path.display(),
            rows = table.len(),
            columns = table.headers.len(),
            "Loaded delimited table"
        );
        Ok(table)
    }

    /// Serialize as delimited text
    pub fn to_writer<W: Write>(&self, writer: W, delimiter: u8) -> Result<()> {
        let mut wtr = csv::WriterBuilder::new()
            .delimiter(delimiter)
            .from_writer(writer);
        wtr.write_record(&self.headers)?;
        for row in &self.rows {
            wtr.write_record(row)?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// Write to disk atomically (temp file + rename)
    pub fn write_delimited(&self, path: &Path, delimiter: u8) -> Result<()> {
        let mut staged = StagedFiles::new();
        staged.stage_table(self, path, delimiter)?;
        staged.commit()?;
        debug!(
            table = %self.label,
            path = %path.display(),
            rows = self.len(),
            "Wrote delimited table"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        let mut t = Table::new("roster", ["name", "year"]);
        t.push_row(vec!["Ana".into(), "2010".into()]).unwrap();
        t.push_row(vec!["Rui".into(), "".into()]).unwrap();
        t
    }

    #[test]
    fn test_column_index_missing_is_precondition_error() {
        let t = sample();
        assert_eq!(t.column_index("year").unwrap(), 1);
        match t.column_index("nope") {
            Err(Error::MissingColumn { table, column }) => {
                assert_eq!(table, "roster");
                assert_eq!(column, "nope");
            }
            other => panic!("expected MissingColumn, got {:?}", other),
        }
    }

    #[test]
    fn test_push_row_rejects_wrong_arity() {
        let mut t = sample();
        assert!(t.push_row(vec!["only one".into()]).is_err());
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn test_map_column_only_touches_named_column() {
        let mut t = sample();
        t.map_column("name", |s| s.to_uppercase()).unwrap();
        assert_eq!(t.rows()[0], vec!["ANA".to_string(), "2010".to_string()]);
        assert_eq!(t.rows()[1][1], "");
    }

    #[test]
    fn test_reader_handles_quoted_delimiters() {
        let text = "name;institution\n\"Silva; J.\";usp\n";
        let t = Table::from_reader("profile", text.as_bytes(), b';').unwrap();
        assert_eq!(t.headers(), ["name", "institution"]);
        assert_eq!(t.rows()[0][0], "Silva; J.");
    }

    #[test]
    fn test_reader_rejects_ragged_rows() {
        let text = "a,b\n1,2\n3\n";
        assert!(Table::from_reader("roster", text.as_bytes(), b',').is_err());
    }

    #[test]
    fn test_writer_output_parses_back() {
        let t = sample();
        let mut buf = Vec::new();
        t.to_writer(&mut buf, b',').unwrap();
        assert_eq!(String::from_utf8(buf.clone()).unwrap(), "name,year\nAna,2010\nRui,\n");
        let back = Table::from_reader("roster", buf.as_slice(), b',').unwrap();
        assert_eq!(back, t);
    }

    #[test]
    fn test_reader_rejects_repeated_header() {
        let text = "name,year,name\nAna,2010,Ana\n";
        match Table::from_reader("profile", text.as_bytes(), b',') {
            Err(Error::InvalidInput(msg)) => assert!(msg.contains("'name'")),
            other => panic!("expected InvalidInput, got {:?}", other),
        }
    }

    #[test]
    fn test_unique_name_appends_suffix_until_free() {
        let taken = vec!["year".to_string(), "year_x".to_string()];
        assert_eq!(unique_name(&taken, "name", "_x"), "name");
        assert_eq!(unique_name(&taken, "year", "_x"), "year_x_x");
    }
}
