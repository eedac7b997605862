//! Cascade key schedule
//!
//! Each pass joins roster and profile rows on exact equality of a tuple of
//! normalized fields. The schedule starts strict (full name, institution and
//! year) and loosens step by step down to the bare first-name token.

use crate::model::{ProfileRecord, RosterRecord};
use rlink_common::config::RosterColumns;

/// Field that can take part in a join key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchField {
    FullName,
    Institution,
    Year,
    FirstName,
}

/// Ordered set of fields joined on in one pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyTuple(pub &'static [MatchField]);

/// The fixed eight-pass schedule, applied in this order
pub const CASCADE: [KeyTuple; 8] = [
    KeyTuple(&[MatchField::FullName, MatchField::Institution, MatchField::Year]),
    KeyTuple(&[MatchField::FullName, MatchField::Institution]),
    KeyTuple(&[MatchField::FullName, MatchField::Year]),
    KeyTuple(&[MatchField::FullName]),
    KeyTuple(&[MatchField::FirstName, MatchField::Institution, MatchField::Year]),
    KeyTuple(&[MatchField::FirstName, MatchField::Institution]),
    KeyTuple(&[MatchField::FirstName, MatchField::Year]),
    KeyTuple(&[MatchField::FirstName]),
];

/// One component of a join key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyPart<'a> {
    Text(&'a str),
    Year(u16),
}

/// Side-independent view of the fields a key can read
trait KeyFields {
    fn name(&self) -> &str;
    fn institution(&self) -> &str;
    fn join_year(&self) -> u16;
    fn first_name(&self) -> &str;
}

impl KeyFields for RosterRecord {
    fn name(&self) -> &str {
        &self.name
    }
    fn institution(&self) -> &str {
        &self.institution
    }
    fn join_year(&self) -> u16 {
        self.year.join_value()
    }
    fn first_name(&self) -> &str {
        &self.first_name
    }
}

impl KeyFields for ProfileRecord {
    fn name(&self) -> &str {
        &self.name
    }
    fn institution(&self) -> &str {
        &self.institution
    }
    fn join_year(&self) -> u16 {
        self.year.join_value()
    }
    fn first_name(&self) -> &str {
        &self.first_name
    }
}

impl KeyTuple {
    pub fn fields(&self) -> &'static [MatchField] {
        self.0
    }

    pub fn contains(&self, field: MatchField) -> bool {
        self.0.contains(&field)
    }

    /// Human-readable label built from the roster column names
    pub fn label(&self, columns: &RosterColumns) -> String {
        self.0
            .iter()
            .map(|field| match field {
                MatchField::FullName => columns.name.as_str(),
                MatchField::Institution => columns.institution.as_str(),
                MatchField::Year => columns.year.as_str(),
                MatchField::FirstName => crate::loader::FIRST_NAME_COLUMN,
            })
            .collect::<Vec<_>>()
            .join(" - ")
    }

    fn extract<'a, R: KeyFields>(&self, record: &'a R) -> Vec<KeyPart<'a>> {
        self.0
            .iter()
            .map(|field| match field {
                MatchField::FullName => KeyPart::Text(record.name()),
                MatchField::Institution => KeyPart::Text(record.institution()),
                MatchField::Year => KeyPart::Year(record.join_year()),
                MatchField::FirstName => KeyPart::Text(record.first_name()),
            })
            .collect()
    }

    pub fn roster_key<'a>(&self, record: &'a RosterRecord) -> Vec<KeyPart<'a>> {
        self.extract(record)
    }

    pub fn profile_key<'a>(&self, record: &'a ProfileRecord) -> Vec<KeyPart<'a>> {
        self.extract(record)
    }
}
