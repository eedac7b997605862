//! Roster and profile records
//!
//! Records are created once by the loaders and are read-only afterwards.
//! Each keeps its full row (`values`, already normalized) so the output
//! tables can reproduce every input column.

use std::fmt;

/// Sequential id assigned to roster rows at load time (1..N)
///
/// This, not the person identifier, is the unit of matching and removal: a
/// person may own several roster rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RosterRowId(pub u32);

impl fmt::Display for RosterRowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Degree year, `None` when missing or not numeric
///
/// Joins and gaps treat an unknown year as 0, so two unknown years compare
/// equal with a gap of 0 and an unknown year sits far from any real one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct DegreeYear(pub Option<u16>);

impl DegreeYear {
    pub const UNKNOWN: DegreeYear = DegreeYear(None);

    /// Coerce a free-text cell; anything that is not a positive whole number
    /// becomes unknown
    ///
    /// Negative years and years above 65535 are also unknown, so their gaps
    /// are taken against 0 rather than their literal value.
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        if let Ok(year) = text.parse::<u16>() {
            return DegreeYear((year != 0).then_some(year));
        }
        // Spreadsheet exports often render integer columns as "2010.0"
        match text.parse::<f64>() {
            Ok(v) if v.is_finite() && v.fract() == 0.0 && v >= 1.0 && v <= f64::from(u16::MAX) => {
                DegreeYear(Some(v as u16))
            }
            _ => DegreeYear::UNKNOWN,
        }
    }

    /// Value used for equality joins
    pub fn join_value(self) -> u16 {
        self.0.unwrap_or(0)
    }

    /// Absolute difference in years
    pub fn gap(self, other: DegreeYear) -> u32 {
        u32::from(self.join_value().abs_diff(other.join_value()))
    }
}

impl fmt::Display for DegreeYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.join_value())
    }
}

/// One funded person-title row of the roster
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterRecord {
    pub row_id: RosterRowId,
    pub person_id: String,
    /// Folded, hyphen-free full name
    pub name: String,
    pub institution: String,
    pub year: DegreeYear,
    pub first_name: String,
    /// Cells in roster schema order
    pub values: Vec<String>,
}

/// One profile-corpus document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileRecord {
    pub doc_id: String,
    pub name: String,
    pub institution: String,
    pub year: DegreeYear,
    pub first_name: String,
    /// Cells in profile schema order
    pub values: Vec<String>,
}

/// Loaded roster with its output schema
#[derive(Debug, Clone)]
pub struct RosterSet {
    pub headers: Vec<String>,
    pub records: Vec<RosterRecord>,
}

/// Loaded profile corpus with its output schema
#[derive(Debug, Clone)]
pub struct ProfileSet {
    pub headers: Vec<String>,
    pub records: Vec<ProfileRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_year_parsing() {
        assert_eq!(DegreeYear::parse("2010"), DegreeYear(Some(2010)));
        assert_eq!(DegreeYear::parse(" 1998 "), DegreeYear(Some(1998)));
        assert_eq!(DegreeYear::parse("2010.0"), DegreeYear(Some(2010)));
        assert_eq!(DegreeYear::parse("2010.5"), DegreeYear::UNKNOWN);
        assert_eq!(DegreeYear::parse(""), DegreeYear::UNKNOWN);
        assert_eq!(DegreeYear::parse("nan"), DegreeYear::UNKNOWN);
        assert_eq!(DegreeYear::parse("0"), DegreeYear::UNKNOWN);
        assert_eq!(DegreeYear::parse("-5"), DegreeYear::UNKNOWN);
        assert_eq!(DegreeYear::parse("70000"), DegreeYear::UNKNOWN);
    }

    #[test]
    fn test_unknown_years_behave_as_zero() {
        let unknown = DegreeYear::UNKNOWN;
        assert_eq!(unknown.join_value(), DegreeYear::parse("0").join_value());
        assert_eq!(unknown.gap(unknown), 0);
        assert_eq!(unknown.gap(DegreeYear(Some(2010))), 2010);
        assert_eq!(DegreeYear(Some(2012)).gap(DegreeYear(Some(2010))), 2);
        assert_eq!(unknown.to_string(), "0");
    }
}
