//! Roster and profile loaders
//!
//! Turn raw tables into typed records ready for matching:
//! 1. Verify the configured columns exist (missing column aborts the run)
//! 2. Fold names and institutions, hyphens in names become spaces
//! 3. Coerce degree years (missing or non-numeric → unknown)
//! 4. Derive the first-name token
//!
//! The roster is projected to its four identity columns and exact duplicate
//! rows are collapsed (last occurrence wins) before row ids are assigned.
//! Profile rows keep every column; rows without a name are excluded.

use crate::model::{DegreeYear, ProfileRecord, ProfileSet, RosterRecord, RosterRowId, RosterSet};
use rlink_common::config::{ProfileColumns, RosterColumns};
use rlink_common::normalize::{first_token, name_key, normalize_column};
use rlink_common::table::unique_name;
use rlink_common::{Error, Result, Table};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

/// Derived first-name token column (both schemas)
pub const FIRST_NAME_COLUMN: &str = "first_name";
/// Sequential roster row id column
pub const ROSTER_ROW_ID_COLUMN: &str = "roster_row_id";
/// Coerced profile degree year column
pub const PROFILE_YEAR_COLUMN: &str = "degree_year";
/// Appended to a derived column name already present in the input
pub const DERIVED_SUFFIX: &str = "_derived";

/// Append the derived columns to `headers`, renaming any that collide
fn push_derived(headers: &mut Vec<String>, derived: &[&str]) {
    for name in derived {
        let name = unique_name(headers, name, DERIVED_SUFFIX);
        headers.push(name);
    }
}

/// Fold the identity columns of a table in place
fn normalize_identity_columns(table: &mut Table, name: &str, institution: &str) -> Result<()> {
    normalize_column(table, name)?;
    normalize_column(table, institution)?;
    table.map_column(name, name_key)
}

/// Load the funding roster
///
/// # Errors
/// `Error::MissingColumn` if any configured roster column is absent.
pub fn load_roster(mut table: Table, columns: &RosterColumns) -> Result<RosterSet> {
    let name_idx = table.column_index(&columns.name)?;
    let institution_idx = table.column_index(&columns.institution)?;
    let year_idx = table.column_index(&columns.year)?;
    let person_idx = table.column_index(&columns.person_id)?;

    normalize_identity_columns(&mut table, &columns.name, &columns.institution)?;

    let raw_rows = table.len();
    let projected: Vec<[String; 4]> = table
        .into_rows()
        .into_iter()
        .map(|mut row| {
            let year = DegreeYear::parse(&row[year_idx]);
            [
                std::mem::take(&mut row[name_idx]),
                std::mem::take(&mut row[institution_idx]),
                year.to_string(),
                std::mem::take(&mut row[person_idx]),
            ]
        })
        .collect();

    // Exact duplicates collapse onto their last occurrence
    let mut last_seen: HashMap<&[String; 4], usize> = HashMap::with_capacity(projected.len());
    for (i, row) in projected.iter().enumerate() {
        last_seen.insert(row, i);
    }
    let keep: Vec<bool> = projected
        .iter()
        .enumerate()
        .map(|(i, row)| last_seen[row] == i)
        .collect();
    drop(last_seen);

    let mut records = Vec::with_capacity(keep.iter().filter(|k| **k).count());
    for (row, _) in projected.into_iter().zip(keep).filter(|(_, k)| *k) {
        let row_id = RosterRowId(records.len() as u32 + 1);
        let [name, institution, year_text, person_id] = row;
        let first_name = first_token(&name);
        let year = DegreeYear::parse(&year_text);
        let values = vec![
            name.clone(),
            institution.clone(),
            year_text,
            person_id.clone(),
            first_name.clone(),
            row_id.to_string(),
        ];
        records.push(RosterRecord {
            row_id,
            person_id,
            name,
            institution,
            year,
            first_name,
            values,
        });
    }

    info!(
        rows = raw_rows,
        kept = records.len(),
        duplicates = raw_rows - records.len(),
        "Roster loaded"
    );

    let mut headers = vec![
        columns.name.clone(),
        columns.institution.clone(),
        columns.year.clone(),
        columns.person_id.clone(),
    ];
    push_derived(&mut headers, &[FIRST_NAME_COLUMN, ROSTER_ROW_ID_COLUMN]);

    Ok(RosterSet { headers, records })
}

/// Load the profile corpus
///
/// # Errors
/// `Error::MissingColumn` if any configured profile column is absent,
/// `Error::InvalidInput` if a document identifier repeats.
pub fn load_profiles(mut table: Table, columns: &ProfileColumns) -> Result<ProfileSet> {
    let doc_idx = table.column_index(&columns.doc_id)?;
    let name_idx = table.column_index(&columns.name)?;
    let institution_idx = table.column_index(&columns.institution)?;
    let year_idx = table.column_index(&columns.year)?;

    normalize_identity_columns(&mut table, &columns.name, &columns.institution)?;

    let mut headers = table.headers().to_vec();
    push_derived(&mut headers, &[FIRST_NAME_COLUMN, PROFILE_YEAR_COLUMN]);

    let raw_rows = table.len();
    let mut seen_ids = HashSet::with_capacity(raw_rows);
    let mut records = Vec::with_capacity(raw_rows);

    for mut values in table.into_rows() {
        if values[name_idx].trim().is_empty() {
            debug!(doc_id = %values[doc_idx], "Skipping profile without a name");
            continue;
        }

        let doc_id = values[doc_idx].clone();
        if !seen_ids.insert(doc_id.clone()) {
            return Err(Error::InvalidInput(format!(
                "Duplicate profile document identifier '{}'",
                doc_id
            )));
        }

        let name = values[name_idx].clone();
        let institution = values[institution_idx].clone();
        let year = DegreeYear::parse(&values[year_idx]);
        let first_name = first_token(&name);

        values.push(first_name.clone());
        values.push(year.to_string());

        records.push(ProfileRecord {
            doc_id,
            name,
            institution,
            year,
            first_name,
            values,
        });
    }

    info!(
        rows = raw_rows,
        kept = records.len(),
        without_name = raw_rows - records.len(),
        "Profile corpus loaded"
    );

    Ok(ProfileSet { headers, records })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster_table(rows: &[[&str; 4]]) -> Table {
        let mut t = Table::new(
            "roster",
            ["ID_PESSOA", "NM_DOCENTE", "NM_IES_TITULACAO", "AN_TITULACAO", "NM_PROGRAMA"],
        );
        for [id, name, inst, year] in rows {
            t.push_row(vec![
                id.to_string(),
                name.to_string(),
                inst.to_string(),
                year.to_string(),
                "ignored".to_string(),
            ])
            .unwrap();
        }
        t
    }

    fn profile_table(rows: &[[&str; 4]]) -> Table {
        let mut t = Table::new(
            "profile",
            ["FILE-NAME", "NOME-COMPLETO", "ANO-DE-OBTENCAO-DO-TITULO", "NOME-INSTITUICAO"],
        );
        for [doc, name, year, inst] in rows {
            t.push_row(vec![doc.to_string(), name.to_string(), year.to_string(), inst.to_string()])
                .unwrap();
        }
        t
    }

    #[test]
    fn test_roster_projection_and_normalization() {
        let set = load_roster(
            roster_table(&[["P1", "José Da-Silva", "Universidade Federal", "2010"]]),
            &RosterColumns::default(),
        )
        .unwrap();

        assert_eq!(
            set.headers,
            ["NM_DOCENTE", "NM_IES_TITULACAO", "AN_TITULACAO", "ID_PESSOA", "first_name", "roster_row_id"]
        );
        let r = &set.records[0];
        assert_eq!(r.row_id, RosterRowId(1));
        assert_eq!(r.name, "jose da silva");
        assert_eq!(r.institution, "universidade federal");
        assert_eq!(r.year, DegreeYear(Some(2010)));
        assert_eq!(r.first_name, "jose");
        assert_eq!(
            r.values,
            ["jose da silva", "universidade federal", "2010", "P1", "jose", "1"]
        );
    }

    #[test]
    fn test_roster_duplicates_keep_last_and_ids_are_sequential() {
        let set = load_roster(
            roster_table(&[
                ["P1", "Ana Lima", "USP", "2001"],
                ["P2", "Rui Costa", "UFRJ", ""],
                // same as row 1 once folded
                ["P1", "ANA LIMA", "usp", "2001.0"],
                ["P3", "Eva Melo", "UnB", "x"],
            ]),
            &RosterColumns::default(),
        )
        .unwrap();

        let people: Vec<_> = set.records.iter().map(|r| r.person_id.as_str()).collect();
        assert_eq!(people, ["P2", "P1", "P3"]);
        let ids: Vec<_> = set.records.iter().map(|r| r.row_id.0).collect();
        assert_eq!(ids, [1, 2, 3]);
        assert_eq!(set.records[0].year, DegreeYear::UNKNOWN);
        assert_eq!(set.records[0].values[2], "0");
    }

    #[test]
    fn test_roster_missing_column_is_fatal() {
        let columns = RosterColumns {
            person_id: "ID_DOCENTE".to_string(),
            ..RosterColumns::default()
        };
        match load_roster(roster_table(&[]), &columns) {
            Err(Error::MissingColumn { column, .. }) => assert_eq!(column, "ID_DOCENTE"),
            other => panic!("expected MissingColumn, got {:?}", other.map(|s| s.records.len())),
        }
    }

    #[test]
    fn test_profiles_skip_nameless_and_derive_fields() {
        let set = load_profiles(
            profile_table(&[
                ["D1", "JOÃO Pereira-Neto", "2012", "Unicamp"],
                ["D2", "  ", "2010", "USP"],
                ["D3", "maria", "", "USP"],
            ]),
            &ProfileColumns::default(),
        )
        .unwrap();

        assert_eq!(set.records.len(), 2);
        let d1 = &set.records[0];
        assert_eq!(d1.name, "joao pereira neto");
        assert_eq!(d1.institution, "unicamp");
        assert_eq!(d1.first_name, "joao");
        assert_eq!(d1.year, DegreeYear(Some(2012)));
        assert_eq!(set.headers.last().unwrap(), PROFILE_YEAR_COLUMN);
        assert_eq!(d1.values, ["D1", "joao pereira neto", "2012", "unicamp", "joao", "2012"]);
        assert_eq!(set.records[1].values[5], "0");
    }

    #[test]
    fn test_profile_with_own_degree_year_keeps_distinct_headers() {
        let mut t = Table::new(
            "profile",
            ["FILE-NAME", "NOME-COMPLETO", "NOME-INSTITUICAO", "ANO-DE-OBTENCAO-DO-TITULO", "degree_year"],
        );
        t.push_row(vec!["D1".into(), "ana".into(), "usp".into(), "2010".into(), "doutorado".into()])
            .unwrap();
        let set = load_profiles(t, &ProfileColumns::default()).unwrap();

        assert_eq!(
            set.headers,
            [
                "FILE-NAME",
                "NOME-COMPLETO",
                "NOME-INSTITUICAO",
                "ANO-DE-OBTENCAO-DO-TITULO",
                "degree_year",
                "first_name",
                "degree_year_derived",
            ]
        );
        assert_eq!(set.records[0].values[4], "doutorado");
        assert_eq!(set.records[0].values[6], "2010");
    }

    #[test]
    fn test_roster_column_named_like_derived_column() {
        let columns = RosterColumns {
            person_id: "first_name".to_string(),
            ..RosterColumns::default()
        };
        let mut t = Table::new(
            "roster",
            ["first_name", "NM_DOCENTE", "NM_IES_TITULACAO", "AN_TITULACAO"],
        );
        t.push_row(vec!["P1".into(), "Ana Lima".into(), "USP".into(), "2001".into()])
            .unwrap();
        let set = load_roster(t, &columns).unwrap();

        assert_eq!(set.headers[3..], ["first_name", "first_name_derived", "roster_row_id"]);
        assert_eq!(set.records[0].values[3..], ["P1", "ana", "1"]);
    }

    #[test]
    fn test_profiles_duplicate_doc_id_is_fatal() {
        let result = load_profiles(
            profile_table(&[["D1", "ana", "2010", "usp"], ["D1", "rui", "2011", "ufrj"]]),
            &ProfileColumns::default(),
        );
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }
}
