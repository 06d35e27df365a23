//! Stateless helper utilities shared by the roster reader and form writer.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use regex::Regex;
use rust_xlsxwriter::utility::row_col_to_cell;

use crate::conf::{
    N_COL_KM, N_COL_KM_TOTAL, N_LEN_EXCEL_SHEET_NAME_MAX, N_NROWS_EXCEL_MAX,
    N_OFFSET_KM_OUTBOUND, N_OFFSET_KM_RETURN, TUP_EXCEL_ILLEGAL,
};
use crate::spec::{EnumFormFormula, SpecParticipantRecord, TypeRosterGroups};

////////////////////////////////////////////////////////////////////////////////
// #region PostalCode

static RE_POSTAL_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{3}\s?\d{2,3}").expect("postal code pattern is valid"));

/// Extract the first postal-code-shaped digit run from a free-text address.
///
/// Matches 3 digits, optional whitespace, then 2-3 digits; whitespace inside
/// the match is removed. Returns an empty string when nothing matches.
pub fn extract_postal_code(address: &str) -> String {
    RE_POSTAL_CODE
        .find(address)
        .map(|m| m.as_str().chars().filter(|chr| !chr.is_whitespace()).collect())
        .unwrap_or_default()
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Grouping

/// Stable partition of `records` by group key, keys in ascending order.
pub fn partition_by_group(records: Vec<SpecParticipantRecord>) -> TypeRosterGroups {
    let mut dict_groups: TypeRosterGroups = BTreeMap::new();
    for record in records {
        dict_groups
            .entry(record.group.clone())
            .or_default()
            .push(record);
    }
    dict_groups
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ColumnNaming

/// Name blank headers `Unnamed: <idx>` and suffix repeats with `.1`, `.2`, ...
pub fn derive_unique_column_names(headers: &[Option<String>]) -> Vec<String> {
    let mut set_names_seen = BTreeSet::new();
    let mut l_names = Vec::with_capacity(headers.len());

    for (n_idx, header) in headers.iter().enumerate() {
        let c_base_name = match header {
            Some(val) if !val.trim().is_empty() => val.trim().to_string(),
            _ => format!("Unnamed: {n_idx}"),
        };

        let mut c_name = c_base_name.clone();
        let mut n_dup = 1usize;
        while set_names_seen.contains(&c_name) {
            c_name = format!("{c_base_name}.{n_dup}");
            n_dup += 1;
        }
        set_names_seen.insert(c_name.clone());
        l_names.push(c_name);
    }

    l_names
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SheetNormalization

/// Replace invalid chars and trim to valid Excel sheet name.
pub fn sanitize_sheet_name(name: &str, replace_to: &str) -> String {
    let mut c_name = name.to_string();
    for c_illegal in TUP_EXCEL_ILLEGAL {
        c_name = c_name.replace(c_illegal, replace_to);
    }
    c_name = c_name.trim().trim_matches('\'').to_string();
    if c_name.is_empty() {
        c_name = "Sheet".to_string();
    }

    c_name.chars().take(N_LEN_EXCEL_SHEET_NAME_MAX).collect()
}

/// Return `name` or a `name__2`, `name__3`, ... variant not yet in `set_existing`.
///
/// Excel compares sheet names case-insensitively, so `set_existing` holds
/// lowercase names.
pub fn derive_unique_sheet_name(name: &str, set_existing: &mut BTreeSet<String>) -> String {
    if set_existing.insert(name.to_lowercase()) {
        return name.to_string();
    }

    let base_name: String = name
        .chars()
        .take(usize::max(1, N_LEN_EXCEL_SHEET_NAME_MAX - 3))
        .collect();

    let mut n_idx = 2usize;
    loop {
        let candidate: String = format!("{base_name}__{n_idx}")
            .chars()
            .take(N_LEN_EXCEL_SHEET_NAME_MAX)
            .collect();
        if set_existing.insert(candidate.to_lowercase()) {
            return candidate;
        }
        n_idx += 1;
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Formulas

/// A1 reference of a 1-based `(row, column)` cell.
pub fn derive_cell_ref(n_row: usize, n_col: usize) -> Result<String, String> {
    Ok(row_col_to_cell(cast_row_num(n_row)?, cast_col_num(n_col)?))
}

/// Build formula text for `enum_formula` in the form starting at `n_row_start`.
///
/// References are anchored to the form's outbound km row, so the formula
/// text does not depend on which cell it is written into.
pub fn derive_formula_text(
    enum_formula: EnumFormFormula,
    n_row_start: usize,
    rate_per_km: f64,
) -> Result<String, String> {
    let c_km_outbound = derive_cell_ref(n_row_start + N_OFFSET_KM_OUTBOUND, N_COL_KM)?;
    Ok(match enum_formula {
        EnumFormFormula::TotalKm => {
            let c_km_return = derive_cell_ref(n_row_start + N_OFFSET_KM_RETURN, N_COL_KM)?;
            format!("={c_km_outbound}+{c_km_return}")
        }
        EnumFormFormula::ReturnKm => format!("={c_km_outbound}"),
        EnumFormFormula::Amount => {
            let c_km_total = derive_cell_ref(n_row_start + N_OFFSET_KM_OUTBOUND, N_COL_KM_TOTAL)?;
            format!("={c_km_total}*{rate_per_km}")
        }
    })
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region IndexCasting

/// Convert a 1-based row number to the writer's 0-based row index.
pub fn cast_row_num(n_row: usize) -> Result<u32, String> {
    if n_row == 0 || n_row > N_NROWS_EXCEL_MAX {
        return Err(format!("row number out of range: {n_row}"));
    }
    u32::try_from(n_row - 1).map_err(|_| format!("row index overflow: {n_row}"))
}

/// Convert a 1-based column number to the writer's 0-based column index.
pub fn cast_col_num(n_col: usize) -> Result<u16, String> {
    if n_col == 0 {
        return Err("column number out of range: 0".to_string());
    }
    u16::try_from(n_col - 1).map_err(|_| format!("column index overflow: {n_col}"))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    fn create_record(last_name: &str, group: &str) -> SpecParticipantRecord {
        SpecParticipantRecord {
            last_name: last_name.to_string(),
            group: group.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_extract_postal_code_variants() {
        assert_eq!(extract_postal_code("Brno 625 00"), "62500");
        assert_eq!(extract_postal_code("Kounicova 12, 60200 Brno"), "60200");
        assert_eq!(extract_postal_code("Bratislava 811 101"), "811101");
        assert_eq!(extract_postal_code("Praha"), "");
        assert_eq!(extract_postal_code(""), "");
        assert_eq!(extract_postal_code("Dům 12, Obec"), "");
    }

    #[test]
    fn test_extract_postal_code_first_match_wins() {
        assert_eq!(extract_postal_code("Lidická 700 12, 602 00 Brno"), "70012");
        assert_eq!(extract_postal_code("Lidická 700, 602 00 Brno"), "60200");
        assert_eq!(extract_postal_code("602 00 Brno, PO box 123 45"), "60200");
    }

    #[test]
    fn test_partition_is_stable_exhaustive_and_sorted() {
        let records = vec![
            create_record("Novák", "B"),
            create_record("Svoboda", "A"),
            create_record("Dvořák", "C"),
            create_record("Černý", "A"),
            create_record("Procházka", "B"),
        ];

        let dict_groups = partition_by_group(records.clone());

        assert_eq!(
            dict_groups.keys().cloned().collect::<Vec<_>>(),
            vec!["A", "B", "C"]
        );
        let l_names_a: Vec<&str> = dict_groups["A"]
            .iter()
            .map(|r| r.last_name.as_str())
            .collect();
        assert_eq!(l_names_a, vec!["Svoboda", "Černý"]);
        let l_names_b: Vec<&str> = dict_groups["B"]
            .iter()
            .map(|r| r.last_name.as_str())
            .collect();
        assert_eq!(l_names_b, vec!["Novák", "Procházka"]);

        let n_total: usize = dict_groups.values().map(Vec::len).sum();
        assert_eq!(n_total, records.len());
        for record in &records {
            assert_eq!(
                dict_groups
                    .values()
                    .flatten()
                    .filter(|r| *r == record)
                    .count(),
                1
            );
        }
    }

    #[test]
    fn test_partition_of_empty_roster_is_empty() {
        assert!(partition_by_group(vec![]).is_empty());
    }

    #[test]
    fn test_derive_unique_column_names() {
        let headers = vec![
            Some("Last name".to_string()),
            None,
            Some("Address".to_string()),
            Some("Address".to_string()),
            Some("  ".to_string()),
        ];
        assert_eq!(
            derive_unique_column_names(&headers),
            vec!["Last name", "Unnamed: 1", "Address", "Address.1", "Unnamed: 4"]
        );
    }

    #[test]
    fn test_sanitize_and_unique_sheet_names() {
        assert_eq!(sanitize_sheet_name("Group A/B", "_"), "Group A_B");
        assert_eq!(sanitize_sheet_name("  ", "_"), "Sheet");
        assert_eq!(sanitize_sheet_name(&"x".repeat(40), "_").len(), 31);

        let mut set_existing = BTreeSet::new();
        assert_eq!(derive_unique_sheet_name("Group A", &mut set_existing), "Group A");
        assert_eq!(
            derive_unique_sheet_name("group a", &mut set_existing),
            "group a__2"
        );
    }

    #[test]
    fn test_formula_references_follow_layout_offsets() {
        // Form starting at row 2: outbound km F9, return km F12, total G9, amount I14.
        assert_eq!(
            derive_formula_text(EnumFormFormula::TotalKm, 2, 2.0).unwrap(),
            "=F9+F12"
        );
        assert_eq!(
            derive_formula_text(EnumFormFormula::ReturnKm, 2, 2.0).unwrap(),
            "=F9"
        );
        assert_eq!(
            derive_formula_text(EnumFormFormula::Amount, 2, 2.0).unwrap(),
            "=G9*2"
        );
        assert_eq!(
            derive_formula_text(EnumFormFormula::Amount, 14, 4.5).unwrap(),
            "=G21*4.5"
        );
    }

    #[test]
    fn test_cast_indices() {
        assert_eq!(cast_row_num(1).unwrap(), 0);
        assert_eq!(cast_col_num(10).unwrap(), 9);
        assert!(cast_row_num(0).is_err());
        assert!(cast_row_num(N_NROWS_EXCEL_MAX + 1).is_err());
        assert!(cast_col_num(0).is_err());
    }
}
