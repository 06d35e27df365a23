//! Roster loader: spreadsheet rows into participant records.

use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto};
use polars::prelude::{AnyValue, Column, DataFrame, NamedFrom};
use tracing::{debug, info, warn};

use crate::spec::{
    EnumParticipantField, FormGenError, SpecParticipantRecord, SpecRosterColumns, SpecRosterLoad,
    TypeRosterGroups,
};
use crate::util::{derive_unique_column_names, partition_by_group};

/// Roster table as read from the sheet.
#[derive(Debug, Clone)]
struct SpecRosterTable {
    sheet_name: String,
    /// 1-based sheet row of the header.
    n_row_header: usize,
    df_roster: DataFrame,
    l_if_row_blank: Vec<bool>,
}

/// Load participants from the roster workbook at `path`.
///
/// Row 1 of the sheet is the header; required columns are looked up by the
/// names in `columns`. Blank rows are skipped. Rows that carry data but no
/// group value cannot be grouped: they are dropped and reported as warnings.
///
/// Returns [`FormGenError::InputNotFound`] when `path` is not a file and
/// [`FormGenError::InputFormat`] when the workbook is unreadable or lacks a
/// required column.
pub fn load_roster(
    path: &Path,
    columns: &SpecRosterColumns,
) -> Result<SpecRosterLoad, FormGenError> {
    if !path.is_file() {
        return Err(FormGenError::InputNotFound(path.to_path_buf()));
    }

    let table = read_roster_table(path, columns.sheet_name.as_deref()).map_err(|message| {
        FormGenError::InputFormat {
            path: path.to_path_buf(),
            message,
        }
    })?;

    let l_cols_required = select_required_columns(&table.df_roster, columns).map_err(
        |message| FormGenError::InputFormat {
            path: path.to_path_buf(),
            message,
        },
    )?;

    let mut roster = SpecRosterLoad {
        sheet_name: table.sheet_name.clone(),
        cnt_rows_read: table.df_roster.height(),
        ..Default::default()
    };

    for n_idx_row in 0..table.df_roster.height() {
        if table.l_if_row_blank[n_idx_row] {
            continue;
        }
        let n_row_source = table.n_row_header + 1 + n_idx_row;

        let mut record = SpecParticipantRecord {
            n_row_source,
            ..Default::default()
        };
        for (enum_field, col) in &l_cols_required {
            let value = col.get(n_idx_row).map_err(|err| FormGenError::InputFormat {
                path: path.to_path_buf(),
                message: format!("Failed to read row {n_row_source}: {err}"),
            })?;
            let c_text = derive_text_from_any_value(value);
            match enum_field {
                EnumParticipantField::LastName => record.last_name = c_text,
                EnumParticipantField::FirstName => record.first_name = c_text,
                EnumParticipantField::IdNumber => record.id_number = c_text,
                EnumParticipantField::Address => record.address = c_text,
                EnumParticipantField::LicensePlate => record.license_plate = c_text,
                EnumParticipantField::Group => record.group = c_text,
            }
        }

        if record.group.is_empty() {
            let c_msg = format!(
                "Row {n_row_source} ({} {}) has no {:?} value; skipped.",
                record.first_name, record.last_name, columns.col_group
            );
            warn!(row = n_row_source, "{c_msg}");
            roster.cnt_rows_skipped += 1;
            roster.warnings.push(c_msg);
            continue;
        }

        debug!(
            row = n_row_source,
            group = %record.group,
            "Loaded {} {}",
            record.first_name,
            record.last_name
        );
        roster.records.push(record);
    }

    info!(
        sheet = %roster.sheet_name,
        records = roster.records.len(),
        skipped = roster.cnt_rows_skipped,
        "Loaded roster from {}",
        path.display()
    );
    Ok(roster)
}

/// Load the roster and partition it by group key.
pub fn load_roster_groups(
    path: &Path,
    columns: &SpecRosterColumns,
) -> Result<(SpecRosterLoad, TypeRosterGroups), FormGenError> {
    let mut roster = load_roster(path, columns)?;
    let dict_groups = partition_by_group(std::mem::take(&mut roster.records));
    Ok((roster, dict_groups))
}

fn read_roster_table(path: &Path, sheet_name: Option<&str>) -> Result<SpecRosterTable, String> {
    let mut workbook =
        open_workbook_auto(path).map_err(|err| format!("Failed to open workbook: {err}"))?;

    let c_sheet_name = match sheet_name {
        Some(val) => val.to_string(),
        None => workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| "Workbook contains no sheets.".to_string())?,
    };
    let range = workbook
        .worksheet_range(&c_sheet_name)
        .map_err(|err| format!("Failed to read sheet {c_sheet_name:?}: {err}"))?;

    let n_row_header = range.start().map_or(1, |(n_row, _)| n_row as usize + 1);
    let mut iter_rows = range.rows();
    let Some(l_header_cells) = iter_rows.next() else {
        return Err(format!("Sheet {c_sheet_name:?} has no header row."));
    };

    let l_headers: Vec<Option<String>> =
        l_header_cells.iter().map(derive_text_from_data).collect();
    let l_colnames = derive_unique_column_names(&l_headers);

    let mut l_cols_values: Vec<Vec<Option<String>>> = vec![Vec::new(); l_colnames.len()];
    let mut l_if_row_blank = Vec::new();
    for row in iter_rows {
        let mut if_blank = true;
        for (n_idx_col, l_values) in l_cols_values.iter_mut().enumerate() {
            let value = row.get(n_idx_col).and_then(derive_text_from_data);
            if_blank &= value.is_none();
            l_values.push(value);
        }
        l_if_row_blank.push(if_blank);
    }

    let l_columns: Vec<Column> = l_colnames
        .iter()
        .zip(l_cols_values)
        .map(|(c_name, l_values)| Column::new(c_name.as_str().into(), l_values))
        .collect();
    let df_roster =
        DataFrame::new(l_columns).map_err(|err| format!("Failed to build roster table: {err}"))?;

    Ok(SpecRosterTable {
        sheet_name: c_sheet_name,
        n_row_header,
        df_roster,
        l_if_row_blank,
    })
}

fn select_required_columns<'a>(
    df_roster: &'a DataFrame,
    columns: &SpecRosterColumns,
) -> Result<Vec<(EnumParticipantField, &'a Column)>, String> {
    let mut l_cols_required = Vec::new();
    let mut l_missing = Vec::new();
    for (enum_field, c_name) in columns.required() {
        match df_roster.column(c_name) {
            Ok(col) => l_cols_required.push((enum_field, col)),
            Err(_) => l_missing.push(format!("{c_name:?}")),
        }
    }

    if !l_missing.is_empty() {
        return Err(format!(
            "Missing required column(s): {}; found: {:?}",
            l_missing.join(", "),
            df_roster.get_column_names_str()
        ));
    }
    Ok(l_cols_required)
}

fn derive_text_from_data(value: &Data) -> Option<String> {
    let c_text = match value {
        Data::Empty => return None,
        Data::String(val) => val.trim().to_string(),
        Data::Float(val) => derive_text_from_float(*val),
        Data::Int(val) => val.to_string(),
        Data::Bool(val) => val.to_string(),
        _ => value.to_string().trim().to_string(),
    };
    if c_text.is_empty() { None } else { Some(c_text) }
}

/// Whole numbers print without a fraction so numeric IDs stay intact.
fn derive_text_from_float(x: f64) -> String {
    if x.is_finite() && x.fract() == 0.0 && x.abs() < 1e15 {
        (x as i64).to_string()
    } else {
        x.to_string()
    }
}

fn derive_text_from_any_value(value: AnyValue<'_>) -> String {
    match value {
        AnyValue::Null => String::new(),
        AnyValue::String(val) => val.to_string(),
        AnyValue::StringOwned(val) => val.to_string(),
        _ => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use rust_xlsxwriter::Workbook;
    use tempfile::TempDir;

    use super::*;
    use crate::conf::derive_default_roster_columns;

    const TUP_HEADERS: [&str; 6] = [
        "Last name",
        "First name",
        "ID number",
        "Address",
        "Driver's license plate",
        "Performance group",
    ];

    fn write_roster(path: &Path, headers: &[&str], rows: &[[&str; 6]]) {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        for (n_idx_col, c_header) in headers.iter().enumerate() {
            worksheet
                .write_string(0, n_idx_col as u16, *c_header)
                .unwrap();
        }
        for (n_idx_row, row) in rows.iter().enumerate() {
            for (n_idx_col, c_value) in row.iter().enumerate() {
                if c_value.is_empty() {
                    continue;
                }
                worksheet
                    .write_string(n_idx_row as u32 + 1, n_idx_col as u16, *c_value)
                    .unwrap();
            }
        }
        workbook.save(path).unwrap();
    }

    fn create_roster_path(dir: &TempDir) -> PathBuf {
        dir.path().join("roster.xlsx")
    }

    #[test]
    fn test_load_roster_reads_records_in_source_order() {
        let dir = TempDir::new().unwrap();
        let path = create_roster_path(&dir);
        write_roster(
            &path,
            &TUP_HEADERS,
            &[
                ["Novák", "Jan", "123456789", "Brno 625 00", "1B2 3456", "B"],
                ["Svoboda", "Petr", "987654321", "Praha", "", "A"],
            ],
        );

        let roster = load_roster(&path, &derive_default_roster_columns()).unwrap();

        assert_eq!(roster.cnt_rows_read, 2);
        assert_eq!(roster.cnt_rows_skipped, 0);
        assert_eq!(roster.records.len(), 2);
        assert_eq!(roster.records[0].last_name, "Novák");
        assert_eq!(roster.records[0].address, "Brno 625 00");
        assert_eq!(roster.records[0].license_plate, "1B2 3456");
        assert_eq!(roster.records[0].group, "B");
        assert_eq!(roster.records[0].n_row_source, 2);
        assert_eq!(roster.records[1].license_plate, "");
        assert_eq!(roster.records[1].n_row_source, 3);
    }

    #[test]
    fn test_load_roster_keeps_numeric_id_without_fraction() {
        let dir = TempDir::new().unwrap();
        let path = create_roster_path(&dir);
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        for (n_idx_col, c_header) in TUP_HEADERS.iter().enumerate() {
            worksheet
                .write_string(0, n_idx_col as u16, *c_header)
                .unwrap();
        }
        worksheet.write_string(1, 0, "Dvořák").unwrap();
        worksheet.write_number(1, 2, 8001011234.0).unwrap();
        worksheet.write_string(1, 5, "C").unwrap();
        workbook.save(&path).unwrap();

        let roster = load_roster(&path, &derive_default_roster_columns()).unwrap();

        assert_eq!(roster.records.len(), 1);
        assert_eq!(roster.records[0].id_number, "8001011234");
    }

    #[test]
    fn test_load_roster_drops_rows_without_group() {
        let dir = TempDir::new().unwrap();
        let path = create_roster_path(&dir);
        write_roster(
            &path,
            &TUP_HEADERS,
            &[
                ["Novák", "Jan", "1", "Brno", "", "A"],
                ["", "", "", "", "", ""],
                ["Černý", "Eva", "2", "Praha", "", ""],
                ["Malý", "Ota", "3", "Zlín 760 01", "", "A"],
            ],
        );

        let (roster, dict_groups) =
            load_roster_groups(&path, &derive_default_roster_columns()).unwrap();

        assert_eq!(roster.cnt_rows_skipped, 1);
        assert_eq!(roster.warnings.len(), 1);
        assert!(roster.warnings[0].contains("Row 4"));
        assert_eq!(dict_groups.len(), 1);
        let l_names: Vec<&str> = dict_groups["A"]
            .iter()
            .map(|r| r.last_name.as_str())
            .collect();
        assert_eq!(l_names, vec!["Novák", "Malý"]);
    }

    #[test]
    fn test_load_roster_with_header_only_is_empty() {
        let dir = TempDir::new().unwrap();
        let path = create_roster_path(&dir);
        write_roster(&path, &TUP_HEADERS, &[]);

        let roster = load_roster(&path, &derive_default_roster_columns()).unwrap();

        assert_eq!(roster.cnt_rows_read, 0);
        assert!(roster.records.is_empty());
    }

    #[test]
    fn test_load_roster_missing_file_is_input_not_found() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing.xlsx");

        let err = load_roster(&path, &derive_default_roster_columns()).unwrap_err();

        assert!(matches!(err, FormGenError::InputNotFound(p) if p == path));
    }

    #[test]
    fn test_load_roster_missing_column_is_input_format_error() {
        let dir = TempDir::new().unwrap();
        let path = create_roster_path(&dir);
        write_roster(
            &path,
            &TUP_HEADERS[..5],
            &[["Novák", "Jan", "1", "Brno", "", ""]],
        );

        let err = load_roster(&path, &derive_default_roster_columns()).unwrap_err();

        match err {
            FormGenError::InputFormat { message, .. } => {
                assert!(message.contains("Performance group"), "{message}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_load_roster_unreadable_file_is_input_format_error() {
        let dir = TempDir::new().unwrap();
        let path = create_roster_path(&dir);
        std::fs::write(&path, b"not a workbook").unwrap();

        let err = load_roster(&path, &derive_default_roster_columns()).unwrap_err();

        assert!(matches!(err, FormGenError::InputFormat { .. }));
    }

    #[test]
    fn test_derive_text_from_data() {
        assert_eq!(derive_text_from_data(&Data::Empty), None);
        assert_eq!(derive_text_from_data(&Data::String("  ".to_string())), None);
        assert_eq!(
            derive_text_from_data(&Data::String(" A ".to_string())),
            Some("A".to_string())
        );
        assert_eq!(
            derive_text_from_data(&Data::Float(625.0)),
            Some("625".to_string())
        );
        assert_eq!(
            derive_text_from_data(&Data::Float(2.5)),
            Some("2.5".to_string())
        );
        assert_eq!(derive_text_from_data(&Data::Int(7)), Some("7".to_string()));
    }
}
