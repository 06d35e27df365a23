//! Form constants, the fixed form layout and default preset factories.

use std::path::PathBuf;

use chrono::NaiveDate;

use crate::spec::{
    EnumFormFormula, EnumLayoutContent, EnumParticipantField, FormGenError, SpecCellFormat,
    SpecEventConfig, SpecFormFormats, SpecFormRunConfig, SpecLayoutCell, SpecRosterColumns,
};

////////////////////////////////////////////////////////////////////////////////
// #region ExcelLimits

/// Excel worksheet maximum row count.
pub const N_NROWS_EXCEL_MAX: usize = 1_048_576;
/// Excel sheet name maximum length.
pub const N_LEN_EXCEL_SHEET_NAME_MAX: usize = 31;
/// Characters not allowed in sheet names.
pub const TUP_EXCEL_ILLEGAL: [&str; 7] = ["*", ":", "?", "/", "\\", "[", "]"];

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SheetGeometry

/// Row holding the sheet title.
pub const N_ROW_TITLE: usize = 1;
/// Row where the first form of a sheet starts.
pub const N_ROW_FORM_FIRST: usize = 2;
/// Rows consumed by one form; the renderer returns `start + N_ROWS_FORM`.
pub const N_ROWS_FORM: usize = 12;

/// Column where the outbound/return km are entered by hand.
pub const N_COL_KM: usize = 6;
/// Column holding the total km formula.
pub const N_COL_KM_TOTAL: usize = 7;
/// Column holding the amount formula.
pub const N_COL_AMOUNT: usize = 9;

/// Row offset of the outbound leg (manual km entry, total km formula).
pub const N_OFFSET_KM_OUTBOUND: usize = 7;
/// Row offset of the return leg km formula.
pub const N_OFFSET_KM_RETURN: usize = 10;
/// Row offset of the amount formula.
pub const N_OFFSET_AMOUNT: usize = 12;

/// Column widths applied to every group sheet, `(1-based column, width)`.
pub const TUP_FORM_COLUMN_WIDTHS: [(usize, f64); 10] = [
    (1, 13.0),
    (2, 24.0),
    (3, 12.0),
    (4, 26.0),
    (5, 8.0),
    (6, 9.0),
    (7, 10.0),
    (8, 16.0),
    (9, 30.0),
    (10, 6.0),
];

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region FormLabels

pub const C_LABEL_PLACE: &str = "Place:";
pub const C_LABEL_DATE: &str = "Date:";
pub const C_LABEL_LAST_NAME: &str = "Last name:";
pub const C_LABEL_FIRST_NAME: &str = "First name:";
pub const C_LABEL_ADDRESS: &str = "Address:";
pub const C_LABEL_POSTAL_CODE: &str = "Postal code:";
pub const C_LABEL_ID_NUMBER: &str = "ID No.:";
pub const C_LABEL_ROUTE: &str = "Departure - destination";
pub const C_LABEL_RETURN_LEG: &str = "Return leg";
pub const C_LABEL_KM: &str = "km";
pub const C_LABEL_KM_TOTAL: &str = "Total km";
pub const C_LABEL_PLATE: &str = "Plate";
pub const C_LABEL_FELLOW_TRAVELER: &str = "Fellow traveler:";
pub const C_LABEL_SIGNED_BY: &str = "Signature of responsible officer";
pub const C_LABEL_SIGNATURE_DATE: &str = "Date";
pub const C_LABEL_SIGNATURE_CLAIMANT: &str = "Signature of claimant - recipient";
pub const C_LABEL_TOTAL: &str = "Total:";
pub const C_LABEL_IN_WORDS: &str = "In words:";
pub const C_SIGNATURE_LINE: &str = "……………………………………………";
pub const C_CERTIFICATION: &str = "I hereby confirm that the details above are correct and that I was\n\
                                   paid a contribution towards travel costs by private car:";

/// Prefix of every group sheet name.
pub const C_SHEET_NAME_PREFIX: &str = "Group";
/// Prefix of the row-1 sheet title; the club name follows.
pub const C_SHEET_TITLE_PREFIX: &str = "Travel expense reimbursement -";

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region FormLayout

const fn cell(n_row_offset: usize, n_col: usize, content: EnumLayoutContent) -> SpecLayoutCell {
    SpecLayoutCell {
        n_row_offset,
        n_col,
        content,
    }
}

/// Every written cell of one form, relative to the form start row.
///
/// Offsets 0 and 1 are blank spacing; offset 5 is a blank separator.
pub const TUP_FORM_LAYOUT: [SpecLayoutCell; 36] = {
    use EnumLayoutContent::{
        CurrencyUnit, EventDate, EventName, EventVenue, Field, Formula, Label, Note, PostalCode,
    };
    use EnumParticipantField::{Address, FirstName, IdNumber, LastName, LicensePlate};
    [
        cell(2, 1, Label(C_LABEL_PLACE)),
        cell(2, 3, EventVenue),
        cell(2, 8, Label(C_SIGNATURE_LINE)),
        cell(3, 4, EventName),
        cell(3, 7, Label(C_LABEL_SIGNED_BY)),
        cell(4, 1, Label(C_LABEL_DATE)),
        cell(4, 3, EventDate),
        cell(6, 1, Label(C_LABEL_LAST_NAME)),
        cell(6, 2, Field(LastName)),
        cell(6, 4, Label(C_LABEL_ROUTE)),
        cell(6, N_COL_KM, Label(C_LABEL_KM)),
        cell(6, N_COL_KM_TOTAL, Label(C_LABEL_KM_TOTAL)),
        cell(6, 8, Label(C_LABEL_PLATE)),
        cell(6, 9, Label(C_LABEL_FELLOW_TRAVELER)),
        cell(
            N_OFFSET_KM_OUTBOUND,
            N_COL_KM_TOTAL,
            Formula(EnumFormFormula::TotalKm),
        ),
        cell(N_OFFSET_KM_OUTBOUND, 8, Field(LicensePlate)),
        cell(8, 1, Label(C_LABEL_FIRST_NAME)),
        cell(8, 2, Field(FirstName)),
        cell(9, 1, Label(C_LABEL_ADDRESS)),
        cell(9, 2, Field(Address)),
        cell(9, 4, Label(C_LABEL_RETURN_LEG)),
        cell(9, N_COL_KM, Label(C_LABEL_KM)),
        cell(9, 8, EventDate),
        cell(9, 9, Label(C_SIGNATURE_LINE)),
        cell(
            N_OFFSET_KM_RETURN,
            N_COL_KM,
            Formula(EnumFormFormula::ReturnKm),
        ),
        cell(11, 8, Label(C_LABEL_SIGNATURE_DATE)),
        cell(11, 9, Label(C_LABEL_SIGNATURE_CLAIMANT)),
        cell(N_OFFSET_AMOUNT, 1, Label(C_LABEL_POSTAL_CODE)),
        cell(N_OFFSET_AMOUNT, 2, PostalCode),
        cell(N_OFFSET_AMOUNT, 4, Note(C_CERTIFICATION)),
        cell(N_OFFSET_AMOUNT, 8, Label(C_LABEL_TOTAL)),
        cell(
            N_OFFSET_AMOUNT,
            N_COL_AMOUNT,
            Formula(EnumFormFormula::Amount),
        ),
        cell(N_OFFSET_AMOUNT, 10, CurrencyUnit),
        cell(13, 1, Label(C_LABEL_ID_NUMBER)),
        cell(13, 2, Field(IdNumber)),
        cell(13, 4, Label(C_LABEL_IN_WORDS)),
    ]
};

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region DefaultPresets

/// Default roster workbook.
pub const C_FILE_IN_DEFAULT: &str = "roster.xlsx";
/// Default generated workbook.
pub const C_FILE_OUT_DEFAULT: &str = "travel_expense_forms.xlsx";

pub const C_CLUB_NAME_DEFAULT: &str = "SK Moravia Brno";
pub const C_VENUE_DEFAULT: &str = "Brno, 23rd wheelchair table tennis tournament";
pub const C_EVENT_NAME_DEFAULT: &str = "„Memoriál Vojtěcha Vašíčka\"";
/// ISO `YYYY-MM-DD`.
pub const C_EVENT_DATE_DEFAULT: &str = "2025-11-08";
pub const N_RATE_PER_KM_DEFAULT: f64 = 2.0;
pub const C_CURRENCY_UNIT_DEFAULT: &str = "Kč";

/// Date format of the event date cells.
pub const C_NUM_FORMAT_DATE: &str = "dd.mm.yyyy";

/// Parse an ISO `YYYY-MM-DD` event date.
pub fn parse_event_date(date_iso: &str) -> Result<NaiveDate, FormGenError> {
    NaiveDate::parse_from_str(date_iso.trim(), "%Y-%m-%d").map_err(|err| {
        FormGenError::InvalidConfig(format!("event date {date_iso:?} is not YYYY-MM-DD: {err}"))
    })
}

/// Build default roster header names.
pub fn derive_default_roster_columns() -> SpecRosterColumns {
    SpecRosterColumns {
        sheet_name: None,
        col_last_name: "Last name".to_string(),
        col_first_name: "First name".to_string(),
        col_id_number: "ID number".to_string(),
        col_address: "Address".to_string(),
        col_license_plate: "Driver's license plate".to_string(),
        col_group: "Performance group".to_string(),
    }
}

/// Build default event information.
pub fn derive_default_event_config() -> Result<SpecEventConfig, FormGenError> {
    Ok(SpecEventConfig {
        club_name: C_CLUB_NAME_DEFAULT.to_string(),
        venue: C_VENUE_DEFAULT.to_string(),
        event_name: C_EVENT_NAME_DEFAULT.to_string(),
        event_date: parse_event_date(C_EVENT_DATE_DEFAULT)?,
        rate_per_km: N_RATE_PER_KM_DEFAULT,
        currency_unit: C_CURRENCY_UNIT_DEFAULT.to_string(),
    })
}

/// Build default named format presets used by [`crate::writer::FormWriter`].
pub fn derive_default_form_formats() -> SpecFormFormats {
    let cfg_base_fmt_spec = SpecCellFormat {
        font_name: Some("Times New Roman".to_string()),
        font_size: Some(11),
        align: Some("left".to_string()),
        valign: Some("vcenter".to_string()),
        ..Default::default()
    };

    SpecFormFormats {
        fmt_title: cfg_base_fmt_spec.with_(SpecCellFormat {
            font_size: Some(14),
            bold: Some(true),
            ..Default::default()
        }),
        fmt_label: cfg_base_fmt_spec.with_(SpecCellFormat {
            bold: Some(true),
            ..Default::default()
        }),
        fmt_text: cfg_base_fmt_spec.clone(),
        fmt_date: cfg_base_fmt_spec.with_(SpecCellFormat {
            num_format: Some(C_NUM_FORMAT_DATE.to_string()),
            ..Default::default()
        }),
        fmt_note: cfg_base_fmt_spec.with_(SpecCellFormat {
            font_size: Some(9),
            text_wrap: Some(true),
            ..Default::default()
        }),
        fmt_formula: cfg_base_fmt_spec.with_(SpecCellFormat {
            align: Some("right".to_string()),
            ..Default::default()
        }),
    }
}

/// Build the default run configuration.
pub fn derive_default_run_config() -> Result<SpecFormRunConfig, FormGenError> {
    Ok(SpecFormRunConfig {
        path_file_in: PathBuf::from(C_FILE_IN_DEFAULT),
        path_file_out: PathBuf::from(C_FILE_OUT_DEFAULT),
        roster_columns: derive_default_roster_columns(),
        event: derive_default_event_config()?,
        formats: derive_default_form_formats(),
    })
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    #[test]
    fn test_form_layout_stays_inside_one_form() {
        for spec_cell in TUP_FORM_LAYOUT {
            assert!(spec_cell.n_row_offset >= 2, "{spec_cell:?}");
            assert!(spec_cell.n_row_offset < 2 + N_ROWS_FORM, "{spec_cell:?}");
            assert!(spec_cell.n_col >= 1 && spec_cell.n_col <= 10, "{spec_cell:?}");
        }
    }

    #[test]
    fn test_form_layout_has_no_duplicate_cells() {
        let set_cells: BTreeSet<(usize, usize)> = TUP_FORM_LAYOUT
            .iter()
            .map(|spec_cell| (spec_cell.n_row_offset, spec_cell.n_col))
            .collect();
        assert_eq!(set_cells.len(), TUP_FORM_LAYOUT.len());
    }

    #[test]
    fn test_form_layout_leaves_separator_row_blank() {
        assert!(
            TUP_FORM_LAYOUT
                .iter()
                .all(|spec_cell| spec_cell.n_row_offset != 5)
        );
    }

    #[test]
    fn test_parse_event_date() {
        let date = parse_event_date("2025-11-08").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2025, 11, 8).unwrap());
        assert!(matches!(
            parse_event_date("08.11.2025"),
            Err(FormGenError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_default_run_config_builds() {
        let cfg = derive_default_run_config().unwrap();
        assert_eq!(cfg.event.rate_per_km, 2.0);
        assert_eq!(cfg.roster_columns.required().len(), 6);
        assert_eq!(cfg.formats.fmt_note.text_wrap, Some(true));
    }
}
