//! Form renderer and the workbook writer that stacks forms into group sheets.

use std::collections::BTreeSet;
use std::path::PathBuf;

use chrono::Datelike;
use rust_xlsxwriter::{ExcelDateTime, Format, FormatAlign, FormatBorder, Workbook, Worksheet, XlsxError};
use tracing::{debug, info};

use crate::conf::{
    C_SHEET_NAME_PREFIX, C_SHEET_TITLE_PREFIX, N_ROW_FORM_FIRST, N_ROW_TITLE, N_ROWS_FORM,
    TUP_FORM_COLUMN_WIDTHS, TUP_FORM_LAYOUT,
};
use crate::spec::{
    EnumLayoutContent, FormGenError, SpecCellFormat, SpecEventConfig, SpecFormFormats,
    SpecFormSheetReport, SpecParticipantRecord,
};
use crate::util::{
    cast_col_num, cast_row_num, derive_formula_text, derive_unique_sheet_name,
    extract_postal_code, sanitize_sheet_name,
};

/// Writer-ready formats built once from [`SpecFormFormats`].
#[derive(Debug, Clone)]
pub struct SpecFormFormatSet {
    pub fmt_title: Format,
    pub fmt_label: Format,
    pub fmt_text: Format,
    pub fmt_date: Format,
    pub fmt_note: Format,
    pub fmt_formula: Format,
}

impl SpecFormFormatSet {
    /// Convert format specs into `rust_xlsxwriter` formats.
    pub fn from_spec(formats: &SpecFormFormats) -> Self {
        Self {
            fmt_title: derive_rust_xlsx_format(&formats.fmt_title),
            fmt_label: derive_rust_xlsx_format(&formats.fmt_label),
            fmt_text: derive_rust_xlsx_format(&formats.fmt_text),
            fmt_date: derive_rust_xlsx_format(&formats.fmt_date),
            fmt_note: derive_rust_xlsx_format(&formats.fmt_note),
            fmt_formula: derive_rust_xlsx_format(&formats.fmt_formula),
        }
    }
}

/// Stateful workbook writer, one sheet per performance group.
pub struct FormWriter {
    path_file_out: PathBuf,
    workbook: Workbook,
    event: SpecEventConfig,
    formats: SpecFormFormatSet,
    set_sheet_names_existing: BTreeSet<String>,
    l_reports: Vec<SpecFormSheetReport>,
    if_closed: bool,
}

impl FormWriter {
    /// Create writer bound to output path, event information and formats.
    ///
    /// The workbook is buffered in memory until [`Self::close`] is called.
    pub fn new(path_file_out: PathBuf, event: SpecEventConfig, formats: &SpecFormFormats) -> Self {
        Self {
            path_file_out,
            workbook: Workbook::new(),
            event,
            formats: SpecFormFormatSet::from_spec(formats),
            set_sheet_names_existing: BTreeSet::new(),
            l_reports: Vec::new(),
            if_closed: false,
        }
    }

    /// Return output file path as string.
    pub fn file_out(&self) -> String {
        self.path_file_out.to_string_lossy().to_string()
    }

    /// Return snapshot of per-sheet reports.
    pub fn report(&self) -> Vec<SpecFormSheetReport> {
        self.l_reports.clone()
    }

    /// Flush workbook to disk. Idempotent.
    pub fn close(&mut self) -> Result<(), FormGenError> {
        if self.if_closed {
            return Ok(());
        }
        self.workbook
            .save(&self.path_file_out)
            .map_err(|err| self.derive_output_error(derive_xlsx_error_text(err)))?;
        self.if_closed = true;
        info!("Saved workbook {}", self.path_file_out.display());
        Ok(())
    }

    /// Add the sheet `Group <group_key>` and stack one form per record.
    pub fn write_group_sheet(
        &mut self,
        group_key: &str,
        records: &[SpecParticipantRecord],
    ) -> Result<SpecFormSheetReport, FormGenError> {
        if self.if_closed {
            return Err(self.derive_output_error("Cannot write after close().".to_string()));
        }
        let report = self
            .write_sheet(group_key, records)
            .map_err(|message| self.derive_output_error(message))?;
        self.l_reports.push(report.clone());
        Ok(report)
    }

    fn write_sheet(
        &mut self,
        group_key: &str,
        records: &[SpecParticipantRecord],
    ) -> Result<SpecFormSheetReport, String> {
        let sheet_name = derive_unique_sheet_name(
            &sanitize_sheet_name(&format!("{C_SHEET_NAME_PREFIX} {group_key}"), "_"),
            &mut self.set_sheet_names_existing,
        );
        info!(group = group_key, forms = records.len(), "Creating sheet {sheet_name:?}");

        let worksheet = self.workbook.add_worksheet();
        worksheet
            .set_name(&sheet_name)
            .map_err(derive_xlsx_error_text)?;

        for (n_col, n_width) in TUP_FORM_COLUMN_WIDTHS {
            worksheet
                .set_column_width(cast_col_num(n_col)?, n_width)
                .map_err(derive_xlsx_error_text)?;
        }

        worksheet
            .write_string_with_format(
                cast_row_num(N_ROW_TITLE)?,
                0,
                format!("{C_SHEET_TITLE_PREFIX} {}", self.event.club_name),
                &self.formats.fmt_title,
            )
            .map_err(derive_xlsx_error_text)?;

        let mut n_row_cursor = N_ROW_FORM_FIRST;
        for record in records {
            debug!(
                row = n_row_cursor,
                "  - {} {}", record.first_name, record.last_name
            );
            n_row_cursor =
                render_form(worksheet, n_row_cursor, record, &self.event, &self.formats)?;
        }

        Ok(SpecFormSheetReport {
            sheet_name,
            group_key: group_key.to_string(),
            cnt_forms: records.len(),
            n_row_first: N_ROW_FORM_FIRST,
            n_row_next: n_row_cursor,
        })
    }

    fn derive_output_error(&self, message: String) -> FormGenError {
        FormGenError::OutputWrite {
            path: self.path_file_out.clone(),
            message,
        }
    }
}

/// Write one participant's form into `worksheet` starting at 1-based row
/// `n_row_start`, following [`TUP_FORM_LAYOUT`].
///
/// Empty participant fields and an empty postal code leave their cells
/// untouched. Returns `n_row_start + N_ROWS_FORM`, the start row of the next
/// form.
pub fn render_form(
    worksheet: &mut Worksheet,
    n_row_start: usize,
    participant: &SpecParticipantRecord,
    event: &SpecEventConfig,
    formats: &SpecFormFormatSet,
) -> Result<usize, String> {
    let c_postal_code = extract_postal_code(&participant.address);
    let date_event = derive_excel_date(event)?;

    for spec_cell in TUP_FORM_LAYOUT {
        let n_row = cast_row_num(n_row_start + spec_cell.n_row_offset)?;
        let n_col = cast_col_num(spec_cell.n_col)?;

        let c_text = match spec_cell.content {
            EnumLayoutContent::Label(val) => Some((val.to_string(), &formats.fmt_label)),
            EnumLayoutContent::Note(val) => Some((val.to_string(), &formats.fmt_note)),
            EnumLayoutContent::Field(enum_field) => {
                Some((participant.field(enum_field).to_string(), &formats.fmt_text))
            }
            EnumLayoutContent::PostalCode => Some((c_postal_code.clone(), &formats.fmt_text)),
            EnumLayoutContent::EventVenue => {
                Some((format!(" {} ", event.venue), &formats.fmt_text))
            }
            EnumLayoutContent::EventName => {
                Some((format!(" {}", event.event_name), &formats.fmt_text))
            }
            EnumLayoutContent::CurrencyUnit => {
                Some((event.currency_unit.clone(), &formats.fmt_label))
            }
            EnumLayoutContent::EventDate => {
                worksheet
                    .write_datetime_with_format(n_row, n_col, &date_event, &formats.fmt_date)
                    .map_err(derive_xlsx_error_text)?;
                None
            }
            EnumLayoutContent::Formula(enum_formula) => {
                let c_formula = derive_formula_text(enum_formula, n_row_start, event.rate_per_km)?;
                worksheet
                    .write_formula_with_format(
                        n_row,
                        n_col,
                        c_formula.as_str(),
                        &formats.fmt_formula,
                    )
                    .map_err(derive_xlsx_error_text)?;
                None
            }
        };

        if let Some((c_value, fmt)) = c_text
            && !c_value.is_empty()
        {
            worksheet
                .write_string_with_format(n_row, n_col, c_value, fmt)
                .map_err(derive_xlsx_error_text)?;
        }
    }

    Ok(n_row_start + N_ROWS_FORM)
}

fn derive_excel_date(event: &SpecEventConfig) -> Result<ExcelDateTime, String> {
    let n_year = u16::try_from(event.event_date.year())
        .map_err(|_| format!("event year out of range: {}", event.event_date))?;
    ExcelDateTime::from_ymd(
        n_year,
        event.event_date.month() as u8,
        event.event_date.day() as u8,
    )
    .map_err(derive_xlsx_error_text)
}

fn derive_rust_xlsx_format(spec: &SpecCellFormat) -> Format {
    let mut format = Format::new();

    if let Some(val) = &spec.font_name {
        format = format.set_font_name(val.clone());
    }
    if let Some(val) = spec.font_size {
        format = format.set_font_size(val as f64);
    }
    if spec.bold.unwrap_or(false) {
        format = format.set_bold();
    }
    if spec.italic.unwrap_or(false) {
        format = format.set_italic();
    }

    if let Some(val) = &spec.align
        && let Some(align) = derive_format_align(val)
    {
        format = format.set_align(align);
    }
    if let Some(val) = &spec.valign
        && let Some(align) = derive_format_align(val)
    {
        format = format.set_align(align);
    }

    if let Some(val) = &spec.num_format {
        format = format.set_num_format(val.clone());
    }
    if let Some(val) = spec.bottom {
        format = format.set_border_bottom(derive_format_border(val));
    }
    if spec.text_wrap.unwrap_or(false) {
        format = format.set_text_wrap();
    }

    format
}

fn derive_format_border(border: i64) -> FormatBorder {
    match border {
        1 => FormatBorder::Thin,
        2 => FormatBorder::Medium,
        3 => FormatBorder::Dashed,
        4 => FormatBorder::Dotted,
        5 => FormatBorder::Thick,
        6 => FormatBorder::Double,
        7 => FormatBorder::Hair,
        _ => FormatBorder::None,
    }
}

fn derive_format_align(align: &str) -> Option<FormatAlign> {
    let value = align.trim().to_ascii_lowercase();
    match value.as_str() {
        "general" => Some(FormatAlign::General),
        "left" => Some(FormatAlign::Left),
        "center" => Some(FormatAlign::Center),
        "right" => Some(FormatAlign::Right),
        "justify" => Some(FormatAlign::Justify),
        "top" => Some(FormatAlign::Top),
        "bottom" => Some(FormatAlign::Bottom),
        "vcenter" | "vertical_center" => Some(FormatAlign::VerticalCenter),
        _ => None,
    }
}

fn derive_xlsx_error_text(err: XlsxError) -> String {
    format!("xlsx write error: {err}")
}
