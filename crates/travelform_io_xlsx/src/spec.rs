//! Shared roster/form specification models, reports and error types.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use chrono::NaiveDate;

////////////////////////////////////////////////////////////////////////////////
// #region CellFormatSpecification

/// Cell format specification with right-side overlay semantics.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SpecCellFormat {
    /// Font family name.
    pub font_name: Option<String>,
    /// Font size in points.
    pub font_size: Option<i64>,
    /// Bold style.
    pub bold: Option<bool>,
    /// Italic style.
    pub italic: Option<bool>,

    /// Horizontal alignment.
    pub align: Option<String>,
    /// Vertical alignment.
    pub valign: Option<String>,
    /// Text wrap.
    pub text_wrap: Option<bool>,
    /// Bottom border override.
    pub bottom: Option<i64>,

    /// Number format code.
    pub num_format: Option<String>,
}

impl SpecCellFormat {
    /// Return a new format by overlaying `patch` onto `self`.
    pub fn with_(&self, patch: SpecCellFormat) -> SpecCellFormat {
        self.merge(&patch)
    }

    /// Merge two formats with right-side non-`None` overwrite semantics.
    pub fn merge(&self, other: &SpecCellFormat) -> SpecCellFormat {
        SpecCellFormat {
            font_name: other.font_name.clone().or_else(|| self.font_name.clone()),
            font_size: other.font_size.or(self.font_size),
            bold: other.bold.or(self.bold),
            italic: other.italic.or(self.italic),
            align: other.align.clone().or_else(|| self.align.clone()),
            valign: other.valign.clone().or_else(|| self.valign.clone()),
            text_wrap: other.text_wrap.or(self.text_wrap),
            bottom: other.bottom.or(self.bottom),
            num_format: other.num_format.clone().or_else(|| self.num_format.clone()),
        }
    }
}

/// Named format presets used by the form writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecFormFormats {
    /// Sheet title on row 1.
    pub fmt_title: SpecCellFormat,
    /// Static label cells.
    pub fmt_label: SpecCellFormat,
    /// Participant/event text cells.
    pub fmt_text: SpecCellFormat,
    /// Event date cells.
    pub fmt_date: SpecCellFormat,
    /// Multi-line certification text.
    pub fmt_note: SpecCellFormat,
    /// Live formula cells.
    pub fmt_formula: SpecCellFormat,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region RosterSpecification

/// One participant, read from one roster row.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecParticipantRecord {
    /// Family name.
    pub last_name: String,
    /// Given name.
    pub first_name: String,
    /// Identity document number, kept as text.
    pub id_number: String,
    /// Free-text home address.
    pub address: String,
    /// Driver's car license plate.
    pub license_plate: String,
    /// Performance group key.
    pub group: String,
    /// 1-based source row in the roster sheet.
    pub n_row_source: usize,
}

impl SpecParticipantRecord {
    /// Read one participant field by selector.
    pub fn field(&self, field: EnumParticipantField) -> &str {
        match field {
            EnumParticipantField::LastName => &self.last_name,
            EnumParticipantField::FirstName => &self.first_name,
            EnumParticipantField::IdNumber => &self.id_number,
            EnumParticipantField::Address => &self.address,
            EnumParticipantField::LicensePlate => &self.license_plate,
            EnumParticipantField::Group => &self.group,
        }
    }
}

/// Participant field selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EnumParticipantField {
    /// [`SpecParticipantRecord::last_name`].
    LastName,
    /// [`SpecParticipantRecord::first_name`].
    FirstName,
    /// [`SpecParticipantRecord::id_number`].
    IdNumber,
    /// [`SpecParticipantRecord::address`].
    Address,
    /// [`SpecParticipantRecord::license_plate`].
    LicensePlate,
    /// [`SpecParticipantRecord::group`].
    Group,
}

/// Roster header names for each required column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecRosterColumns {
    /// Source sheet; first sheet when `None`.
    pub sheet_name: Option<String>,
    pub col_last_name: String,
    pub col_first_name: String,
    pub col_id_number: String,
    pub col_address: String,
    pub col_license_plate: String,
    pub col_group: String,
}

impl SpecRosterColumns {
    /// Required header names paired with the field each one fills.
    pub fn required(&self) -> [(EnumParticipantField, &str); 6] {
        [
            (EnumParticipantField::LastName, self.col_last_name.as_str()),
            (EnumParticipantField::FirstName, self.col_first_name.as_str()),
            (EnumParticipantField::IdNumber, self.col_id_number.as_str()),
            (EnumParticipantField::Address, self.col_address.as_str()),
            (
                EnumParticipantField::LicensePlate,
                self.col_license_plate.as_str(),
            ),
            (EnumParticipantField::Group, self.col_group.as_str()),
        ]
    }
}

/// Loader output: records in source order plus diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecRosterLoad {
    /// Sheet actually read.
    pub sheet_name: String,
    /// Data rows seen below the header (blank rows included).
    pub cnt_rows_read: usize,
    /// Non-blank rows dropped because they lack a group value.
    pub cnt_rows_skipped: usize,
    /// Loaded participants, source order.
    pub records: Vec<SpecParticipantRecord>,
    /// Non-fatal warnings.
    pub warnings: Vec<String>,
}

/// Ordered `group key -> participants` mapping.
pub type TypeRosterGroups = BTreeMap<String, Vec<SpecParticipantRecord>>;

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region FormLayoutSpecification

/// Live formula kinds embedded in a form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumFormFormula {
    /// Outbound km plus return km.
    TotalKm,
    /// Return leg mirrors the outbound km.
    ReturnKm,
    /// Total km times the per-kilometer rate.
    Amount,
}

/// What goes into one layout cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumLayoutContent {
    /// Static text.
    Label(&'static str),
    /// Multi-line static text written with the wrapped note format.
    Note(&'static str),
    /// Participant field text.
    Field(EnumParticipantField),
    /// Postal code extracted from the participant address.
    PostalCode,
    /// [`SpecEventConfig::venue`].
    EventVenue,
    /// [`SpecEventConfig::event_name`].
    EventName,
    /// [`SpecEventConfig::event_date`] as a spreadsheet date.
    EventDate,
    /// [`SpecEventConfig::currency_unit`].
    CurrencyUnit,
    /// Spreadsheet formula.
    Formula(EnumFormFormula),
}

/// One cell of the fixed form template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecLayoutCell {
    /// Row offset from the form start row.
    pub n_row_offset: usize,
    /// 1-based column number.
    pub n_col: usize,
    /// Cell content.
    pub content: EnumLayoutContent,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region RunConfiguration

/// Static event information printed on every form.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecEventConfig {
    /// Organizing club, used in the sheet title.
    pub club_name: String,
    /// Venue description.
    pub venue: String,
    /// Event name.
    pub event_name: String,
    /// Event date.
    pub event_date: NaiveDate,
    /// Reimbursement per kilometer.
    pub rate_per_km: f64,
    /// Currency unit printed next to the amount.
    pub currency_unit: String,
}

/// Full immutable configuration for one generator run.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecFormRunConfig {
    /// Roster workbook.
    pub path_file_in: PathBuf,
    /// Generated workbook.
    pub path_file_out: PathBuf,
    /// Roster header names.
    pub roster_columns: SpecRosterColumns,
    /// Event information.
    pub event: SpecEventConfig,
    /// Cell format presets.
    pub formats: SpecFormFormats,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ReportSpecification

/// One generated group sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecFormSheetReport {
    /// Actual unique sheet name in workbook.
    pub sheet_name: String,
    /// Group key the sheet was built from.
    pub group_key: String,
    /// Number of forms rendered.
    pub cnt_forms: usize,
    /// 1-based row where the first form starts.
    pub n_row_first: usize,
    /// 1-based row following the last form.
    pub n_row_next: usize,
}

/// Aggregate report of one generator run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecFormReport {
    /// Output workbook path.
    pub path_file_out: PathBuf,
    /// Data rows read from the roster.
    pub cnt_rows_read: usize,
    /// Rows dropped by the loader.
    pub cnt_rows_skipped: usize,
    /// Group sheets in output order.
    pub sheets: Vec<SpecFormSheetReport>,
    /// Non-fatal warnings.
    pub warnings: Vec<String>,
}

impl SpecFormReport {
    /// Add a warning message.
    pub fn warn(&mut self, msg: impl AsRef<str>) {
        self.warnings.push(msg.as_ref().to_string());
    }

    /// Total forms across all sheets.
    pub fn form_count(&self) -> usize {
        self.sheets.iter().map(|sheet| sheet.cnt_forms).sum()
    }

    /// Number of group sheets.
    pub fn group_count(&self) -> usize {
        self.sheets.len()
    }

    /// Machine-readable counters.
    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        let mut dict_counts = BTreeMap::new();
        dict_counts.insert("cnt_rows_read".to_string(), self.cnt_rows_read as u64);
        dict_counts.insert("cnt_rows_skipped".to_string(), self.cnt_rows_skipped as u64);
        dict_counts.insert("cnt_groups".to_string(), self.group_count() as u64);
        dict_counts.insert("cnt_forms".to_string(), self.form_count() as u64);
        dict_counts.insert("cnt_warnings".to_string(), self.warnings.len() as u64);
        dict_counts
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        let dict_counts = self.to_dict();
        format!(
            "{prefix} {} forms in {} groups (rows={} skipped={} warnings={}) -> {}",
            dict_counts["cnt_forms"],
            dict_counts["cnt_groups"],
            dict_counts["cnt_rows_read"],
            dict_counts["cnt_rows_skipped"],
            dict_counts["cnt_warnings"],
            self.path_file_out.display()
        )
    }
}

impl fmt::Display for SpecFormReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[FORMS]"))
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Errors

/// Run-aborting failures. Nothing is retried.
#[derive(Debug)]
pub enum FormGenError {
    /// Roster path does not resolve to a file.
    InputNotFound(PathBuf),
    /// Roster cannot be read or lacks required columns.
    InputFormat {
        /// Roster path.
        path: PathBuf,
        /// Underlying reason.
        message: String,
    },
    /// Output workbook could not be built or saved.
    OutputWrite {
        /// Output path.
        path: PathBuf,
        /// Underlying reason.
        message: String,
    },
    /// Static configuration is unusable.
    InvalidConfig(String),
}

impl fmt::Display for FormGenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InputNotFound(path) => {
                write!(f, "Input file not found: {}", path.display())
            }
            Self::InputFormat { path, message } => {
                write!(f, "Invalid input file {}: {message}", path.display())
            }
            Self::OutputWrite { path, message } => {
                write!(f, "Failed to write output {}: {message}", path.display())
            }
            Self::InvalidConfig(msg) => write!(f, "Invalid configuration: {msg}"),
        }
    }
}

impl std::error::Error for FormGenError {}

// #endregion
////////////////////////////////////////////////////////////////////////////////
