//! `travelform_io_xlsx` v1:
//! Travel-expense form generator kernel.
//!
//! - `conf`     : constants, form layout and default presets
//! - `spec`     : records/configs/reports/errors
//! - `util`     : pure helper functions
//! - `reader`   : roster loader
//! - `writer`   : form renderer and workbook writer
//! - `generate` : run orchestration
pub mod conf;
pub mod generate;
pub mod reader;
pub mod spec;
pub mod util;
pub mod writer;

pub use conf::{
    N_ROW_FORM_FIRST, N_ROWS_FORM, TUP_FORM_LAYOUT, derive_default_event_config,
    derive_default_form_formats, derive_default_roster_columns, derive_default_run_config,
    parse_event_date,
};
pub use generate::generate_forms;
pub use reader::{load_roster, load_roster_groups};
pub use spec::{
    EnumFormFormula, EnumLayoutContent, EnumParticipantField, FormGenError, SpecCellFormat,
    SpecEventConfig, SpecFormFormats, SpecFormReport, SpecFormRunConfig, SpecFormSheetReport,
    SpecLayoutCell, SpecParticipantRecord, SpecRosterColumns, SpecRosterLoad, TypeRosterGroups,
};
pub use util::{extract_postal_code, partition_by_group};
pub use writer::{FormWriter, SpecFormFormatSet, render_form};
