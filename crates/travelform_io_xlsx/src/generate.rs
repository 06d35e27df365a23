//! Run orchestration: load roster, render group sheets, save workbook.

use tracing::info;

use crate::reader::load_roster_groups;
use crate::spec::{FormGenError, SpecFormReport, SpecFormRunConfig};
use crate::writer::FormWriter;

/// Generate the travel-expense workbook described by `spec_run`.
///
/// This function performs:
/// 1. Configuration validation.
/// 2. Roster loading and stable partition by group key.
/// 3. One sheet per group in ascending key order, forms stacked from row 2.
/// 4. Saving the workbook (input is fully read before the output is written).
///
/// Any failure aborts the run; a partially written output must be discarded.
pub fn generate_forms(spec_run: &SpecFormRunConfig) -> Result<SpecFormReport, FormGenError> {
    validate_run_config(spec_run)?;

    info!("Loading roster from {}", spec_run.path_file_in.display());
    let (roster, dict_groups) =
        load_roster_groups(&spec_run.path_file_in, &spec_run.roster_columns)?;

    let mut report = SpecFormReport {
        path_file_out: spec_run.path_file_out.clone(),
        cnt_rows_read: roster.cnt_rows_read,
        cnt_rows_skipped: roster.cnt_rows_skipped,
        ..Default::default()
    };
    for c_warning in &roster.warnings {
        report.warn(c_warning);
    }

    let mut writer = FormWriter::new(
        spec_run.path_file_out.clone(),
        spec_run.event.clone(),
        &spec_run.formats,
    );
    for (group_key, l_records) in &dict_groups {
        writer.write_group_sheet(group_key, l_records)?;
    }

    info!("Saving to {}", writer.file_out());
    writer.close()?;
    report.sheets = writer.report();

    info!(
        forms = report.form_count(),
        groups = report.group_count(),
        "Done"
    );
    Ok(report)
}

fn validate_run_config(spec_run: &SpecFormRunConfig) -> Result<(), FormGenError> {
    if !spec_run.event.rate_per_km.is_finite() || spec_run.event.rate_per_km < 0.0 {
        return Err(FormGenError::InvalidConfig(format!(
            "rate_per_km must be a finite number >= 0, got {}",
            spec_run.event.rate_per_km
        )));
    }
    if spec_run.path_file_in == spec_run.path_file_out {
        return Err(FormGenError::InvalidConfig(format!(
            "input and output paths must differ: {}",
            spec_run.path_file_in.display()
        )));
    }
    Ok(())
}
