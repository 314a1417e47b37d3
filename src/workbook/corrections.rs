use crate::dataset::Table;
use crate::utils::{RefineryError, Result};
use crate::workbook::{SheetStore, WorkbookLayout};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

const REQUIRED_CORRECTION_COLUMNS: [&str; 3] = ["_uuid", "Question", "new_value"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ApplyMode {
    /// Corrections with an empty `new_value` are skipped.
    #[default]
    NewValueOnly,
    /// Empty `new_value` clears the cell.
    Overwrite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ApplyOptions {
    #[serde(default)]
    pub mode: ApplyMode,
    /// Ignore correction rows without a `new_value`.
    #[serde(default = "default_only_pending")]
    pub only_pending: bool,
}

fn default_only_pending() -> bool {
    true
}

impl Default for ApplyOptions {
    fn default() -> Self {
        Self {
            mode: ApplyMode::default(),
            only_pending: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CorrectionChange {
    pub uuid: String,
    pub question: String,
    pub old_value_sample: String,
    pub new_value: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct ApplyReport {
    pub total_corrections: usize,
    pub pending_corrections: usize,
    pub applied_cells: usize,
    pub applied_rows: usize,
    pub skipped: usize,
    pub changes: Vec<CorrectionChange>,
    pub errors: Vec<String>,
    /// Set by `sync_corrections` once the data tab has been written back.
    pub written_back: bool,
}

/// Patches `data` in place from a correction log keyed by `_uuid` and column name.
pub fn apply_corrections(
    data: &mut Table,
    corrections: &Table,
    options: ApplyOptions,
) -> Result<ApplyReport> {
    let uuid_idx = data
        .headers
        .iter()
        .position(|h| h.starts_with("_uuid"))
        .ok_or_else(|| {
            RefineryError::ValidationError("Data_Set does not have a _uuid column.".to_string())
        })?;

    let missing: Vec<&str> = REQUIRED_CORRECTION_COLUMNS
        .iter()
        .copied()
        .filter(|c| corrections.column_index(c).is_none())
        .collect();
    if !missing.is_empty() {
        return Err(RefineryError::ValidationError(format!(
            "Correction_Log is missing required columns: {:?}",
            missing
        )));
    }

    let corr_uuid = corrections.require_column("_uuid")?;
    let corr_question = corrections.require_column("Question")?;
    let corr_new = corrections.require_column("new_value")?;

    let pending: Vec<&Vec<String>> = corrections
        .rows
        .iter()
        .filter(|r| !options.only_pending || !r[corr_new].trim().is_empty())
        .collect();

    let mut report = ApplyReport {
        total_corrections: corrections.row_count(),
        pending_corrections: pending.len(),
        ..Default::default()
    };

    for correction in pending {
        let uuid = correction[corr_uuid].trim();
        let question = correction[corr_question].trim();
        let new_value = correction[corr_new].trim();

        if options.mode == ApplyMode::NewValueOnly && new_value.is_empty() {
            report.skipped += 1;
            continue;
        }

        let Some(question_idx) = data.column_index(question) else {
            report
                .errors
                .push(format!("Column not found in Data_Set: {}", question));
            continue;
        };

        let mut old_values = Vec::new();
        for row in data.rows.iter_mut().filter(|r| r[uuid_idx].trim() == uuid) {
            old_values.push(std::mem::replace(&mut row[question_idx], new_value.to_string()));
        }

        if old_values.is_empty() {
            report
                .errors
                .push(format!("_uuid not found in Data_Set: {}", uuid));
            continue;
        }

        report.applied_rows += old_values.len();
        report.applied_cells += old_values.len();
        report.changes.push(CorrectionChange {
            uuid: uuid.to_string(),
            question: question.to_string(),
            old_value_sample: old_values.swap_remove(0),
            new_value: new_value.to_string(),
        });
    }

    Ok(report)
}

/// Loads both tabs, applies the log and writes the data tab back when something changed.
pub fn sync_corrections(
    store: &dyn SheetStore,
    layout: &WorkbookLayout,
    options: ApplyOptions,
    confirm: bool,
) -> Result<ApplyReport> {
    if !confirm {
        return Err(RefineryError::ValidationError(
            "Refusing to update the workbook without confirmation".to_string(),
        ));
    }

    let mut data = store.read_sheet(&layout.data_sheet)?;
    if data.is_empty() {
        return Err(RefineryError::ValidationError(format!(
            "{} is empty.",
            layout.data_sheet
        )));
    }
    let corrections = store.read_sheet(&layout.correction_sheet)?;
    if corrections.is_empty() {
        return Err(RefineryError::ValidationError(format!(
            "{} is empty or has no data.",
            layout.correction_sheet
        )));
    }

    let mut report = apply_corrections(&mut data, &corrections, options)?;

    for error in report.errors.iter().take(20) {
        warn!(error = %error, "Correction not applied");
    }

    if report.applied_cells > 0 {
        store.write_sheet(&layout.data_sheet, &data)?;
        report.written_back = true;
    }

    info!(
        applied_cells = report.applied_cells,
        errors = report.errors.len(),
        written_back = report.written_back,
        "Correction log synced"
    );

    Ok(report)
}
