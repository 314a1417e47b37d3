use crate::dataset::dates::parse_lenient_date;
use crate::dataset::reader::format_float;
use crate::dataset::{Table, WorkbookWriter};
use crate::utils::{RefineryError, Result};
use crate::workbook::{SheetStore, WorkbookLayout};
use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, warn};

pub const FILTERED_EXPORT_FILE: &str = "filtered_data_output.xlsx";
pub const FILTERED_EXPORT_SHEET: &str = "FilteredData";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct UpdateOptions {
    /// Append new records to the data tab; otherwise only filter.
    #[serde(default = "default_upload")]
    pub upload: bool,
}

fn default_upload() -> bool {
    true
}

impl Default for UpdateOptions {
    fn default() -> Self {
        Self { upload: true }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct UpdateReport {
    pub input_rows: usize,
    pub rows_on_or_after_start: usize,
    pub removed_by_list: usize,
    pub filtered_rows: usize,
    pub appended_rows: usize,
    pub already_present: usize,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct UpdateOutcome {
    pub report: UpdateReport,
    pub filtered: Table,
}

/// Date filter, remove-list exclusion and cell normalisation, without touching the store.
pub fn filter_upload(
    upload: &Table,
    date_column: &str,
    start_date: NaiveDate,
    remove_ids: &HashSet<String>,
    id_column: &str,
) -> Result<(Table, UpdateReport)> {
    let date_idx = upload.require_column(date_column)?;
    let parsed: Vec<Option<NaiveDate>> = upload
        .rows
        .iter()
        .map(|r| parse_lenient_date(&r[date_idx]))
        .collect();

    if parsed.iter().all(|d| d.is_none()) {
        return Err(RefineryError::ValidationError(format!(
            "Selected column '{}' does not contain valid date values",
            date_column
        )));
    }

    let mut filtered = Table::new(upload.headers.clone());
    for (row, date) in upload.rows.iter().zip(&parsed) {
        if let Some(date) = date.filter(|d| *d >= start_date) {
            let mut row = row.clone();
            row[date_idx] = date.format("%Y-%m-%d").to_string();
            filtered.push_row(row);
        }
    }
    let rows_on_or_after_start = filtered.row_count();

    if let Some(id_idx) = filtered.column_index(id_column) {
        filtered.retain_rows(|r| !remove_ids.contains(r[id_idx].trim()));
    }
    let removed_by_list = rows_on_or_after_start - filtered.row_count();

    normalize_numeric_columns(&mut filtered, date_idx);

    let report = UpdateReport {
        input_rows: upload.row_count(),
        rows_on_or_after_start,
        removed_by_list,
        filtered_rows: filtered.row_count(),
        ..Default::default()
    };
    Ok((filtered, report))
}

/// In columns whose every non-empty cell is numeric, integral decimals such as `5.0`
/// lose their fraction. Digit-only cells are left alone so codes keep leading zeros.
fn normalize_numeric_columns(table: &mut Table, skip: usize) {
    for col in 0..table.column_count() {
        if col == skip {
            continue;
        }
        let mut seen = false;
        let numeric = table.rows.iter().all(|r| {
            let v = r[col].trim();
            if v.is_empty() {
                return true;
            }
            seen = true;
            v.parse::<f64>().map(|f| f.is_finite()).unwrap_or(false)
        });
        if !numeric || !seen {
            continue;
        }
        for row in &mut table.rows {
            if let Some(clean) = integral_decimal(&row[col]) {
                row[col] = clean;
            }
        }
    }
}

fn integral_decimal(value: &str) -> Option<String> {
    let v = value.trim();
    if !v.contains(['.', 'e', 'E']) {
        return None;
    }
    let f = v.parse::<f64>().ok()?;
    (f.is_finite() && f.fract() == 0.0).then(|| format_float(f))
}

fn load_remove_ids(store: &dyn SheetStore, layout: &WorkbookLayout) -> HashSet<String> {
    match store.try_read_sheet(&layout.remove_sheet) {
        Ok(Some(sheet)) => match sheet.column_values(&layout.id_column) {
            Ok(values) => values.into_iter().map(|v| v.trim().to_string()).collect(),
            Err(_) => {
                warn!(
                    sheet = %layout.remove_sheet,
                    column = %layout.id_column,
                    "Remove list tab has no id column"
                );
                HashSet::new()
            }
        },
        Ok(None) => {
            warn!(sheet = %layout.remove_sheet, "Remove list tab not found");
            HashSet::new()
        }
        Err(e) => {
            warn!(sheet = %layout.remove_sheet, error = %e, "Could not read remove list");
            HashSet::new()
        }
    }
}

/// Filters an uploaded dataset and appends the records the data tab does not have yet.
pub fn update_dataset(
    store: &dyn SheetStore,
    layout: &WorkbookLayout,
    upload: &Table,
    date_column: &str,
    start_date: NaiveDate,
    options: UpdateOptions,
) -> Result<UpdateOutcome> {
    let remove_ids = load_remove_ids(store, layout);
    let (filtered, mut report) =
        filter_upload(upload, date_column, start_date, &remove_ids, &layout.id_column)?;

    if !options.upload {
        report.message = format!("{} rows kept after filtering", report.filtered_rows);
        return Ok(UpdateOutcome { report, filtered });
    }

    let upload_id_idx = filtered.column_index(&layout.id_column).ok_or_else(|| {
        RefineryError::ValidationError(format!(
            "Column '{}' not found in dataset",
            layout.id_column
        ))
    })?;

    let existing = store.try_read_sheet(&layout.data_sheet)?.map(|mut sheet| {
        sheet.dedupe_headers();
        sheet
    });
    let existing_ids: HashSet<String> = existing
        .as_ref()
        .and_then(|s| s.column_values(&layout.id_column).ok())
        .map(|values| values.into_iter().map(|v| v.trim().to_string()).collect())
        .unwrap_or_default();

    let new_rows: Vec<&Vec<String>> = filtered
        .rows
        .iter()
        .filter(|r| !existing_ids.contains(r[upload_id_idx].trim()))
        .collect();
    report.already_present = filtered.row_count() - new_rows.len();

    if new_rows.is_empty() {
        report.message = "No new records to add. All UUIDs already exist.".to_string();
        return Ok(UpdateOutcome { report, filtered });
    }

    match existing.filter(|s| !s.headers.is_empty()) {
        Some(sheet) => {
            let positions: Vec<Option<usize>> = sheet
                .headers
                .iter()
                .map(|h| filtered.column_index(h))
                .collect();
            let dropped: Vec<&String> = filtered
                .headers
                .iter()
                .filter(|h| sheet.column_index(h).is_none())
                .collect();
            if !dropped.is_empty() {
                warn!(columns = ?dropped, "Upload columns missing from data tab are not appended");
            }

            let aligned: Vec<Vec<String>> = new_rows
                .iter()
                .map(|r| {
                    positions
                        .iter()
                        .map(|p| p.map(|i| r[i].clone()).unwrap_or_default())
                        .collect()
                })
                .collect();
            report.appended_rows = store.append_rows(&layout.data_sheet, &aligned)?;
        }
        None => {
            let mut sheet = Table::new(filtered.headers.clone());
            for row in &new_rows {
                sheet.push_row((*row).clone());
            }
            store.write_sheet(&layout.data_sheet, &sheet)?;
            report.appended_rows = sheet.row_count();
        }
    }

    report.message = format!("{} new rows added to {}", report.appended_rows, layout.data_sheet);
    info!(
        appended = report.appended_rows,
        already_present = report.already_present,
        removed = report.removed_by_list,
        "Dataset updated"
    );

    Ok(UpdateOutcome { report, filtered })
}

pub fn export_filtered(filtered: &Table, out_dir: &Path) -> Result<String> {
    let path = out_dir.join(FILTERED_EXPORT_FILE).to_string_lossy().to_string();
    let mut workbook = WorkbookWriter::new();
    workbook.add_sheet(FILTERED_EXPORT_SHEET, filtered)?;
    workbook.save(&path)?;
    Ok(path)
}
