pub mod corrections;
pub mod redb_store;
pub mod review;
pub mod transfer;
pub mod updater;

pub use corrections::{
    apply_corrections, sync_corrections, ApplyMode, ApplyOptions, ApplyReport, CorrectionChange,
};
pub use redb_store::RedbWorkbook;
pub use review::{
    open_review, submit_review, FieldEdit, FieldKind, ReviewField, ReviewForm, ReviewSubmission,
    REVIEW_LOG_HEADERS,
};
pub use transfer::{export_sheet, import_sheet};
pub use updater::{
    export_filtered, filter_upload, update_dataset, UpdateOptions, UpdateOutcome, UpdateReport,
    FILTERED_EXPORT_FILE, FILTERED_EXPORT_SHEET,
};

use crate::dataset::Table;
use crate::utils::{Result, WorkbookConfig};
use serde::{Deserialize, Serialize};

/// Named tabs of a shared workbook. Every method is one atomic operation against the
/// backend; there is no locking across calls.
pub trait SheetStore: Send + Sync {
    fn list_sheets(&self) -> Result<Vec<String>>;

    /// `None` when the tab does not exist.
    fn try_read_sheet(&self, name: &str) -> Result<Option<Table>>;

    /// Replaces the whole tab, creating it if needed.
    fn write_sheet(&self, name: &str, table: &Table) -> Result<()>;

    /// Appends rows to an existing tab and returns how many were written.
    fn append_rows(&self, name: &str, rows: &[Vec<String>]) -> Result<usize>;

    /// Creates an empty tab with `headers` unless it exists. Returns true when created.
    fn ensure_sheet(&self, name: &str, headers: &[String]) -> Result<bool>;

    fn delete_sheet(&self, name: &str) -> Result<bool>;

    fn read_sheet(&self, name: &str) -> Result<Table> {
        self.try_read_sheet(name)?
            .ok_or_else(|| crate::utils::RefineryError::SheetNotFound(name.to_string()))
    }
}

/// Tab and column names the sync operations look for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkbookLayout {
    pub data_sheet: String,
    pub correction_sheet: String,
    pub review_log_sheet: String,
    pub remove_sheet: String,
    pub hidden_sheet: String,
    pub hidden_label_column: String,
    pub id_column: String,
}

impl From<&WorkbookConfig> for WorkbookLayout {
    fn from(config: &WorkbookConfig) -> Self {
        Self {
            data_sheet: config.data_sheet.clone(),
            correction_sheet: config.correction_sheet.clone(),
            review_log_sheet: config.review_log_sheet.clone(),
            remove_sheet: config.remove_sheet.clone(),
            hidden_sheet: config.hidden_sheet.clone(),
            hidden_label_column: config.hidden_label_column.clone(),
            id_column: config.id_column.clone(),
        }
    }
}

impl Default for WorkbookLayout {
    fn default() -> Self {
        Self::from(&WorkbookConfig::default())
    }
}
