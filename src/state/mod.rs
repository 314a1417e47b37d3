pub mod cleanup;

use crate::translation::{JobExports, JobProgress, JobReport};
use crate::utils::{AppConfig, Result};
use crate::workbook::{RedbWorkbook, SheetStore, WorkbookLayout};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn SheetStore>,
    pub layout: WorkbookLayout,
    pub jobs: Arc<RwLock<HashMap<String, JobState>>>,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn SheetStore>) -> Self {
        let layout = WorkbookLayout::from(&config.workbook);
        Self {
            config: Arc::new(config),
            store,
            layout,
            jobs: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Opens the redb workbook named in `workbook.db_path`.
    pub fn open(config: AppConfig) -> Result<Self> {
        let store = RedbWorkbook::open(&config.workbook.db_path)?;
        Ok(Self::new(config, Arc::new(store)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Running,
    Completed,
    Failed,
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Running => write!(f, "running"),
            JobStatus::Completed => write!(f, "completed"),
            JobStatus::Failed => write!(f, "failed"),
        }
    }
}

pub(crate) fn now_secs() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Progress of one background column translation.
#[derive(Debug, Clone, Serialize)]
pub struct JobState {
    pub run_id: String,
    pub input_path: String,
    pub column: String,
    pub status: JobStatus,
    pub progress: f32,
    pub rows_processed: usize,
    pub rows_total: usize,
    pub batches_completed: usize,
    pub batches_total: usize,
    pub start_time: u64,
    pub estimated_time_remaining: Option<u64>,
    pub report: Option<JobReport>,
    pub exports: Option<JobExports>,
    pub error: Option<String>,
    pub finished_at: Option<u64>,
}

impl JobState {
    pub fn new(run_id: String, input_path: String, column: String, rows_total: usize) -> Self {
        Self {
            run_id,
            input_path,
            column,
            status: JobStatus::Running,
            progress: 0.0,
            rows_processed: 0,
            rows_total,
            batches_completed: 0,
            batches_total: 0,
            start_time: now_secs(),
            estimated_time_remaining: None,
            report: None,
            exports: None,
            error: None,
            finished_at: None,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.status != JobStatus::Running
    }

    pub fn update_progress(&mut self, update: &JobProgress) {
        self.rows_processed = update.rows_processed;
        self.rows_total = update.rows_total;
        self.batches_completed = update.batches_completed;
        self.batches_total = update.batches_total;
        self.progress = if self.rows_total > 0 {
            self.rows_processed as f32 / self.rows_total as f32
        } else {
            0.0
        };

        if self.batches_completed > 0 {
            let elapsed = now_secs().saturating_sub(self.start_time);
            let rate = self.batches_completed as f64 / elapsed.max(1) as f64;
            let remaining = self.batches_total.saturating_sub(self.batches_completed);
            self.estimated_time_remaining = Some((remaining as f64 / rate.max(0.001)) as u64);
        }
    }

    pub fn complete(&mut self, report: JobReport, exports: JobExports) {
        self.status = JobStatus::Completed;
        self.progress = 1.0;
        self.rows_processed = self.rows_total;
        self.estimated_time_remaining = Some(0);
        self.report = Some(report);
        self.exports = Some(exports);
        self.finished_at = Some(now_secs());
    }

    pub fn fail(&mut self, error: String) {
        self.status = JobStatus::Failed;
        self.estimated_time_remaining = None;
        self.error = Some(error);
        self.finished_at = Some(now_secs());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_and_eta() {
        let mut job = JobState::new("r1".into(), "in.xlsx".into(), "q1".into(), 40);
        assert_eq!(job.status, JobStatus::Running);

        job.update_progress(&JobProgress {
            rows_processed: 10,
            rows_total: 40,
            batches_completed: 1,
            batches_total: 4,
        });
        assert_eq!(job.progress, 0.25);
        assert!(job.estimated_time_remaining.is_some());

        job.fail("boom".into());
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.error.as_deref(), Some("boom"));
        assert!(job.is_finished());
        assert!(job.finished_at.is_some());
    }

    #[test]
    fn state_uses_configured_layout() {
        let mut config = AppConfig::default();
        config.workbook.data_sheet = "Main".into();
        let store = Arc::new(RedbWorkbook::in_memory().unwrap());
        let state = AppState::new(config, store);
        assert_eq!(state.layout.data_sheet, "Main");
    }
}
