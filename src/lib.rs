pub mod dataset;
pub mod language;
pub mod server;
pub mod state;
pub mod stats;
pub mod translation;
pub mod utils;
pub mod workbook;

pub use dataset::{read_table, write_csv, write_xlsx, Table};
pub use server::RefineryServer;
pub use state::{AppState, JobState, JobStatus};
pub use translation::{JobOptions, RobustTranslator, TranslationProvider};
pub use utils::{AppConfig, RefineryError, Result};
pub use workbook::{RedbWorkbook, SheetStore, WorkbookLayout};
