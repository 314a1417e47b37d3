pub mod analyzer;
pub mod dates;
pub mod profile;
pub mod reader;
pub mod table;
pub mod writer;

pub use analyzer::{analyze_dataset, estimate_cells_tokens, estimate_tokens, DatasetMetadata};
pub use dates::{parse_date_text, parse_lenient_date};
pub use profile::{
    analyze_columns, detect_entry_type, profile_tables, summary_report, ColumnEntryType,
    ColumnProfile, DatasetSummary,
};
pub use reader::{file_exists, list_sheets, read_table, CsvStreamReader, FileKind};
pub use table::Table;
pub use writer::{write_csv, write_csv_with_bom, write_xlsx, CsvStreamWriter, WorkbookWriter};
