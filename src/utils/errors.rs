use thiserror::Error;

#[derive(Error, Debug)]
pub enum RefineryError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Workbook read error: {0}")]
    SpreadsheetError(#[from] calamine::Error),

    #[error("Workbook write error: {0}")]
    XlsxError(#[from] rust_xlsxwriter::XlsxError),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    #[error("Record not found: {0}")]
    RecordNotFound(String),

    #[error("Job not found: {0}")]
    JobNotFound(String),

    #[error("Unsupported file type: {0}")]
    UnsupportedFile(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("HTTP request error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("File not found: {0}")]
    FileNotFound(String),
}

pub type Result<T> = std::result::Result<T, RefineryError>;
