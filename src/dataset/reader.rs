use crate::dataset::table::Table;
use crate::utils::{RefineryError, Result};
use calamine::{open_workbook_auto, Data, Reader};
use chrono::Timelike;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Csv,
    Workbook,
}

impl FileKind {
    pub fn from_path(path: &str) -> Result<Self> {
        let ext = Path::new(path)
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "csv" => Ok(FileKind::Csv),
            "xlsx" | "xlsm" | "xls" => Ok(FileKind::Workbook),
            _ => Err(RefineryError::UnsupportedFile(format!(
                "{} (only CSV or XLSX/XLSM/XLS files are supported)",
                path
            ))),
        }
    }
}

pub struct CsvStreamReader {
    path: String,
}

impl CsvStreamReader {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    pub fn read_all(&self) -> Result<Table> {
        let mut reader = self.open()?;
        let headers = reader.headers()?.clone();
        let mut table = Table::new(headers.iter().map(|s| s.to_string()).collect());
        for result in reader.records() {
            let record = result?;
            table.push_row(record.iter().map(|s| s.to_string()).collect());
        }
        Ok(table)
    }

    fn open(&self) -> Result<csv::Reader<std::fs::File>> {
        let file = std::fs::File::open(&self.path)?;
        Ok(csv::ReaderBuilder::new().flexible(true).from_reader(file))
    }
}

/// Reads a CSV or Excel file into a [`Table`]; workbooks use `sheet` or the first sheet.
pub fn read_table(path: &str, sheet: Option<&str>) -> Result<Table> {
    if !file_exists(path) {
        return Err(RefineryError::FileNotFound(path.to_string()));
    }

    match FileKind::from_path(path)? {
        FileKind::Csv => CsvStreamReader::new(path).read_all(),
        FileKind::Workbook => read_workbook_sheet(path, sheet),
    }
}

pub fn list_sheets(path: &str) -> Result<Vec<String>> {
    match FileKind::from_path(path)? {
        FileKind::Csv => Err(RefineryError::ValidationError(format!(
            "{} is a CSV file and has no worksheets",
            path
        ))),
        FileKind::Workbook => {
            let workbook = open_workbook_auto(path)?;
            Ok(workbook.sheet_names().to_vec())
        }
    }
}

fn read_workbook_sheet(path: &str, sheet: Option<&str>) -> Result<Table> {
    let mut workbook = open_workbook_auto(path)?;

    let sheet_name = match sheet {
        Some(name) => name.to_string(),
        None => workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| RefineryError::ValidationError(format!("No sheets found in {}", path)))?,
    };

    if !workbook.sheet_names().contains(&sheet_name) {
        return Err(RefineryError::SheetNotFound(sheet_name));
    }

    let range = workbook.worksheet_range(&sheet_name)?;
    let values: Vec<Vec<String>> = range
        .rows()
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect();

    Ok(Table::from_values(values))
}

/// Cell text as a user sees it: integral floats without `.0`, dates as ISO.
pub fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => format_float(*f),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(value) if value.num_seconds_from_midnight() == 0 => {
                value.format("%Y-%m-%d").to_string()
            }
            Some(value) => value.format("%Y-%m-%d %H:%M:%S").to_string(),
            None => dt.as_f64().to_string(),
        },
        other => other.to_string(),
    }
}

pub fn format_float(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

pub async fn get_file_size(path: &str) -> Result<u64> {
    let metadata = tokio::fs::metadata(path).await?;
    Ok(metadata.len())
}

pub fn file_exists(path: &str) -> bool {
    Path::new(path).exists()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn reads_csv_as_strings() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "_uuid,name,age").unwrap();
        writeln!(file, "u1,احمد,30").unwrap();
        writeln!(file, "u2,Sara").unwrap();
        file.flush().unwrap();

        let table = read_table(file.path().to_str().unwrap(), None).unwrap();
        assert_eq!(table.headers, vec!["_uuid", "name", "age"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0][1], "احمد");
        assert_eq!(table.rows[1], vec!["u2", "Sara", ""]);
    }

    #[test]
    fn empty_csv_is_empty_table() {
        let file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        let table = read_table(file.path().to_str().unwrap(), None).unwrap();
        assert!(table.headers.is_empty());
        assert!(table.is_empty());
    }

    #[test]
    fn rejects_unknown_extension() {
        let file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        let err = read_table(file.path().to_str().unwrap(), None).unwrap_err();
        assert!(matches!(err, RefineryError::UnsupportedFile(_)));
    }

    #[test]
    fn floats_render_like_cells() {
        assert_eq!(format_float(3.0), "3");
        assert_eq!(format_float(2.5), "2.5");
        assert_eq!(format_float(-12.0), "-12");
    }
}
