use crate::dataset::table::Table;
use crate::utils::{sanitize_cell, RefineryError, Result};
use csv::Writer;
use rust_xlsxwriter::Workbook;
use std::fs::File;
use std::io::Write;
use std::path::Path;

const WIDTH_SCAN_ROWS: usize = 500;
const MAX_COLUMN_WIDTH: usize = 60;
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

pub struct CsvStreamWriter {
    path: String,
    headers: Vec<String>,
    with_bom: bool,
    writer: Option<Writer<File>>,
    rows_written: usize,
}

impl CsvStreamWriter {
    pub fn new(path: impl Into<String>, headers: Vec<String>) -> Self {
        Self {
            path: path.into(),
            headers,
            with_bom: false,
            writer: None,
            rows_written: 0,
        }
    }

    /// Prefix the file with a UTF-8 BOM so Excel opens Dari/Pashto text correctly.
    pub fn with_bom(mut self) -> Self {
        self.with_bom = true;
        self
    }

    pub fn initialize(&mut self) -> Result<()> {
        ensure_parent(&self.path)?;
        let mut file = File::create(&self.path)?;
        if self.with_bom {
            file.write_all(UTF8_BOM)?;
        }
        let mut writer = Writer::from_writer(file);
        writer.write_record(&self.headers)?;
        self.writer = Some(writer);
        Ok(())
    }

    pub fn write_row(&mut self, row: &[String]) -> Result<()> {
        let writer = self.writer.as_mut().ok_or_else(|| {
            RefineryError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotConnected,
                "Writer not initialized",
            ))
        })?;

        let sanitized: Vec<String> = row.iter().map(|s| sanitize_cell(s)).collect();

        writer.write_record(&sanitized)?;
        self.rows_written += 1;
        Ok(())
    }

    pub fn write_rows(&mut self, rows: &[Vec<String>]) -> Result<()> {
        for row in rows {
            self.write_row(row)?;
        }
        Ok(())
    }

    pub fn finish(mut self) -> Result<usize> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }
        Ok(self.rows_written)
    }
}

pub fn write_csv(path: &str, table: &Table) -> Result<usize> {
    let mut writer = CsvStreamWriter::new(path, table.headers.clone());
    writer.initialize()?;
    writer.write_rows(&table.rows)?;
    writer.finish()
}

pub fn write_csv_with_bom(path: &str, table: &Table) -> Result<usize> {
    let mut writer = CsvStreamWriter::new(path, table.headers.clone()).with_bom();
    writer.initialize()?;
    writer.write_rows(&table.rows)?;
    writer.finish()
}

/// Multi-sheet XLSX export with a frozen header row and fitted column widths.
pub struct WorkbookWriter {
    workbook: Workbook,
    sheets: usize,
}

impl WorkbookWriter {
    pub fn new() -> Self {
        Self {
            workbook: Workbook::new(),
            sheets: 0,
        }
    }

    pub fn add_sheet(&mut self, name: &str, table: &Table) -> Result<()> {
        let name = match name.trim() {
            "" => format!("Sheet{}", self.sheets + 1),
            trimmed => trimmed.to_string(),
        };

        let worksheet = self.workbook.add_worksheet();
        worksheet.set_name(&name)?;

        for (col, header) in table.headers.iter().enumerate() {
            worksheet.write_string(0, col as u16, header)?;
        }
        for (row_idx, row) in table.rows.iter().enumerate() {
            for (col, value) in row.iter().enumerate() {
                worksheet.write_string((row_idx + 1) as u32, col as u16, value)?;
            }
        }

        worksheet.set_freeze_panes(1, 0)?;

        for (col, header) in table.headers.iter().enumerate() {
            let widest = table
                .rows
                .iter()
                .take(WIDTH_SCAN_ROWS)
                .map(|r| r.get(col).map(|v| v.chars().count()).unwrap_or(0))
                .chain(std::iter::once(header.chars().count()))
                .max()
                .unwrap_or(0);
            let width = (widest + 3).min(MAX_COLUMN_WIDTH);
            worksheet.set_column_width(col as u16, width as f64)?;
        }

        self.sheets += 1;
        Ok(())
    }

    pub fn sheet_count(&self) -> usize {
        self.sheets
    }

    pub fn save(mut self, path: &str) -> Result<()> {
        ensure_parent(path)?;
        self.workbook.save(path)?;
        Ok(())
    }
}

impl Default for WorkbookWriter {
    fn default() -> Self {
        Self::new()
    }
}

pub fn write_xlsx(path: &str, sheets: &[(&str, &Table)]) -> Result<()> {
    let mut writer = WorkbookWriter::new();
    for (name, table) in sheets {
        writer.add_sheet(name, table)?;
    }
    writer.save(path)
}

fn ensure_parent(path: &str) -> Result<()> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
