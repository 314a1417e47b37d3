use crate::dataset::{write_csv_with_bom, Table, WorkbookWriter};
use crate::language::is_dari_pashto_text;
use crate::utils::{is_null_marker, safe_file_stem, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

pub const DEFAULT_LIST_SHEET: &str = "Translation_List";
pub const DEFAULT_LIST_STEM: &str = "missing_translations";

/// A cell still written in Dari/Pashto, addressed by record key and column label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct MissingTranslation {
    pub key: String,
    pub label: String,
    pub value: String,
}

pub fn extract_missing_translations(
    table: &Table,
    key_col: &str,
    exclude_cols: &[String],
    remove_duplicates: bool,
) -> Vec<MissingTranslation> {
    let key_idx = table.column_index(key_col);
    let exclude: HashSet<&str> = exclude_cols.iter().map(|c| c.as_str()).collect();

    let mut out = Vec::new();
    let mut seen = HashSet::new();

    for (i, row) in table.rows.iter().enumerate() {
        let key = match key_idx.map(|k| row[k].trim()) {
            Some(k) if !is_null_marker(k) => k.to_string(),
            _ => format!("ROW_{:06}", i + 1),
        };

        for (col, value) in table.headers.iter().zip(row.iter()) {
            if exclude.contains(col.as_str()) || !is_dari_pashto_text(value) {
                continue;
            }
            let item = MissingTranslation {
                key: key.clone(),
                label: col.clone(),
                value: value.trim().to_string(),
            };
            if remove_duplicates && !seen.insert(item.clone()) {
                continue;
            }
            out.push(item);
        }
    }

    out
}

pub fn missing_table(items: &[MissingTranslation]) -> Table {
    let mut table = Table::new(vec!["key".to_string(), "label".to_string(), "value".to_string()]);
    for item in items {
        table.push_row(vec![item.key.clone(), item.label.clone(), item.value.clone()]);
    }
    table
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ExtractExports {
    pub csv_path: String,
    pub xlsx_path: String,
    pub sheet: String,
}

/// Writes `<stem>.csv` (UTF-8 with BOM, for Excel) and a single-sheet `<stem>.xlsx`
/// inside `out_dir`; directories in `file_stem` are ignored.
pub fn export_missing_translations(
    items: &[MissingTranslation],
    out_dir: &Path,
    file_stem: &str,
    sheet_name: Option<&str>,
) -> Result<ExtractExports> {
    let sheet = sheet_name
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_LIST_SHEET)
        .to_string();
    let table = missing_table(items);

    let stem = safe_file_stem(file_stem);
    let file_stem = if stem.is_empty() { DEFAULT_LIST_STEM } else { stem.as_str() };

    let csv_path = out_dir
        .join(format!("{}.csv", file_stem))
        .to_string_lossy()
        .to_string();
    let xlsx_path = out_dir
        .join(format!("{}.xlsx", file_stem))
        .to_string_lossy()
        .to_string();

    write_csv_with_bom(&csv_path, &table)?;

    let mut workbook = WorkbookWriter::new();
    workbook.add_sheet(&sheet, &table)?;
    workbook.save(&xlsx_path)?;

    Ok(ExtractExports {
        csv_path,
        xlsx_path,
        sheet,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{list_sheets, read_table};

    fn survey() -> Table {
        Table::from_values(vec![
            vec!["_uuid".into(), "q1".into(), "q2".into(), "note".into()],
            vec!["u1".into(), "بلی".into(), "yes".into(), "خوب".into()],
            vec!["nan".into(), "نخیر".into(), "نخیر".into(), "".into()],
            vec!["u1".into(), "بلی".into(), "no".into(), "".into()],
        ])
    }

    #[test]
    fn extracts_with_key_fallback() {
        let items = extract_missing_translations(&survey(), "_uuid", &[], false);
        assert_eq!(items.len(), 5);
        assert_eq!(items[2].key, "ROW_000002");
        assert_eq!(items[2].label, "q1");
        assert_eq!(items[3].label, "q2");
    }

    #[test]
    fn exclusions_and_dedupe() {
        let items =
            extract_missing_translations(&survey(), "_uuid", &["note".to_string()], true);
        let labels: Vec<_> = items.iter().map(|i| (i.key.as_str(), i.label.as_str())).collect();
        assert_eq!(
            labels,
            vec![("u1", "q1"), ("ROW_000002", "q1"), ("ROW_000002", "q2")]
        );
    }

    #[test]
    fn missing_key_column_numbers_rows() {
        let items = extract_missing_translations(&survey(), "id", &[], false);
        assert!(items.iter().all(|i| i.key.starts_with("ROW_")));
    }

    #[test]
    fn exports_csv_and_single_sheet_xlsx() {
        let dir = tempfile::tempdir().unwrap();
        let items = extract_missing_translations(&survey(), "_uuid", &[], true);

        let exports = export_missing_translations(&items, dir.path(), "missing", Some("  ")).unwrap();
        assert_eq!(exports.sheet, DEFAULT_LIST_SHEET);

        let bytes = std::fs::read(&exports.csv_path).unwrap();
        assert!(bytes.starts_with(&[0xEF, 0xBB, 0xBF]));

        assert_eq!(list_sheets(&exports.xlsx_path).unwrap(), vec![DEFAULT_LIST_SHEET]);
        let back = read_table(&exports.xlsx_path, None).unwrap();
        assert_eq!(back.row_count(), items.len());
    }

    #[test]
    fn export_name_stays_inside_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("exports");
        let items = extract_missing_translations(&survey(), "_uuid", &[], true);

        let exports = export_missing_translations(&items, &out, "../../escape", None).unwrap();
        assert!(Path::new(&exports.csv_path).starts_with(&out));
        assert!(exports.xlsx_path.ends_with("escape.xlsx"));
        assert!(!dir.path().join("escape.csv").exists());

        let exports = export_missing_translations(&items, &out, "..", None).unwrap();
        assert!(exports.csv_path.ends_with("missing_translations.csv"));
        assert!(Path::new(&exports.xlsx_path).starts_with(&out));
    }
}
