use crate::dataset::reader::FileKind;
use crate::dataset::{read_table, write_csv, write_xlsx};
use crate::utils::Result;
use crate::workbook::SheetStore;
use tracing::info;

/// Loads a CSV/XLSX file into tab `name`, replacing whatever was there.
pub fn import_sheet(
    store: &dyn SheetStore,
    name: &str,
    path: &str,
    source_sheet: Option<&str>,
) -> Result<usize> {
    let table = read_table(path, source_sheet)?;
    store.write_sheet(name, &table)?;
    info!(sheet = name, path = path, rows = table.row_count(), "Sheet imported");
    Ok(table.row_count())
}

/// Writes tab `name` to a CSV or XLSX file, chosen by extension.
pub fn export_sheet(store: &dyn SheetStore, name: &str, path: &str) -> Result<usize> {
    let table = store.read_sheet(name)?;
    match FileKind::from_path(path)? {
        FileKind::Csv => {
            write_csv(path, &table)?;
        }
        FileKind::Workbook => write_xlsx(path, &[(name, &table)])?,
    }
    info!(sheet = name, path = path, rows = table.row_count(), "Sheet exported");
    Ok(table.row_count())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Table;
    use crate::workbook::RedbWorkbook;

    #[test]
    fn csv_and_xlsx_round_trip_through_the_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = RedbWorkbook::in_memory().unwrap();
        let csv_path = dir.path().join("seed.csv");
        std::fs::write(&csv_path, "_uuid,q1\nu1,بلی\nu2,no\n").unwrap();

        let rows = import_sheet(&store, "Data_Set", csv_path.to_str().unwrap(), None).unwrap();
        assert_eq!(rows, 2);

        let xlsx_path = dir.path().join("out.xlsx");
        export_sheet(&store, "Data_Set", xlsx_path.to_str().unwrap()).unwrap();
        let back = read_table(xlsx_path.to_str().unwrap(), Some("Data_Set")).unwrap();
        assert_eq!(back, store.read_sheet("Data_Set").unwrap());
        assert_eq!(back.cell(0, 1), "بلی");
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let store = RedbWorkbook::in_memory().unwrap();
        store.write_sheet("t", &Table::new(vec!["a".into()])).unwrap();
        assert!(export_sheet(&store, "t", "/tmp/out.json").is_err());
    }
}
