use crate::dataset::Table;
use crate::utils::{RefineryError, Result};
use crate::workbook::SheetStore;
use redb::backends::InMemoryBackend;
use redb::{Builder, Database, ReadableTable, TableDefinition};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

const SHEETS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("sheets");

fn db_err(e: impl std::fmt::Display) -> RefineryError {
    RefineryError::DatabaseError(e.to_string())
}

fn decode(data: &[u8]) -> Result<Table> {
    serde_json::from_slice(data).map_err(|e| RefineryError::SerializationError(e.to_string()))
}

fn encode(table: &Table) -> Result<Vec<u8>> {
    serde_json::to_vec(table).map_err(|e| RefineryError::SerializationError(e.to_string()))
}

/// Workbook backend on a single redb file: tab name -> JSON table.
#[derive(Clone)]
pub struct RedbWorkbook {
    db: Arc<Database>,
}

impl RedbWorkbook {
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let db = Database::create(db_path).map_err(db_err)?;
        Self::init(db)
    }

    pub fn in_memory() -> Result<Self> {
        let db = Builder::new()
            .create_with_backend(InMemoryBackend::new())
            .map_err(db_err)?;
        Self::init(db)
    }

    fn init(db: Database) -> Result<Self> {
        let write_txn = db.begin_write().map_err(db_err)?;
        {
            let _ = write_txn.open_table(SHEETS_TABLE).map_err(db_err)?;
        }
        write_txn.commit().map_err(db_err)?;

        Ok(Self { db: Arc::new(db) })
    }
}

impl SheetStore for RedbWorkbook {
    fn list_sheets(&self) -> Result<Vec<String>> {
        let read_txn = self.db.begin_read().map_err(db_err)?;
        let table = read_txn.open_table(SHEETS_TABLE).map_err(db_err)?;

        let mut names = Vec::new();
        for entry in table.iter().map_err(db_err)? {
            let (key, _) = entry.map_err(db_err)?;
            names.push(key.value().to_string());
        }
        Ok(names)
    }

    fn try_read_sheet(&self, name: &str) -> Result<Option<Table>> {
        let read_txn = self.db.begin_read().map_err(db_err)?;
        let table = read_txn.open_table(SHEETS_TABLE).map_err(db_err)?;

        match table.get(name) {
            Ok(Some(data)) => Ok(Some(decode(data.value())?)),
            Ok(None) => Ok(None),
            Err(e) => Err(db_err(e)),
        }
    }

    fn write_sheet(&self, name: &str, sheet: &Table) -> Result<()> {
        let data = encode(sheet)?;

        let write_txn = self.db.begin_write().map_err(db_err)?;
        {
            let mut table = write_txn.open_table(SHEETS_TABLE).map_err(db_err)?;
            table.insert(name, data.as_slice()).map_err(db_err)?;
        }
        write_txn.commit().map_err(db_err)?;

        debug!(sheet = name, rows = sheet.row_count(), "Sheet written");
        Ok(())
    }

    fn append_rows(&self, name: &str, rows: &[Vec<String>]) -> Result<usize> {
        let write_txn = self.db.begin_write().map_err(db_err)?;
        {
            let mut table = write_txn.open_table(SHEETS_TABLE).map_err(db_err)?;

            let mut sheet = match table.get(name).map_err(db_err)? {
                Some(data) => decode(data.value())?,
                None => return Err(RefineryError::SheetNotFound(name.to_string())),
            };
            for row in rows {
                sheet.push_row(row.clone());
            }

            let data = encode(&sheet)?;
            table.insert(name, data.as_slice()).map_err(db_err)?;
        }
        write_txn.commit().map_err(db_err)?;

        debug!(sheet = name, rows = rows.len(), "Rows appended");
        Ok(rows.len())
    }

    fn ensure_sheet(&self, name: &str, headers: &[String]) -> Result<bool> {
        let write_txn = self.db.begin_write().map_err(db_err)?;
        let created = {
            let mut table = write_txn.open_table(SHEETS_TABLE).map_err(db_err)?;
            let exists = table.get(name).map_err(db_err)?.is_some();
            if !exists {
                let data = encode(&Table::new(headers.to_vec()))?;
                table.insert(name, data.as_slice()).map_err(db_err)?;
            }
            !exists
        };
        write_txn.commit().map_err(db_err)?;
        Ok(created)
    }

    fn delete_sheet(&self, name: &str) -> Result<bool> {
        let write_txn = self.db.begin_write().map_err(db_err)?;
        let removed = {
            let mut table = write_txn.open_table(SHEETS_TABLE).map_err(db_err)?;
            let removed = table.remove(name).map_err(db_err)?.is_some();
            removed
        };
        write_txn.commit().map_err(db_err)?;
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn write_read_and_list() {
        let store = RedbWorkbook::in_memory().unwrap();
        let sheet = Table::from_values(vec![strings(&["_uuid", "q1"]), strings(&["u1", "a"])]);

        store.write_sheet("Data_Set", &sheet).unwrap();
        assert_eq!(store.read_sheet("Data_Set").unwrap(), sheet);
        assert_eq!(store.list_sheets().unwrap(), vec!["Data_Set"]);
        assert!(matches!(
            store.read_sheet("Missing"),
            Err(RefineryError::SheetNotFound(_))
        ));
    }

    #[test]
    fn append_requires_existing_tab() {
        let store = RedbWorkbook::in_memory().unwrap();
        assert!(store.append_rows("Log", &[strings(&["x"])]).is_err());

        assert!(store.ensure_sheet("Log", &strings(&["a", "b"])).unwrap());
        assert!(!store.ensure_sheet("Log", &strings(&["other"])).unwrap());
        assert_eq!(store.append_rows("Log", &[strings(&["1"]), strings(&["2", "3", "4"])]).unwrap(), 2);

        let log = store.read_sheet("Log").unwrap();
        assert_eq!(log.headers, strings(&["a", "b"]));
        assert_eq!(log.rows, vec![strings(&["1", ""]), strings(&["2", "3"])]);
    }

    #[test]
    fn persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("wb.redb");
        {
            let store = RedbWorkbook::open(&path).unwrap();
            store.ensure_sheet("Remove_from_DS", &strings(&["_uuid"])).unwrap();
        }
        let store = RedbWorkbook::open(&path).unwrap();
        assert_eq!(store.list_sheets().unwrap(), vec!["Remove_from_DS"]);
        assert!(store.delete_sheet("Remove_from_DS").unwrap());
        assert!(!store.delete_sheet("Remove_from_DS").unwrap());
    }
}
