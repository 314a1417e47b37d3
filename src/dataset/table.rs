use crate::utils::{RefineryError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;

/// An all-string table: header row plus data rows, every row as wide as the header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    /// Builds a table from raw sheet values where the first row is the header.
    pub fn from_values(mut values: Vec<Vec<String>>) -> Self {
        if values.is_empty() {
            return Self::default();
        }
        let headers = values.remove(0);
        let mut table = Self::new(headers);
        for row in values {
            table.push_row(row);
        }
        table
    }

    pub fn push_row(&mut self, mut row: Vec<String>) {
        row.resize(self.headers.len(), String::new());
        self.rows.push(row);
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| RefineryError::ColumnNotFound(name.to_string()))
    }

    pub fn column_values(&self, name: &str) -> Result<Vec<&str>> {
        let idx = self.require_column(name)?;
        Ok(self.rows.iter().map(|r| r[idx].as_str()).collect())
    }

    pub fn cell(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map(|s| s.as_str())
            .unwrap_or("")
    }

    pub fn head(&self, n: usize) -> Table {
        Table {
            headers: self.headers.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }

    /// Appends a column, or overwrites it when the name already exists.
    pub fn push_column(&mut self, name: &str, values: Vec<String>) {
        let mut values = values.into_iter();
        match self.column_index(name) {
            Some(idx) => {
                for row in &mut self.rows {
                    row[idx] = values.next().unwrap_or_default();
                }
            }
            None => {
                self.headers.push(name.to_string());
                for row in &mut self.rows {
                    row.push(values.next().unwrap_or_default());
                }
            }
        }
    }

    pub fn drop_column(&mut self, name: &str) -> Result<()> {
        let idx = self.require_column(name)?;
        self.headers.remove(idx);
        for row in &mut self.rows {
            row.remove(idx);
        }
        Ok(())
    }

    pub fn retain_rows<F>(&mut self, mut keep: F)
    where
        F: FnMut(&[String]) -> bool,
    {
        self.rows.retain(|r| keep(r));
    }

    /// Renames repeated headers to `name_1`, `name_2`, ... keeping the first as is.
    pub fn dedupe_headers(&mut self) {
        let mut seen: HashMap<String, usize> = HashMap::new();
        for header in &mut self.headers {
            match seen.get_mut(header.as_str()) {
                Some(count) => {
                    *count += 1;
                    *header = format!("{}_{}", header, count);
                }
                None => {
                    seen.insert(header.clone(), 0);
                }
            }
        }
    }

    /// One JSON object per row, keyed by header.
    pub fn to_json_records(&self) -> Vec<JsonValue> {
        self.rows
            .iter()
            .map(|row| {
                let mut map = serde_json::Map::new();
                for (header, value) in self.headers.iter().zip(row.iter()) {
                    map.insert(header.clone(), JsonValue::String(value.clone()));
                }
                JsonValue::Object(map)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn rows_are_padded_and_truncated() {
        let table = Table::from_values(vec![
            strings(&["a", "b"]),
            strings(&["1"]),
            strings(&["1", "2", "3"]),
        ]);
        assert_eq!(table.rows[0], strings(&["1", ""]));
        assert_eq!(table.rows[1], strings(&["1", "2"]));
    }

    #[test]
    fn duplicate_headers_get_suffixes() {
        let mut table = Table::new(strings(&["q", "q", "x", "q"]));
        table.dedupe_headers();
        assert_eq!(table.headers, strings(&["q", "q_1", "x", "q_2"]));
    }

    #[test]
    fn push_column_overwrites_existing() {
        let mut table = Table::from_values(vec![strings(&["a"]), strings(&["1"]), strings(&["2"])]);
        table.push_column("b", strings(&["x", "y"]));
        table.push_column("a", strings(&["9", "8"]));
        assert_eq!(table.headers, strings(&["a", "b"]));
        assert_eq!(table.rows, vec![strings(&["9", "x"]), strings(&["8", "y"])]);

        table.drop_column("a").unwrap();
        assert_eq!(table.rows, vec![strings(&["x"]), strings(&["y"])]);
        assert!(table.drop_column("zzz").is_err());
    }

    #[test]
    fn head_previews_as_records() {
        let table = Table::from_values(vec![
            strings(&["_uuid", "district"]),
            strings(&["u1", "پغمان"]),
            strings(&["u2", "Herat"]),
            strings(&["u3", ""]),
        ]);
        let records = table.head(2).to_json_records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["district"], "پغمان");
        assert_eq!(records[1]["_uuid"], "u2");
        assert_eq!(table.head(10).row_count(), 3);
    }
}
