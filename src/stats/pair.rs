use crate::dataset::Table;
use crate::stats::columns::{detect_column_kind, to_numeric, ColumnKind};
use crate::utils::{is_null_marker, RefineryError, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

pub const DEFAULT_TOP_N: usize = 20;
const TOP_N_RANGE: (usize, usize) = (5, 100);

#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema)]
pub struct PairOptions {
    /// Drop rows where either axis is missing.
    #[serde(default = "default_drop_missing")]
    pub drop_missing: bool,
    /// Categorical axes keep only their most frequent values.
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

fn default_drop_missing() -> bool {
    true
}

fn default_top_n() -> usize {
    DEFAULT_TOP_N
}

impl Default for PairOptions {
    fn default() -> Self {
        Self {
            drop_missing: true,
            top_n: DEFAULT_TOP_N,
        }
    }
}

/// One prepared column. `values` and `numbers` are row-aligned.
#[derive(Debug, Clone, PartialEq)]
pub struct Axis {
    pub name: String,
    pub kind: ColumnKind,
    pub values: Vec<String>,
    pub numbers: Vec<Option<f64>>,
}

impl Axis {
    fn from_column(table: &Table, name: &str) -> Result<Self> {
        let idx = table.require_column(name)?;
        let raw: Vec<&str> = table.rows.iter().map(|r| r[idx].as_str()).collect();
        let kind = detect_column_kind(&raw);
        let numbers = raw
            .iter()
            .map(|v| {
                if kind == ColumnKind::Numeric {
                    to_numeric(v)
                } else {
                    None
                }
            })
            .collect();

        Ok(Self {
            name: name.to_string(),
            kind,
            values: raw.iter().map(|v| v.trim().to_string()).collect(),
            numbers,
        })
    }

    pub fn is_numeric(&self) -> bool {
        self.kind == ColumnKind::Numeric
    }

    pub fn is_categorical(&self) -> bool {
        self.kind == ColumnKind::Categorical
    }

    pub fn is_missing(&self, row: usize) -> bool {
        if self.is_numeric() {
            self.numbers[row].is_none()
        } else {
            is_null_marker(&self.values[row])
        }
    }

    /// Non-missing numbers in row order.
    pub fn present_numbers(&self) -> Vec<f64> {
        self.numbers.iter().flatten().copied().collect()
    }

    /// Non-missing raw values in row order.
    pub fn present_values(&self) -> Vec<&str> {
        (0..self.len())
            .filter(|&i| !self.is_missing(i))
            .map(|i| self.values[i].as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Values ordered by frequency, ties broken alphabetically.
    pub fn value_counts(&self) -> Vec<(String, usize)> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for v in self.present_values() {
            *counts.entry(v).or_default() += 1;
        }
        let mut sorted: Vec<(String, usize)> =
            counts.into_iter().map(|(k, c)| (k.to_string(), c)).collect();
        sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        sorted
    }

    fn retain(&mut self, keep: &[bool]) {
        let mut i = 0;
        self.values.retain(|_| {
            i += 1;
            keep[i - 1]
        });
        let mut j = 0;
        self.numbers.retain(|_| {
            j += 1;
            keep[j - 1]
        });
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PairData {
    pub x: Axis,
    pub y: Axis,
}

impl PairData {
    pub fn row_count(&self) -> usize {
        self.x.len()
    }

    /// Rows where both axes carry a number.
    pub fn numeric_pairs(&self) -> Vec<(f64, f64)> {
        self.x
            .numbers
            .iter()
            .zip(&self.y.numbers)
            .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
            .collect()
    }

    fn retain(&mut self, keep: &[bool]) {
        self.x.retain(keep);
        self.y.retain(keep);
    }
}

fn top_values(axis: &Axis, top_n: usize) -> Option<HashSet<String>> {
    let counts = axis.value_counts();
    if !axis.is_categorical() || counts.len() <= top_n {
        return None;
    }
    Some(counts.into_iter().take(top_n).map(|(v, _)| v).collect())
}

/// Loads two columns, coerces numeric axes and limits categorical ones.
pub fn prepare_pair(table: &Table, x: &str, y: &str, options: PairOptions) -> Result<PairData> {
    let top_n = options.top_n.clamp(TOP_N_RANGE.0, TOP_N_RANGE.1);
    let mut pair = PairData {
        x: Axis::from_column(table, x)?,
        y: Axis::from_column(table, y)?,
    };

    if options.drop_missing {
        let keep: Vec<bool> = (0..pair.row_count())
            .map(|i| !pair.x.is_missing(i) && !pair.y.is_missing(i))
            .collect();
        pair.retain(&keep);
    }

    if let Some(top) = top_values(&pair.x, top_n) {
        let keep: Vec<bool> = pair.x.values.iter().map(|v| top.contains(v)).collect();
        pair.retain(&keep);
    }
    if let Some(top) = top_values(&pair.y, top_n) {
        let keep: Vec<bool> = pair.y.values.iter().map(|v| top.contains(v)).collect();
        pair.retain(&keep);
    }

    if pair.row_count() == 0 {
        return Err(RefineryError::ValidationError(
            "No data after filtering. Change columns or disable filters.".to_string(),
        ));
    }
    Ok(pair)
}
