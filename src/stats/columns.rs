use crate::dataset::{parse_date_text, Table};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Share of values that must parse for a column to count as dates or numbers.
const KIND_THRESHOLD: f64 = 0.7;
const CATEGORICAL_MAX_RATIO: f64 = 0.3;
const MISSING_MARKERS: [&str; 4] = ["", "nan", "None", "NULL"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Numeric,
    Date,
    Categorical,
    Text,
    Unknown,
}

impl std::fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnKind::Numeric => write!(f, "numeric"),
            ColumnKind::Date => write!(f, "date"),
            ColumnKind::Categorical => write!(f, "categorical"),
            ColumnKind::Text => write!(f, "text"),
            ColumnKind::Unknown => write!(f, "unknown"),
        }
    }
}

/// Numeric coercion: placeholders become `None`, thousands separators are dropped.
pub fn to_numeric(value: &str) -> Option<f64> {
    let s = value.trim();
    if MISSING_MARKERS.contains(&s) {
        return None;
    }
    s.replace(',', "")
        .parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
}

pub fn detect_column_kind(values: &[&str]) -> ColumnKind {
    let present: Vec<&str> = values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .collect();
    if present.is_empty() {
        return ColumnKind::Unknown;
    }

    let total = present.len() as f64;
    let share = |pred: &dyn Fn(&str) -> bool| present.iter().filter(|v| pred(v)).count() as f64 / total;

    if share(&|v| parse_date_text(v).is_some()) >= KIND_THRESHOLD {
        return ColumnKind::Date;
    }
    if share(&|v| to_numeric(v).is_some()) >= KIND_THRESHOLD {
        return ColumnKind::Numeric;
    }

    let unique: HashSet<&str> = present.iter().copied().collect();
    if unique.len() as f64 / total <= CATEGORICAL_MAX_RATIO {
        ColumnKind::Categorical
    } else {
        ColumnKind::Text
    }
}

pub fn column_kinds(table: &Table) -> Vec<(String, ColumnKind)> {
    table
        .headers
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let values: Vec<&str> = table.rows.iter().map(|r| r[i].as_str()).collect();
            (name.clone(), detect_column_kind(&values))
        })
        .collect()
}
