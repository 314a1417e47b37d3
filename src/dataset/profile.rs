//! Classifies survey columns as closed (choice) or open (entry) questions so
//! data-entry effort can be planned before a dataset is handed out.

use crate::dataset::table::Table;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt::Write;

const SAMPLE_SIZE: usize = 100;

const REASON_KEYWORDS: [&str; 9] = [
    "reason", "ریزن", "دلایل", "توضیح", "شرح", "explain", "comment", "نظر", "سایر",
];

/// Subset used when flagging high-priority entry columns in the report.
const PRIORITY_KEYWORDS: [&str; 5] = ["reason", "ریزن", "دلایل", "توضیح", "شرح"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnEntryType {
    Choice,
    Entry,
    Mixed,
    Empty,
}

impl std::fmt::Display for ColumnEntryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnEntryType::Choice => write!(f, "Choice"),
            ColumnEntryType::Entry => write!(f, "Entry"),
            ColumnEntryType::Mixed => write!(f, "Mixed"),
            ColumnEntryType::Empty => write!(f, "Empty"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnProfile {
    pub column: String,
    pub entry_type: ColumnEntryType,
    pub unique_values: usize,
    pub total_values: usize,
    pub uniqueness_ratio: String,
    pub sample_values: Vec<String>,
    pub contains_reason_keywords: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub total_columns: usize,
    pub entry_columns: usize,
    pub choice_columns: usize,
    pub mixed_columns: usize,
    pub high_priority_entries: Vec<String>,
}

fn name_has_keyword(column: &str, keywords: &[&str]) -> bool {
    let lower = column.to_lowercase();
    keywords.iter().any(|k| lower.contains(k))
}

/// Returns the type plus the unique and total counts of the sampled values.
pub fn detect_entry_type(column: &str, values: &[&str]) -> (ColumnEntryType, usize, usize) {
    let sample: Vec<&str> = values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .take(SAMPLE_SIZE)
        .collect();

    if sample.is_empty() {
        return (ColumnEntryType::Empty, 0, 0);
    }

    let total = sample.len();
    let unique = sample.iter().collect::<HashSet<_>>().len();
    let unique_ratio = unique as f64 / total as f64;
    let avg_length =
        sample.iter().map(|v| v.chars().count()).sum::<usize>() as f64 / total as f64;

    let entry_type = if unique_ratio <= 0.3 && avg_length < 50.0 {
        ColumnEntryType::Choice
    } else if unique_ratio >= 0.7 || avg_length > 100.0 || name_has_keyword(column, &REASON_KEYWORDS)
    {
        ColumnEntryType::Entry
    } else {
        ColumnEntryType::Mixed
    };

    (entry_type, unique, total)
}

pub fn analyze_columns(table: &Table) -> (Vec<ColumnProfile>, DatasetSummary) {
    let mut profiles = Vec::with_capacity(table.column_count());

    for (idx, column) in table.headers.iter().enumerate() {
        let values: Vec<&str> = table.rows.iter().map(|r| r[idx].as_str()).collect();
        let (entry_type, unique_values, total_values) = detect_entry_type(column, &values);

        let sample_values: Vec<String> = values
            .iter()
            .filter(|v| !v.trim().is_empty())
            .take(3)
            .map(|v| v.to_string())
            .collect();

        profiles.push(ColumnProfile {
            column: column.clone(),
            entry_type,
            unique_values,
            total_values,
            uniqueness_ratio: format!(
                "{:.1}%",
                unique_values as f64 / total_values.max(1) as f64 * 100.0
            ),
            sample_values,
            contains_reason_keywords: name_has_keyword(column, &PRIORITY_KEYWORDS),
        });
    }

    let count = |t: ColumnEntryType| profiles.iter().filter(|p| p.entry_type == t).count();
    let summary = DatasetSummary {
        total_columns: profiles.len(),
        entry_columns: count(ColumnEntryType::Entry),
        choice_columns: count(ColumnEntryType::Choice),
        mixed_columns: count(ColumnEntryType::Mixed),
        high_priority_entries: profiles
            .iter()
            .filter(|p| p.entry_type == ColumnEntryType::Entry && p.contains_reason_keywords)
            .map(|p| p.column.clone())
            .collect(),
    };

    (profiles, summary)
}

pub fn summary_report(profiles: &[ColumnProfile], summary: &DatasetSummary) -> String {
    let mut report = String::new();
    let _ = writeln!(report, "# Column analysis report\n");
    let _ = writeln!(report, "Total columns: {}", summary.total_columns);
    let _ = writeln!(report, "Choice columns: {}", summary.choice_columns);
    let _ = writeln!(report, "Entry columns: {}", summary.entry_columns);
    let _ = writeln!(report, "Mixed columns: {}", summary.mixed_columns);

    let _ = writeln!(report, "\n## Entry columns");
    for p in profiles.iter().filter(|p| p.entry_type == ColumnEntryType::Entry) {
        let _ = writeln!(report, "- {} ({} unique of {})", p.column, p.unique_values, p.total_values);
    }

    let _ = writeln!(report, "\n## High priority entry columns");
    if summary.high_priority_entries.is_empty() {
        let _ = writeln!(report, "No high priority columns found");
    } else {
        for col in &summary.high_priority_entries {
            let _ = writeln!(report, "- {} (contains reason keywords)", col);
        }
    }

    let _ = writeln!(report, "\n## Recommendation");
    if summary.entry_columns > summary.choice_columns {
        let _ = writeln!(
            report,
            "This dataset is mostly open (Entry) questions and needs more data-entry time."
        );
    } else {
        let _ = writeln!(
            report,
            "This dataset is mostly closed (Choice) questions; data entry will be faster."
        );
    }

    report
}

/// Profiles as a sheet (`Column Analysis`) plus a Metric/Value summary sheet.
pub fn profile_tables(profiles: &[ColumnProfile], summary: &DatasetSummary) -> (Table, Table) {
    let mut analysis = Table::new(
        [
            "Column Name",
            "Type",
            "Unique Values",
            "Total Values",
            "Uniqueness Ratio",
            "Sample Values",
            "Contains Reason Keywords",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect(),
    );
    for p in profiles {
        analysis.push_row(vec![
            p.column.clone(),
            p.entry_type.to_string(),
            p.unique_values.to_string(),
            p.total_values.to_string(),
            p.uniqueness_ratio.clone(),
            if p.sample_values.is_empty() {
                "No Data".to_string()
            } else {
                format!("{:?}", p.sample_values)
            },
            p.contains_reason_keywords.to_string(),
        ]);
    }

    let mut metrics = Table::new(vec!["Metric".to_string(), "Value".to_string()]);
    for (metric, value) in [
        ("Total Columns", summary.total_columns),
        ("Choice Columns", summary.choice_columns),
        ("Entry Columns", summary.entry_columns),
        ("Mixed Columns", summary.mixed_columns),
    ] {
        metrics.push_row(vec![metric.to_string(), value.to_string()]);
    }

    (analysis, metrics)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_short_answers_are_choice() {
        let values = vec!["yes", "no", "yes", "yes", "no", "no", "yes", "no", "yes", "no"];
        let (kind, unique, total) = detect_entry_type("has_water", &values);
        assert_eq!(kind, ColumnEntryType::Choice);
        assert_eq!((unique, total), (2, 10));
    }

    #[test]
    fn distinct_answers_are_entry() {
        let values = vec!["a1", "b2", "c3", "d4"];
        assert_eq!(detect_entry_type("name", &values).0, ColumnEntryType::Entry);
    }

    #[test]
    fn reason_keyword_promotes_mixed_to_entry() {
        // 2 unique of 4 → ratio 0.5, neither choice nor entry by ratio
        let values = vec!["x", "y", "x", "y"];
        assert_eq!(detect_entry_type("q1", &values).0, ColumnEntryType::Mixed);
        assert_eq!(
            detect_entry_type("Other_Comment", &values).0,
            ColumnEntryType::Entry
        );
        assert_eq!(detect_entry_type("دلایل", &values).0, ColumnEntryType::Entry);
    }

    #[test]
    fn blank_column_is_empty() {
        assert_eq!(detect_entry_type("q", &["", "  "]).0, ColumnEntryType::Empty);
    }

    #[test]
    fn summary_flags_reason_entry_columns() {
        let table = Table::from_values(vec![
            vec!["gender".into(), "reason_for_leaving".into(), "note".into()],
            vec!["m".into(), "conflict in village".into(), "a".into()],
            vec!["f".into(), "no work".into(), "b".into()],
            vec!["m".into(), "drought".into(), "a".into()],
            vec!["m".into(), "family".into(), "b".into()],
        ]);
        let (profiles, summary) = analyze_columns(&table);
        assert_eq!(profiles.len(), 3);
        assert_eq!(summary.high_priority_entries, vec!["reason_for_leaving"]);
        assert_eq!(summary.entry_columns, 1);

        let report = summary_report(&profiles, &summary);
        assert!(report.contains("reason_for_leaving (contains reason keywords)"));
    }
}
