pub mod config;
pub mod errors;

pub use config::{AppConfig, TranslationDefaults, WorkbookConfig};
pub use errors::{RefineryError, Result};

use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

static UNSAFE_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9_-]+").expect("static regex"));

const NULL_MARKERS: [&str; 3] = ["nan", "none", "null"];

pub fn sanitize_cell(value: &str) -> String {
    if value.starts_with('=')
        || value.starts_with('+')
        || value.starts_with('-')
        || value.starts_with('@')
    {
        format!("'{}", value)
    } else {
        value.to_string()
    }
}

/// Trimmed copy of a cell; the form treats missing and whitespace-only alike.
pub fn normalize_val(value: &str) -> String {
    value.trim().to_string()
}

/// True for empty cells and the textual nulls (`nan`, `none`, `null`) of exported sheets.
pub fn is_null_marker(value: &str) -> bool {
    let v = value.trim();
    v.is_empty() || NULL_MARKERS.contains(&v.to_lowercase().as_str())
}

/// File stem with every run of characters outside `[A-Za-z0-9_-]` replaced by `_`.
pub fn safe_file_stem(path: &str) -> String {
    let stem = Path::new(path)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    UNSAFE_NAME_RE.replace_all(&stem, "_").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formula_prefixes_are_quoted() {
        assert_eq!(sanitize_cell("=SUM(A1)"), "'=SUM(A1)");
        assert_eq!(sanitize_cell("-5"), "'-5");
        assert_eq!(sanitize_cell("plain"), "plain");
    }

    #[test]
    fn null_markers() {
        assert!(is_null_marker(""));
        assert!(is_null_marker("  NaN "));
        assert!(is_null_marker("None"));
        assert!(!is_null_marker("n/a"));
        assert!(!is_null_marker("کابل"));
    }

    #[test]
    fn safe_stem_replaces_runs() {
        assert_eq!(safe_file_stem("/tmp/Survey Round 2 (final).xlsx"), "Survey_Round_2_final_");
        assert_eq!(safe_file_stem("data.v2.csv"), "data_v2");
    }
}
