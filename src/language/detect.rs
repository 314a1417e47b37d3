use crate::dataset::Table;
use crate::utils::{is_null_marker, normalize_val};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Arabic, Arabic Supplement and Arabic Extended-A: the blocks Dari and Pashto are written in.
static ARABIC_BLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\u{0600}-\u{06FF}\u{0750}-\u{077F}\u{08A0}-\u{08FF}]").expect("static regex")
});

static PERSO_ARABIC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\u{0600}-\u{06FF}]").expect("static regex"));

static ENGLISH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-zA-Z]").expect("static regex"));

const ATTENTION_MARKERS: [&str; 7] = ["n/a", "na", "null", "none", "nan", "-", "--"];

pub const DEFAULT_SCAN_LIMIT: usize = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    Empty,
    DariPashto,
    English,
    Unknown,
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Language::Empty => write!(f, "empty"),
            Language::DariPashto => write!(f, "dari_pashto"),
            Language::English => write!(f, "english"),
            Language::Unknown => write!(f, "unknown"),
        }
    }
}

/// Arabic script wins over Latin, so mixed cells are treated as needing translation.
pub fn detect_language(text: &str) -> Language {
    let s = text.trim();
    if s.is_empty() {
        return Language::Empty;
    }
    if ARABIC_BLOCK_RE.is_match(s) {
        return Language::DariPashto;
    }
    if ENGLISH_RE.is_match(s) {
        return Language::English;
    }
    Language::Unknown
}

pub fn is_dari_pashto_text(text: &str) -> bool {
    if is_null_marker(text) {
        return false;
    }
    ARABIC_BLOCK_RE.is_match(text.trim())
}

pub fn contains_perso_arabic(text: &str) -> bool {
    PERSO_ARABIC_RE.is_match(text)
}

/// A review field needs attention when it is blank, a placeholder, or still untranslated.
pub fn needs_attention(value: &str) -> bool {
    let v = normalize_val(value);
    if v.is_empty() {
        return true;
    }
    if ATTENTION_MARKERS.contains(&v.to_lowercase().as_str()) {
        return true;
    }
    contains_perso_arabic(&v)
}

/// Columns with at least one Dari/Pashto cell among the first `limit_scan` rows.
pub fn columns_with_dari_pashto(table: &Table, limit_scan: usize) -> Vec<String> {
    let n = table.row_count().min(limit_scan);
    if n == 0 {
        return Vec::new();
    }

    table
        .headers
        .iter()
        .enumerate()
        .filter(|(idx, _)| {
            table.rows[..n]
                .iter()
                .any(|row| is_dari_pashto_text(&row[*idx]))
        })
        .map(|(_, name)| name.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_cells() {
        assert_eq!(detect_language("   "), Language::Empty);
        assert_eq!(detect_language("سلام"), Language::DariPashto);
        assert_eq!(detect_language("ښه راغلاست"), Language::DariPashto);
        assert_eq!(detect_language("Hello"), Language::English);
        assert_eq!(detect_language("Kabul کابل"), Language::DariPashto);
        assert_eq!(detect_language("12345"), Language::Unknown);
    }

    #[test]
    fn null_markers_are_not_dari() {
        assert!(!is_dari_pashto_text("NaN"));
        assert!(!is_dari_pashto_text(""));
        assert!(is_dari_pashto_text(" هرات "));
    }

    #[test]
    fn extended_block_counts_for_detection_but_not_review() {
        // U+08A0 ARABIC LETTER BEH WITH SMALL V BELOW
        let ext = "\u{08A0}";
        assert!(is_dari_pashto_text(ext));
        assert!(!contains_perso_arabic(ext));
    }

    #[test]
    fn attention_rules() {
        assert!(needs_attention(""));
        assert!(needs_attention(" N/A "));
        assert!(needs_attention("--"));
        assert!(needs_attention("بلی"));
        assert!(!needs_attention("yes"));
        assert!(!needs_attention("0"));
    }

    #[test]
    fn scans_only_the_leading_rows() {
        let table = Table::from_values(vec![
            vec!["a".into(), "b".into(), "c".into()],
            vec!["x".into(), "کابل".into(), "y".into()],
            vec!["x".into(), "y".into(), "هرات".into()],
        ]);
        assert_eq!(columns_with_dari_pashto(&table, 1), vec!["b"]);
        assert_eq!(columns_with_dari_pashto(&table, DEFAULT_SCAN_LIMIT), vec!["b", "c"]);
    }
}
