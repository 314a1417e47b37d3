use crate::dataset::Table;
use crate::language::{contains_perso_arabic, needs_attention};
use crate::utils::{is_null_marker, normalize_val, RefineryError, Result};
use crate::workbook::{SheetStore, WorkbookLayout};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use tracing::info;

pub const REVIEW_LOG_HEADERS: [&str; 5] = ["_uuid", "Question", "old_value", "new_value", "Edited_By"];

/// Columns with at most this many distinct values are offered as a pick list.
const SELECT_MAX_OPTIONS: usize = 7;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldKind {
    Select { options: Vec<String> },
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ReviewField {
    pub question: String,
    pub current_value: String,
    #[serde(flatten)]
    pub kind: FieldKind,
    pub rtl: bool,
    pub needs_attention: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ReviewForm {
    pub uuid: String,
    pub hidden_columns: usize,
    pub fields: Vec<ReviewField>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FieldEdit {
    pub question: String,
    pub new_value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ReviewSubmission {
    pub uuid: String,
    pub editor: String,
    pub saved: usize,
    pub unchanged: usize,
    pub message: String,
}

/// Labels listed in the hidden tab, lowercased; one cell may hold several comma-separated names.
fn load_hidden_labels(store: &dyn SheetStore, layout: &WorkbookLayout) -> Result<HashSet<String>> {
    let Some(sheet) = store.try_read_sheet(&layout.hidden_sheet)? else {
        return Ok(HashSet::new());
    };
    let Ok(values) = sheet.column_values(&layout.hidden_label_column) else {
        return Ok(HashSet::new());
    };

    Ok(values
        .into_iter()
        .filter(|v| !is_null_marker(v))
        .flat_map(|v| v.split(','))
        .map(|p| p.trim().to_lowercase())
        .filter(|p| !p.is_empty())
        .collect())
}

fn load_record<'a>(data: &'a Table, layout: &WorkbookLayout, uuid: &str) -> Result<(usize, &'a [String])> {
    if data.is_empty() {
        return Err(RefineryError::ValidationError(format!(
            "{} is empty.",
            layout.data_sheet
        )));
    }
    let id_idx = data.column_index(&layout.id_column).ok_or_else(|| {
        RefineryError::ValidationError(format!(
            "{} sheet must contain {} column.",
            layout.data_sheet, layout.id_column
        ))
    })?;
    let row = data
        .rows
        .iter()
        .find(|r| r[id_idx] == uuid)
        .ok_or_else(|| RefineryError::RecordNotFound(uuid.to_string()))?;
    Ok((id_idx, row.as_slice()))
}

fn field_kind(data: &Table, col: usize) -> FieldKind {
    let distinct: BTreeSet<String> = data
        .rows
        .iter()
        .map(|r| r[col].trim())
        .filter(|v| !is_null_marker(v))
        .map(|v| v.to_string())
        .collect();

    if distinct.len() <= SELECT_MAX_OPTIONS {
        FieldKind::Select {
            options: distinct.into_iter().collect(),
        }
    } else {
        FieldKind::Text
    }
}

/// Builds the edit form for one record. With `filter_needed` only blank, placeholder or
/// untranslated fields are returned.
pub fn open_review(
    store: &dyn SheetStore,
    layout: &WorkbookLayout,
    uuid: &str,
    filter_needed: bool,
) -> Result<ReviewForm> {
    let uuid = uuid.trim();
    let data = store.read_sheet(&layout.data_sheet)?;
    let (id_idx, row) = load_record(&data, layout, uuid)?;
    let hidden = load_hidden_labels(store, layout)?;

    let mut fields = Vec::new();
    for (col, question) in data.headers.iter().enumerate() {
        if col == id_idx || hidden.contains(&question.trim().to_lowercase()) {
            continue;
        }
        let current = normalize_val(&row[col]);
        let attention = needs_attention(&current);
        if filter_needed && !attention {
            continue;
        }
        fields.push(ReviewField {
            question: question.clone(),
            rtl: contains_perso_arabic(&current),
            kind: field_kind(&data, col),
            needs_attention: attention,
            current_value: current,
        });
    }

    Ok(ReviewForm {
        uuid: uuid.to_string(),
        hidden_columns: hidden.len(),
        fields,
    })
}

/// Appends every real change in one call to the review log tab.
pub fn submit_review(
    store: &dyn SheetStore,
    layout: &WorkbookLayout,
    uuid: &str,
    editor: &str,
    edits: &[FieldEdit],
) -> Result<ReviewSubmission> {
    let uuid = uuid.trim();
    let editor = editor.trim();
    if uuid.is_empty() || editor.is_empty() {
        return Err(RefineryError::ValidationError(
            "Both _uuid and editor name are required".to_string(),
        ));
    }

    let data = store.read_sheet(&layout.data_sheet)?;
    let (_, row) = load_record(&data, layout, uuid)?;

    let mut changes = Vec::new();
    for edit in edits {
        let col = data.require_column(&edit.question)?;
        let old = normalize_val(&row[col]);
        let new = normalize_val(&edit.new_value);
        if new != old {
            changes.push(vec![
                uuid.to_string(),
                edit.question.clone(),
                old,
                new,
                editor.to_string(),
            ]);
        }
    }

    let unchanged = edits.len() - changes.len();
    if changes.is_empty() {
        return Ok(ReviewSubmission {
            uuid: uuid.to_string(),
            editor: editor.to_string(),
            saved: 0,
            unchanged,
            message: "No changes detected.".to_string(),
        });
    }

    let headers: Vec<String> = REVIEW_LOG_HEADERS.iter().map(|h| h.to_string()).collect();
    store.ensure_sheet(&layout.review_log_sheet, &headers)?;
    let saved = store.append_rows(&layout.review_log_sheet, &changes)?;

    info!(uuid = %uuid, editor = %editor, saved = saved, "Review saved");

    Ok(ReviewSubmission {
        uuid: uuid.to_string(),
        editor: editor.to_string(),
        saved,
        unchanged,
        message: format!("Saved: {} change(s) | Editor: {}", saved, editor),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workbook::RedbWorkbook;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn seeded() -> (RedbWorkbook, WorkbookLayout) {
        let store = RedbWorkbook::in_memory().unwrap();
        let layout = WorkbookLayout::default();

        let mut rows = vec![strings(&["_uuid", "consent", "comment", "enumerator", "phone"])];
        for i in 0..10 {
            rows.push(vec![
                format!("u{}", i),
                if i % 2 == 0 { "yes".into() } else { "no".into() },
                format!("comment {}", i),
                "Ali".into(),
                "070".into(),
            ]);
        }
        rows[1][2] = "آب نیست".into();
        rows[1][1] = "n/a".into();
        store
            .write_sheet(&layout.data_sheet, &Table::from_values(rows))
            .unwrap();
        store
            .write_sheet(
                &layout.hidden_sheet,
                &Table::from_values(vec![strings(&["Labels"]), strings(&["Enumerator, PHONE"]), strings(&["nan"])]),
            )
            .unwrap();
        (store, layout)
    }

    #[test]
    fn form_hides_labels_and_classifies_fields() {
        let (store, layout) = seeded();
        let form = open_review(&store, &layout, "u0", false).unwrap();

        assert_eq!(form.hidden_columns, 2);
        let questions: Vec<_> = form.fields.iter().map(|f| f.question.as_str()).collect();
        assert_eq!(questions, vec!["consent", "comment"]);

        assert_eq!(
            form.fields[0].kind,
            FieldKind::Select {
                options: strings(&["n/a", "no", "yes"])
            }
        );
        assert_eq!(form.fields[1].kind, FieldKind::Text);
        assert!(form.fields[1].rtl);
    }

    #[test]
    fn filter_keeps_fields_needing_attention() {
        let (store, layout) = seeded();
        let form = open_review(&store, &layout, "u0", true).unwrap();
        assert_eq!(form.fields.len(), 2);

        let form = open_review(&store, &layout, "u1", true).unwrap();
        assert!(form.fields.is_empty());
    }

    #[test]
    fn unknown_record_is_an_error() {
        let (store, layout) = seeded();
        assert!(matches!(
            open_review(&store, &layout, "zzz", false),
            Err(RefineryError::RecordNotFound(_))
        ));
    }

    #[test]
    fn submit_records_only_real_changes() {
        let (store, layout) = seeded();
        let edits = vec![
            FieldEdit {
                question: "comment".into(),
                new_value: "There is no water".into(),
            },
            FieldEdit {
                question: "consent".into(),
                new_value: " n/a ".into(),
            },
        ];

        let result = submit_review(&store, &layout, "u0", "Sara", &edits).unwrap();
        assert_eq!(result.saved, 1);
        assert_eq!(result.unchanged, 1);

        let log = store.read_sheet(&layout.review_log_sheet).unwrap();
        assert_eq!(log.headers, strings(&REVIEW_LOG_HEADERS));
        assert_eq!(log.rows[0], strings(&["u0", "comment", "آب نیست", "There is no water", "Sara"]));

        let again = submit_review(&store, &layout, "u0", "Sara", &edits[1..]).unwrap();
        assert_eq!(again.saved, 0);
        assert_eq!(again.message, "No changes detected.");
    }

    #[test]
    fn submit_requires_editor() {
        let (store, layout) = seeded();
        assert!(submit_review(&store, &layout, "u0", "  ", &[]).is_err());
    }
}
