use crate::dataset::{Table, WorkbookWriter};
use crate::language::{
    detect_language, looks_like_name_or_place, protect_phrases, transliterate, Language,
};
use crate::translation::client::RobustTranslator;
use crate::translation::provider::ProviderStrategy;
use crate::utils::{safe_file_stem, RefineryError, Result, TranslationDefaults};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

pub const MAX_BATCH_SIZE: usize = 100;
pub const MAX_ROW_DELAY_MS: u64 = 1500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    /// Translate meaning.
    #[default]
    Translate,
    /// Romanize only, for names and places.
    Transliterate,
    /// Names and places are romanized, sentences translated.
    Auto,
}

impl std::fmt::Display for OutputMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputMode::Translate => write!(f, "Translate meaning"),
            OutputMode::Transliterate => write!(f, "Transliterate only"),
            OutputMode::Auto => write!(f, "Auto (names transliterated, sentences translated)"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ExportMode {
    ReplaceOriginal,
    #[default]
    AddColumn,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct JobOptions {
    pub column: String,
    #[serde(default)]
    pub key_column: Option<String>,
    #[serde(default)]
    pub output_mode: OutputMode,
    /// Named provider chain; `translation.provider_order` from config when absent.
    #[serde(default)]
    pub strategy: Option<ProviderStrategy>,
    #[serde(default)]
    pub do_not_translate: Vec<String>,
    #[serde(default)]
    pub export_mode: ExportMode,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
    #[serde(default = "default_target_lang")]
    pub target_lang: String,
    /// Caller-assigned run id; a fresh v4 id otherwise.
    #[serde(default)]
    pub run_id: Option<String>,
}

fn default_batch_size() -> usize {
    TranslationDefaults::default().batch_size
}

fn default_delay_ms() -> u64 {
    TranslationDefaults::default().row_delay_ms
}

fn default_target_lang() -> String {
    TranslationDefaults::default().target_lang
}

impl JobOptions {
    pub fn new(column: impl Into<String>) -> Self {
        Self::from_defaults(column, &TranslationDefaults::default())
    }

    /// Batch size, row delay and target language taken from the `[translation]` config.
    pub fn from_defaults(column: impl Into<String>, defaults: &TranslationDefaults) -> Self {
        Self {
            column: column.into(),
            key_column: None,
            output_mode: OutputMode::default(),
            strategy: None,
            do_not_translate: Vec::new(),
            export_mode: ExportMode::default(),
            batch_size: defaults.batch_size,
            delay_ms: defaults.row_delay_ms,
            target_lang: defaults.target_lang.clone(),
            run_id: None,
        }
    }

    fn batch_size(&self) -> usize {
        self.batch_size.clamp(1, MAX_BATCH_SIZE)
    }

    fn row_delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms.min(MAX_ROW_DELAY_MS))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct JobReport {
    pub run_id: String,
    pub source_column: String,
    pub key_column: Option<String>,
    pub total_rows: usize,
    pub dari_pashto_rows: usize,
    pub other_rows: usize,
    pub processed_rows: usize,
    pub translated_rows: usize,
    pub transliterated_rows: usize,
    /// Dari/Pashto text that came back unchanged after every provider gave up.
    pub failed_rows: usize,
    pub result_column: String,
    /// Strategy name, or the configured provider chain.
    pub provider_strategy: String,
    pub output_mode: OutputMode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TranslationLogEntry {
    pub key: String,
    pub original_value: String,
    pub translated_value: String,
}

/// Reported to the caller after each batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobProgress {
    pub rows_processed: usize,
    pub rows_total: usize,
    pub batches_completed: usize,
    pub batches_total: usize,
}

#[derive(Debug, Clone)]
pub struct JobOutcome {
    pub report: JobReport,
    /// Built before any replacement so originals survive `ReplaceOriginal`.
    pub log: Vec<TranslationLogEntry>,
}

enum RowResult {
    Translated(String),
    Transliterated(String),
    Unchanged(String),
    Failed(String),
}

pub async fn run_column_job<P>(
    table: &mut Table,
    options: &JobOptions,
    translator: &RobustTranslator,
    mut progress: P,
) -> Result<JobOutcome>
where
    P: FnMut(JobProgress),
{
    let column_idx = table.require_column(&options.column)?;
    if let Some(key) = &options.key_column {
        table.require_column(key)?;
    }

    let run_id = options
        .run_id
        .clone()
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    let total_rows = table.row_count();
    let dari_pashto_rows = table
        .rows
        .iter()
        .filter(|r| detect_language(&r[column_idx]) == Language::DariPashto)
        .count();

    info!(
        run_id = %run_id,
        column = %options.column,
        rows = total_rows,
        dari_pashto_rows = dari_pashto_rows,
        mode = %options.output_mode,
        "Translation job started"
    );

    let batch_size = options.batch_size();
    let row_delay = options.row_delay();
    let batches_total = total_rows.div_ceil(batch_size);

    let mut results = Vec::with_capacity(total_rows);
    let mut translated_rows = 0;
    let mut transliterated_rows = 0;
    let mut failed_rows = 0;

    for (batch_idx, batch) in table.rows.chunks(batch_size).enumerate() {
        for row in batch {
            if !row_delay.is_zero() {
                tokio::time::sleep(row_delay).await;
            }

            let original = row[column_idx].trim();
            let value = match process_row(original, options, translator).await {
                RowResult::Translated(v) => {
                    translated_rows += 1;
                    v
                }
                RowResult::Transliterated(v) => {
                    transliterated_rows += 1;
                    v
                }
                RowResult::Failed(v) => {
                    failed_rows += 1;
                    v
                }
                RowResult::Unchanged(v) => v,
            };
            results.push(value);
        }

        progress(JobProgress {
            rows_processed: results.len(),
            rows_total: total_rows,
            batches_completed: batch_idx + 1,
            batches_total,
        });
    }

    let out_column = format!("{}_OUT", options.column);
    table.push_column(&out_column, results);

    let log = translation_log(
        table,
        &options.column,
        &out_column,
        options.key_column.as_deref(),
    )?;

    let result_column = match options.export_mode {
        ExportMode::AddColumn => out_column,
        ExportMode::ReplaceOriginal => {
            let out_idx = table.require_column(&out_column)?;
            for row in &mut table.rows {
                row[column_idx] = row[out_idx].clone();
            }
            table.drop_column(&out_column)?;
            options.column.clone()
        }
    };

    let report = JobReport {
        run_id,
        source_column: options.column.clone(),
        key_column: options.key_column.clone(),
        total_rows,
        dari_pashto_rows,
        other_rows: total_rows - dari_pashto_rows,
        processed_rows: total_rows,
        translated_rows,
        transliterated_rows,
        failed_rows,
        result_column,
        provider_strategy: options
            .strategy
            .map(|s| s.to_string())
            .unwrap_or_else(|| translator.provider_names().join(" + ")),
        output_mode: options.output_mode,
    };

    info!(
        run_id = %report.run_id,
        processed = report.processed_rows,
        translated = report.translated_rows,
        transliterated = report.transliterated_rows,
        failed = report.failed_rows,
        "Translation job completed"
    );

    Ok(JobOutcome { report, log })
}

async fn process_row(original: &str, options: &JobOptions, translator: &RobustTranslator) -> RowResult {
    let is_dari_pashto = detect_language(original) == Language::DariPashto;

    let romanize = match options.output_mode {
        OutputMode::Transliterate => true,
        OutputMode::Auto => is_dari_pashto && looks_like_name_or_place(original),
        OutputMode::Translate => false,
    };
    if romanize {
        let roman = transliterate(original);
        return if roman == original {
            RowResult::Unchanged(roman)
        } else {
            RowResult::Transliterated(roman)
        };
    }

    let protected = protect_phrases(original, &options.do_not_translate);
    let sendable = detect_language(&protected.text) == Language::DariPashto;
    let translated = translator
        .translate_text(&protected.text, &options.target_lang)
        .await;

    if !sendable {
        return RowResult::Unchanged(protected.restore(&translated));
    }
    if translated == protected.text.trim() {
        return RowResult::Failed(protected.restore(&translated));
    }
    RowResult::Translated(protected.restore(&translated))
}

/// One entry per row with a non-empty original; rows without a key get `ROW_0001`-style ids.
pub fn translation_log(
    table: &Table,
    original_col: &str,
    translated_col: &str,
    key_col: Option<&str>,
) -> Result<Vec<TranslationLogEntry>> {
    let original_idx = table.require_column(original_col)?;
    let translated_idx = table.require_column(translated_col)?;
    let key_idx = key_col.and_then(|k| table.column_index(k));

    let entries = table
        .rows
        .iter()
        .enumerate()
        .filter_map(|(i, row)| {
            let original = row[original_idx].trim();
            if original.is_empty() {
                return None;
            }
            let key = key_idx
                .map(|k| row[k].trim())
                .filter(|k| !k.is_empty())
                .map(|k| k.to_string())
                .unwrap_or_else(|| format!("ROW_{:04}", i + 1));
            Some(TranslationLogEntry {
                key,
                original_value: original.to_string(),
                translated_value: row[translated_idx].trim().to_string(),
            })
        })
        .collect();

    Ok(entries)
}

pub fn log_table(log: &[TranslationLogEntry]) -> Table {
    let mut table = Table::new(vec![
        "Key".to_string(),
        "Original_Value".to_string(),
        "Translated_Value".to_string(),
    ]);
    for entry in log {
        table.push_row(vec![
            entry.key.clone(),
            entry.original_value.clone(),
            entry.translated_value.clone(),
        ]);
    }
    table
}

pub fn job_summary(report: &JobReport) -> Table {
    let mut table = Table::new(vec!["Metric".to_string(), "Value".to_string()]);
    let rows = [
        ("Total Rows", report.total_rows.to_string()),
        ("Processed Rows", report.processed_rows.to_string()),
        ("Source Column", report.source_column.clone()),
        (
            "Key Column",
            report
                .key_column
                .clone()
                .unwrap_or_else(|| "Auto-generated".to_string()),
        ),
        ("Provider Strategy", report.provider_strategy.clone()),
        ("Output Mode", report.output_mode.to_string()),
        ("Run ID", report.run_id.clone()),
    ];
    for (metric, value) in rows {
        table.push_row(vec![metric.to_string(), value]);
    }
    table
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct JobExports {
    pub processed_path: String,
    pub log_path: String,
}

pub fn export_job(
    table: &Table,
    outcome: &JobOutcome,
    out_dir: &Path,
    input_name: &str,
) -> Result<JobExports> {
    let safe = safe_file_stem(input_name);
    if safe.is_empty() {
        return Err(RefineryError::ValidationError(format!(
            "cannot derive an export name from '{}'",
            input_name
        )));
    }

    let processed_path = out_dir.join(format!("processed_{}.xlsx", safe));
    let log_path = out_dir.join(format!("output_log_{}.xlsx", safe));
    let processed_path = processed_path.to_string_lossy().to_string();
    let log_path = log_path.to_string_lossy().to_string();

    let mut processed = WorkbookWriter::new();
    processed.add_sheet("Processed_Data", table)?;
    processed.save(&processed_path)?;

    let mut log = WorkbookWriter::new();
    log.add_sheet("Output_Log", &log_table(&outcome.log))?;
    log.add_sheet("Summary", &job_summary(&outcome.report))?;
    log.save(&log_path)?;

    info!(
        run_id = %outcome.report.run_id,
        processed = %processed_path,
        log = %log_path,
        "Job exports written"
    );

    Ok(JobExports {
        processed_path,
        log_path,
    })
}
