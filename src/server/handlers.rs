//! Operations shared by the MCP tools and the HTTP routes.

use crate::dataset::{
    analyze_columns, analyze_dataset, list_sheets, profile_tables, read_table, summary_report,
    ColumnProfile, DatasetMetadata, DatasetSummary, Table, WorkbookWriter,
};
use crate::language::{
    columns_with_dari_pashto, detect_language, is_dari_pashto_text, looks_like_name_or_place,
    needs_attention, transliterate, Language, DEFAULT_SCAN_LIMIT,
};
use crate::state::cleanup::sweep_jobs;
use crate::state::{AppState, JobState};
use crate::stats::{
    available_operations, calculate, chart_data, compatible_charts, prepare_pair, ChartData,
    ChartKind, ColumnKind, Operation, OperationValue, PairOptions,
};
use crate::translation::{
    export_job, export_missing_translations, extract_missing_translations, run_column_job,
    ExportMode, ExtractExports, JobOptions, JobProgress, MissingTranslation, OutputMode,
    ProviderStrategy, RobustTranslator, DEFAULT_LIST_STEM,
};
use crate::utils::{safe_file_stem, RefineryError, Result, TranslationDefaults};
use crate::workbook::{
    export_filtered, export_sheet, import_sheet, open_review, submit_review, sync_corrections,
    update_dataset, ApplyMode, ApplyOptions, ApplyReport, FieldEdit, ReviewForm,
    ReviewSubmission, UpdateOptions, UpdateReport,
};
use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::sync::mpsc;
use tracing::{error, info};
use uuid::Uuid;

const PREVIEW_ROWS: usize = 50;

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[schemars(description = "Parameters for analyzing a dataset file")]
pub struct AnalyzeDatasetParams {
    #[schemars(description = "Path to the CSV or XLSX file")]
    pub file_path: String,
    #[schemars(description = "Worksheet name (XLSX only, default: first sheet)")]
    pub sheet: Option<String>,
    #[schemars(description = "Number of sample rows to return (default: 10)")]
    pub sample_rows: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[schemars(description = "A dataset file, or a workbook tab when no file is given")]
pub struct SourceParams {
    #[schemars(description = "Path to a CSV or XLSX file")]
    pub file_path: Option<String>,
    #[schemars(description = "Worksheet in the file, or workbook tab when file_path is omitted (default: the data tab)")]
    pub sheet: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ClassifyColumnsParams {
    #[serde(flatten)]
    pub source: SourceParams,
    #[schemars(description = "Also write column_analysis_<name>.xlsx to the export directory")]
    #[serde(default)]
    pub export: bool,
}

#[derive(Debug, Serialize)]
pub struct ClassifyColumnsResult {
    pub profiles: Vec<ColumnProfile>,
    pub summary: DatasetSummary,
    pub report: String,
    pub export_path: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct DetectLanguageParams {
    #[serde(flatten)]
    pub source: SourceParams,
    #[schemars(description = "Rows scanned per column (default: 2000)")]
    pub limit_scan: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct LanguageColumn {
    pub column: String,
    pub dari_pashto_cells: usize,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct InspectTextParams {
    #[schemars(description = "Texts to classify")]
    pub texts: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct TextInspection {
    pub text: String,
    pub language: String,
    pub name_or_place: bool,
    pub needs_attention: bool,
    pub transliteration: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ExtractMissingParams {
    #[serde(flatten)]
    pub source: SourceParams,
    #[schemars(description = "Key column (default: _uuid); rows without a key get ROW_000001-style ids")]
    pub key_column: Option<String>,
    #[schemars(description = "Columns to skip")]
    #[serde(default)]
    pub exclude_columns: Vec<String>,
    #[schemars(description = "Drop repeated (key, label, value) triples (default: true)")]
    pub remove_duplicates: Option<bool>,
    #[schemars(description = "Export file stem (default: missing_translations)")]
    pub output_name: Option<String>,
    #[schemars(description = "Sheet name of the XLSX export (default: Translation_List)")]
    pub output_sheet: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ExtractMissingResult {
    pub total: usize,
    pub preview: Vec<MissingTranslation>,
    pub exports: Option<ExtractExports>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct TranslateColumnParams {
    #[schemars(description = "Path to the CSV or XLSX file")]
    pub file_path: String,
    #[schemars(description = "Worksheet name (XLSX only)")]
    pub sheet: Option<String>,
    #[schemars(description = "Column to translate")]
    pub column: String,
    #[schemars(description = "Record key column for the log; rows are numbered when absent")]
    pub key_column: Option<String>,
    #[serde(default)]
    pub output_mode: OutputMode,
    #[schemars(description = "Provider chain; the configured provider_order when absent")]
    pub strategy: Option<ProviderStrategy>,
    #[serde(default)]
    pub do_not_translate: Vec<String>,
    #[serde(default)]
    pub export_mode: ExportMode,
    #[schemars(description = "Rows per progress update (1-100, config default)")]
    pub batch_size: Option<usize>,
    #[schemars(description = "Pause before each row in ms (0-1500, config default)")]
    pub delay_ms: Option<u64>,
    #[schemars(description = "Target language code (config default)")]
    pub target_lang: Option<String>,
}

impl TranslateColumnParams {
    /// Job options with unset fields taken from the `[translation]` config.
    pub fn job_options(&self, defaults: &TranslationDefaults) -> JobOptions {
        let mut options = JobOptions::from_defaults(self.column.clone(), defaults);
        options.key_column = self.key_column.clone();
        options.output_mode = self.output_mode;
        options.strategy = self.strategy;
        options.do_not_translate = self.do_not_translate.clone();
        options.export_mode = self.export_mode;
        if let Some(batch_size) = self.batch_size {
            options.batch_size = batch_size;
        }
        if let Some(delay_ms) = self.delay_ms {
            options.delay_ms = delay_ms;
        }
        if let Some(target_lang) = &self.target_lang {
            options.target_lang = target_lang.clone();
        }
        options
    }
}

#[derive(Debug, Serialize)]
pub struct JobStarted {
    pub run_id: String,
    pub rows_total: usize,
    pub providers: Vec<String>,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct JobProgressParams {
    #[schemars(description = "Run id returned by translate_column")]
    pub run_id: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ApplyCorrectionsParams {
    #[schemars(description = "new_value_only (skip empty new values) or overwrite")]
    #[serde(default)]
    pub mode: ApplyMode,
    #[schemars(description = "Only corrections with a new_value (default: true)")]
    pub only_pending: Option<bool>,
    #[schemars(description = "Must be true; the data tab is rewritten")]
    #[serde(default)]
    pub confirm: bool,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct UpdateDatasetParams {
    #[schemars(description = "Path to the uploaded CSV or XLSX file")]
    pub file_path: String,
    pub sheet: Option<String>,
    #[schemars(description = "Column holding the submission date")]
    pub date_column: String,
    #[schemars(description = "Keep rows on or after this date (YYYY-MM-DD)")]
    pub start_date: String,
    #[schemars(description = "Append new records to the data tab (default: true)")]
    pub upload: Option<bool>,
    #[schemars(description = "Write filtered_data_output.xlsx to the export directory")]
    #[serde(default)]
    pub export: bool,
}

#[derive(Debug, Serialize)]
pub struct UpdateDatasetResult {
    pub report: UpdateReport,
    pub export_path: Option<String>,
    pub preview: Vec<serde_json::Value>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct OpenReviewParams {
    pub uuid: String,
    #[schemars(description = "Only blank, placeholder or untranslated fields")]
    #[serde(default)]
    pub filter_needed: bool,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SubmitReviewParams {
    pub uuid: String,
    pub editor: String,
    pub edits: Vec<FieldEdit>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct StatisticsParams {
    #[serde(flatten)]
    pub source: SourceParams,
    pub x_column: String,
    pub y_column: String,
    #[schemars(description = "Operations to run (default: every available one)")]
    pub operations: Option<Vec<Operation>>,
    #[serde(flatten)]
    pub pair: PairOptionsParams,
}

#[derive(Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct PairOptionsParams {
    #[schemars(description = "Drop rows missing either column (default: true)")]
    pub drop_missing: Option<bool>,
    #[schemars(description = "Categories kept per categorical column, 5..=100 (default: 20)")]
    pub top_n: Option<usize>,
}

impl PairOptionsParams {
    fn options(&self) -> PairOptions {
        let defaults = PairOptions::default();
        PairOptions {
            drop_missing: self.drop_missing.unwrap_or(defaults.drop_missing),
            top_n: self.top_n.unwrap_or(defaults.top_n),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StatisticsResult {
    pub x_kind: ColumnKind,
    pub y_kind: ColumnKind,
    pub rows: usize,
    pub available_operations: Vec<Operation>,
    pub compatible_charts: Vec<ChartKind>,
    pub results: Vec<(String, OperationValue)>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ChartParams {
    #[serde(flatten)]
    pub source: SourceParams,
    pub x_column: String,
    pub y_column: String,
    pub chart: ChartKind,
    #[serde(flatten)]
    pub pair: PairOptionsParams,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SheetTransferParams {
    #[schemars(description = "Workbook tab name")]
    pub name: String,
    #[schemars(description = "CSV or XLSX file path")]
    pub file_path: String,
    #[schemars(description = "Worksheet to read from an XLSX file (import only)")]
    pub source_sheet: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SheetListParams {
    #[schemars(description = "List worksheets of this XLSX file instead of the workbook tabs")]
    pub file_path: Option<String>,
}

fn export_dir(state: &AppState) -> Result<PathBuf> {
    let dir = state.config.export.output_dir.clone();
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

fn load_table(state: &AppState, source: &SourceParams) -> Result<Table> {
    match &source.file_path {
        Some(path) => read_table(path, source.sheet.as_deref()),
        None => {
            let tab = source.sheet.as_deref().unwrap_or(&state.layout.data_sheet);
            state.store.read_sheet(tab)
        }
    }
}

fn source_name(state: &AppState, source: &SourceParams) -> String {
    source
        .file_path
        .clone()
        .or_else(|| source.sheet.clone())
        .unwrap_or_else(|| state.layout.data_sheet.clone())
}

pub async fn analyze(params: AnalyzeDatasetParams) -> Result<DatasetMetadata> {
    analyze_dataset(
        &params.file_path,
        params.sheet.as_deref(),
        params.sample_rows.unwrap_or(10),
    )
    .await
}

pub fn classify_columns(state: &AppState, params: ClassifyColumnsParams) -> Result<ClassifyColumnsResult> {
    let table = load_table(state, &params.source)?;
    let (profiles, summary) = analyze_columns(&table);
    let report = summary_report(&profiles, &summary);

    let export_path = if params.export {
        let name = format!(
            "column_analysis_{}.xlsx",
            safe_file_stem(&source_name(state, &params.source))
        );
        let path = export_dir(state)?.join(name).to_string_lossy().to_string();
        let (analysis, summary_sheet) = profile_tables(&profiles, &summary);
        let mut writer = WorkbookWriter::new();
        writer.add_sheet("Column Analysis", &analysis)?;
        writer.add_sheet("Summary", &summary_sheet)?;
        writer.save(&path)?;
        Some(path)
    } else {
        None
    };

    Ok(ClassifyColumnsResult {
        profiles,
        summary,
        report,
        export_path,
    })
}

pub fn detect_columns(state: &AppState, params: DetectLanguageParams) -> Result<Vec<LanguageColumn>> {
    let table = load_table(state, &params.source)?;
    let limit = params.limit_scan.unwrap_or(DEFAULT_SCAN_LIMIT);

    columns_with_dari_pashto(&table, limit)
        .into_iter()
        .map(|column| {
            let cells = table
                .column_values(&column)?
                .into_iter()
                .take(limit)
                .filter(|v| is_dari_pashto_text(v))
                .count();
            Ok(LanguageColumn {
                column,
                dari_pashto_cells: cells,
            })
        })
        .collect()
}

pub fn inspect_text(params: InspectTextParams) -> Vec<TextInspection> {
    params
        .texts
        .into_iter()
        .map(|text| {
            let language = detect_language(&text);
            TextInspection {
                language: language.to_string(),
                name_or_place: language == Language::DariPashto && looks_like_name_or_place(&text),
                needs_attention: needs_attention(&text),
                transliteration: transliterate(&text),
                text,
            }
        })
        .collect()
}

pub fn extract_missing(state: &AppState, params: ExtractMissingParams) -> Result<ExtractMissingResult> {
    let table = load_table(state, &params.source)?;
    let key = params
        .key_column
        .unwrap_or_else(|| state.layout.id_column.clone());
    let items = extract_missing_translations(
        &table,
        &key,
        &params.exclude_columns,
        params.remove_duplicates.unwrap_or(true),
    );

    let exports = if items.is_empty() {
        None
    } else {
        let stem = params
            .output_name
            .unwrap_or_else(|| DEFAULT_LIST_STEM.to_string());
        let sheet = params
            .output_sheet
            .unwrap_or_else(|| state.config.export.translation_list_sheet.clone());
        Some(export_missing_translations(
            &items,
            &export_dir(state)?,
            &stem,
            Some(&sheet),
        )?)
    };

    Ok(ExtractMissingResult {
        total: items.len(),
        preview: items.iter().take(PREVIEW_ROWS).cloned().collect(),
        exports,
    })
}

/// Validates the request, registers the job and runs it on a background task.
pub async fn start_translation(state: &AppState, params: TranslateColumnParams) -> Result<JobStarted> {
    let mut options = params.job_options(&state.config.translation);
    let mut table = read_table(&params.file_path, params.sheet.as_deref())?;
    table.require_column(&options.column)?;
    if let Some(key) = &options.key_column {
        table.require_column(key)?;
    }

    let translator = RobustTranslator::from_config(&state.config, options.strategy)?;
    let providers = translator.provider_names();
    let out_dir = export_dir(state)?;

    let run_id = Uuid::new_v4().to_string();
    options.run_id = Some(run_id.clone());
    let rows_total = table.row_count();

    sweep_jobs(state).await;
    state.jobs.write().await.insert(
        run_id.clone(),
        JobState::new(
            run_id.clone(),
            params.file_path.clone(),
            options.column.clone(),
            rows_total,
        ),
    );

    let (tx, mut rx) = mpsc::unbounded_channel::<JobProgress>();
    let jobs = state.jobs.clone();
    let progress_id = run_id.clone();
    tokio::spawn(async move {
        while let Some(update) = rx.recv().await {
            if let Some(job) = jobs.write().await.get_mut(&progress_id) {
                job.update_progress(&update);
            }
        }
    });

    let jobs = state.jobs.clone();
    let job_id = run_id.clone();
    let input_path = params.file_path;
    tokio::spawn(async move {
        let result = async {
            let outcome = run_column_job(&mut table, &options, &translator, move |p| {
                let _ = tx.send(p);
            })
            .await?;
            let exports = export_job(&table, &outcome, &out_dir, &input_path)?;
            Ok::<_, RefineryError>((outcome.report, exports))
        }
        .await;

        let mut jobs = jobs.write().await;
        let Some(job) = jobs.get_mut(&job_id) else {
            return;
        };
        match result {
            Ok((report, exports)) => job.complete(report, exports),
            Err(e) => {
                error!(run_id = %job_id, error = %e, "Translation job failed");
                job.fail(e.to_string());
            }
        }
    });

    info!(run_id = %run_id, rows = rows_total, "Translation job queued");

    Ok(JobStarted {
        run_id,
        rows_total,
        providers,
        message: "Job started. Poll get_job_progress with the run_id.".to_string(),
    })
}

pub async fn job_progress(state: &AppState, run_id: &str) -> Result<JobState> {
    state
        .jobs
        .read()
        .await
        .get(run_id)
        .cloned()
        .ok_or_else(|| RefineryError::JobNotFound(run_id.to_string()))
}

pub fn apply_corrections(state: &AppState, params: ApplyCorrectionsParams) -> Result<ApplyReport> {
    let options = ApplyOptions {
        mode: params.mode,
        only_pending: params.only_pending.unwrap_or(true),
    };
    sync_corrections(state.store.as_ref(), &state.layout, options, params.confirm)
}

pub fn update(state: &AppState, params: UpdateDatasetParams) -> Result<UpdateDatasetResult> {
    let start = NaiveDate::parse_from_str(params.start_date.trim(), "%Y-%m-%d").map_err(|_| {
        RefineryError::ValidationError(format!(
            "start_date must be YYYY-MM-DD, got '{}'",
            params.start_date
        ))
    })?;
    let upload = read_table(&params.file_path, params.sheet.as_deref())?;
    let options = UpdateOptions {
        upload: params.upload.unwrap_or(true),
    };

    let outcome = update_dataset(
        state.store.as_ref(),
        &state.layout,
        &upload,
        &params.date_column,
        start,
        options,
    )?;

    let export_path = if params.export {
        Some(export_filtered(&outcome.filtered, &export_dir(state)?)?)
    } else {
        None
    };

    Ok(UpdateDatasetResult {
        preview: outcome.filtered.head(PREVIEW_ROWS).to_json_records(),
        report: outcome.report,
        export_path,
    })
}

pub fn review_form(state: &AppState, params: OpenReviewParams) -> Result<ReviewForm> {
    open_review(
        state.store.as_ref(),
        &state.layout,
        &params.uuid,
        params.filter_needed,
    )
}

pub fn review_submit(state: &AppState, params: SubmitReviewParams) -> Result<ReviewSubmission> {
    submit_review(
        state.store.as_ref(),
        &state.layout,
        &params.uuid,
        &params.editor,
        &params.edits,
    )
}

pub fn statistics(state: &AppState, params: StatisticsParams) -> Result<StatisticsResult> {
    let table = load_table(state, &params.source)?;
    let pair = prepare_pair(&table, &params.x_column, &params.y_column, params.pair.options())?;

    let available = available_operations(pair.x.kind, pair.y.kind);
    let selected: Vec<Operation> = match params.operations {
        Some(ops) => ops.into_iter().filter(|op| available.contains(op)).collect(),
        None => available.clone(),
    };

    Ok(StatisticsResult {
        x_kind: pair.x.kind,
        y_kind: pair.y.kind,
        rows: pair.row_count(),
        compatible_charts: compatible_charts(pair.x.kind, pair.y.kind),
        results: calculate(&pair, &selected),
        available_operations: available,
    })
}

pub fn chart(state: &AppState, params: ChartParams) -> Result<ChartData> {
    let table = load_table(state, &params.source)?;
    let pair = prepare_pair(&table, &params.x_column, &params.y_column, params.pair.options())?;
    chart_data(&pair, params.chart)
}

pub fn import(state: &AppState, params: SheetTransferParams) -> Result<usize> {
    import_sheet(
        state.store.as_ref(),
        &params.name,
        &params.file_path,
        params.source_sheet.as_deref(),
    )
}

pub fn export(state: &AppState, params: SheetTransferParams) -> Result<usize> {
    export_sheet(state.store.as_ref(), &params.name, &params.file_path)
}

pub fn sheets(state: &AppState, params: SheetListParams) -> Result<Vec<String>> {
    match params.file_path {
        Some(path) => list_sheets(&path),
        None => state.store.list_sheets(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::AppConfig;
    use crate::workbook::RedbWorkbook;
    use std::sync::Arc;

    fn state(dir: &std::path::Path) -> AppState {
        let mut config = AppConfig::default();
        config.export.output_dir = dir.join("exports");
        AppState::new(config, Arc::new(RedbWorkbook::in_memory().unwrap()))
    }

    fn seed(state: &AppState) {
        let table = Table::from_values(vec![
            vec!["_uuid".into(), "district".into(), "comment".into(), "age".into()],
            vec!["u1".into(), "Kabul".into(), "آب نیست".into(), "30".into()],
            vec!["u2".into(), "Herat".into(), "fine".into(), "41".into()],
            vec!["u3".into(), "Kabul".into(), "".into(), "25".into()],
        ]);
        state.store.write_sheet(&state.layout.data_sheet, &table).unwrap();
    }

    fn tab_source() -> SourceParams {
        SourceParams {
            file_path: None,
            sheet: None,
        }
    }

    #[test]
    fn detects_columns_from_the_data_tab() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(dir.path());
        seed(&state);

        let columns = detect_columns(
            &state,
            DetectLanguageParams {
                source: tab_source(),
                limit_scan: None,
            },
        )
        .unwrap();
        assert_eq!(columns.len(), 1);
        assert_eq!(columns[0].column, "comment");
        assert_eq!(columns[0].dari_pashto_cells, 1);
    }

    #[test]
    fn extract_writes_exports() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(dir.path());
        seed(&state);

        let result = extract_missing(
            &state,
            ExtractMissingParams {
                source: tab_source(),
                key_column: None,
                exclude_columns: vec![],
                remove_duplicates: None,
                output_name: None,
                output_sheet: None,
            },
        )
        .unwrap();
        assert_eq!(result.total, 1);
        assert_eq!(result.preview[0].key, "u1");
        let exports = result.exports.unwrap();
        assert!(std::path::Path::new(&exports.xlsx_path).exists());
        assert_eq!(exports.sheet, "Translation_List");
    }

    #[test]
    fn statistics_filters_unavailable_operations() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(dir.path());
        seed(&state);

        let result = statistics(
            &state,
            StatisticsParams {
                source: tab_source(),
                x_column: "district".into(),
                y_column: "age".into(),
                operations: Some(vec![Operation::Mean, Operation::Correlation]),
                pair: PairOptionsParams::default(),
            },
        )
        .unwrap();
        assert_eq!(result.y_kind, ColumnKind::Numeric);
        assert_eq!(result.results.len(), 1);
        assert_eq!(result.results[0].0, "Mean(age)");
    }

    #[test]
    fn update_rejects_bad_start_date() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(dir.path());
        let err = update(
            &state,
            UpdateDatasetParams {
                file_path: "missing.csv".into(),
                sheet: None,
                date_column: "today".into(),
                start_date: "15/03/2024".into(),
                upload: None,
                export: false,
            },
        )
        .unwrap_err();
        assert!(err.to_string().contains("YYYY-MM-DD"));
    }

    #[tokio::test]
    async fn unknown_job_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(dir.path());
        assert!(matches!(
            job_progress(&state, "nope").await,
            Err(RefineryError::JobNotFound(_))
        ));
    }

    #[tokio::test]
    async fn translation_rejects_unknown_column_before_queueing() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(dir.path());
        let csv = dir.path().join("in.csv");
        std::fs::write(&csv, "_uuid,comment\nu1,سلام\n").unwrap();

        let result = start_translation(
            &state,
            translate_params(&csv.to_string_lossy(), "missing"),
        )
        .await;
        assert!(result.is_err());
        assert!(state.jobs.read().await.is_empty());
    }

    fn translate_params(file_path: &str, column: &str) -> TranslateColumnParams {
        TranslateColumnParams {
            file_path: file_path.to_string(),
            sheet: None,
            column: column.to_string(),
            key_column: None,
            output_mode: OutputMode::default(),
            strategy: None,
            do_not_translate: Vec::new(),
            export_mode: ExportMode::default(),
            batch_size: None,
            delay_ms: None,
            target_lang: None,
        }
    }

    #[test]
    fn unset_job_fields_come_from_config() {
        let mut config = AppConfig::default();
        config.translation.batch_size = 40;
        config.translation.row_delay_ms = 0;
        config.translation.target_lang = "de".to_string();

        let mut params = translate_params("in.csv", "comment");
        let options = params.job_options(&config.translation);
        assert_eq!(
            (options.batch_size, options.delay_ms, options.target_lang.as_str()),
            (40, 0, "de")
        );

        params.batch_size = Some(5);
        params.target_lang = Some("en".to_string());
        let options = params.job_options(&config.translation);
        assert_eq!((options.batch_size, options.target_lang.as_str()), (5, "en"));
        assert_eq!(options.delay_ms, 0);
    }
}
