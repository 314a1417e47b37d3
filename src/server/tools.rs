use crate::server::handlers::{
    self, AnalyzeDatasetParams, ApplyCorrectionsParams, ChartParams, ClassifyColumnsParams,
    DetectLanguageParams, ExtractMissingParams, InspectTextParams, JobProgressParams,
    OpenReviewParams, SheetListParams, SheetTransferParams, StatisticsParams, SubmitReviewParams,
    TranslateColumnParams, UpdateDatasetParams,
};
use crate::state::AppState;
use crate::utils::RefineryError;
use rmcp::{
    handler::server::{tool::ToolRouter, wrapper::Parameters},
    model::*,
    tool, tool_handler, tool_router,
    ErrorData as McpError,
};
use serde::Serialize;

/// Caller mistakes become `invalid_params`; everything else is an internal error.
pub fn to_mcp_error(err: RefineryError) -> McpError {
    match err {
        RefineryError::ValidationError(_)
        | RefineryError::ColumnNotFound(_)
        | RefineryError::SheetNotFound(_)
        | RefineryError::RecordNotFound(_)
        | RefineryError::JobNotFound(_)
        | RefineryError::FileNotFound(_)
        | RefineryError::UnsupportedFile(_) => McpError::invalid_params(err.to_string(), None),
        other => McpError::internal_error(other.to_string(), None),
    }
}

fn json_result<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(e.to_string(), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

#[derive(Clone)]
pub struct RefineryServer {
    state: AppState,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl RefineryServer {
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            tool_router: Self::tool_router(),
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    #[tool(
        name = "analyze_dataset",
        description = "Row/column counts, file size, Dari/Pashto cell count, estimated LLM tokens and sample rows of a CSV or XLSX file."
    )]
    async fn analyze_dataset(
        &self,
        params: Parameters<AnalyzeDatasetParams>,
    ) -> Result<CallToolResult, McpError> {
        let metadata = handlers::analyze(params.0).await.map_err(to_mcp_error)?;
        json_result(&metadata)
    }

    #[tool(
        name = "classify_columns",
        description = "Classify every column as Choice, Entry, Mixed or Empty and return a text report. Reads a file, or a workbook tab when no file_path is given."
    )]
    async fn classify_columns(
        &self,
        params: Parameters<ClassifyColumnsParams>,
    ) -> Result<CallToolResult, McpError> {
        let result = handlers::classify_columns(&self.state, params.0).map_err(to_mcp_error)?;
        json_result(&result)
    }

    #[tool(
        name = "detect_language",
        description = "List the columns holding Dari/Pashto text, with the number of such cells in the scanned rows."
    )]
    async fn detect_language(
        &self,
        params: Parameters<DetectLanguageParams>,
    ) -> Result<CallToolResult, McpError> {
        let columns = handlers::detect_columns(&self.state, params.0).map_err(to_mcp_error)?;
        json_result(&columns)
    }

    #[tool(
        name = "inspect_text",
        description = "Classify short texts: language, name/place heuristic, needs-attention flag and Latin transliteration."
    )]
    async fn inspect_text(
        &self,
        params: Parameters<InspectTextParams>,
    ) -> Result<CallToolResult, McpError> {
        json_result(&handlers::inspect_text(params.0))
    }

    #[tool(
        name = "extract_missing_translations",
        description = "Collect every Dari/Pashto cell as (key, label, value) and export the list to CSV (UTF-8 BOM) and XLSX."
    )]
    async fn extract_missing_translations(
        &self,
        params: Parameters<ExtractMissingParams>,
    ) -> Result<CallToolResult, McpError> {
        let result = handlers::extract_missing(&self.state, params.0).map_err(to_mcp_error)?;
        json_result(&result)
    }

    #[tool(
        name = "translate_column",
        description = "Start a background translation of one column. Returns a run_id; poll get_job_progress until completed, then read the processed and log workbooks from the export paths."
    )]
    async fn translate_column(
        &self,
        params: Parameters<TranslateColumnParams>,
    ) -> Result<CallToolResult, McpError> {
        let started = handlers::start_translation(&self.state, params.0)
            .await
            .map_err(to_mcp_error)?;
        json_result(&started)
    }

    #[tool(
        name = "get_job_progress",
        description = "Status, rows processed, ETA and, once finished, the report and export paths of a translation job."
    )]
    async fn get_job_progress(
        &self,
        params: Parameters<JobProgressParams>,
    ) -> Result<CallToolResult, McpError> {
        let job = handlers::job_progress(&self.state, &params.0.run_id)
            .await
            .map_err(to_mcp_error)?;
        json_result(&job)
    }

    #[tool(
        name = "apply_corrections",
        description = "Apply the correction log tab to the data tab by _uuid and column name. Requires confirm=true; the data tab is rewritten only when a cell changed."
    )]
    async fn apply_corrections(
        &self,
        params: Parameters<ApplyCorrectionsParams>,
    ) -> Result<CallToolResult, McpError> {
        let report = handlers::apply_corrections(&self.state, params.0).map_err(to_mcp_error)?;
        json_result(&report)
    }

    #[tool(
        name = "update_dataset",
        description = "Filter an uploaded dataset by start date and the remove list, then append records whose _uuid is new to the data tab."
    )]
    async fn update_dataset(
        &self,
        params: Parameters<UpdateDatasetParams>,
    ) -> Result<CallToolResult, McpError> {
        let result = handlers::update(&self.state, params.0).map_err(to_mcp_error)?;
        json_result(&result)
    }

    #[tool(
        name = "open_review",
        description = "Build the edit form for one record: visible fields with current values, pick lists for columns with few distinct values."
    )]
    async fn open_review(
        &self,
        params: Parameters<OpenReviewParams>,
    ) -> Result<CallToolResult, McpError> {
        let form = handlers::review_form(&self.state, params.0).map_err(to_mcp_error)?;
        json_result(&form)
    }

    #[tool(
        name = "submit_review",
        description = "Record changed field values of one record in the review log tab with the editor's name."
    )]
    async fn submit_review(
        &self,
        params: Parameters<SubmitReviewParams>,
    ) -> Result<CallToolResult, McpError> {
        let result = handlers::review_submit(&self.state, params.0).map_err(to_mcp_error)?;
        json_result(&result)
    }

    #[tool(
        name = "compute_statistics",
        description = "Column kinds, available operations, compatible charts and the selected statistics for a pair of columns."
    )]
    async fn compute_statistics(
        &self,
        params: Parameters<StatisticsParams>,
    ) -> Result<CallToolResult, McpError> {
        let result = handlers::statistics(&self.state, params.0).map_err(to_mcp_error)?;
        json_result(&result)
    }

    #[tool(
        name = "chart_data",
        description = "Aggregated series for one chart over a pair of columns (points, category values, histogram bins, box summaries or a grid)."
    )]
    async fn chart_data(&self, params: Parameters<ChartParams>) -> Result<CallToolResult, McpError> {
        let data = handlers::chart(&self.state, params.0).map_err(to_mcp_error)?;
        json_result(&data)
    }

    #[tool(
        name = "import_sheet",
        description = "Load a CSV or XLSX file into a workbook tab, replacing its contents."
    )]
    async fn import_sheet(
        &self,
        params: Parameters<SheetTransferParams>,
    ) -> Result<CallToolResult, McpError> {
        let name = params.0.name.clone();
        let rows = handlers::import(&self.state, params.0).map_err(to_mcp_error)?;
        json_result(&serde_json::json!({ "sheet": name, "rows": rows }))
    }

    #[tool(
        name = "export_sheet",
        description = "Write a workbook tab to a CSV or XLSX file."
    )]
    async fn export_sheet(
        &self,
        params: Parameters<SheetTransferParams>,
    ) -> Result<CallToolResult, McpError> {
        let params = params.0;
        let (name, path) = (params.name.clone(), params.file_path.clone());
        let rows = handlers::export(&self.state, params).map_err(to_mcp_error)?;
        json_result(&serde_json::json!({ "sheet": name, "file_path": path, "rows": rows }))
    }

    #[tool(
        name = "list_sheets",
        description = "List the workbook tabs, or the worksheets of an XLSX file."
    )]
    async fn list_sheets(
        &self,
        params: Parameters<SheetListParams>,
    ) -> Result<CallToolResult, McpError> {
        let sheets = handlers::sheets(&self.state, params.0).map_err(to_mcp_error)?;
        json_result(&sheets)
    }

    pub fn router(&self) -> &ToolRouter<Self> {
        &self.tool_router
    }
}

#[tool_handler]
impl rmcp::handler::server::ServerHandler for RefineryServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                r#"Survey Refinery MCP Server

Datasets are CSV/XLSX files (absolute paths) or tabs of the local workbook
(Data_Set, Correction_Log, Correction_Log_1, Remove_from_DS, Not_Show_in_form).

Translation:
1. detect_language - find Dari/Pashto columns
2. translate_column - start a job, get run_id
3. get_job_progress - poll until completed; exports hold the output paths
Use extract_missing_translations to list untranslated cells.

Workbook:
- import_sheet / export_sheet / list_sheets move data in and out
- apply_corrections (confirm=true) patches Data_Set from Correction_Log
- update_dataset appends new records after date and remove-list filtering
- open_review / submit_review edit one record and log the changes

Exploration: classify_columns, compute_statistics, chart_data."#
                    .to_string(),
            ),
        }
    }
}
