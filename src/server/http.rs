use crate::server::handlers::{
    self, AnalyzeDatasetParams, ApplyCorrectionsParams, ChartParams, ClassifyColumnsParams,
    DetectLanguageParams, ExtractMissingParams, InspectTextParams, OpenReviewParams,
    SheetListParams, SheetTransferParams, StatisticsParams, SubmitReviewParams,
    TranslateColumnParams, UpdateDatasetParams,
};
use crate::state::AppState;
use crate::utils::{RefineryError, Result};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

pub fn status_for(err: &RefineryError) -> StatusCode {
    match err {
        RefineryError::RecordNotFound(_)
        | RefineryError::JobNotFound(_)
        | RefineryError::SheetNotFound(_)
        | RefineryError::FileNotFound(_) => StatusCode::NOT_FOUND,
        RefineryError::ValidationError(_)
        | RefineryError::ColumnNotFound(_)
        | RefineryError::UnsupportedFile(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn respond<T: Serialize>(result: Result<T>) -> Response {
    match result {
        Ok(value) => (StatusCode::OK, Json(value)).into_response(),
        Err(e) => (
            status_for(&e),
            Json(serde_json::json!({ "error": e.to_string() })),
        )
            .into_response(),
    }
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "survey-refinery-mcp",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn info() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": "survey-refinery-mcp",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Survey dataset refinery - HTTP Mode",
        "endpoints": {
            "GET /health": "Health check",
            "GET /info": "Server info",
            "POST /analyze": "Analyze a dataset file",
            "POST /columns/classify": "Choice/Entry column classification",
            "POST /language/detect": "Columns with Dari/Pashto text",
            "POST /language/inspect": "Classify and transliterate texts",
            "POST /translations/missing": "Extract untranslated cells",
            "POST /translations": "Start a column translation job",
            "GET /translations/:run_id": "Job progress",
            "POST /corrections/apply": "Apply the correction log",
            "POST /dataset/update": "Filter and append an upload",
            "POST /review/open": "Record edit form",
            "POST /review/submit": "Save record edits",
            "POST /stats": "Statistics for a column pair",
            "POST /stats/chart": "Chart series for a column pair",
            "POST /sheets": "List workbook tabs",
            "POST /sheets/import": "Load a file into a tab",
            "POST /sheets/export": "Write a tab to a file"
        }
    }))
}

async fn analyze(Json(params): Json<AnalyzeDatasetParams>) -> Response {
    respond(handlers::analyze(params).await)
}

async fn classify(State(state): State<AppState>, Json(params): Json<ClassifyColumnsParams>) -> Response {
    respond(handlers::classify_columns(&state, params))
}

async fn detect(State(state): State<AppState>, Json(params): Json<DetectLanguageParams>) -> Response {
    respond(handlers::detect_columns(&state, params))
}

async fn inspect(Json(params): Json<InspectTextParams>) -> Response {
    respond(Ok(handlers::inspect_text(params)))
}

async fn missing(State(state): State<AppState>, Json(params): Json<ExtractMissingParams>) -> Response {
    respond(handlers::extract_missing(&state, params))
}

async fn translate(State(state): State<AppState>, Json(params): Json<TranslateColumnParams>) -> Response {
    respond(handlers::start_translation(&state, params).await)
}

async fn progress(State(state): State<AppState>, Path(run_id): Path<String>) -> Response {
    respond(handlers::job_progress(&state, &run_id).await)
}

async fn corrections(State(state): State<AppState>, Json(params): Json<ApplyCorrectionsParams>) -> Response {
    respond(handlers::apply_corrections(&state, params))
}

async fn update(State(state): State<AppState>, Json(params): Json<UpdateDatasetParams>) -> Response {
    respond(handlers::update(&state, params))
}

async fn review_open(State(state): State<AppState>, Json(params): Json<OpenReviewParams>) -> Response {
    respond(handlers::review_form(&state, params))
}

async fn review_submit(State(state): State<AppState>, Json(params): Json<SubmitReviewParams>) -> Response {
    respond(handlers::review_submit(&state, params))
}

async fn stats(State(state): State<AppState>, Json(params): Json<StatisticsParams>) -> Response {
    respond(handlers::statistics(&state, params))
}

async fn chart(State(state): State<AppState>, Json(params): Json<ChartParams>) -> Response {
    respond(handlers::chart(&state, params))
}

async fn sheets(State(state): State<AppState>, Json(params): Json<SheetListParams>) -> Response {
    respond(handlers::sheets(&state, params))
}

async fn import(State(state): State<AppState>, Json(params): Json<SheetTransferParams>) -> Response {
    respond(handlers::import(&state, params))
}

async fn export(State(state): State<AppState>, Json(params): Json<SheetTransferParams>) -> Response {
    respond(handlers::export(&state, params))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/info", get(info))
        .route("/analyze", post(analyze))
        .route("/columns/classify", post(classify))
        .route("/language/detect", post(detect))
        .route("/language/inspect", post(inspect))
        .route("/translations/missing", post(missing))
        .route("/translations", post(translate))
        .route("/translations/:run_id", get(progress))
        .route("/corrections/apply", post(corrections))
        .route("/dataset/update", post(update))
        .route("/review/open", post(review_open))
        .route("/review/submit", post(review_submit))
        .route("/stats", post(stats))
        .route("/stats/chart", post(chart))
        .route("/sheets", post(sheets))
        .route("/sheets/import", post(import))
        .route("/sheets/export", post(export))
        .with_state(state)
}
