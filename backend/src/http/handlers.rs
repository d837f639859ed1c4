//! HTTP handlers for the REST API.
//!
//! Handlers read a snapshot from the store and delegate to the query
//! services. Parsing uploaded or reloaded files is CPU-bound and runs under
//! `spawn_blocking`.

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    Json,
};

use super::dto::{
    ChampionsQuery, ChampionsResponse, ClassificationQuery, ClassificationResponse,
    DatasetResponse, DiagnosticsResponse, FiltersQuery, FiltersResponse, GroupDto,
    HealthResponse, UploadQuery,
};
use super::error::AppError;
use super::state::AppState;
use crate::models::Field;
use crate::parsing::SourceHint;
use crate::services::{loader, top_n, ResultQuery};

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: "v1".to_string(),
        dataset_loaded: state.store.current().is_some(),
        generation: state.store.generation(),
    }))
}

// =============================================================================
// Dataset
// =============================================================================

/// GET /v1/dataset
pub async fn get_dataset(State(state): State<AppState>) -> HandlerResult<DatasetResponse> {
    let snapshot = state.store.require()?;
    Ok(Json(DatasetResponse::from(snapshot.as_ref())))
}

/// GET /v1/diagnostics
pub async fn get_diagnostics(State(state): State<AppState>) -> HandlerResult<DiagnosticsResponse> {
    let snapshot = state.store.require()?;
    Ok(Json(DiagnosticsResponse {
        generation: snapshot.generation,
        diagnostics: snapshot.diagnostics.as_ref().clone(),
    }))
}

/// POST /v1/dataset?filename=<name>
///
/// The body is the raw file. The new dataset replaces the current one only
/// when the whole load succeeds.
pub async fn upload_dataset(
    State(state): State<AppState>,
    Query(query): Query<UploadQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<DatasetResponse>), AppError> {
    if body.is_empty() {
        return Err(AppError::BadRequest("Request body is empty".to_string()));
    }

    let mut hint = SourceHint {
        filename: query.filename,
        content_type: None,
    };
    if let Some(content_type) = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
    {
        hint = hint.with_content_type(content_type);
    }

    let store = state.store.clone();
    let config = state.config.clone();
    let snapshot = tokio::task::spawn_blocking(move || {
        loader::load_into_store(&store, &body, &hint, &config.ingest)
    })
    .await??;

    Ok((
        StatusCode::CREATED,
        Json(DatasetResponse::from(snapshot.as_ref())),
    ))
}

/// POST /v1/dataset/reload
///
/// Re-read the configured results file.
pub async fn reload_dataset(State(state): State<AppState>) -> HandlerResult<DatasetResponse> {
    let path = state.config.server.results_path.clone().ok_or_else(|| {
        AppError::BadRequest("No results file configured (set RESULTS_FILE)".to_string())
    })?;

    let store = state.store.clone();
    let config = state.config.clone();
    let snapshot = tokio::task::spawn_blocking(move || {
        loader::load_path(&path, &config.ingest)
            .map(|report| store.load(report.result_set, report.diagnostics))
    })
    .await??;

    Ok(Json(DatasetResponse::from(snapshot.as_ref())))
}

// =============================================================================
// Queries
// =============================================================================

fn parse_field(name: &str) -> Result<Field, AppError> {
    name.parse::<Field>().map_err(AppError::BadRequest)
}

/// GET /v1/filters?field=<field>&sex=<sex>
pub async fn get_filters(
    State(state): State<AppState>,
    Query(query): Query<FiltersQuery>,
) -> HandlerResult<FiltersResponse> {
    let field = parse_field(&query.field)?;
    let snapshot = state.store.require()?;
    let q = ResultQuery::new(&snapshot.result_set);

    let values = match query.sex.as_deref() {
        Some(sex) => q.distinct_values_where(field, sex),
        None => q.distinct_values(field),
    };
    Ok(Json(FiltersResponse { field, values }))
}

/// GET /v1/classification?sex=&event=&q=
pub async fn get_classification(
    State(state): State<AppState>,
    Query(query): Query<ClassificationQuery>,
) -> HandlerResult<ClassificationResponse> {
    let snapshot = state.store.require()?;
    let table = ResultQuery::new(&snapshot.result_set).classification(
        &query.sex,
        &query.event,
        query.q.as_deref().unwrap_or_default(),
    );
    Ok(Json(table.into()))
}

/// GET /v1/champions?sex=&event=&n=&by=
pub async fn get_champions(
    State(state): State<AppState>,
    Query(query): Query<ChampionsQuery>,
) -> HandlerResult<ChampionsResponse> {
    let partition = query.by.as_deref().map(parse_field).transpose()?;
    let n = query.n.unwrap_or(state.config.query.podium_size);

    let snapshot = state.store.require()?;
    let selected = ResultQuery::new(&snapshot.result_set).filter(&query.sex, &query.event);
    let groups = top_n(&selected, n, partition)
        .into_iter()
        .map(GroupDto::from)
        .collect();

    Ok(Json(ChampionsResponse {
        sex: query.sex,
        event: query.event,
        n,
        partition,
        groups,
    }))
}
