//! # API REST
//!
//! REST API for rhetorical dynamics analysis.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON bodies, status codes, CORS)
//!
//! All analysis and history logic lives in `rda-core`; handlers only translate between HTTP
//! and an [`AnalysisService`] shared behind an `Arc`.

#![warn(rust_2018_idioms)]

pub mod dto;

use axum::{
    extract::{Path as AxumPath, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use dto::{
    AdviceRes, AnalyzeReq, ErrorRes, FingerprintRes, HealthRes, ListHistoryRes, PatternCountRes,
    PatternRes, PlanRes, RecordRes, RecordSummaryRes, RepliesRes, ReportRes, SegmentRes,
    SegmentsRes, SeverityGroupRes,
};
use rda_core::{AnalysisError, AnalysisRecord, AnalysisService, DetailLevel, Identifier};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Application state shared across REST API handlers.
#[derive(Clone)]
struct AppState {
    service: Arc<AnalysisService>,
}

type ApiError = (StatusCode, Json<ErrorRes>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorRes {
            error: message.into(),
            path: None,
        }),
    )
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        create_analysis,
        list_history,
        clear_history,
        get_record,
        remove_record,
        get_segments,
        get_report,
    ),
    components(schemas(
        HealthRes,
        AnalyzeReq,
        ErrorRes,
        RecordRes,
        FingerprintRes,
        PatternRes,
        PlanRes,
        AdviceRes,
        RepliesRes,
        RecordSummaryRes,
        ListHistoryRes,
        SegmentRes,
        SegmentsRes,
        ReportRes,
        SeverityGroupRes,
        PatternCountRes,
    ))
)]
pub struct ApiDoc;

/// Builds the REST router, including Swagger UI at `/swagger-ui`.
pub fn router(service: Arc<AnalysisService>) -> Router {
    let state = AppState { service };

    Router::new()
        .route("/health", get(health))
        .route("/analyses", post(create_analysis))
        .route("/history", get(list_history).delete(clear_history))
        .route("/history/:id", get(get_record).delete(remove_record))
        .route("/history/:id/segments", get(get_segments))
        .route("/history/:id/report", get(get_report))
        .merge(
            SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn parse_id(raw: &str) -> Result<Identifier, ApiError> {
    Identifier::parse(raw).map_err(|e| {
        tracing::debug!("Invalid analysis ID {:?}: {}", raw, e);
        api_error(StatusCode::BAD_REQUEST, "Invalid analysis ID")
    })
}

fn find_record(state: &AppState, raw_id: &str) -> Result<AnalysisRecord, ApiError> {
    let id = parse_id(raw_id)?;
    state
        .service
        .history()
        .get(id)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "Analysis not found"))
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for monitoring and load balancers.
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "RDA REST API is alive".into(),
    })
}

#[utoipa::path(
    post,
    path = "/analyses",
    request_body = AnalyzeReq,
    responses(
        (status = 201, description = "Analysis stored", body = RecordRes),
        (status = 400, description = "Invalid conversation or detail level", body = ErrorRes),
        (status = 422, description = "Analyzer response failed validation", body = ErrorRes),
        (status = 502, description = "Analyzer unavailable", body = ErrorRes)
    )
)]
/// Analyse a conversation and add the result to the history.
///
/// # Errors
/// - `400 Bad Request` if the conversation is blank or too long, or the detail level is unknown.
/// - `422 Unprocessable Entity` if the analyzer's response is malformed; nothing is stored.
/// - `502 Bad Gateway` if the analyzer cannot be reached or fails.
#[axum::debug_handler]
async fn create_analysis(
    State(state): State<AppState>,
    Json(req): Json<AnalyzeReq>,
) -> Result<(StatusCode, Json<RecordRes>), ApiError> {
    let detail_level = match req.detail_level.as_deref() {
        Some(raw) => raw
            .parse::<DetailLevel>()
            .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?,
        None => state.service.detail_level(),
    };

    match state
        .service
        .analyze_with_detail(&req.conversation, &req.context, detail_level)
        .await
    {
        Ok(record) => Ok((StatusCode::CREATED, Json(RecordRes::from(&record)))),
        Err(AnalysisError::InvalidInput(message)) => {
            Err(api_error(StatusCode::BAD_REQUEST, message))
        }
        Err(AnalysisError::SchemaValidation(e)) => {
            tracing::error!("Analyzer response rejected: {}", e);
            Err((
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(ErrorRes {
                    error: e.message,
                    path: Some(e.path),
                }),
            ))
        }
        Err(AnalysisError::AnalyzerUnavailable(e)) => {
            tracing::error!("Analyzer unavailable: {}", e);
            Err(api_error(StatusCode::BAD_GATEWAY, e.to_string()))
        }
    }
}

#[utoipa::path(
    get,
    path = "/history",
    responses(
        (status = 200, description = "Stored analyses, most recent first", body = ListHistoryRes)
    )
)]
#[axum::debug_handler]
async fn list_history(State(state): State<AppState>) -> Json<ListHistoryRes> {
    let history = state.service.history();
    Json(ListHistoryRes {
        capacity: history.capacity(),
        records: history.list().iter().map(RecordSummaryRes::from).collect(),
    })
}

#[utoipa::path(
    delete,
    path = "/history",
    responses(
        (status = 204, description = "History cleared")
    )
)]
#[axum::debug_handler]
async fn clear_history(State(state): State<AppState>) -> StatusCode {
    state.service.history().clear();
    StatusCode::NO_CONTENT
}

#[utoipa::path(
    get,
    path = "/history/{id}",
    params(("id" = String, Path, description = "Analysis identifier")),
    responses(
        (status = 200, description = "Stored analysis", body = RecordRes),
        (status = 400, description = "Malformed identifier", body = ErrorRes),
        (status = 404, description = "No analysis with this identifier", body = ErrorRes)
    )
)]
#[axum::debug_handler]
async fn get_record(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<RecordRes>, ApiError> {
    let record = find_record(&state, &id)?;
    Ok(Json(RecordRes::from(&record)))
}

#[utoipa::path(
    delete,
    path = "/history/{id}",
    params(("id" = String, Path, description = "Analysis identifier")),
    responses(
        (status = 204, description = "Analysis removed (or was not stored)"),
        (status = 400, description = "Malformed identifier", body = ErrorRes)
    )
)]
#[axum::debug_handler]
async fn remove_record(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    if !state.service.history().remove(id) {
        tracing::debug!("Remove of unknown analysis {}", id);
    }
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/history/{id}/segments",
    params(("id" = String, Path, description = "Analysis identifier")),
    responses(
        (status = 200, description = "Source text split into plain and evidence segments", body = SegmentsRes),
        (status = 400, description = "Malformed identifier", body = ErrorRes),
        (status = 404, description = "No analysis with this identifier", body = ErrorRes)
    )
)]
#[axum::debug_handler]
async fn get_segments(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<SegmentsRes>, ApiError> {
    let id = parse_id(&id)?;
    let segments = state
        .service
        .segments(id)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "Analysis not found"))?;
    Ok(Json(SegmentsRes {
        segments: segments.iter().map(SegmentRes::from).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/history/{id}/report",
    params(("id" = String, Path, description = "Analysis identifier")),
    responses(
        (status = 200, description = "Severity groups, pattern counts and threshold flag", body = ReportRes),
        (status = 400, description = "Malformed identifier", body = ErrorRes),
        (status = 404, description = "No analysis with this identifier", body = ErrorRes)
    )
)]
#[axum::debug_handler]
async fn get_report(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<ReportRes>, ApiError> {
    let record = find_record(&state, &id)?;
    Ok(Json(ReportRes::new(
        &record,
        state.service.toxicity_threshold(),
    )))
}
