use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use bookshelf_core::{CatalogError, SanitizedConfig};
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

use crate::metrics::{collect_dynamic_metrics, encode_metrics};
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Error half of every JSON handler result.
pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn bad_request(message: impl Into<String>) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

pub fn not_found(message: impl Into<String>) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

/// Map an engine error to its HTTP status.
pub fn catalog_error(err: CatalogError) -> ApiError {
    let status = match &err {
        CatalogError::NotFound(_) => StatusCode::NOT_FOUND,
        e if e.is_rate_limited() => StatusCode::TOO_MANY_REQUESTS,
        CatalogError::CatalogIncomplete { .. } => StatusCode::SERVICE_UNAVAILABLE,
        CatalogError::PageFetchFailed { .. }
        | CatalogError::BatchFetchFailed { .. }
        | CatalogError::LookupFailed(_) => StatusCode::BAD_GATEWAY,
    };
    if status != StatusCode::NOT_FOUND {
        warn!("Request failed: {}", err);
    }
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

pub async fn get_config(State(state): State<Arc<AppState>>) -> Json<SanitizedConfig> {
    Json(state.sanitized_config())
}

/// GET /api/v1/metrics
///
/// Prometheus text exposition.
pub async fn get_metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    collect_dynamic_metrics(&state);
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        encode_metrics(),
    )
}
