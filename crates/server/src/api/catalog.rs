//! Catalog status and preload handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use bookshelf_core::{CatalogKind, CatalogStatus};
use serde::Serialize;
use tracing::info;

use super::handlers::{bad_request, ApiError};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct PreloadResponse {
    pub kind: CatalogKind,
    pub message: String,
}

/// GET /api/v1/catalog/status
///
/// Residency, known totals and load state of both collections.
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<CatalogStatus> {
    Json(state.session().status())
}

/// POST /api/v1/catalog/{kind}/preload
///
/// Start a background bulk load. A run already in progress, or a collection
/// that is already dense, makes this a no-op.
pub async fn preload(
    State(state): State<Arc<AppState>>,
    Path(kind): Path<String>,
) -> Result<(StatusCode, Json<PreloadResponse>), ApiError> {
    let kind: CatalogKind = kind.parse().map_err(bad_request)?;

    // Detached; progress is visible through the status endpoint.
    drop(state.session().preload(kind));
    info!("Bulk load of {} requested", kind);

    Ok((
        StatusCode::ACCEPTED,
        Json(PreloadResponse {
            kind,
            message: format!("Bulk load of {} started", kind),
        }),
    ))
}
