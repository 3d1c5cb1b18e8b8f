//! Title API handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use bookshelf_core::{SortedPage, Title, TitleQuery, TitleSortField};
use serde::Serialize;

use super::handlers::{catalog_error, not_found, ApiError};
use super::params::{BrowseParams, PageParams, PageResponse, SearchResponse};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CoverResponse {
    pub isbn: String,
    pub url: String,
}

/// GET /api/v1/titles
///
/// One page of titles in catalog order, loaded on demand.
pub async fn list_titles(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PageParams>,
) -> Result<Json<PageResponse<Title>>, ApiError> {
    let params = params.validated()?;
    let session = state.session();

    let records = session
        .title_page(params.page, params.page_size)
        .await
        .map_err(catalog_error)?;

    Ok(Json(PageResponse {
        records,
        page: params.page,
        page_size: params.page_size,
        total_count: session.store().total_count::<Title>(),
    }))
}

/// GET /api/v1/titles/browse
///
/// Sorted page over the full title collection. Waits for the bulk load.
pub async fn browse_titles(
    State(state): State<Arc<AppState>>,
    Query(params): Query<BrowseParams>,
) -> Result<Json<SortedPage<Title, TitleSortField>>, ApiError> {
    let sort = params.sort_state::<TitleSortField>()?;
    let page = state
        .session()
        .browse_titles(sort, params.page, params.page_size)
        .await
        .map_err(catalog_error)?;
    Ok(Json(page))
}

/// GET /api/v1/titles/search
pub async fn search_titles(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TitleQuery>,
) -> Result<Json<SearchResponse<Title>>, ApiError> {
    let records = state
        .session()
        .search_titles(&query)
        .await
        .map_err(catalog_error)?;
    Ok(Json(records.into()))
}

/// GET /api/v1/titles/lucky
///
/// A random title. 404 when the catalog turns out to be empty.
pub async fn lucky_title(State(state): State<Arc<AppState>>) -> Result<Json<Title>, ApiError> {
    match state.session().feeling_lucky().await {
        Ok(Some(title)) => Ok(Json(title)),
        Ok(None) => Err(not_found("No title found")),
        Err(e) => Err(catalog_error(e)),
    }
}

/// GET /api/v1/titles/{isbn}
pub async fn get_title(
    State(state): State<Arc<AppState>>,
    Path(isbn): Path<String>,
) -> Result<Json<Title>, ApiError> {
    let title = state.session().title(&isbn).await.map_err(catalog_error)?;
    Ok(Json(title))
}

/// GET /api/v1/titles/{isbn}/cover
pub async fn title_cover(
    State(state): State<Arc<AppState>>,
    Path(isbn): Path<String>,
) -> Json<CoverResponse> {
    let url = state.session().cover_url(&isbn);
    Json(CoverResponse { isbn, url })
}
