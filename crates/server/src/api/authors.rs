//! Author API handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use bookshelf_core::{Author, AuthorQuery, AuthorSortField, SortedPage, Title};

use super::handlers::{catalog_error, ApiError};
use super::params::{BrowseParams, PageParams, PageResponse, RangeParams, SearchResponse};
use crate::state::AppState;

/// GET /api/v1/authors
///
/// One page of authors in catalog order, loaded on demand.
pub async fn list_authors(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PageParams>,
) -> Result<Json<PageResponse<Author>>, ApiError> {
    let params = params.validated()?;
    let session = state.session();

    let records = session
        .author_page(params.page, params.page_size)
        .await
        .map_err(catalog_error)?;

    Ok(Json(PageResponse {
        records,
        page: params.page,
        page_size: params.page_size,
        total_count: session.store().total_count::<Author>(),
    }))
}

/// GET /api/v1/authors/browse
///
/// Sorted page over the full author collection. Waits for the bulk load.
pub async fn browse_authors(
    State(state): State<Arc<AppState>>,
    Query(params): Query<BrowseParams>,
) -> Result<Json<SortedPage<Author, AuthorSortField>>, ApiError> {
    let sort = params.sort_state::<AuthorSortField>()?;
    let page = state
        .session()
        .browse_authors(sort, params.page, params.page_size)
        .await
        .map_err(catalog_error)?;
    Ok(Json(page))
}

/// GET /api/v1/authors/search
pub async fn search_authors(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AuthorQuery>,
) -> Result<Json<SearchResponse<Author>>, ApiError> {
    let records = state
        .session()
        .search_authors(&query)
        .await
        .map_err(catalog_error)?;
    Ok(Json(records.into()))
}

/// GET /api/v1/authors/{id}
pub async fn get_author(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Author>, ApiError> {
    let author = state.session().author(&id).await.map_err(catalog_error)?;
    Ok(Json(author))
}

/// GET /api/v1/authors/{id}/titles
///
/// Titles by one author, straight from the remote catalog.
pub async fn author_titles(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(range): Query<RangeParams>,
) -> Result<Json<PageResponse<Title>>, ApiError> {
    let range = range.validated()?;
    let page = state
        .session()
        .titles_by_author(&id, range.start, range.rows)
        .await
        .map_err(catalog_error)?;

    Ok(Json(PageResponse {
        records: page.records,
        page: range.start / range.rows,
        page_size: range.rows,
        total_count: page.total_count,
    }))
}
