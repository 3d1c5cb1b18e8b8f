use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::{authors, catalog, handlers, middleware::metrics_middleware, titles};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // API routes
    let api_routes = Router::new()
        // Health, config and metrics
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .route("/metrics", get(handlers::get_metrics))
        // Cache status and bulk loading
        .route("/catalog/status", get(catalog::get_status))
        .route("/catalog/{kind}/preload", post(catalog::preload))
        // Authors
        .route("/authors", get(authors::list_authors))
        .route("/authors/browse", get(authors::browse_authors))
        .route("/authors/search", get(authors::search_authors))
        .route("/authors/{id}", get(authors::get_author))
        .route("/authors/{id}/titles", get(authors::author_titles))
        // Titles
        .route("/titles", get(titles::list_titles))
        .route("/titles/browse", get(titles::browse_titles))
        .route("/titles/search", get(titles::search_titles))
        .route("/titles/lucky", get(titles::lucky_title))
        .route("/titles/{isbn}", get(titles::get_title))
        .route("/titles/{isbn}/cover", get(titles::title_cover))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
