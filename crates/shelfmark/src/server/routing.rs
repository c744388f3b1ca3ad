//! Axum router configuration for all endpoints

use axum::{
  middleware::{from_fn, from_fn_with_state},
  routing::{get, post},
  Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::server::handlers::{books, ratings, recommendations, status};
use crate::server::middleware::{request_context_middleware, session_middleware};
use crate::server::state::AppState;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
  Router::new()
    // Status and version endpoints
    .route("/status", get(status::status))
    .route("/version", get(status::version))
    .route("/api", get(status::api_info))
    // Catalog endpoints
    .route("/books/popular", get(books::popular))
    .route("/recommendations", post(recommendations::recommend))
    // Session ratings
    .route("/ratings", get(ratings::list_ratings).post(ratings::rate_book))
    // Last layer added runs first, so the request context wraps the session
    .layer(from_fn_with_state(state.clone(), session_middleware))
    .layer(from_fn(request_context_middleware))
    .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(CorsLayer::permissive()))
    .with_state(state)
}
