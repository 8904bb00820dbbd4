//! HTTP surface of the VBC.ai blog.

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;

use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;

use crate::state::AppState;

/// The full application: routes plus body limit, tracing and CORS layers.
pub fn app(state: AppState) -> Router {
    let max_body_bytes = state.config().max_body_bytes;
    routes::build_router(state)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(middleware::request_tracing::trace_layer())
        .layer(middleware::cors::cors_layer())
}
