use axum::http::{header, Method};
use tower_http::cors::{Any, CorsLayer};

/// Any origin may read the blog and post forms; credentials travel in the
/// `Authorization` header, never in cookies.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}
