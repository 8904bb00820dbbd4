use axum::{
    extract::State,
    http::header,
    response::IntoResponse,
    routing::get,
    Router,
};
use chrono::Utc;
use vbc_blog_core::sitemap::{robots_txt, sitemap_xml};

use crate::error::ApiResult;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/sitemap.xml", get(sitemap))
        .route("/robots.txt", get(robots))
}

async fn sitemap(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let posts = state.posts().list_published().await?;
    let xml = sitemap_xml(&state.config().site_url, &posts, Utc::now());
    Ok(([(header::CONTENT_TYPE, "application/xml; charset=utf-8")], xml))
}

async fn robots(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        robots_txt(&state.config().site_url),
    )
}
