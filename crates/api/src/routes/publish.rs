use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use vbc_blog_core::post::validate_ingest;

use crate::error::ApiResult;
use crate::state::AppState;

/// Publishing webhook.
pub fn routes() -> Router<AppState> {
    Router::new().route("/api/publishBlog", post(publish_blog))
}

pub(crate) fn content_type(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
}

/// `POST /api/publishBlog`: validate the payload and store it as a new post.
async fn publish_blog(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let new_post = validate_ingest(content_type(&headers), &body)?;
    let post = state.posts().insert(new_post).await?;

    Ok(Json(json!({
        "message": "Blog published successfully",
        "id": post.id,
        "slug": post.slug,
    })))
}
