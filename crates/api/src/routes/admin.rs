use axum::{
    body::Bytes,
    extract::{Path, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use vbc_blog_core::document::DocumentId;
use vbc_blog_core::lead::decode_form;

use super::publish::content_type;
use crate::error::{ApiError, ApiResult};
use crate::middleware::auth::AdminSession;
use crate::state::AppState;

/// Admin login and post management.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/admin/login", post(login))
        .route("/v1/admin/posts", get(list_posts))
        .route("/v1/admin/posts/{id}", delete(delete_post))
}

#[derive(Debug, Deserialize)]
struct LoginForm {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

/// `POST /v1/admin/login`: exchange the shared credential for a bearer token.
async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Json<Value>> {
    let form: LoginForm = decode_form(content_type(&headers), &body)?;
    let Some(admin) = state.admin().cloned() else {
        tracing::warn!("admin login attempted but no admin credential is configured");
        return Err(ApiError::Unauthorized("invalid email or password".to_string()));
    };

    // Argon2 verification is CPU-bound.
    let email = form.email.clone();
    let verified = tokio::task::spawn_blocking(move || admin.verify(&form.email, &form.password))
        .await
        .map_err(|e| ApiError::Internal(format!("login task failed: {e}")))?;
    if let Err(err) = verified {
        tracing::warn!(email = %email, "admin login rejected");
        return Err(err.into());
    }

    let issued = state.tokens().issue(&email)?;
    tracing::info!(email = %email, "admin logged in");
    Ok(Json(json!({
        "token": issued.token,
        "tokenType": "Bearer",
        "expiresAt": issued.expires_at,
        "expiresIn": state.tokens().ttl_secs(),
    })))
}

/// `GET /v1/admin/posts`: every post, drafts included, newest first.
async fn list_posts(_session: AdminSession, State(state): State<AppState>) -> ApiResult<Response> {
    let posts = state.posts().list_all().await?;
    Ok(Json(json!({ "total": posts.len(), "posts": posts })).into_response())
}

/// `DELETE /v1/admin/posts/{id}`
async fn delete_post(
    session: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let not_found = || ApiError::NotFound(format!("post {id} not found"));
    let doc_id = DocumentId::parse(&id).map_err(|_| not_found())?;
    if !state.posts().delete(&doc_id).await? {
        return Err(not_found());
    }
    tracing::info!(id = %id, by = %session.claims.sub, "post removed by admin");
    Ok(Json(json!({ "deleted": id })))
}
