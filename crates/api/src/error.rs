use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use vbc_blog_core::admin::AuthError;
use vbc_blog_core::document::ValidationError;
use vbc_blog_core::store::StoreError;

/// API error type, rendered as `{"error": {"type", "message", "statusCode"}}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Hashing(msg) => ApiError::Internal(format!("password hashing: {msg}")),
            other => ApiError::Unauthorized(other.to_string()),
        }
    }
}

fn internal() -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "internalError",
        "An internal error occurred".to_string(),
    )
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "notFound", msg.clone()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "badRequest", msg.clone()),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg.clone()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone()),
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {msg}");
                internal()
            }
            ApiError::Store(StoreError::Conflict(msg)) => {
                (StatusCode::CONFLICT, "conflict", msg.clone())
            }
            ApiError::Store(StoreError::Validation(err)) => {
                (StatusCode::BAD_REQUEST, "badRequest", err.to_string())
            }
            ApiError::Store(err @ StoreError::Timeout(_)) => {
                tracing::error!("Store error: {err}");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "unavailable",
                    "The content store is not responding".to_string(),
                )
            }
            ApiError::Store(err) => {
                tracing::error!("Store error: {err}");
                internal()
            }
        };

        let body = json!({
            "error": {
                "type": error_type,
                "message": message,
                "statusCode": status.as_u16(),
            }
        });

        (status, Json(body)).into_response()
    }
}

/// Convenience type alias for route handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn store_errors_map_to_statuses() {
        let status = |err: ApiError| err.into_response().status();
        assert_eq!(
            status(StoreError::Conflict("slug taken".into()).into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status(StoreError::Timeout(Duration::from_secs(5)).into()),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status(StoreError::Backend("boom".into()).into()),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status(ValidationError::NotAnObject.into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status(AuthError::TokenExpired.into()),
            StatusCode::UNAUTHORIZED
        );
    }
}
