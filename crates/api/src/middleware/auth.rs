use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::Authorization;
use axum_extra::TypedHeader;
use vbc_blog_core::admin::Claims;

use crate::error::ApiError;
use crate::state::AppState;

/// Extractor for routes that need the admin's bearer token.
#[derive(Debug, Clone)]
pub struct AdminSession {
    pub claims: Claims,
}

impl FromRequestParts<AppState> for AdminSession {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| ApiError::Unauthorized("Authentication required".to_string()))?;
        let claims = state.tokens().verify(bearer.token())?;
        Ok(Self { claims })
    }
}
