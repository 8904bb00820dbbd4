use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use chrono::Utc;
use serde_json::{json, Value};
use vbc_blog_core::lead::{decode_form, ContactForm, DemoForm, Lead, LeadSource, SubscribeForm};

use super::publish::content_type;
use crate::error::ApiResult;
use crate::state::AppState;

/// Lead capture forms.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/leads/subscribe", post(subscribe))
        .route("/v1/leads/demo", post(schedule_demo))
        .route("/v1/leads/get-started", post(get_started))
}

async fn store_lead(state: &AppState, lead: Lead, message: &str) -> ApiResult<(StatusCode, Json<Value>)> {
    let id = state.leads().insert(lead).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": message, "id": id })),
    ))
}

async fn subscribe(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let lead = decode_form::<SubscribeForm>(content_type(&headers), &body)?.into_lead(Utc::now())?;
    store_lead(&state, lead, "Thanks for subscribing").await
}

async fn schedule_demo(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let lead = decode_form::<DemoForm>(content_type(&headers), &body)?.into_lead(Utc::now())?;
    store_lead(&state, lead, "Your demo has been scheduled").await
}

async fn get_started(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let lead = decode_form::<ContactForm>(content_type(&headers), &body)?
        .into_lead(LeadSource::GetStarted, Utc::now())?;
    store_lead(&state, lead, "Thanks, we will be in touch shortly").await
}
