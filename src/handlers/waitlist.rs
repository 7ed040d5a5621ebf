//! Waitlist signup handler

use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::error::ApiError;
use crate::models::ApiResponse;
use crate::services::{JoinWaitlistRequest, WaitlistService};

use super::ApiJson;

/// POST /api/waitlist - Public; repeat signups succeed silently
pub async fn join_waitlist(
    State(service): State<Arc<WaitlistService>>,
    ApiJson(request): ApiJson<JoinWaitlistRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Value>>), ApiError> {
    service.join(request).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(json!({ "joined": true }))),
    ))
}
