//! Lender tier policy handlers

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::error::ApiError;
use crate::middleware::AuthenticatedUser;
use crate::models::ApiResponse;
use crate::policy::{PolicyService, TierPolicy, TierPolicyInput};

use super::ApiJson;

/// GET /api/lender/policies
pub async fn list_policies(
    State(service): State<Arc<PolicyService>>,
    user: AuthenticatedUser,
) -> Result<Json<ApiResponse<Vec<TierPolicy>>>, ApiError> {
    let policies = service.list_policies(user.user_id).await?;
    Ok(Json(ApiResponse::ok(policies)))
}

/// PUT /api/lender/policies - Validates the whole batch before writing
pub async fn upsert_policies(
    State(service): State<Arc<PolicyService>>,
    user: AuthenticatedUser,
    ApiJson(inputs): ApiJson<Vec<TierPolicyInput>>,
) -> Result<Json<ApiResponse<Vec<TierPolicy>>>, ApiError> {
    let policies = service.upsert_policies(user.user_id, inputs).await?;
    Ok(Json(ApiResponse::ok(policies)))
}
