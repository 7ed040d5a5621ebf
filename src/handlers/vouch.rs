//! Vouch handlers

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::AuthenticatedUser;
use crate::models::ApiResponse;
use crate::trust::{TrustService, VouchEligibility};
use crate::vouch::{CreateVouchRequest, Vouch, VouchService};

use super::{ApiJson, ApiPath};

/// GET /api/vouches/eligibility
///
/// Advisory only. An evaluation failure is logged and reported as eligible
/// so the UI does not block; `create_vouch` re-checks and rejects.
pub async fn get_vouch_eligibility(
    State(trust): State<Arc<TrustService>>,
    user: AuthenticatedUser,
) -> Json<VouchEligibility> {
    match trust.check_vouch_eligibility(user.user_id).await {
        Ok(eligibility) => Json(eligibility),
        Err(e) => {
            tracing::warn!(
                error = %e,
                user_id = %user.user_id,
                "Vouch eligibility check failed, allowing"
            );
            Json(VouchEligibility::eligible())
        }
    }
}

/// POST /api/vouches
pub async fn create_vouch(
    State(service): State<Arc<VouchService>>,
    user: AuthenticatedUser,
    ApiJson(request): ApiJson<CreateVouchRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Vouch>>), ApiError> {
    let vouch = service.create_vouch(user.user_id, request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(vouch))))
}

/// DELETE /api/vouches/:id
pub async fn revoke_vouch(
    State(service): State<Arc<VouchService>>,
    user: AuthenticatedUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<ApiResponse<Vouch>>, ApiError> {
    let vouch = service.revoke_vouch(user.user_id, id).await?;
    Ok(Json(ApiResponse::ok(vouch)))
}

/// GET /api/vouches/received
pub async fn list_received_vouches(
    State(service): State<Arc<VouchService>>,
    user: AuthenticatedUser,
) -> Result<Json<ApiResponse<Vec<Vouch>>>, ApiError> {
    let vouches = service.list_received(user.user_id).await?;
    Ok(Json(ApiResponse::ok(vouches)))
}

/// GET /api/vouches/given
pub async fn list_given_vouches(
    State(service): State<Arc<VouchService>>,
    user: AuthenticatedUser,
) -> Result<Json<ApiResponse<Vec<Vouch>>>, ApiError> {
    let vouches = service.list_given(user.user_id).await?;
    Ok(Json(ApiResponse::ok(vouches)))
}
