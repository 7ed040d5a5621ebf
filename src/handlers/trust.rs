//! Trust tier and lender matching handlers

use axum::{extract::State, Json};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::AuthenticatedUser;
use crate::models::ApiResponse;
use crate::trust::{MatchQuery, MatchResult, TrustService, TrustSnapshot};

use super::{ApiPath, ApiQuery};

/// GET /api/trust/me - Caller's tier, served from cache while fresh
pub async fn get_my_tier(
    State(trust): State<Arc<TrustService>>,
    user: AuthenticatedUser,
) -> Result<Json<ApiResponse<TrustSnapshot>>, ApiError> {
    let snapshot = trust.get_tier(user.user_id).await?;
    Ok(Json(ApiResponse::ok(snapshot)))
}

/// GET /api/trust/:user_id
pub async fn get_user_tier(
    State(trust): State<Arc<TrustService>>,
    _user: AuthenticatedUser,
    ApiPath(user_id): ApiPath<Uuid>,
) -> Result<Json<ApiResponse<TrustSnapshot>>, ApiError> {
    let snapshot = trust.get_tier(user_id).await?;
    Ok(Json(ApiResponse::ok(snapshot)))
}

/// POST /api/trust/me/refresh - Force a recount
pub async fn refresh_my_tier(
    State(trust): State<Arc<TrustService>>,
    user: AuthenticatedUser,
) -> Result<Json<ApiResponse<TrustSnapshot>>, ApiError> {
    let snapshot = trust.calculate_tier(user.user_id).await?;
    Ok(Json(ApiResponse::ok(snapshot)))
}

/// GET /api/lenders/match?amount=
pub async fn match_lenders(
    State(trust): State<Arc<TrustService>>,
    user: AuthenticatedUser,
    ApiQuery(query): ApiQuery<MatchQuery>,
) -> Result<Json<ApiResponse<MatchResult>>, ApiError> {
    let result = trust.find_eligible_lenders(user.user_id, query.amount).await?;
    Ok(Json(ApiResponse::ok(result)))
}
