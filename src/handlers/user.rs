//! User profile handlers

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::error::ApiError;
use crate::middleware::AuthenticatedUser;
use crate::models::{ApiResponse, UpdateProfileRequest, User};
use crate::services::UserService;

use super::ApiJson;

/// GET /api/users/me
pub async fn get_me(
    State(service): State<Arc<UserService>>,
    user: AuthenticatedUser,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    let profile = service.get_user(user.user_id).await?;
    Ok(Json(ApiResponse::ok(profile)))
}

/// PATCH /api/users/me
pub async fn update_me(
    State(service): State<Arc<UserService>>,
    user: AuthenticatedUser,
    ApiJson(request): ApiJson<UpdateProfileRequest>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    let profile = service.update_profile(user.user_id, request).await?;
    Ok(Json(ApiResponse::ok(profile)))
}
