//! Admin moderation handlers

use axum::{extract::State, Json};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::AdminUser;
use crate::models::{ApiResponse, SetBlockedRequest, SetVerificationRequest, User};
use crate::services::UserService;

use super::{ApiJson, ApiPath};

/// PATCH /api/admin/users/:id/verification
pub async fn set_user_verification(
    State(service): State<Arc<UserService>>,
    AdminUser(admin): AdminUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<SetVerificationRequest>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    let user = service
        .set_verification(admin.user_id, id, request.status)
        .await?;
    Ok(Json(ApiResponse::ok(user)))
}

/// PATCH /api/admin/users/:id/block
pub async fn set_user_blocked(
    State(service): State<Arc<UserService>>,
    AdminUser(admin): AdminUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<SetBlockedRequest>,
) -> Result<Json<ApiResponse<User>>, ApiError> {
    let user = service.set_blocked(admin.user_id, id, request.blocked).await?;
    Ok(Json(ApiResponse::ok(user)))
}
