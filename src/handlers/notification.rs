//! Notification inbox handlers

use axum::{extract::State, Json};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::AuthenticatedUser;
use crate::models::ApiResponse;
use crate::notification::{ListNotificationsQuery, MarkedRead, Notification, NotificationService};

use super::{ApiPath, ApiQuery};

pub async fn list_notifications(
    State(service): State<Arc<NotificationService>>,
    user: AuthenticatedUser,
    ApiQuery(query): ApiQuery<ListNotificationsQuery>,
) -> Result<Json<ApiResponse<Vec<Notification>>>, ApiError> {
    let notifications = service
        .list(user.user_id, query.unread_only, query.limit)
        .await?;
    Ok(Json(ApiResponse::ok(notifications)))
}

pub async fn mark_notification_read(
    State(service): State<Arc<NotificationService>>,
    user: AuthenticatedUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<ApiResponse<Notification>>, ApiError> {
    let notification = service.mark_read(user.user_id, id).await?;
    Ok(Json(ApiResponse::ok(notification)))
}

pub async fn mark_all_notifications_read(
    State(service): State<Arc<NotificationService>>,
    user: AuthenticatedUser,
) -> Result<Json<ApiResponse<MarkedRead>>, ApiError> {
    let marked = service.mark_all_read(user.user_id).await?;
    Ok(Json(ApiResponse::ok(marked)))
}
