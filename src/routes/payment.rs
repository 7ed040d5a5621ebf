//! Payment and notification routes

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::*;
use crate::state::AppState;

pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/api/payments/webhook", post(payment_webhook))
        .route("/api/payments/:id/confirm", post(confirm_payment))
        .route("/api/notifications", get(list_notifications))
        .route(
            "/api/notifications/read-all",
            post(mark_all_notifications_read),
        )
        .route("/api/notifications/:id/read", post(mark_notification_read))
}
