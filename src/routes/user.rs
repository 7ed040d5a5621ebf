//! User profile, admin and waitlist routes

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::handlers::*;
use crate::state::AppState;

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/api/users/me", get(get_me).patch(update_me))
        .route(
            "/api/admin/users/:id/verification",
            patch(set_user_verification),
        )
        .route("/api/admin/users/:id/block", patch(set_user_blocked))
        .route("/api/waitlist", post(join_waitlist))
}
