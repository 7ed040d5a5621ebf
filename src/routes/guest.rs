//! Retired guest flow routes

use axum::{routing::any, Router};

use crate::handlers::guest_flow_gone;
use crate::state::AppState;

pub fn guest_routes() -> Router<AppState> {
    Router::new()
        .route("/api/guest-lender", any(guest_flow_gone))
        .route("/api/guest-lender/*rest", any(guest_flow_gone))
        .route("/api/guest-borrower", any(guest_flow_gone))
        .route("/api/guest-borrower/*rest", any(guest_flow_gone))
}
