//! Trust tier, lender matching and tier policy routes

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::*;
use crate::state::AppState;

pub fn trust_routes() -> Router<AppState> {
    Router::new()
        .route("/api/trust/me", get(get_my_tier))
        .route("/api/trust/me/refresh", post(refresh_my_tier))
        .route("/api/trust/:user_id", get(get_user_tier))
        .route("/api/lenders/match", get(match_lenders))
        .route(
            "/api/lender/policies",
            get(list_policies).put(upsert_policies),
        )
}
