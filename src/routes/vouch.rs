//! Vouch routes

use axum::{
    routing::{delete, get},
    Router,
};

use crate::handlers::*;
use crate::state::AppState;

pub fn vouch_routes() -> Router<AppState> {
    Router::new()
        .route("/api/vouches", axum::routing::post(create_vouch))
        .route("/api/vouches/eligibility", get(get_vouch_eligibility))
        .route("/api/vouches/received", get(list_received_vouches))
        .route("/api/vouches/given", get(list_given_vouches))
        .route("/api/vouches/:id", delete(revoke_vouch))
}
