//! Loan and invite routes

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::*;
use crate::state::AppState;

pub fn loan_routes() -> Router<AppState> {
    Router::new()
        .route("/api/loans", get(list_loans).post(create_loan))
        .route("/api/loans/:id", get(get_loan))
        .route("/api/loans/:id/respond", post(respond_to_loan))
        .route("/api/loans/:id/fund", post(fund_loan))
        .route("/api/loans/:id/default", post(mark_loan_defaulted))
        .route("/api/loans/:id/payments", get(list_loan_payments))
        .route("/api/invites/:token", get(view_invite))
        .route("/api/invites/:token/respond", post(respond_to_invite))
}
