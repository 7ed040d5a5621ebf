//! Loan handlers

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::ApiError;
use crate::loan::{
    CreateLoanRequest, CreatedLoan, FundedLoan, InviteSummary, ListLoansQuery, Loan, LoanRef,
    LoanService, RespondRequest,
};
use crate::middleware::AuthenticatedUser;
use crate::models::{ApiResponse, PaginatedResponse};

use super::{ApiJson, ApiPath, ApiQuery};

pub async fn create_loan(
    State(service): State<Arc<LoanService>>,
    user: AuthenticatedUser,
    ApiJson(request): ApiJson<CreateLoanRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CreatedLoan>>), ApiError> {
    let created = service.create_loan(user.user_id, request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(created))))
}

pub async fn list_loans(
    State(service): State<Arc<LoanService>>,
    user: AuthenticatedUser,
    ApiQuery(query): ApiQuery<ListLoansQuery>,
) -> Result<Json<ApiResponse<PaginatedResponse<Loan>>>, ApiError> {
    let loans = service.list_loans(user.user_id, &query).await?;
    Ok(Json(ApiResponse::ok(loans)))
}

pub async fn get_loan(
    State(service): State<Arc<LoanService>>,
    user: AuthenticatedUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<ApiResponse<Loan>>, ApiError> {
    let loan = service.get_loan(user.user_id, id).await?;
    Ok(Json(ApiResponse::ok(loan)))
}

/// POST /api/loans/:id/respond - Addressed lender accepts or declines
pub async fn respond_to_loan(
    State(service): State<Arc<LoanService>>,
    user: AuthenticatedUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<RespondRequest>,
) -> Result<Json<ApiResponse<Loan>>, ApiError> {
    let loan = service
        .respond_to_loan(user.user_id, LoanRef::Id(id), request)
        .await?;
    Ok(Json(ApiResponse::ok(loan)))
}

pub async fn fund_loan(
    State(service): State<Arc<LoanService>>,
    user: AuthenticatedUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<ApiResponse<FundedLoan>>, ApiError> {
    let funded = service.fund_loan(user.user_id, id).await?;
    Ok(Json(ApiResponse::ok(funded)))
}

pub async fn mark_loan_defaulted(
    State(service): State<Arc<LoanService>>,
    user: AuthenticatedUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<ApiResponse<Loan>>, ApiError> {
    let loan = service.mark_defaulted(user.user_id, id).await?;
    Ok(Json(ApiResponse::ok(loan)))
}

/// GET /api/invites/:token - No auth; the token is the credential
pub async fn view_invite(
    State(service): State<Arc<LoanService>>,
    ApiPath(token): ApiPath<String>,
) -> Result<Json<ApiResponse<InviteSummary>>, ApiError> {
    let summary = service.view_invite(&token).await?;
    Ok(Json(ApiResponse::ok(summary)))
}

/// POST /api/invites/:token/respond
pub async fn respond_to_invite(
    State(service): State<Arc<LoanService>>,
    user: AuthenticatedUser,
    ApiPath(token): ApiPath<String>,
    ApiJson(request): ApiJson<RespondRequest>,
) -> Result<Json<ApiResponse<Loan>>, ApiError> {
    let loan = service
        .respond_to_loan(user.user_id, LoanRef::InviteToken(token), request)
        .await?;
    Ok(Json(ApiResponse::ok(loan)))
}
