//! Payment handlers

use axum::{extract::State, http::HeaderMap, Json};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::AuthenticatedUser;
use crate::models::ApiResponse;
use crate::payment::{ConfirmPaymentRequest, Payment, PaymentService, PaymentView, PaymentWebhookPayload};
use crate::state::AppState;

use super::{ApiJson, ApiPath};

pub const WEBHOOK_SECRET_HEADER: &str = "x-webhook-secret";

/// GET /api/loans/:id/payments
pub async fn list_loan_payments(
    State(service): State<Arc<PaymentService>>,
    user: AuthenticatedUser,
    ApiPath(loan_id): ApiPath<Uuid>,
) -> Result<Json<ApiResponse<Vec<PaymentView>>>, ApiError> {
    let payments = service.list_for_loan(user.user_id, loan_id).await?;
    Ok(Json(ApiResponse::ok(payments)))
}

/// POST /api/payments/:id/confirm
pub async fn confirm_payment(
    State(service): State<Arc<PaymentService>>,
    user: AuthenticatedUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<ConfirmPaymentRequest>,
) -> Result<Json<ApiResponse<Payment>>, ApiError> {
    let payment = service.confirm_payment(user.user_id, id, request).await?;
    Ok(Json(ApiResponse::ok(payment)))
}

/// POST /api/payments/webhook - Provider callback authenticated by a
/// shared secret header
pub async fn payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    ApiJson(payload): ApiJson<PaymentWebhookPayload>,
) -> Result<Json<ApiResponse<Payment>>, ApiError> {
    let expected = state
        .webhook_secret
        .as_deref()
        .ok_or_else(|| ApiError::Unauthorized("Webhook is not configured".to_string()))?;

    let provided = headers
        .get(WEBHOOK_SECRET_HEADER)
        .and_then(|v| v.to_str().ok());

    if !provided.is_some_and(|p| secrets_match(p, expected)) {
        tracing::warn!("Payment webhook rejected: bad secret");
        return Err(ApiError::Unauthorized("Invalid webhook secret".to_string()));
    }

    let payment = state.payment_service.apply_provider_outcome(payload).await?;
    Ok(Json(ApiResponse::ok(payment)))
}

/// Compares fixed-length digests without an early exit so timing does not
/// reveal how much of the secret matched
fn secrets_match(provided: &str, expected: &str) -> bool {
    let a = Sha256::digest(provided.as_bytes());
    let b = Sha256::digest(expected.as_bytes());
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secrets_match() {
        assert!(secrets_match("whsec_123", "whsec_123"));
        assert!(!secrets_match("whsec_124", "whsec_123"));
        assert!(!secrets_match("whsec_12", "whsec_123"));
        assert!(!secrets_match("", "whsec_123"));
    }
}
