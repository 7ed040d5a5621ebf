//! Retired guest lending flows

use crate::error::ApiError;

/// Any `/api/guest-lender/*` or `/api/guest-borrower/*` request
pub async fn guest_flow_gone() -> ApiError {
    ApiError::Gone(
        "Guest flows have been retired. Sign in and use /api/loans instead.".to_string(),
    )
}
