//! Tier policy models

use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;
use validator::Validate;

use crate::trust::TrustTier;

pub const MIN_INTEREST_RATE: f64 = 0.0;
pub const MAX_INTEREST_RATE: f64 = 100.0;
pub const MIN_POLICY_LOAN_AMOUNT: f64 = 1.0;

/// Lender policy row
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct TierPolicy {
    pub id: Uuid,
    pub lender_id: Uuid,
    pub tier_id: TrustTier,
    /// Annual rate in percent
    pub interest_rate: f64,
    pub max_loan_amount: f64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One entry of the bulk upsert body
#[derive(Debug, Deserialize, Validate, Clone)]
pub struct TierPolicyInput {
    pub tier_id: String,
    #[validate(range(min = 0.0, max = 100.0))]
    pub interest_rate: f64,
    #[validate(range(min = 1.0))]
    pub max_loan_amount: f64,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

/// An input entry after validation, with its tier resolved
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedPolicy {
    pub tier: TrustTier,
    pub interest_rate: f64,
    pub max_loan_amount: f64,
    pub is_active: bool,
}
