//! Tier policy service layer

use chrono::Utc;
use sqlx::PgPool;
use std::collections::HashSet;
use uuid::Uuid;
use validator::Validate;

use crate::error::ApiError;
use crate::trust::TrustTier;

use super::model::{
    TierPolicy, TierPolicyInput, ValidatedPolicy, MAX_INTEREST_RATE, MIN_INTEREST_RATE,
    MIN_POLICY_LOAN_AMOUNT,
};

/// Validate a whole upsert batch before anything is written. The first
/// offending entry is reported with its index.
pub fn validate_policy_batch(inputs: &[TierPolicyInput]) -> Result<Vec<ValidatedPolicy>, ApiError> {
    if inputs.is_empty() {
        return Err(ApiError::BadRequest(
            "At least one tier policy is required".to_string(),
        ));
    }
    if inputs.len() > TrustTier::ALL.len() {
        return Err(ApiError::BadRequest(format!(
            "At most {} tier policies may be submitted",
            TrustTier::ALL.len()
        )));
    }

    let mut seen = HashSet::new();
    let mut validated = Vec::with_capacity(inputs.len());

    for (index, input) in inputs.iter().enumerate() {
        let tier = TrustTier::parse(&input.tier_id).ok_or_else(|| {
            ApiError::BadRequest(format!(
                "policies[{}]: unknown tier_id '{}'",
                index, input.tier_id
            ))
        })?;

        if !seen.insert(tier) {
            return Err(ApiError::BadRequest(format!(
                "policies[{}]: duplicate tier_id '{}'",
                index, input.tier_id
            )));
        }

        // NaN slips through range comparisons
        if !input.interest_rate.is_finite() || !input.max_loan_amount.is_finite() {
            return Err(ApiError::BadRequest(format!(
                "policies[{}]: rate and amount must be finite numbers",
                index
            )));
        }

        input.validate().map_err(|_| {
            ApiError::ValidationError(format!(
                "policies[{}]: interest_rate must be within [{}, {}] and max_loan_amount at least {}",
                index, MIN_INTEREST_RATE, MAX_INTEREST_RATE, MIN_POLICY_LOAN_AMOUNT
            ))
        })?;

        validated.push(ValidatedPolicy {
            tier,
            interest_rate: input.interest_rate,
            max_loan_amount: input.max_loan_amount,
            is_active: input.is_active,
        });
    }

    Ok(validated)
}

#[derive(Clone)]
pub struct PolicyService {
    db_pool: PgPool,
}

impl PolicyService {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    pub async fn list_policies(&self, lender_id: Uuid) -> Result<Vec<TierPolicy>, ApiError> {
        let policies = sqlx::query_as::<_, TierPolicy>(
            "SELECT * FROM lender_tier_policies WHERE lender_id = $1 ORDER BY tier_id",
        )
        .bind(lender_id)
        .fetch_all(&self.db_pool)
        .await?;

        Ok(policies)
    }

    /// Active policy a lender holds for one tier, if any
    pub async fn policy_for(
        &self,
        lender_id: Uuid,
        tier: TrustTier,
    ) -> Result<Option<TierPolicy>, ApiError> {
        let policy = sqlx::query_as::<_, TierPolicy>(
            r#"
            SELECT * FROM lender_tier_policies
            WHERE lender_id = $1 AND tier_id = $2 AND is_active = TRUE
            "#,
        )
        .bind(lender_id)
        .bind(tier)
        .fetch_optional(&self.db_pool)
        .await?;

        Ok(policy)
    }

    /// Validate then upsert every entry in one transaction
    pub async fn upsert_policies(
        &self,
        lender_id: Uuid,
        inputs: Vec<TierPolicyInput>,
    ) -> Result<Vec<TierPolicy>, ApiError> {
        let validated = validate_policy_batch(&inputs)?;

        let mut tx = self.db_pool.begin().await?;
        let now = Utc::now();
        let mut saved = Vec::with_capacity(validated.len());

        for policy in validated {
            let row = sqlx::query_as::<_, TierPolicy>(
                r#"
                INSERT INTO lender_tier_policies (
                    lender_id, tier_id, interest_rate, max_loan_amount, is_active,
                    created_at, updated_at
                )
                VALUES ($1, $2, $3, $4, $5, $6, $6)
                ON CONFLICT (lender_id, tier_id) DO UPDATE
                SET interest_rate = EXCLUDED.interest_rate,
                    max_loan_amount = EXCLUDED.max_loan_amount,
                    is_active = EXCLUDED.is_active,
                    updated_at = EXCLUDED.updated_at
                RETURNING *
                "#,
            )
            .bind(lender_id)
            .bind(policy.tier)
            .bind(policy.interest_rate)
            .bind(policy.max_loan_amount)
            .bind(policy.is_active)
            .bind(now)
            .fetch_one(&mut *tx)
            .await?;

            saved.push(row);
        }

        tx.commit().await?;

        tracing::info!(lender_id = %lender_id, count = saved.len(), "Tier policies upserted");

        Ok(saved)
    }
}
