//! Trust service layer - tier calculation, lender matching and the vouch
//! eligibility gate

use chrono::{Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::ApiError;

use super::eligibility::evaluate_vouch_eligibility;
use super::matcher::{rank_policies, summarize_matches};
use super::model::{MatchResult, TrustSnapshot, TrustTier, UserTrustRecord, VouchEligibility};
use super::store::TrustStore;

/// Default window during which a stored tier is served without recomputing
pub const DEFAULT_TIER_FRESHNESS_SECONDS: i64 = 3600;

/// Trust service. Every operation is a short sequence of store calls with
/// no locking; concurrent recomputations for one user write equal values.
#[derive(Clone)]
pub struct TrustService {
    store: Arc<dyn TrustStore>,
    freshness: Duration,
}

impl TrustService {
    pub fn new(store: Arc<dyn TrustStore>, freshness_seconds: i64) -> Self {
        Self {
            store,
            freshness: Duration::seconds(freshness_seconds),
        }
    }

    /// Recount active vouches and persist the resulting tier
    pub async fn calculate_tier(&self, user_id: Uuid) -> Result<TrustSnapshot, ApiError> {
        let user = self.require_user(user_id).await?;
        self.recompute(&user).await
    }

    /// Stored tier when it is fresh, otherwise a synchronous recompute
    pub async fn get_tier(&self, user_id: Uuid) -> Result<TrustSnapshot, ApiError> {
        let user = self.require_user(user_id).await?;

        if let (Some(tier), Some(updated_at)) = (user.trust_tier, user.tier_updated_at) {
            if Utc::now() - updated_at < self.freshness {
                return Ok(TrustSnapshot::new(
                    user.id,
                    user.vouch_count as i64,
                    tier,
                    updated_at,
                    false,
                ));
            }
        }

        self.recompute(&user).await
    }

    /// Forces the next `get_tier` for this user to recompute
    pub async fn invalidate_tier(&self, user_id: Uuid) -> Result<(), ApiError> {
        self.store.mark_tier_stale(user_id).await?;
        Ok(())
    }

    /// Read-only gate consulted before a user may vouch for someone
    pub async fn check_vouch_eligibility(
        &self,
        user_id: Uuid,
    ) -> Result<VouchEligibility, ApiError> {
        let user = self.store.fetch_user(user_id).await?;
        Ok(evaluate_vouch_eligibility(user.as_ref()))
    }

    /// Lenders whose active policy at the borrower's tier covers `amount`.
    /// A failing policy query is logged and reported as no matches.
    pub async fn find_eligible_lenders(
        &self,
        borrower_id: Uuid,
        amount: f64,
    ) -> Result<MatchResult, ApiError> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(ApiError::BadRequest(
                "Requested amount must be greater than 0".to_string(),
            ));
        }

        let tier = self.get_tier(borrower_id).await?.tier;

        let policies = match self.store.active_policies_for_tier(tier).await {
            Ok(policies) => policies,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    borrower_id = %borrower_id,
                    tier = tier.id(),
                    "Lender policy query failed, returning no matches"
                );
                Vec::new()
            }
        };

        let lenders = rank_policies(policies, borrower_id, tier, amount);
        Ok(summarize_matches(tier, amount, lenders))
    }

    async fn require_user(&self, user_id: Uuid) -> Result<UserTrustRecord, ApiError> {
        self.store
            .fetch_user(user_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
    }

    async fn recompute(&self, user: &UserTrustRecord) -> Result<TrustSnapshot, ApiError> {
        let count = self.store.count_active_vouches(user.id).await?;
        let tier = TrustTier::from_vouch_count(count);
        let now = Utc::now();

        self.store.save_tier(user.id, tier, count, now).await?;

        if user.trust_tier != Some(tier) {
            tracing::info!(
                user_id = %user.id,
                from = user.trust_tier.map(|t| t.id()).unwrap_or("none"),
                to = tier.id(),
                vouch_count = count,
                "Trust tier changed"
            );
        }

        Ok(TrustSnapshot::new(user.id, count, tier, now, true))
    }
}
