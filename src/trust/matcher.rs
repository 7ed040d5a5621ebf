//! Lender matching

use uuid::Uuid;

use crate::policy::TierPolicy;

use super::model::{LenderMatch, MatchResult, TrustTier};

/// Keep the active policies at `tier` that cover `amount` and do not
/// belong to the borrower, cheapest first. Equal rates prefer the larger
/// ceiling.
pub fn rank_policies(
    policies: Vec<TierPolicy>,
    borrower_id: Uuid,
    tier: TrustTier,
    amount: f64,
) -> Vec<LenderMatch> {
    let mut matches: Vec<LenderMatch> = policies
        .into_iter()
        .filter(|p| p.is_active)
        .filter(|p| p.tier_id == tier)
        .filter(|p| p.lender_id != borrower_id)
        .filter(|p| p.max_loan_amount >= amount)
        .map(|p| LenderMatch {
            policy_id: p.id,
            lender_id: p.lender_id,
            tier: p.tier_id,
            interest_rate: p.interest_rate,
            max_loan_amount: p.max_loan_amount,
        })
        .collect();

    matches.sort_by(|a, b| {
        a.interest_rate
            .total_cmp(&b.interest_rate)
            .then(b.max_loan_amount.total_cmp(&a.max_loan_amount))
    });

    matches
}

pub fn summarize_matches(tier: TrustTier, amount: f64, lenders: Vec<LenderMatch>) -> MatchResult {
    let total_matches = lenders.len();
    let best_rate = lenders.first().map(|m| m.interest_rate);
    let average_rate = (total_matches > 0).then(|| {
        lenders.iter().map(|m| m.interest_rate).sum::<f64>() / total_matches as f64
    });

    MatchResult {
        tier,
        requested_amount: amount,
        lenders,
        total_matches,
        best_rate,
        average_rate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn policy(lender_id: Uuid, tier: TrustTier, rate: f64, max: f64, active: bool) -> TierPolicy {
        TierPolicy {
            id: Uuid::new_v4(),
            lender_id,
            tier_id: tier,
            interest_rate: rate,
            max_loan_amount: max,
            is_active: active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_equal_rates_prefer_larger_ceiling() {
        let small = policy(Uuid::new_v4(), TrustTier::Low, 8.0, 1_000.0, true);
        let large = policy(Uuid::new_v4(), TrustTier::Low, 8.0, 5_000.0, true);
        let large_id = large.id;

        let ranked = rank_policies(vec![small, large], Uuid::new_v4(), TrustTier::Low, 500.0);
        assert_eq!(ranked[0].policy_id, large_id);
    }

    #[test]
    fn test_inactive_and_other_tiers_are_skipped() {
        let policies = vec![
            policy(Uuid::new_v4(), TrustTier::Low, 5.0, 1_000.0, false),
            policy(Uuid::new_v4(), TrustTier::High, 4.0, 1_000.0, true),
        ];
        assert!(rank_policies(policies, Uuid::new_v4(), TrustTier::Low, 100.0).is_empty());
    }

    #[test]
    fn test_summary_of_no_matches() {
        let result = summarize_matches(TrustTier::Building, 250.0, vec![]);
        assert_eq!(result.total_matches, 0);
        assert_eq!(result.best_rate, None);
        assert_eq!(result.average_rate, None);
    }
}
