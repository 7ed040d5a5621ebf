//! Trust tier models

use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::VerificationStatus;

/// Minimum active vouches for each tier above the lowest
pub const BUILDING_TIER_MIN_VOUCHES: i64 = 3;
pub const ESTABLISHED_TIER_MIN_VOUCHES: i64 = 6;
pub const HIGH_TIER_MIN_VOUCHES: i64 = 11;

/// Ordered trust buckets. Stored and serialized as `tier_1`..`tier_4`.
#[derive(
    Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[sqlx(type_name = "trust_tier")]
pub enum TrustTier {
    #[sqlx(rename = "tier_1")]
    #[serde(rename = "tier_1")]
    Low,
    #[sqlx(rename = "tier_2")]
    #[serde(rename = "tier_2")]
    Building,
    #[sqlx(rename = "tier_3")]
    #[serde(rename = "tier_3")]
    Established,
    #[sqlx(rename = "tier_4")]
    #[serde(rename = "tier_4")]
    High,
}

impl TrustTier {
    pub const ALL: [TrustTier; 4] = [
        TrustTier::Low,
        TrustTier::Building,
        TrustTier::Established,
        TrustTier::High,
    ];

    /// Map an active-vouch count onto a tier
    pub fn from_vouch_count(count: i64) -> Self {
        match count {
            c if c >= HIGH_TIER_MIN_VOUCHES => TrustTier::High,
            c if c >= ESTABLISHED_TIER_MIN_VOUCHES => TrustTier::Established,
            c if c >= BUILDING_TIER_MIN_VOUCHES => TrustTier::Building,
            _ => TrustTier::Low,
        }
    }

    pub fn id(&self) -> &'static str {
        match self {
            TrustTier::Low => "tier_1",
            TrustTier::Building => "tier_2",
            TrustTier::Established => "tier_3",
            TrustTier::High => "tier_4",
        }
    }

    pub fn parse(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tier| tier.id() == id)
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            TrustTier::Low => "Low Trust",
            TrustTier::Building => "Building Trust",
            TrustTier::Established => "Established Trust",
            TrustTier::High => "High Trust",
        }
    }

    pub fn min_vouches(&self) -> i64 {
        match self {
            TrustTier::Low => 0,
            TrustTier::Building => BUILDING_TIER_MIN_VOUCHES,
            TrustTier::Established => ESTABLISHED_TIER_MIN_VOUCHES,
            TrustTier::High => HIGH_TIER_MIN_VOUCHES,
        }
    }

    pub fn next(&self) -> Option<TrustTier> {
        match self {
            TrustTier::Low => Some(TrustTier::Building),
            TrustTier::Building => Some(TrustTier::Established),
            TrustTier::Established => Some(TrustTier::High),
            TrustTier::High => None,
        }
    }
}

/// The trust columns of a user row
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserTrustRecord {
    pub id: Uuid,
    pub verification_status: VerificationStatus,
    pub is_blocked: bool,
    pub trust_tier: Option<TrustTier>,
    pub vouch_count: i32,
    pub tier_updated_at: Option<DateTime<Utc>>,
}

/// Tier as returned to clients
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TrustSnapshot {
    pub user_id: Uuid,
    pub tier: TrustTier,
    pub tier_name: String,
    pub vouch_count: i64,
    pub next_tier: Option<TrustTier>,
    pub vouches_to_next_tier: Option<i64>,
    pub updated_at: DateTime<Utc>,
    /// Whether this read recomputed the tier rather than serving the cache
    pub recomputed: bool,
}

impl TrustSnapshot {
    pub fn new(
        user_id: Uuid,
        vouch_count: i64,
        tier: TrustTier,
        updated_at: DateTime<Utc>,
        recomputed: bool,
    ) -> Self {
        let next_tier = tier.next();
        Self {
            user_id,
            tier,
            tier_name: tier.display_name().to_string(),
            vouch_count,
            next_tier,
            vouches_to_next_tier: next_tier.map(|next| (next.min_vouches() - vouch_count).max(0)),
            updated_at,
            recomputed,
        }
    }
}

/// Outcome of the vouch eligibility gate
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct VouchEligibility {
    #[serde(rename = "canVouch")]
    pub can_vouch: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl VouchEligibility {
    pub fn eligible() -> Self {
        Self {
            can_vouch: true,
            reason: None,
        }
    }

    pub fn ineligible(reason: &str) -> Self {
        Self {
            can_vouch: false,
            reason: Some(reason.to_string()),
        }
    }
}

/// A lender policy that covers a borrower's request
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LenderMatch {
    pub policy_id: Uuid,
    pub lender_id: Uuid,
    pub tier: TrustTier,
    pub interest_rate: f64,
    pub max_loan_amount: f64,
}

/// Matching result with simple rate aggregates
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MatchResult {
    pub tier: TrustTier,
    pub requested_amount: f64,
    pub lenders: Vec<LenderMatch>,
    pub total_matches: usize,
    pub best_rate: Option<f64>,
    pub average_rate: Option<f64>,
}

/// Query for the matching endpoint
#[derive(Debug, Deserialize)]
pub struct MatchQuery {
    pub amount: f64,
}
