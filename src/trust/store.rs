//! Persistence seam for trust calculations

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::policy::TierPolicy;

use super::model::{TrustTier, UserTrustRecord};

/// Queries the trust service depends on
#[async_trait]
pub trait TrustStore: Send + Sync {
    async fn fetch_user(&self, user_id: Uuid) -> Result<Option<UserTrustRecord>, sqlx::Error>;

    /// Number of vouches in `active` status received by the user
    async fn count_active_vouches(&self, user_id: Uuid) -> Result<i64, sqlx::Error>;

    async fn save_tier(
        &self,
        user_id: Uuid,
        tier: TrustTier,
        vouch_count: i64,
        updated_at: DateTime<Utc>,
    ) -> Result<(), sqlx::Error>;

    /// Clears the tier timestamp so the next read recomputes
    async fn mark_tier_stale(&self, user_id: Uuid) -> Result<(), sqlx::Error>;

    async fn active_policies_for_tier(&self, tier: TrustTier)
        -> Result<Vec<TierPolicy>, sqlx::Error>;
}

/// Postgres-backed trust store
#[derive(Clone)]
pub struct PgTrustStore {
    db_pool: PgPool,
}

impl PgTrustStore {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl TrustStore for PgTrustStore {
    async fn fetch_user(&self, user_id: Uuid) -> Result<Option<UserTrustRecord>, sqlx::Error> {
        sqlx::query_as::<_, UserTrustRecord>(
            r#"
            SELECT id, verification_status, is_blocked, trust_tier, vouch_count, tier_updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.db_pool)
        .await
    }

    async fn count_active_vouches(&self, user_id: Uuid) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM vouches WHERE vouchee_id = $1 AND status = 'active'",
        )
        .bind(user_id)
        .fetch_one(&self.db_pool)
        .await?;

        Ok(count)
    }

    async fn save_tier(
        &self,
        user_id: Uuid,
        tier: TrustTier,
        vouch_count: i64,
        updated_at: DateTime<Utc>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE users
            SET trust_tier = $1, vouch_count = $2, tier_updated_at = $3, updated_at = $3
            WHERE id = $4
            "#,
        )
        .bind(tier)
        .bind(vouch_count as i32)
        .bind(updated_at)
        .bind(user_id)
        .execute(&self.db_pool)
        .await?;

        Ok(())
    }

    async fn mark_tier_stale(&self, user_id: Uuid) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE users SET tier_updated_at = NULL WHERE id = $1")
            .bind(user_id)
            .execute(&self.db_pool)
            .await?;

        Ok(())
    }

    async fn active_policies_for_tier(
        &self,
        tier: TrustTier,
    ) -> Result<Vec<TierPolicy>, sqlx::Error> {
        sqlx::query_as::<_, TierPolicy>(
            r#"
            SELECT * FROM lender_tier_policies
            WHERE tier_id = $1 AND is_active = TRUE
            ORDER BY interest_rate ASC
            "#,
        )
        .bind(tier)
        .fetch_all(&self.db_pool)
        .await
    }
}
