//! Vouch service layer

use chrono::Utc;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::error::ApiError;
use crate::notification::{NewNotification, NotificationKind, NotificationService};
use crate::trust::TrustService;

use super::model::{CreateVouchRequest, Vouch, VouchStatus};

#[derive(Clone)]
pub struct VouchService {
    db_pool: PgPool,
    trust: Arc<TrustService>,
    notifications: Arc<NotificationService>,
}

impl VouchService {
    pub fn new(
        db_pool: PgPool,
        trust: Arc<TrustService>,
        notifications: Arc<NotificationService>,
    ) -> Self {
        Self {
            db_pool,
            trust,
            notifications,
        }
    }

    /// Create a vouch. The eligibility gate is authoritative here: any
    /// failure to evaluate it rejects the request.
    pub async fn create_vouch(
        &self,
        voucher_id: Uuid,
        request: CreateVouchRequest,
    ) -> Result<Vouch, ApiError> {
        request.validate()?;

        if request.vouchee_id == voucher_id {
            return Err(ApiError::BadRequest("You cannot vouch for yourself".to_string()));
        }

        let eligibility = self.trust.check_vouch_eligibility(voucher_id).await?;
        if !eligibility.can_vouch {
            return Err(ApiError::Forbidden(
                eligibility
                    .reason
                    .unwrap_or_else(|| "Not eligible to vouch".to_string()),
            ));
        }

        let vouchee_exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE id = $1")
            .bind(request.vouchee_id)
            .fetch_optional(&self.db_pool)
            .await?;
        if vouchee_exists.is_none() {
            return Err(ApiError::NotFound("User to vouch for not found".to_string()));
        }

        let vouch = sqlx::query_as::<_, Vouch>(
            r#"
            INSERT INTO vouches (voucher_id, vouchee_id, message, status, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(voucher_id)
        .bind(request.vouchee_id)
        .bind(&request.message)
        .bind(VouchStatus::Active)
        .bind(Utc::now())
        .fetch_one(&self.db_pool)
        .await
        .map_err(|e| match ApiError::from(e) {
            ApiError::Conflict(_) => {
                ApiError::Conflict("You have already vouched for this user".to_string())
            }
            other => other,
        })?;

        tracing::info!(
            vouch_id = %vouch.id,
            voucher_id = %voucher_id,
            vouchee_id = %vouch.vouchee_id,
            "Vouch created"
        );

        self.refresh_tier(vouch.vouchee_id).await;

        self.notifications
            .notify(NewNotification::new(
                vouch.vouchee_id,
                NotificationKind::VouchReceived,
                "Someone vouched for you",
                "A member vouched for you. Vouches raise your trust tier and unlock more lenders.",
            ))
            .await;

        Ok(vouch)
    }

    /// Revoke one of the caller's own active vouches
    pub async fn revoke_vouch(&self, voucher_id: Uuid, vouch_id: Uuid) -> Result<Vouch, ApiError> {
        let existing = sqlx::query_as::<_, Vouch>("SELECT * FROM vouches WHERE id = $1")
            .bind(vouch_id)
            .fetch_optional(&self.db_pool)
            .await?
            .ok_or_else(|| ApiError::NotFound("Vouch not found".to_string()))?;

        if existing.voucher_id != voucher_id {
            return Err(ApiError::Forbidden(
                "Only the voucher can revoke a vouch".to_string(),
            ));
        }

        let vouch = sqlx::query_as::<_, Vouch>(
            r#"
            UPDATE vouches
            SET status = $1, revoked_at = $2
            WHERE id = $3 AND status = $4
            RETURNING *
            "#,
        )
        .bind(VouchStatus::Revoked)
        .bind(Utc::now())
        .bind(vouch_id)
        .bind(VouchStatus::Active)
        .fetch_optional(&self.db_pool)
        .await?
        .ok_or_else(|| ApiError::Conflict("Vouch is already revoked".to_string()))?;

        tracing::info!(vouch_id = %vouch.id, vouchee_id = %vouch.vouchee_id, "Vouch revoked");

        self.refresh_tier(vouch.vouchee_id).await;

        Ok(vouch)
    }

    pub async fn list_received(&self, user_id: Uuid) -> Result<Vec<Vouch>, ApiError> {
        let vouches = sqlx::query_as::<_, Vouch>(
            "SELECT * FROM vouches WHERE vouchee_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.db_pool)
        .await?;

        Ok(vouches)
    }

    pub async fn list_given(&self, user_id: Uuid) -> Result<Vec<Vouch>, ApiError> {
        let vouches = sqlx::query_as::<_, Vouch>(
            "SELECT * FROM vouches WHERE voucher_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.db_pool)
        .await?;

        Ok(vouches)
    }

    /// On a failed recompute the stored tier is marked stale so the next
    /// read recomputes instead of serving it.
    async fn refresh_tier(&self, user_id: Uuid) {
        if let Err(e) = self.trust.calculate_tier(user_id).await {
            tracing::warn!(error = %e, user_id = %user_id, "Tier recompute after vouch change failed");
            if let Err(e) = self.trust.invalidate_tier(user_id).await {
                tracing::error!(error = %e, user_id = %user_id, "Failed to mark tier stale");
            }
        }
    }
}
