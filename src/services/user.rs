//! User profile and admin moderation

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::error::ApiError;
use crate::models::{UpdateProfileRequest, User, VerificationStatus};

#[derive(Clone)]
pub struct UserService {
    db_pool: PgPool,
}

impl UserService {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    pub async fn get_user(&self, user_id: Uuid) -> Result<User, ApiError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.db_pool)
            .await?
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
    }

    /// Only fields present in the request are changed
    pub async fn update_profile(
        &self,
        user_id: Uuid,
        request: UpdateProfileRequest,
    ) -> Result<User, ApiError> {
        let request = request.normalized();
        request.validate()?;

        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET full_name = COALESCE($1, full_name),
                phone = COALESCE($2, phone),
                updated_at = $3
            WHERE id = $4
            RETURNING *
            "#,
        )
        .bind(&request.full_name)
        .bind(&request.phone)
        .bind(Utc::now())
        .bind(user_id)
        .fetch_optional(&self.db_pool)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
    }

    pub async fn set_verification(
        &self,
        admin_id: Uuid,
        user_id: Uuid,
        status: VerificationStatus,
    ) -> Result<User, ApiError> {
        let user = sqlx::query_as::<_, User>(
            "UPDATE users SET verification_status = $1, updated_at = $2 WHERE id = $3 RETURNING *",
        )
        .bind(status)
        .bind(Utc::now())
        .bind(user_id)
        .fetch_optional(&self.db_pool)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

        tracing::info!(
            admin_id = %admin_id,
            user_id = %user_id,
            status = ?status,
            "Verification status changed"
        );

        Ok(user)
    }

    pub async fn set_blocked(
        &self,
        admin_id: Uuid,
        user_id: Uuid,
        blocked: bool,
    ) -> Result<User, ApiError> {
        if admin_id == user_id && blocked {
            return Err(ApiError::BadRequest("You cannot block yourself".to_string()));
        }

        let user = sqlx::query_as::<_, User>(
            "UPDATE users SET is_blocked = $1, updated_at = $2 WHERE id = $3 RETURNING *",
        )
        .bind(blocked)
        .bind(Utc::now())
        .bind(user_id)
        .fetch_optional(&self.db_pool)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

        tracing::warn!(admin_id = %admin_id, user_id = %user_id, blocked, "User block flag changed");

        Ok(user)
    }
}
