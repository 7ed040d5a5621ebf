//! Notification service layer

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::ApiError;

use super::mailer::Mailer;
use super::model::{MarkedRead, NewNotification, Notification};

const MAX_LIST_LIMIT: i64 = 100;

#[derive(Clone)]
pub struct NotificationService {
    db_pool: PgPool,
    mailer: Option<Mailer>,
}

impl NotificationService {
    pub fn new(db_pool: PgPool, mailer: Option<Mailer>) -> Self {
        Self { db_pool, mailer }
    }

    /// Record a notification and relay it by email when configured. Failures
    /// are logged and swallowed so the request that triggered them succeeds.
    pub async fn notify(&self, notification: NewNotification) {
        if let Err(e) = self.insert(&notification).await {
            tracing::error!(
                error = %e,
                user_id = %notification.user_id,
                kind = ?notification.kind,
                "Failed to store notification"
            );
            return;
        }

        if notification.kind.sends_email() {
            self.relay_email(&notification).await;
        }
    }

    pub async fn list(
        &self,
        user_id: Uuid,
        unread_only: bool,
        limit: Option<i64>,
    ) -> Result<Vec<Notification>, ApiError> {
        let limit = limit.unwrap_or(50).clamp(1, MAX_LIST_LIMIT);

        let notifications = sqlx::query_as::<_, Notification>(
            r#"
            SELECT * FROM notifications
            WHERE user_id = $1 AND ($2 = FALSE OR read_at IS NULL)
            ORDER BY created_at DESC
            LIMIT $3
            "#,
        )
        .bind(user_id)
        .bind(unread_only)
        .bind(limit)
        .fetch_all(&self.db_pool)
        .await?;

        Ok(notifications)
    }

    pub async fn mark_read(&self, user_id: Uuid, id: Uuid) -> Result<Notification, ApiError> {
        sqlx::query_as::<_, Notification>(
            r#"
            UPDATE notifications
            SET read_at = COALESCE(read_at, $1)
            WHERE id = $2 AND user_id = $3
            RETURNING *
            "#,
        )
        .bind(Utc::now())
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.db_pool)
        .await?
        .ok_or_else(|| ApiError::NotFound("Notification not found".to_string()))
    }

    pub async fn mark_all_read(&self, user_id: Uuid) -> Result<MarkedRead, ApiError> {
        let result = sqlx::query(
            "UPDATE notifications SET read_at = $1 WHERE user_id = $2 AND read_at IS NULL",
        )
        .bind(Utc::now())
        .bind(user_id)
        .execute(&self.db_pool)
        .await?;

        Ok(MarkedRead {
            updated: result.rows_affected(),
        })
    }

    async fn insert(&self, n: &NewNotification) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO notifications (user_id, kind, title, body, loan_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(n.user_id)
        .bind(n.kind)
        .bind(&n.title)
        .bind(&n.body)
        .bind(n.loan_id)
        .bind(Utc::now())
        .execute(&self.db_pool)
        .await?;

        Ok(())
    }

    async fn relay_email(&self, n: &NewNotification) {
        let Some(mailer) = &self.mailer else {
            return;
        };

        let email: Option<(String,)> = match sqlx::query_as("SELECT email FROM users WHERE id = $1")
            .bind(n.user_id)
            .fetch_optional(&self.db_pool)
            .await
        {
            Ok(row) => row,
            Err(e) => {
                tracing::warn!(error = %e, user_id = %n.user_id, "Could not look up email address");
                return;
            }
        };

        let Some((to,)) = email else {
            return;
        };

        let message = mailer.message(&to, &n.title, &n.body);
        if let Err(e) = mailer.send(&message).await {
            tracing::warn!(error = %e, user_id = %n.user_id, "Email relay failed");
        }
    }

    /// Send an email to an address that may not have an account yet
    pub async fn email_address(&self, to: &str, subject: &str, text: &str) {
        let Some(mailer) = &self.mailer else {
            tracing::debug!(to = %to, "No mailer configured, skipping email");
            return;
        };

        if let Err(e) = mailer.send(&mailer.message(to, subject, text)).await {
            tracing::warn!(error = %e, "Email relay failed");
        }
    }
}
