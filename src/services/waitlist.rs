//! Pre-launch waitlist

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use validator::Validate;

use crate::error::ApiError;

#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "waitlist_interest", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum WaitlistInterest {
    Borrower,
    Lender,
    Business,
}

#[derive(Debug, Deserialize, Validate)]
pub struct JoinWaitlistRequest {
    #[validate(email, length(max = 254))]
    pub email: String,
    #[validate(length(min = 1, max = 120))]
    pub name: Option<String>,
    pub interest: WaitlistInterest,
}

#[derive(Clone)]
pub struct WaitlistService {
    db_pool: PgPool,
}

impl WaitlistService {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    /// Joining twice with the same email is a no-op; the original entry wins
    pub async fn join(&self, request: JoinWaitlistRequest) -> Result<(), ApiError> {
        request.validate()?;
        let email = request.email.trim().to_lowercase();

        let inserted = sqlx::query(
            r#"
            INSERT INTO waitlist (email, name, interest, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (email) DO NOTHING
            "#,
        )
        .bind(&email)
        .bind(request.name.as_deref().map(str::trim))
        .bind(request.interest)
        .bind(Utc::now())
        .execute(&self.db_pool)
        .await?
        .rows_affected();

        if inserted == 1 {
            tracing::info!(interest = ?request.interest, "Waitlist signup");
        } else {
            tracing::debug!("Duplicate waitlist signup ignored");
        }

        Ok(())
    }
}
