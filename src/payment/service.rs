//! Payment service layer

use chrono::Utc;
use sqlx::{PgPool, Postgres, Transaction};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::error::ApiError;
use crate::loan::LoanStatus;
use crate::notification::{NewNotification, NotificationKind, NotificationService};

use super::model::{
    ConfirmPaymentRequest, Payment, PaymentContext, PaymentOutcome, PaymentStatus, PaymentView,
    PaymentWebhookPayload, MAX_PAYMENT_RETRIES,
};

#[derive(Clone)]
pub struct PaymentService {
    db_pool: PgPool,
    notifications: Arc<NotificationService>,
}

impl PaymentService {
    pub fn new(db_pool: PgPool, notifications: Arc<NotificationService>) -> Self {
        Self {
            db_pool,
            notifications,
        }
    }

    /// Schedule for a loan, visible to its borrower and lender
    pub async fn list_for_loan(
        &self,
        user_id: Uuid,
        loan_id: Uuid,
    ) -> Result<Vec<PaymentView>, ApiError> {
        let parties: Option<(Uuid, Option<Uuid>)> =
            sqlx::query_as("SELECT borrower_id, lender_id FROM loans WHERE id = $1")
                .bind(loan_id)
                .fetch_optional(&self.db_pool)
                .await?;

        let (borrower_id, lender_id) =
            parties.ok_or_else(|| ApiError::NotFound("Loan not found".to_string()))?;
        if borrower_id != user_id && lender_id != Some(user_id) {
            return Err(ApiError::Forbidden("Not a party to this loan".to_string()));
        }

        let payments = sqlx::query_as::<_, Payment>(
            "SELECT * FROM payments WHERE loan_id = $1 ORDER BY installment_number",
        )
        .bind(loan_id)
        .fetch_all(&self.db_pool)
        .await?;

        let today = Utc::now().date_naive();
        Ok(payments
            .into_iter()
            .map(|p| PaymentView::new(p, today))
            .collect())
    }

    /// Borrower-reported payment of an installment
    pub async fn confirm_payment(
        &self,
        borrower_id: Uuid,
        payment_id: Uuid,
        request: ConfirmPaymentRequest,
    ) -> Result<Payment, ApiError> {
        request.validate()?;

        let ctx = self.context(payment_id).await?;
        if ctx.borrower_id != borrower_id {
            return Err(ApiError::Forbidden(
                "Only the borrower can confirm a payment".to_string(),
            ));
        }

        if !matches!(ctx.status, PaymentStatus::Scheduled | PaymentStatus::Failed) {
            return Err(ApiError::Conflict(
                "Payment cannot be confirmed in its current state".to_string(),
            ));
        }

        self.complete(ctx, &request.method, Some(request.reference))
            .await
    }

    /// Outcome reported by the payment provider webhook
    pub async fn apply_provider_outcome(
        &self,
        payload: PaymentWebhookPayload,
    ) -> Result<Payment, ApiError> {
        let ctx = self.context(payload.payment_id).await?;

        match payload.outcome {
            PaymentOutcome::Succeeded => self.complete(ctx, "provider", payload.reference).await,
            PaymentOutcome::Failed => self.record_failure(ctx, payload.reason).await,
        }
    }

    async fn context(&self, payment_id: Uuid) -> Result<PaymentContext, ApiError> {
        sqlx::query_as::<_, PaymentContext>(
            r#"
            SELECT p.id, p.loan_id, p.status, l.borrower_id, l.lender_id, l.status AS loan_status
            FROM payments p
            JOIN loans l ON l.id = p.loan_id
            WHERE p.id = $1
            "#,
        )
        .bind(payment_id)
        .fetch_optional(&self.db_pool)
        .await?
        .ok_or_else(|| ApiError::NotFound("Payment not found".to_string()))
    }

    async fn complete(
        &self,
        ctx: PaymentContext,
        method: &str,
        reference: Option<String>,
    ) -> Result<Payment, ApiError> {
        if ctx.loan_status != LoanStatus::Active {
            return Err(ApiError::Conflict("Loan is not active".to_string()));
        }
        if ctx.status == PaymentStatus::Completed {
            return Err(ApiError::Conflict("Payment is already completed".to_string()));
        }

        let mut tx = self.db_pool.begin().await?;
        lock_active_loan(&mut tx, ctx.loan_id).await?;
        let now = Utc::now();

        let payment = sqlx::query_as::<_, Payment>(
            r#"
            UPDATE payments
            SET status = 'completed', paid_at = $1, confirmation_method = $2,
                confirmation_reference = $3, updated_at = $1
            WHERE id = $4 AND status <> 'completed'
            RETURNING *
            "#,
        )
        .bind(now)
        .bind(method)
        .bind(&reference)
        .bind(ctx.id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| ApiError::Conflict("Payment is already completed".to_string()))?;

        let loan_completed = complete_loan_if_settled(&mut tx, ctx.loan_id).await?;

        tx.commit().await?;

        tracing::info!(
            payment_id = %payment.id,
            loan_id = %payment.loan_id,
            installment = payment.installment_number,
            loan_completed,
            "Payment completed"
        );

        if let Some(lender_id) = ctx.lender_id {
            self.notifications
                .notify(
                    NewNotification::new(
                        lender_id,
                        NotificationKind::PaymentReceived,
                        "Payment received",
                        format!(
                            "Installment {} of {:.2} was paid.",
                            payment.installment_number, payment.amount
                        ),
                    )
                    .for_loan(ctx.loan_id),
                )
                .await;
        }

        if loan_completed {
            let parties = std::iter::once(ctx.borrower_id).chain(ctx.lender_id);
            for user_id in parties {
                self.notifications
                    .notify(
                        NewNotification::new(
                            user_id,
                            NotificationKind::LoanCompleted,
                            "Loan repaid in full",
                            "Every installment has been paid. The loan is complete.",
                        )
                        .for_loan(ctx.loan_id),
                    )
                    .await;
            }
        }

        Ok(payment)
    }

    async fn record_failure(
        &self,
        ctx: PaymentContext,
        reason: Option<String>,
    ) -> Result<Payment, ApiError> {
        if ctx.loan_status != LoanStatus::Active {
            return Err(ApiError::Conflict("Loan is not active".to_string()));
        }
        if ctx.status == PaymentStatus::Completed {
            return Err(ApiError::Conflict("Payment is already completed".to_string()));
        }

        let mut tx = self.db_pool.begin().await?;
        lock_active_loan(&mut tx, ctx.loan_id).await?;

        let payment = sqlx::query_as::<_, Payment>(
            r#"
            UPDATE payments
            SET status = 'failed', retry_count = retry_count + 1,
                last_failure_reason = $1, updated_at = $2
            WHERE id = $3 AND status <> 'completed'
            RETURNING *
            "#,
        )
        .bind(&reason)
        .bind(Utc::now())
        .bind(ctx.id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| ApiError::Conflict("Payment is already completed".to_string()))?;

        tx.commit().await?;

        tracing::warn!(
            payment_id = %payment.id,
            loan_id = %payment.loan_id,
            retry_count = payment.retry_count,
            reason = reason.as_deref().unwrap_or("unspecified"),
            "Payment attempt failed"
        );

        self.notifications
            .notify(
                NewNotification::new(
                    ctx.borrower_id,
                    NotificationKind::PaymentFailed,
                    "Payment failed",
                    format!(
                        "Installment {} could not be collected (attempt {} of {}).",
                        payment.installment_number, payment.retry_count, MAX_PAYMENT_RETRIES
                    ),
                )
                .for_loan(ctx.loan_id),
            )
            .await;

        if payment.retry_count == MAX_PAYMENT_RETRIES {
            if let Some(lender_id) = ctx.lender_id {
                self.notifications
                    .notify(
                        NewNotification::new(
                            lender_id,
                            NotificationKind::PaymentFailed,
                            "Installment at risk of default",
                            format!(
                                "Installment {} has failed {} times. You may mark the loan as defaulted.",
                                payment.installment_number, payment.retry_count
                            ),
                        )
                        .for_loan(ctx.loan_id),
                    )
                    .await;
            }
        }

        Ok(payment)
    }
}

/// Row lock on the loan so payment writes for the same loan serialize.
/// The status is re-read under the lock.
async fn lock_active_loan(
    tx: &mut Transaction<'_, Postgres>,
    loan_id: Uuid,
) -> Result<(), ApiError> {
    let (status,): (LoanStatus,) =
        sqlx::query_as("SELECT status FROM loans WHERE id = $1 FOR UPDATE")
            .bind(loan_id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or_else(|| ApiError::NotFound("Loan not found".to_string()))?;

    if status != LoanStatus::Active {
        return Err(ApiError::Conflict("Loan is not active".to_string()));
    }
    Ok(())
}

/// Moves the loan to `completed` once no installment is outstanding
async fn complete_loan_if_settled(
    tx: &mut Transaction<'_, Postgres>,
    loan_id: Uuid,
) -> Result<bool, ApiError> {
    let (outstanding,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM payments WHERE loan_id = $1 AND status <> 'completed'",
    )
    .bind(loan_id)
    .fetch_one(&mut **tx)
    .await?;

    if outstanding > 0 {
        return Ok(false);
    }

    let result = sqlx::query(
        "UPDATE loans SET status = $1, updated_at = $2 WHERE id = $3 AND status = $4",
    )
    .bind(LoanStatus::Completed)
    .bind(Utc::now())
    .bind(loan_id)
    .bind(LoanStatus::Active)
    .execute(&mut **tx)
    .await?;

    Ok(result.rows_affected() == 1)
}
