//! Loan service layer - Business logic for the loan lifecycle

use chrono::{Duration, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::error::ApiError;
use crate::models::PaginatedResponse;
use crate::notification::{NewNotification, NotificationKind, NotificationService};
use crate::payment::{build_schedule, Payment, MAX_PAYMENT_RETRIES};
use crate::policy::{PolicyService, MAX_INTEREST_RATE, MIN_INTEREST_RATE};
use crate::trust::TrustService;

use super::invite::{generate_invite_token, hash_invite_token};
use super::model::{
    CreateLoanRequest, CreatedLoan, FundedLoan, InviteSummary, ListLoansQuery, Loan, LoanDecision,
    LoanRole, LoanStatus, RespondRequest, MAX_LOAN_AMOUNT,
};

/// How a lender addresses a pending loan
#[derive(Debug, Clone)]
pub enum LoanRef {
    Id(Uuid),
    InviteToken(String),
}

/// Loan service for managing the loan lifecycle
#[derive(Clone)]
pub struct LoanService {
    db_pool: PgPool,
    trust: Arc<TrustService>,
    policies: Arc<PolicyService>,
    notifications: Arc<NotificationService>,
    invite_ttl: Duration,
    app_base_url: String,
}

impl LoanService {
    pub fn new(
        db_pool: PgPool,
        trust: Arc<TrustService>,
        policies: Arc<PolicyService>,
        notifications: Arc<NotificationService>,
        invite_ttl_days: i64,
        app_base_url: String,
    ) -> Self {
        Self {
            db_pool,
            trust,
            policies,
            notifications,
            invite_ttl: Duration::days(invite_ttl_days),
            app_base_url,
        }
    }

    /// Create a loan request, either addressed to a lender directly or to a
    /// personal lender through an invite link
    pub async fn create_loan(
        &self,
        borrower_id: Uuid,
        request: CreateLoanRequest,
    ) -> Result<CreatedLoan, ApiError> {
        let request = request.normalized();
        request.validate()?;
        request.validate_amount().map_err(|_| {
            ApiError::ValidationError(format!(
                "amount must be greater than 0 and at most {}",
                MAX_LOAN_AMOUNT
            ))
        })?;

        if request.lender_id.is_some() == request.invite_email.is_some() {
            return Err(ApiError::BadRequest(
                "Provide exactly one of lender_id or invite_email".to_string(),
            ));
        }

        if let Some(lender_id) = request.lender_id {
            if lender_id == borrower_id {
                return Err(ApiError::BadRequest(
                    "You cannot request a loan from yourself".to_string(),
                ));
            }

            let tier = self.trust.get_tier(borrower_id).await?.tier;
            let covered = self
                .policies
                .policy_for(lender_id, tier)
                .await?
                .is_some_and(|p| p.max_loan_amount >= request.amount);
            if !covered {
                return Err(ApiError::BadRequest(
                    "This lender does not offer this amount at your trust tier".to_string(),
                ));
            }
        }

        let invite_token = request.invite_email.as_ref().map(|_| generate_invite_token());
        let invite_expires_at = invite_token.as_ref().map(|_| Utc::now() + self.invite_ttl);
        let now = Utc::now();

        let loan = sqlx::query_as::<_, Loan>(
            r#"
            INSERT INTO loans (
                borrower_id, lender_id, amount, currency, purpose, term_months,
                status, invite_email, invite_token_hash, invite_expires_at,
                created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $11)
            RETURNING *
            "#,
        )
        .bind(borrower_id)
        .bind(request.lender_id)
        .bind(request.amount)
        .bind(&request.currency)
        .bind(&request.purpose)
        .bind(request.term_months)
        .bind(LoanStatus::Pending)
        .bind(&request.invite_email)
        .bind(invite_token.as_deref().map(hash_invite_token))
        .bind(invite_expires_at)
        .bind(now)
        .fetch_one(&self.db_pool)
        .await?;

        tracing::info!(
            loan_id = %loan.id,
            borrower_id = %borrower_id,
            amount = loan.amount,
            direct = loan.lender_id.is_some(),
            invited = invite_token.is_some(),
            "Loan requested"
        );

        if let Some(lender_id) = loan.lender_id {
            self.notifications
                .notify(
                    NewNotification::new(
                        lender_id,
                        NotificationKind::LoanRequested,
                        "New loan request",
                        format!(
                            "A borrower requested {:.2} {} over {} months.",
                            loan.amount, loan.currency, loan.term_months
                        ),
                    )
                    .for_loan(loan.id),
                )
                .await;
        }

        let invite_url = invite_token
            .as_ref()
            .map(|token| format!("{}/invite/{}", self.app_base_url.trim_end_matches('/'), token));

        if let (Some(email), Some(url)) = (&loan.invite_email, &invite_url) {
            self.notifications
                .email_address(
                    email,
                    "You have been asked to lend",
                    &format!(
                        "Someone you know asked you to lend {:.2} {}. Review the request: {}",
                        loan.amount, loan.currency, url
                    ),
                )
                .await;
        }

        Ok(CreatedLoan {
            loan,
            invite_token,
            invite_url,
        })
    }

    /// A loan visible to its borrower or lender
    pub async fn get_loan(&self, user_id: Uuid, loan_id: Uuid) -> Result<Loan, ApiError> {
        let loan = self.find(loan_id).await?;
        if !loan.is_party(user_id) {
            return Err(ApiError::Forbidden("Not a party to this loan".to_string()));
        }
        Ok(loan)
    }

    pub async fn list_loans(
        &self,
        user_id: Uuid,
        query: &ListLoansQuery,
    ) -> Result<PaginatedResponse<Loan>, ApiError> {
        let (page, limit, offset) = query.pagination().resolve();
        let as_borrower = query.role != Some(LoanRole::Lender);
        let as_lender = query.role != Some(LoanRole::Borrower);

        let loans = sqlx::query_as::<_, Loan>(
            r#"
            SELECT * FROM loans
            WHERE ((borrower_id = $1 AND $2) OR (lender_id = $1 AND $3))
              AND ($4::loan_status IS NULL OR status = $4)
            ORDER BY created_at DESC
            LIMIT $5 OFFSET $6
            "#,
        )
        .bind(user_id)
        .bind(as_borrower)
        .bind(as_lender)
        .bind(query.status)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db_pool)
        .await?;

        let (total,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM loans
            WHERE ((borrower_id = $1 AND $2) OR (lender_id = $1 AND $3))
              AND ($4::loan_status IS NULL OR status = $4)
            "#,
        )
        .bind(user_id)
        .bind(as_borrower)
        .bind(as_lender)
        .bind(query.status)
        .fetch_one(&self.db_pool)
        .await?;

        Ok(PaginatedResponse {
            data: loans,
            total,
            page,
            limit,
        })
    }

    /// Redacted view of the pending loan behind an invite link
    pub async fn view_invite(&self, token: &str) -> Result<InviteSummary, ApiError> {
        let loan = self.find_by_invite(token).await?;

        let borrower_name: Option<(Option<String>,)> =
            sqlx::query_as("SELECT full_name FROM users WHERE id = $1")
                .bind(loan.borrower_id)
                .fetch_optional(&self.db_pool)
                .await?;

        Ok(InviteSummary {
            loan_id: loan.id,
            borrower_name: borrower_name.and_then(|(name,)| name),
            amount: loan.amount,
            currency: loan.currency,
            purpose: loan.purpose,
            term_months: loan.term_months,
            expires_at: loan.invite_expires_at,
        })
    }

    /// Accept or decline a pending loan. Accepting through an invite binds
    /// the caller as lender and consumes the token.
    pub async fn respond_to_loan(
        &self,
        lender_id: Uuid,
        loan_ref: LoanRef,
        request: RespondRequest,
    ) -> Result<Loan, ApiError> {
        let loan = match &loan_ref {
            LoanRef::Id(id) => {
                let loan = self.find(*id).await?;
                if loan.lender_id != Some(lender_id) {
                    return Err(ApiError::Forbidden(
                        "Only the addressed lender can respond to this loan".to_string(),
                    ));
                }
                loan
            }
            LoanRef::InviteToken(token) => {
                let loan = self.find_by_invite(token).await?;
                if loan.borrower_id == lender_id {
                    return Err(ApiError::Forbidden(
                        "You cannot respond to your own loan".to_string(),
                    ));
                }
                loan
            }
        };

        if loan.status != LoanStatus::Pending {
            return Err(ApiError::Conflict("Loan is no longer pending".to_string()));
        }

        let updated = match request.action {
            LoanDecision::Decline => {
                sqlx::query_as::<_, Loan>(
                    r#"
                    UPDATE loans
                    SET status = $1, invite_token_hash = NULL, updated_at = $2
                    WHERE id = $3 AND status = $4
                    RETURNING *
                    "#,
                )
                .bind(LoanStatus::Declined)
                .bind(Utc::now())
                .bind(loan.id)
                .bind(LoanStatus::Pending)
                .fetch_optional(&self.db_pool)
                .await?
            }
            LoanDecision::Accept => {
                let rate = self.acceptance_rate(&loan, lender_id, request.interest_rate).await?;
                let now = Utc::now();

                sqlx::query_as::<_, Loan>(
                    r#"
                    UPDATE loans
                    SET status = $1, lender_id = $2, interest_rate = $3, accepted_at = $4,
                        invite_token_hash = NULL, updated_at = $4
                    WHERE id = $5 AND status = $6
                    RETURNING *
                    "#,
                )
                .bind(LoanStatus::Accepted)
                .bind(lender_id)
                .bind(rate)
                .bind(now)
                .bind(loan.id)
                .bind(LoanStatus::Pending)
                .fetch_optional(&self.db_pool)
                .await?
            }
        }
        .ok_or_else(|| ApiError::Conflict("Loan is no longer pending".to_string()))?;

        tracing::info!(
            loan_id = %updated.id,
            lender_id = %lender_id,
            status = ?updated.status,
            "Lender responded to loan"
        );

        let (kind, title, body) = match request.action {
            LoanDecision::Accept => (
                NotificationKind::LoanAccepted,
                "Loan accepted",
                "Your loan request was accepted. Funds will follow once the lender disburses.",
            ),
            LoanDecision::Decline => (
                NotificationKind::LoanDeclined,
                "Loan declined",
                "Your loan request was declined.",
            ),
        };
        self.notifications
            .notify(NewNotification::new(updated.borrower_id, kind, title, body).for_loan(updated.id))
            .await;

        Ok(updated)
    }

    /// Disburse an accepted loan and write its repayment schedule
    pub async fn fund_loan(&self, lender_id: Uuid, loan_id: Uuid) -> Result<FundedLoan, ApiError> {
        let loan = self.find_as_lender(lender_id, loan_id).await?;

        if loan.status != LoanStatus::Accepted {
            return Err(ApiError::Conflict(
                "Only accepted loans can be funded".to_string(),
            ));
        }

        let rate = loan.interest_rate.ok_or_else(|| {
            ApiError::InternalError(format!("Accepted loan {} has no interest rate", loan.id))
        })?;

        let now = Utc::now();
        let installments = build_schedule(loan.amount, rate, loan.term_months, now.date_naive())
            .map_err(|e| ApiError::BadRequest(e.to_string()))?;

        let mut tx = self.db_pool.begin().await?;

        let funded = sqlx::query_as::<_, Loan>(
            r#"
            UPDATE loans
            SET status = $1, funded_at = $2, updated_at = $2
            WHERE id = $3 AND status = $4
            RETURNING *
            "#,
        )
        .bind(LoanStatus::Active)
        .bind(now)
        .bind(loan.id)
        .bind(LoanStatus::Accepted)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| ApiError::Conflict("Only accepted loans can be funded".to_string()))?;

        let mut schedule = Vec::with_capacity(installments.len());
        for installment in installments {
            let payment = sqlx::query_as::<_, Payment>(
                r#"
                INSERT INTO payments (
                    loan_id, installment_number, amount, due_date, status, retry_count,
                    created_at, updated_at
                )
                VALUES ($1, $2, $3, $4, 'scheduled', 0, $5, $5)
                RETURNING *
                "#,
            )
            .bind(funded.id)
            .bind(installment.installment_number)
            .bind(installment.amount)
            .bind(installment.due_date)
            .bind(now)
            .fetch_one(&mut *tx)
            .await?;

            schedule.push(payment);
        }

        tx.commit().await?;

        tracing::info!(
            loan_id = %funded.id,
            lender_id = %lender_id,
            installments = schedule.len(),
            "Loan funded"
        );

        self.notifications
            .notify(
                NewNotification::new(
                    funded.borrower_id,
                    NotificationKind::LoanFunded,
                    "Loan funded",
                    format!(
                        "Your loan of {:.2} {} is funded. The first installment is due on {}.",
                        funded.amount,
                        funded.currency,
                        schedule
                            .first()
                            .map(|p| p.due_date.to_string())
                            .unwrap_or_default()
                    ),
                )
                .for_loan(funded.id),
            )
            .await;

        Ok(FundedLoan {
            loan: funded,
            schedule,
        })
    }

    /// Lender marks an active loan as defaulted once an installment has
    /// exhausted its retries
    pub async fn mark_defaulted(&self, lender_id: Uuid, loan_id: Uuid) -> Result<Loan, ApiError> {
        let loan = self.find_as_lender(lender_id, loan_id).await?;

        if loan.status != LoanStatus::Active {
            return Err(ApiError::Conflict(
                "Only active loans can be marked as defaulted".to_string(),
            ));
        }

        let (exhausted,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM payments
            WHERE loan_id = $1 AND status = 'failed' AND retry_count >= $2
            "#,
        )
        .bind(loan.id)
        .bind(MAX_PAYMENT_RETRIES)
        .fetch_one(&self.db_pool)
        .await?;

        if exhausted == 0 {
            return Err(ApiError::Conflict(format!(
                "No installment has failed {} times",
                MAX_PAYMENT_RETRIES
            )));
        }

        let defaulted = sqlx::query_as::<_, Loan>(
            r#"
            UPDATE loans
            SET status = $1, updated_at = $2
            WHERE id = $3 AND status = $4
            RETURNING *
            "#,
        )
        .bind(LoanStatus::Defaulted)
        .bind(Utc::now())
        .bind(loan.id)
        .bind(LoanStatus::Active)
        .fetch_optional(&self.db_pool)
        .await?
        .ok_or_else(|| {
            ApiError::Conflict("Only active loans can be marked as defaulted".to_string())
        })?;

        tracing::warn!(loan_id = %defaulted.id, lender_id = %lender_id, "Loan marked as defaulted");

        self.notifications
            .notify(
                NewNotification::new(
                    defaulted.borrower_id,
                    NotificationKind::LoanDefaulted,
                    "Loan in default",
                    "Your lender marked this loan as defaulted after repeated failed payments.",
                )
                .for_loan(defaulted.id),
            )
            .await;

        Ok(defaulted)
    }

    /// Rate for an acceptance: the lender's explicit rate, else the rate of
    /// their policy at the borrower's tier
    async fn acceptance_rate(
        &self,
        loan: &Loan,
        lender_id: Uuid,
        requested: Option<f64>,
    ) -> Result<f64, ApiError> {
        let rate = match requested {
            Some(rate) => rate,
            None => {
                let tier = self.trust.get_tier(loan.borrower_id).await?.tier;
                self.policies
                    .policy_for(lender_id, tier)
                    .await?
                    .map(|p| p.interest_rate)
                    .ok_or_else(|| {
                        ApiError::BadRequest(
                            "interest_rate is required to accept this loan".to_string(),
                        )
                    })?
            }
        };

        if !rate.is_finite() || !(MIN_INTEREST_RATE..=MAX_INTEREST_RATE).contains(&rate) {
            return Err(ApiError::ValidationError(format!(
                "interest_rate must be within [{}, {}]",
                MIN_INTEREST_RATE, MAX_INTEREST_RATE
            )));
        }

        Ok(rate)
    }

    async fn find(&self, loan_id: Uuid) -> Result<Loan, ApiError> {
        sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = $1")
            .bind(loan_id)
            .fetch_optional(&self.db_pool)
            .await?
            .ok_or_else(|| ApiError::NotFound("Loan not found".to_string()))
    }

    async fn find_as_lender(&self, lender_id: Uuid, loan_id: Uuid) -> Result<Loan, ApiError> {
        let loan = self.find(loan_id).await?;
        if loan.lender_id != Some(lender_id) {
            return Err(ApiError::Forbidden(
                "Only the lender can perform this action".to_string(),
            ));
        }
        Ok(loan)
    }

    async fn find_by_invite(&self, token: &str) -> Result<Loan, ApiError> {
        sqlx::query_as::<_, Loan>(
            r#"
            SELECT * FROM loans
            WHERE invite_token_hash = $1 AND status = $2 AND invite_expires_at > $3
            "#,
        )
        .bind(hash_invite_token(token))
        .bind(LoanStatus::Pending)
        .bind(Utc::now())
        .fetch_optional(&self.db_pool)
        .await?
        .ok_or_else(|| ApiError::NotFound("Invite not found or expired".to_string()))
    }
}
