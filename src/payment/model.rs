//! Payment models

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;
use validator::Validate;

use crate::loan::LoanStatus;

/// Failed attempts after which an installment is shown as defaulting
pub const MAX_PAYMENT_RETRIES: i32 = 3;

#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "payment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Scheduled,
    Processing,
    Completed,
    Failed,
}

/// One installment of a loan's repayment schedule
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Payment {
    pub id: Uuid,
    pub loan_id: Uuid,
    pub installment_number: i32,
    pub amount: f64,
    pub due_date: NaiveDate,
    pub status: PaymentStatus,
    pub retry_count: i32,
    pub confirmation_reference: Option<String>,
    pub confirmation_method: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub last_failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// How an installment is presented on dashboards
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DisplayState {
    Upcoming,
    Overdue,
    Processing,
    Paid,
    RetryPending,
    Defaulting,
}

impl Payment {
    pub fn display_state(&self, today: NaiveDate) -> DisplayState {
        match self.status {
            PaymentStatus::Completed => DisplayState::Paid,
            PaymentStatus::Failed if self.reached_retry_limit() => DisplayState::Defaulting,
            PaymentStatus::Failed => DisplayState::RetryPending,
            PaymentStatus::Processing => DisplayState::Processing,
            PaymentStatus::Scheduled if self.due_date < today => DisplayState::Overdue,
            PaymentStatus::Scheduled => DisplayState::Upcoming,
        }
    }

    pub fn reached_retry_limit(&self) -> bool {
        self.retry_count >= MAX_PAYMENT_RETRIES
    }
}

#[derive(Debug, Serialize, Clone)]
pub struct PaymentView {
    #[serde(flatten)]
    pub payment: Payment,
    pub display_state: DisplayState,
}

impl PaymentView {
    pub fn new(payment: Payment, today: NaiveDate) -> Self {
        let display_state = payment.display_state(today);
        Self {
            payment,
            display_state,
        }
    }
}

/// Borrower's confirmation that an installment was paid
#[derive(Debug, Deserialize, Validate)]
pub struct ConfirmPaymentRequest {
    #[validate(length(min = 1, max = 50))]
    pub method: String,
    #[validate(length(min = 1, max = 200))]
    pub reference: String,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentOutcome {
    Succeeded,
    Failed,
}

/// Payment provider webhook body
#[derive(Debug, Deserialize)]
pub struct PaymentWebhookPayload {
    pub payment_id: Uuid,
    pub outcome: PaymentOutcome,
    pub reference: Option<String>,
    pub reason: Option<String>,
}

/// Installment joined with the parties of its loan
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct PaymentContext {
    pub id: Uuid,
    pub loan_id: Uuid,
    pub status: PaymentStatus,
    pub borrower_id: Uuid,
    pub lender_id: Option<Uuid>,
    pub loan_status: LoanStatus,
}
