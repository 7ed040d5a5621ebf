//! Loan models

use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::PaginationParams;
use crate::payment::Payment;

pub const MAX_LOAN_AMOUNT: f64 = 1_000_000.0;

/// Loan status enum
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "loan_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum LoanStatus {
    Pending,
    Accepted,
    Declined,
    Active,
    Completed,
    Defaulted,
}

/// Loan model
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Loan {
    pub id: Uuid,
    pub borrower_id: Uuid,
    pub lender_id: Option<Uuid>,
    pub amount: f64,
    pub currency: String,
    pub purpose: String,
    pub term_months: i32,
    /// Annual percent, set on acceptance
    pub interest_rate: Option<f64>,
    pub status: LoanStatus,
    pub invite_email: Option<String>,
    #[serde(skip_serializing)]
    pub invite_token_hash: Option<String>,
    pub invite_expires_at: Option<DateTime<Utc>>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub funded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Loan {
    pub fn is_party(&self, user_id: Uuid) -> bool {
        self.borrower_id == user_id || self.lender_id == Some(user_id)
    }
}

fn validate_currency(currency: &str) -> Result<(), ValidationError> {
    if currency.len() == 3 && currency.chars().all(|c| c.is_ascii_uppercase()) {
        Ok(())
    } else {
        Err(ValidationError::new("currency"))
    }
}

/// Request to create a new loan
#[derive(Debug, Deserialize, Validate)]
pub struct CreateLoanRequest {
    /// Checked for `> 0` in `validate_amount`; range alone accepts zero
    #[validate(range(max = 1000000.0))]
    pub amount: f64,
    #[validate(custom = "validate_currency")]
    pub currency: String,
    #[validate(length(min = 3, max = 500))]
    pub purpose: String,
    #[validate(range(min = 1, max = 60))]
    pub term_months: i32,
    /// Direct request to a lender with a matching tier policy
    pub lender_id: Option<Uuid>,
    /// Personal lender invited by email
    #[validate(email)]
    pub invite_email: Option<String>,
}

impl CreateLoanRequest {
    /// Trims free-text fields so length limits apply to what is stored
    pub fn normalized(mut self) -> Self {
        self.purpose = self.purpose.trim().to_string();
        self.invite_email = self.invite_email.map(|e| e.trim().to_string());
        self
    }

    pub fn validate_amount(&self) -> Result<(), ValidationError> {
        if self.amount.is_finite() && self.amount > 0.0 && self.amount <= MAX_LOAN_AMOUNT {
            Ok(())
        } else {
            Err(ValidationError::new("amount"))
        }
    }
}

/// Created loan plus the raw invite token, which is never shown again
#[derive(Debug, Serialize)]
pub struct CreatedLoan {
    pub loan: Loan,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invite_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invite_url: Option<String>,
}

/// Funded loan with the repayment schedule written alongside it
#[derive(Debug, Serialize)]
pub struct FundedLoan {
    pub loan: Loan,
    pub schedule: Vec<Payment>,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LoanDecision {
    Accept,
    Decline,
}

/// Lender response to a pending loan
#[derive(Debug, Deserialize)]
pub struct RespondRequest {
    pub action: LoanDecision,
    pub interest_rate: Option<f64>,
}

/// Which side of a loan the caller is listing
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LoanRole {
    Borrower,
    Lender,
}

/// Query for listing loans
#[derive(Debug, Deserialize, Default)]
pub struct ListLoansQuery {
    pub role: Option<LoanRole>,
    pub status: Option<LoanStatus>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl ListLoansQuery {
    pub fn pagination(&self) -> PaginationParams {
        PaginationParams {
            page: self.page,
            limit: self.limit,
        }
    }
}

/// What an invite link reveals before the lender signs in
#[derive(Debug, Serialize)]
pub struct InviteSummary {
    pub loan_id: Uuid,
    pub borrower_name: Option<String>,
    pub amount: f64,
    pub currency: String,
    pub purpose: String,
    pub term_months: i32,
    pub expires_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CreateLoanRequest {
        CreateLoanRequest {
            amount: 500.0,
            currency: "USD".to_string(),
            purpose: "Inventory for market stall".to_string(),
            term_months: 6,
            lender_id: None,
            invite_email: None,
        }
    }

    #[test]
    fn test_valid_request() {
        assert!(request().validate().is_ok());
        assert!(request().validate_amount().is_ok());
    }

    #[test]
    fn test_amount_bounds() {
        let mut req = request();
        req.amount = 0.0;
        assert!(req.validate_amount().is_err());
        req.amount = -5.0;
        assert!(req.validate_amount().is_err());
        req.amount = f64::NAN;
        assert!(req.validate_amount().is_err());
        req.amount = MAX_LOAN_AMOUNT;
        assert!(req.validate_amount().is_ok());
        assert!(req.validate().is_ok());
        req.amount = MAX_LOAN_AMOUNT + 0.01;
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_currency_format() {
        let mut req = request();
        req.currency = "usd".to_string();
        assert!(req.validate().is_err());
        req.currency = "EURO".to_string();
        assert!(req.validate().is_err());
        req.currency = "KES".to_string();
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_term_and_purpose() {
        let mut req = request();
        req.term_months = 61;
        assert!(req.validate().is_err());
        req.term_months = 1;
        req.purpose = "ab".to_string();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_blank_purpose_rejected_after_trim() {
        let mut req = request();
        req.purpose = "     ".to_string();
        assert!(req.validate().is_ok());
        assert!(req.normalized().validate().is_err());

        let mut req = request();
        req.purpose = "  Seed stock  ".to_string();
        let req = req.normalized();
        assert_eq!(req.purpose, "Seed stock");
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_invite_hash_not_serialized() {
        let loan = Loan {
            id: Uuid::new_v4(),
            borrower_id: Uuid::new_v4(),
            lender_id: None,
            amount: 100.0,
            currency: "USD".to_string(),
            purpose: "School fees".to_string(),
            term_months: 3,
            interest_rate: None,
            status: LoanStatus::Pending,
            invite_email: Some("friend@example.com".to_string()),
            invite_token_hash: Some("deadbeef".to_string()),
            invite_expires_at: None,
            accepted_at: None,
            funded_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_value(&loan).unwrap();
        assert!(json.get("invite_token_hash").is_none());
        assert_eq!(json["status"], "pending");
        assert!(loan.is_party(loan.borrower_id));
        assert!(!loan.is_party(Uuid::new_v4()));
    }
}
