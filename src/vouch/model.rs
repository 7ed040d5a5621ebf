//! Vouch models

use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "vouch_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum VouchStatus {
    Active,
    Revoked,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Vouch {
    pub id: Uuid,
    pub voucher_id: Uuid,
    pub vouchee_id: Uuid,
    pub message: Option<String>,
    pub status: VouchStatus,
    pub created_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateVouchRequest {
    pub vouchee_id: Uuid,
    #[validate(length(max = 500))]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_length_limit() {
        let req = CreateVouchRequest {
            vouchee_id: Uuid::new_v4(),
            message: Some("x".repeat(501)),
        };
        assert!(req.validate().is_err());

        let req = CreateVouchRequest {
            vouchee_id: Uuid::new_v4(),
            message: Some("Known them for ten years".to_string()),
        };
        assert!(req.validate().is_ok());
    }
}
