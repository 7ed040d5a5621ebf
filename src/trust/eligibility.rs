//! Vouch eligibility gate

use crate::models::VerificationStatus;

use super::model::{UserTrustRecord, VouchEligibility};

pub const REASON_USER_NOT_FOUND: &str = "User not found";
pub const REASON_BLOCKED: &str = "Account is blocked";
pub const REASON_NOT_VERIFIED: &str = "Identity verification required";

/// Missing, blocked or unverified users may not vouch for others.
pub fn evaluate_vouch_eligibility(user: Option<&UserTrustRecord>) -> VouchEligibility {
    let Some(user) = user else {
        return VouchEligibility::ineligible(REASON_USER_NOT_FOUND);
    };

    if user.is_blocked {
        return VouchEligibility::ineligible(REASON_BLOCKED);
    }

    if user.verification_status != VerificationStatus::Verified {
        return VouchEligibility::ineligible(REASON_NOT_VERIFIED);
    }

    VouchEligibility::eligible()
}
