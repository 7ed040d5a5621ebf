//! Trust domain module
//!
//! Trust tiers derived from vouch counts, the lender matcher that uses
//! them, and the vouch eligibility gate.

pub mod eligibility;
pub mod matcher;
pub mod model;
mod service;
pub mod store;

pub use eligibility::evaluate_vouch_eligibility;
pub use matcher::{rank_policies, summarize_matches};
pub use model::*;
pub use service::TrustService;
pub use store::{PgTrustStore, TrustStore};
