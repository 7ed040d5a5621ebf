//! Lender tier policy module
//!
//! Each lender keeps at most one policy row per trust tier: the rate they
//! charge and the largest loan they will make to borrowers at that tier.

mod model;
mod service;

pub use model::*;
pub use service::{validate_policy_batch, PolicyService};
