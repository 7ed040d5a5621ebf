//! Loan domain module
//!
//! Loan requests, invite links for personal lenders, and the
//! pending → accepted → active → completed/defaulted lifecycle.

mod invite;
mod model;
mod service;

pub use invite::{generate_invite_token, hash_invite_token};
pub use model::*;
pub use service::{LoanRef, LoanService};
