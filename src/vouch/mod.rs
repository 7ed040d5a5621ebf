//! Vouch domain module
//!
//! A vouch is a reputation endorsement from one user to another, carrying
//! no financial liability. Active vouches drive the vouchee's trust tier.

mod model;
mod service;

pub use model::*;
pub use service::VouchService;
