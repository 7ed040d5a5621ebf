//! Payment domain module
//!
//! Repayment schedules, confirmations and provider outcomes. Money moves
//! through external providers; this module only keeps the records.

mod model;
pub mod schedule;
mod service;

pub use model::*;
pub use schedule::{build_schedule, total_repayable, ScheduleError, ScheduledInstallment};
pub use service::PaymentService;
