//! Notification domain module
//!
//! In-app notifications persisted per user, with an optional email relay.

mod mailer;
mod model;
mod service;

pub use mailer::{EmailMessage, Mailer};
pub use model::*;
pub use service::NotificationService;
