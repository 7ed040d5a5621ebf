//! API handlers for the lending backend

pub mod admin;
mod extract;
pub mod guest;
pub mod loan;
pub mod notification;
pub mod payment;
pub mod policy;
pub mod system;
pub mod trust;
pub mod user;
pub mod vouch;
pub mod waitlist;

pub use admin::*;
pub use extract::{ApiJson, ApiPath, ApiQuery};
pub use guest::guest_flow_gone;
pub use loan::*;
pub use notification::*;
pub use payment::*;
pub use policy::*;
pub use system::{health_check, root};
pub use trust::*;
pub use user::*;
pub use vouch::*;
pub use waitlist::join_waitlist;

// Re-export the auth extractors for handler use
pub use crate::middleware::{AdminUser, AuthenticatedUser};
