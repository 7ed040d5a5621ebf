//! Business logic services for user accounts and the waitlist

mod user;
mod waitlist;

pub use user::UserService;
pub use waitlist::{JoinWaitlistRequest, WaitlistInterest, WaitlistService};
