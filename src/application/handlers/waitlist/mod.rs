//! Waitlist handlers.

mod join;
mod leave;
mod promote;

pub use join::{JoinWaitlistCommand, JoinWaitlistHandler, JoinWaitlistResult};
pub use leave::{LeaveWaitlistCommand, LeaveWaitlistHandler};
pub use promote::{PromoteWaitlistCommand, PromoteWaitlistHandler, PromoteWaitlistResult};
