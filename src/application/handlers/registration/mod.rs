//! Registration lifecycle handlers.

mod cancel;
mod register;

pub use cancel::{CancelRegistrationCommand, CancelRegistrationHandler, CancelRegistrationResult};
pub use register::{RegisterCommand, RegisterHandler, RegisterOutcome};
