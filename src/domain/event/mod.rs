//! Event domain - capacity, registration, waitlist, payment, check-in.
//!
//! The [`Event`] aggregate is the single consistency boundary: every
//! registration decision is a mutation of one aggregate followed by one
//! versioned commit.

mod aggregate;
mod attendee;
mod errors;
mod events;
mod intent;
mod status;
mod token;
mod waitlist;

pub use aggregate::{AdmitOutcome, Event, ReleaseOutcome};
pub use attendee::AttendeeRecord;
pub use errors::RegistrationError;
pub use events::RegistrationEvent;
pub use intent::{IntentState, PaymentIntentRecord};
pub use status::{EventStatus, PaymentStatus};
pub use token::{generate_token_value, CheckInPayload, CheckInToken};
pub use waitlist::WaitlistEntry;
