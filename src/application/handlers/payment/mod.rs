//! Payment handlers.

mod confirm;
mod create_intent;
mod refund;

pub use confirm::{ConfirmPaymentCommand, ConfirmPaymentHandler, ConfirmPaymentResult};
pub use create_intent::{
    CreatePaymentIntentCommand, CreatePaymentIntentHandler, CreatePaymentIntentResult,
};
pub use refund::{RefundPaymentCommand, RefundPaymentHandler, RefundPaymentResult};
