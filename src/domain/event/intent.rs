//! Payment intent record - local mirror of a gateway payment intent.
//!
//! Embedded in the Event aggregate so that intent idempotency by
//! (event, user) survives restarts and requires no extra storage.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{Timestamp, UserId};

/// Local state of a payment intent.
///
/// State machine per (event, user):
/// `Created → {Succeeded, Failed}`, `Succeeded → Refunded`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentState {
    /// Intent registered with the gateway, payment not yet confirmed.
    Created,

    /// Gateway confirmed the payment.
    Succeeded,

    /// Payment failed or expired at the gateway.
    Failed,

    /// Payment was refunded after succeeding.
    Refunded,
}

impl IntentState {
    /// Whether a new intent for the same (event, user) would be a duplicate.
    ///
    /// Created and Succeeded intents are returned as-is instead of creating
    /// a second one; Failed and Refunded intents may be superseded.
    pub fn is_open(&self) -> bool {
        matches!(self, IntentState::Created | IntentState::Succeeded)
    }
}

/// Record of one payment intent for one (event, user) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntentRecord {
    /// Paying user.
    pub user_id: UserId,

    /// Opaque gateway reference (e.g. "pi_...").
    pub reference: String,

    /// Client-usable secret for completing the payment.
    pub client_secret: String,

    /// Amount in minor currency units.
    pub amount_minor: i64,

    /// ISO 4217 currency code.
    pub currency: String,

    /// Local intent state.
    pub state: IntentState,

    /// Set when the gateway confirmed a payment the event had no slot for.
    /// A flagged intent must be refunded, automatically or by an operator.
    pub refund_due: bool,

    /// When the intent was created locally.
    pub created_at: Timestamp,

    /// When the intent was last updated locally.
    pub updated_at: Timestamp,
}

impl PaymentIntentRecord {
    /// Creates a freshly-registered intent record.
    pub fn new(
        user_id: UserId,
        reference: String,
        client_secret: String,
        amount_minor: i64,
        currency: String,
        created_at: Timestamp,
    ) -> Self {
        Self {
            user_id,
            reference,
            client_secret,
            amount_minor,
            currency,
            state: IntentState::Created,
            refund_due: false,
            created_at,
            updated_at: created_at,
        }
    }

    /// Marks the intent succeeded. Idempotent.
    pub fn mark_succeeded(&mut self, at: Timestamp) {
        if self.state == IntentState::Created {
            self.state = IntentState::Succeeded;
            self.updated_at = at;
        }
    }

    /// Marks the intent failed.
    pub fn mark_failed(&mut self, at: Timestamp) {
        if self.state == IntentState::Created {
            self.state = IntentState::Failed;
            self.updated_at = at;
        }
    }

    /// Marks the intent refunded and clears any refund flag.
    pub fn mark_refunded(&mut self, at: Timestamp) {
        self.state = IntentState::Refunded;
        self.refund_due = false;
        self.updated_at = at;
    }

    /// Flags a succeeded payment that could not be seated for refund.
    pub fn flag_refund_due(&mut self, at: Timestamp) {
        self.refund_due = true;
        self.updated_at = at;
    }
}
