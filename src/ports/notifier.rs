//! Notification dispatcher port.
//!
//! Attendee-facing notifications (confirmations, waitlist offers, refunds).
//! Delivery is best-effort: handlers log failures but never roll back a
//! committed state change because an email bounced.

use crate::domain::foundation::{DomainError, EventId, Timestamp, UserId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Port for dispatching attendee notifications.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    /// Dispatch a single notification.
    async fn notify(&self, notification: Notification) -> Result<(), DomainError>;
}

/// One notification to one user about one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Recipient.
    pub user_id: UserId,

    /// Event concerned.
    pub event_id: EventId,

    /// What to tell them.
    pub kind: NotificationKind,
}

impl Notification {
    pub fn new(user_id: UserId, event_id: EventId, kind: NotificationKind) -> Self {
        Self {
            user_id,
            event_id,
            kind,
        }
    }
}

/// Notification categories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum NotificationKind {
    /// Registration is confirmed and a slot is held.
    RegistrationConfirmed,

    /// Registration was cancelled.
    RegistrationCancelled,

    /// A slot freed up; the user may claim it until `expires_at`.
    WaitlistOffer { expires_at: Timestamp },

    /// Payment received for a ticket.
    PaymentReceipt { reference: String },

    /// Refund issued for a ticket.
    RefundIssued { reference: String },

    /// Payment succeeded but the event was full; a refund is on its way.
    RefundPending { reference: String },
}
