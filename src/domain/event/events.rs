//! Registration domain events.
//!
//! Events emitted during the registration lifecycle. These events are used for:
//! - Audit logging (all state transitions)
//! - Attendee notifications (confirmations, waitlist offers, refunds)
//! - Downstream integration (badge printing, analytics)
//!
//! # Event Naming Convention
//!
//! Events are named in past tense to indicate something that has already happened:
//! - `RegistrationConfirmed` not `ConfirmRegistration`
//! - `PaymentRefunded` not `RefundPayment`

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{DomainEvent, DomainEventId, EventId, Timestamp, UserId};

/// Events that occur during the registration lifecycle of an event.
///
/// Every variant carries `id`, a unique occurrence identifier used for
/// deduplication by consumers, and `event_id`, the aggregate the change
/// happened on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistrationEvent {
    /// A new bookable event was created.
    Created {
        id: DomainEventId,
        event_id: EventId,
        title: String,
        capacity: u32,
        is_paid: bool,
        occurred_at: Timestamp,
    },

    /// A registration became active and occupies a capacity slot.
    ///
    /// Emitted on the free path at registration time, and on the paid path
    /// at payment confirmation.
    RegistrationConfirmed {
        id: DomainEventId,
        event_id: EventId,
        user_id: UserId,
        payment_reference: Option<String>,
        occurred_at: Timestamp,
    },

    /// An active registration was cancelled and its slot released.
    RegistrationCancelled {
        id: DomainEventId,
        event_id: EventId,
        user_id: UserId,
        occurred_at: Timestamp,
    },

    /// A user joined the waitlist of a full event.
    WaitlistJoined {
        id: DomainEventId,
        event_id: EventId,
        user_id: UserId,
        /// 1-based queue position at join time.
        position: u32,
        occurred_at: Timestamp,
    },

    /// A user left the waitlist voluntarily.
    WaitlistLeft {
        id: DomainEventId,
        event_id: EventId,
        user_id: UserId,
        occurred_at: Timestamp,
    },

    /// A freed slot was offered to the head of the waitlist.
    ///
    /// The offer expires at `expires_at`; an expired offer requeues the
    /// entry to the back of the waitlist.
    WaitlistOfferExtended {
        id: DomainEventId,
        event_id: EventId,
        user_id: UserId,
        expires_at: Timestamp,
        occurred_at: Timestamp,
    },

    /// A payment intent was registered with the gateway.
    PaymentIntentCreated {
        id: DomainEventId,
        event_id: EventId,
        user_id: UserId,
        reference: String,
        amount_minor: i64,
        currency: String,
        occurred_at: Timestamp,
    },

    /// The gateway confirmed a payment and the registration was seated.
    PaymentConfirmed {
        id: DomainEventId,
        event_id: EventId,
        user_id: UserId,
        reference: String,
        occurred_at: Timestamp,
    },

    /// A payment succeeded but no slot was available at confirmation time.
    ///
    /// The intent is durably flagged; an automatic or operator-driven
    /// refund must follow.
    PaymentFlaggedForRefund {
        id: DomainEventId,
        event_id: EventId,
        user_id: UserId,
        reference: String,
        occurred_at: Timestamp,
    },

    /// A completed payment was refunded and the registration released.
    PaymentRefunded {
        id: DomainEventId,
        event_id: EventId,
        user_id: UserId,
        reference: String,
        occurred_at: Timestamp,
    },

    /// An attendee checked in at the door.
    CheckInCompleted {
        id: DomainEventId,
        event_id: EventId,
        user_id: UserId,
        occurred_at: Timestamp,
    },
}

impl RegistrationEvent {
    /// Returns the event ID of the aggregate this event belongs to.
    pub fn event_id(&self) -> EventId {
        match self {
            RegistrationEvent::Created { event_id, .. }
            | RegistrationEvent::RegistrationConfirmed { event_id, .. }
            | RegistrationEvent::RegistrationCancelled { event_id, .. }
            | RegistrationEvent::WaitlistJoined { event_id, .. }
            | RegistrationEvent::WaitlistLeft { event_id, .. }
            | RegistrationEvent::WaitlistOfferExtended { event_id, .. }
            | RegistrationEvent::PaymentIntentCreated { event_id, .. }
            | RegistrationEvent::PaymentConfirmed { event_id, .. }
            | RegistrationEvent::PaymentFlaggedForRefund { event_id, .. }
            | RegistrationEvent::PaymentRefunded { event_id, .. }
            | RegistrationEvent::CheckInCompleted { event_id, .. } => *event_id,
        }
    }

    /// Returns the user this event concerns, if any.
    ///
    /// `Created` is the only event not tied to a user.
    pub fn user_id(&self) -> Option<&UserId> {
        match self {
            RegistrationEvent::Created { .. } => None,
            RegistrationEvent::RegistrationConfirmed { user_id, .. }
            | RegistrationEvent::RegistrationCancelled { user_id, .. }
            | RegistrationEvent::WaitlistJoined { user_id, .. }
            | RegistrationEvent::WaitlistLeft { user_id, .. }
            | RegistrationEvent::WaitlistOfferExtended { user_id, .. }
            | RegistrationEvent::PaymentIntentCreated { user_id, .. }
            | RegistrationEvent::PaymentConfirmed { user_id, .. }
            | RegistrationEvent::PaymentFlaggedForRefund { user_id, .. }
            | RegistrationEvent::PaymentRefunded { user_id, .. }
            | RegistrationEvent::CheckInCompleted { user_id, .. } => Some(user_id),
        }
    }
}

impl DomainEvent for RegistrationEvent {
    fn event_type(&self) -> &'static str {
        match self {
            RegistrationEvent::Created { .. } => "event.created.v1",
            RegistrationEvent::RegistrationConfirmed { .. } => "registration.confirmed.v1",
            RegistrationEvent::RegistrationCancelled { .. } => "registration.cancelled.v1",
            RegistrationEvent::WaitlistJoined { .. } => "waitlist.joined.v1",
            RegistrationEvent::WaitlistLeft { .. } => "waitlist.left.v1",
            RegistrationEvent::WaitlistOfferExtended { .. } => "waitlist.offer_extended.v1",
            RegistrationEvent::PaymentIntentCreated { .. } => "payment.intent_created.v1",
            RegistrationEvent::PaymentConfirmed { .. } => "payment.confirmed.v1",
            RegistrationEvent::PaymentFlaggedForRefund { .. } => "payment.flagged_for_refund.v1",
            RegistrationEvent::PaymentRefunded { .. } => "payment.refunded.v1",
            RegistrationEvent::CheckInCompleted { .. } => "checkin.completed.v1",
        }
    }

    fn aggregate_id(&self) -> String {
        self.event_id().to_string()
    }

    fn aggregate_type(&self) -> &'static str {
        "Event"
    }

    fn occurred_at(&self) -> Timestamp {
        match self {
            RegistrationEvent::Created { occurred_at, .. }
            | RegistrationEvent::RegistrationConfirmed { occurred_at, .. }
            | RegistrationEvent::RegistrationCancelled { occurred_at, .. }
            | RegistrationEvent::WaitlistJoined { occurred_at, .. }
            | RegistrationEvent::WaitlistLeft { occurred_at, .. }
            | RegistrationEvent::WaitlistOfferExtended { occurred_at, .. }
            | RegistrationEvent::PaymentIntentCreated { occurred_at, .. }
            | RegistrationEvent::PaymentConfirmed { occurred_at, .. }
            | RegistrationEvent::PaymentFlaggedForRefund { occurred_at, .. }
            | RegistrationEvent::PaymentRefunded { occurred_at, .. }
            | RegistrationEvent::CheckInCompleted { occurred_at, .. } => *occurred_at,
        }
    }

    fn event_id(&self) -> DomainEventId {
        match self {
            RegistrationEvent::Created { id, .. }
            | RegistrationEvent::RegistrationConfirmed { id, .. }
            | RegistrationEvent::RegistrationCancelled { id, .. }
            | RegistrationEvent::WaitlistJoined { id, .. }
            | RegistrationEvent::WaitlistLeft { id, .. }
            | RegistrationEvent::WaitlistOfferExtended { id, .. }
            | RegistrationEvent::PaymentIntentCreated { id, .. }
            | RegistrationEvent::PaymentConfirmed { id, .. }
            | RegistrationEvent::PaymentFlaggedForRefund { id, .. }
            | RegistrationEvent::PaymentRefunded { id, .. }
            | RegistrationEvent::CheckInCompleted { id, .. } => id.clone(),
        }
    }
}
