//! RefundPaymentHandler - Command handler for refunding a completed payment.

use std::sync::Arc;

use tracing::warn;

use crate::application::handlers::MAX_UPDATE_ATTEMPTS;
use crate::domain::event::{PaymentStatus, RegistrationError, RegistrationEvent};
use crate::domain::foundation::{
    DomainEventId, ErrorCode, EventId, SerializableDomainEvent, Timestamp, UserId,
};
use crate::ports::{
    EventPublisher, EventRepository, Notification, NotificationDispatcher, NotificationKind,
    PaymentGateway,
};

/// Command to refund a paid registration.
#[derive(Debug, Clone)]
pub struct RefundPaymentCommand {
    pub event_id: EventId,
    pub user_id: UserId,
}

/// Result of a successful refund.
#[derive(Debug, Clone)]
pub struct RefundPaymentResult {
    /// Gateway reference of the refunded intent.
    pub reference: String,

    /// Gateway's refund ID.
    pub refund_id: String,

    /// Waitlisted users who received a promotion offer for the freed slot.
    pub offered: Vec<UserId>,
}

/// Handler for refunds.
///
/// Only completed payments are refundable. The gateway refund happens
/// first; the aggregate then releases the slot, marks the records, and
/// extends a promotion offer in one commit.
pub struct RefundPaymentHandler {
    repository: Arc<dyn EventRepository>,
    gateway: Arc<dyn PaymentGateway>,
    event_publisher: Arc<dyn EventPublisher>,
    notifier: Arc<dyn NotificationDispatcher>,
    offer_window_hours: i64,
}

impl RefundPaymentHandler {
    pub fn new(
        repository: Arc<dyn EventRepository>,
        gateway: Arc<dyn PaymentGateway>,
        event_publisher: Arc<dyn EventPublisher>,
        notifier: Arc<dyn NotificationDispatcher>,
        offer_window_hours: i64,
    ) -> Self {
        Self {
            repository,
            gateway,
            event_publisher,
            notifier,
            offer_window_hours,
        }
    }

    pub async fn handle(
        &self,
        cmd: RefundPaymentCommand,
    ) -> Result<RefundPaymentResult, RegistrationError> {
        // 1. Locate the completed payment
        let event = self
            .repository
            .find_by_id(&cmd.event_id)
            .await?
            .ok_or(RegistrationError::EventNotFound(cmd.event_id))?;

        let reference = event
            .active_attendee(&cmd.user_id)
            .filter(|a| a.payment_status == PaymentStatus::Completed)
            .and_then(|a| a.payment_reference.clone())
            .ok_or_else(|| RegistrationError::no_completed_payment(cmd.user_id.clone()))?;

        // 2. Refund at the gateway (outside the commit loop)
        let receipt = self.gateway.refund(&reference).await?;

        // 3. Release the slot, mark records, and extend an offer in one commit
        let mut attempts = 0;
        let (offered, refunded_at) = loop {
            attempts += 1;

            let mut event = self
                .repository
                .find_by_id(&cmd.event_id)
                .await?
                .ok_or(RegistrationError::EventNotFound(cmd.event_id))?;

            let now = Timestamp::now();
            if let Some(attendee) = event.active_attendee_mut(&cmd.user_id) {
                attendee.mark_refunded();
            }
            if let Some(record) = event.intent_by_reference_mut(&reference) {
                record.mark_refunded(now);
            }
            let offered = event.extend_offers(1, now, self.offer_window_hours);
            event.touch(now);

            match self.repository.update(&event).await {
                Ok(()) => break (offered, now),
                Err(e) if e.code == ErrorCode::VersionConflict && attempts < MAX_UPDATE_ATTEMPTS => {
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
        };

        // 4. Publish and notify after the commit
        let mut envelopes = vec![RegistrationEvent::PaymentRefunded {
            id: DomainEventId::new(),
            event_id: cmd.event_id,
            user_id: cmd.user_id.clone(),
            reference: reference.clone(),
            occurred_at: refunded_at,
        }
        .to_envelope()];

        let expires_at = refunded_at.add_hours(self.offer_window_hours);
        for offeree in &offered {
            envelopes.push(
                RegistrationEvent::WaitlistOfferExtended {
                    id: DomainEventId::new(),
                    event_id: cmd.event_id,
                    user_id: offeree.clone(),
                    expires_at,
                    occurred_at: refunded_at,
                }
                .to_envelope(),
            );
        }
        self.event_publisher.publish_all(envelopes).await?;

        if let Err(e) = self
            .notifier
            .notify(Notification::new(
                cmd.user_id.clone(),
                cmd.event_id,
                NotificationKind::RefundIssued {
                    reference: reference.clone(),
                },
            ))
            .await
        {
            warn!(user_id = %cmd.user_id, event_id = %cmd.event_id, error = %e,
                "refund notification failed");
        }
        for offeree in &offered {
            if let Err(e) = self
                .notifier
                .notify(Notification::new(
                    offeree.clone(),
                    cmd.event_id,
                    NotificationKind::WaitlistOffer { expires_at },
                ))
                .await
            {
                warn!(user_id = %offeree, event_id = %cmd.event_id, error = %e,
                    "waitlist offer notification failed");
            }
        }

        Ok(RefundPaymentResult {
            reference,
            refund_id: receipt.refund_id,
            offered,
        })
    }
}
