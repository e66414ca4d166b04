//! CancelRegistrationHandler - Command handler for cancelling a registration.

use std::sync::Arc;

use tracing::warn;

use crate::application::handlers::MAX_UPDATE_ATTEMPTS;
use crate::domain::event::{RegistrationError, RegistrationEvent, ReleaseOutcome};
use crate::domain::foundation::{
    DomainEventId, ErrorCode, EventId, SerializableDomainEvent, Timestamp, UserId,
};
use crate::ports::{
    EventPublisher, EventRepository, Notification, NotificationDispatcher, NotificationKind,
};

/// Command to cancel an active registration.
#[derive(Debug, Clone)]
pub struct CancelRegistrationCommand {
    pub event_id: EventId,
    pub user_id: UserId,
}

/// Result of a successful cancellation.
#[derive(Debug, Clone)]
pub struct CancelRegistrationResult {
    /// Waitlisted users who received a promotion offer for the freed slot.
    pub offered: Vec<UserId>,
}

/// Handler for registration cancellation.
///
/// Releasing the slot and extending the promotion offer happen in the same
/// aggregate commit, so a freed slot can never be double-granted.
pub struct CancelRegistrationHandler {
    repository: Arc<dyn EventRepository>,
    event_publisher: Arc<dyn EventPublisher>,
    notifier: Arc<dyn NotificationDispatcher>,
    offer_window_hours: i64,
}

impl CancelRegistrationHandler {
    pub fn new(
        repository: Arc<dyn EventRepository>,
        event_publisher: Arc<dyn EventPublisher>,
        notifier: Arc<dyn NotificationDispatcher>,
        offer_window_hours: i64,
    ) -> Self {
        Self {
            repository,
            event_publisher,
            notifier,
            offer_window_hours,
        }
    }

    pub async fn handle(
        &self,
        cmd: CancelRegistrationCommand,
    ) -> Result<CancelRegistrationResult, RegistrationError> {
        // 1. Release the slot and extend an offer in one commit
        let mut attempts = 0;
        let (offered, offer_issued_at) = loop {
            attempts += 1;

            let mut event = self
                .repository
                .find_by_id(&cmd.event_id)
                .await?
                .ok_or(RegistrationError::EventNotFound(cmd.event_id))?;

            let now = Timestamp::now();
            match event.release(&cmd.user_id, now) {
                ReleaseOutcome::Released => {}
                ReleaseOutcome::NotRegistered => {
                    return Err(RegistrationError::not_registered(cmd.user_id))
                }
            }

            let offered = event.extend_offers(1, now, self.offer_window_hours);

            match self.repository.update(&event).await {
                Ok(()) => break (offered, now),
                Err(e) if e.code == ErrorCode::VersionConflict && attempts < MAX_UPDATE_ATTEMPTS => {
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
        };

        // 2. Publish and notify after the commit
        let mut envelopes = vec![RegistrationEvent::RegistrationCancelled {
            id: DomainEventId::new(),
            event_id: cmd.event_id,
            user_id: cmd.user_id.clone(),
            occurred_at: offer_issued_at,
        }
        .to_envelope()];

        let expires_at = offer_issued_at.add_hours(self.offer_window_hours);
        for offeree in &offered {
            envelopes.push(
                RegistrationEvent::WaitlistOfferExtended {
                    id: DomainEventId::new(),
                    event_id: cmd.event_id,
                    user_id: offeree.clone(),
                    expires_at,
                    occurred_at: offer_issued_at,
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
                NotificationKind::RegistrationCancelled,
            ))
            .await
        {
            warn!(user_id = %cmd.user_id, event_id = %cmd.event_id, error = %e,
                "cancellation notification failed");
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

        Ok(CancelRegistrationResult { offered })
    }
}
