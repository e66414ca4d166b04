//! PromoteWaitlistHandler - Periodic promotion pass over an event's waitlist.

use std::sync::Arc;

use tracing::{info, warn};

use crate::application::handlers::MAX_UPDATE_ATTEMPTS;
use crate::domain::event::{RegistrationError, RegistrationEvent};
use crate::domain::foundation::{
    DomainEventId, ErrorCode, EventId, SerializableDomainEvent, Timestamp, UserId,
};
use crate::ports::{
    EventPublisher, EventRepository, Notification, NotificationDispatcher, NotificationKind,
};

/// Command to run one promotion pass over an event.
#[derive(Debug, Clone)]
pub struct PromoteWaitlistCommand {
    pub event_id: EventId,
}

/// Result of a promotion pass.
#[derive(Debug, Clone)]
pub struct PromoteWaitlistResult {
    /// Users who received a new promotion offer, in queue order.
    pub offered: Vec<UserId>,
}

/// Handler for waitlist promotion.
///
/// Cancellation and refund extend offers inline for the slot they free;
/// this pass covers everything else: offers that expired and must requeue,
/// and capacity that freed up without an inline offer (e.g. more slots
/// freed than offers extended).
pub struct PromoteWaitlistHandler {
    repository: Arc<dyn EventRepository>,
    event_publisher: Arc<dyn EventPublisher>,
    notifier: Arc<dyn NotificationDispatcher>,
    offer_window_hours: i64,
}

impl PromoteWaitlistHandler {
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
        cmd: PromoteWaitlistCommand,
    ) -> Result<PromoteWaitlistResult, RegistrationError> {
        // 1. Extend offers for all currently free capacity
        let mut attempts = 0;
        let (offered, pass_at) = loop {
            attempts += 1;

            let mut event = self
                .repository
                .find_by_id(&cmd.event_id)
                .await?
                .ok_or(RegistrationError::EventNotFound(cmd.event_id))?;

            if !event.status.accepts_registrations() || event.waitlist.is_empty() {
                return Ok(PromoteWaitlistResult { offered: Vec::new() });
            }

            let now = Timestamp::now();
            let freed = event.capacity.saturating_sub(event.admitted_count());
            let offered = event.extend_offers(freed, now, self.offer_window_hours);
            if offered.is_empty() {
                return Ok(PromoteWaitlistResult { offered });
            }

            match self.repository.update(&event).await {
                Ok(()) => break (offered, now),
                Err(e) if e.code == ErrorCode::VersionConflict && attempts < MAX_UPDATE_ATTEMPTS => {
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
        };

        info!(event_id = %cmd.event_id, offers = offered.len(), "waitlist promotion pass");

        // 2. Publish and notify after the commit
        let expires_at = pass_at.add_hours(self.offer_window_hours);
        let envelopes = offered
            .iter()
            .map(|offeree| {
                RegistrationEvent::WaitlistOfferExtended {
                    id: DomainEventId::new(),
                    event_id: cmd.event_id,
                    user_id: offeree.clone(),
                    expires_at,
                    occurred_at: pass_at,
                }
                .to_envelope()
            })
            .collect();
        self.event_publisher.publish_all(envelopes).await?;

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

        Ok(PromoteWaitlistResult { offered })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemoryEventPublisher, InMemoryEventRepository};
    use crate::adapters::notify::TracingNotifier;
    use crate::domain::event::{AttendeeRecord, Event};

    fn user(id: &str) -> UserId {
        UserId::new(id).unwrap()
    }

    async fn fixture(
        event: Event,
    ) -> (
        PromoteWaitlistHandler,
        Arc<InMemoryEventRepository>,
        Arc<InMemoryEventPublisher>,
    ) {
        let repository = Arc::new(InMemoryEventRepository::new());
        repository.insert(&event).await.unwrap();
        let publisher = Arc::new(InMemoryEventPublisher::new());
        let handler = PromoteWaitlistHandler::new(
            repository.clone(),
            publisher.clone(),
            Arc::new(TracingNotifier::new()),
            24,
        );
        (handler, repository, publisher)
    }

    #[tokio::test]
    async fn extends_offers_for_free_capacity() {
        let now = Timestamp::now();
        let mut event = Event::free(EventId::new(), "Rust Meetup", 2, now).unwrap();
        event.admit(AttendeeRecord::free(user("a1"), now), now);
        event.admit(AttendeeRecord::free(user("a2"), now), now);
        event.join_waitlist(user("w1"), now).unwrap();
        event.join_waitlist(user("w2"), now).unwrap();
        event.join_waitlist(user("w3"), now).unwrap();
        // Two attendees leave without inline offers.
        event.release(&user("a1"), now);
        event.release(&user("a2"), now);
        let event_id = event.id;
        let (handler, _repository, publisher) = fixture(event).await;

        let result = handler
            .handle(PromoteWaitlistCommand { event_id })
            .await
            .unwrap();

        assert_eq!(result.offered, vec![user("w1"), user("w2")]);
        assert_eq!(publisher.published().len(), 2);
    }

    #[tokio::test]
    async fn pass_is_a_no_op_when_everyone_holds_an_offer() {
        let now = Timestamp::now();
        let mut event = Event::free(EventId::new(), "Rust Meetup", 1, now).unwrap();
        event.admit(AttendeeRecord::free(user("a1"), now), now);
        event.join_waitlist(user("w1"), now).unwrap();
        event.release(&user("a1"), now);
        event.extend_offers(1, now, 24);
        let event_id = event.id;
        let (handler, _repository, publisher) = fixture(event).await;

        let result = handler
            .handle(PromoteWaitlistCommand { event_id })
            .await
            .unwrap();

        assert!(result.offered.is_empty());
        assert!(publisher.published().is_empty());
    }

    #[tokio::test]
    async fn empty_waitlist_is_a_no_op() {
        let event = Event::free(EventId::new(), "Rust Meetup", 1, Timestamp::now()).unwrap();
        let event_id = event.id;
        let (handler, _repository, publisher) = fixture(event).await;

        let result = handler
            .handle(PromoteWaitlistCommand { event_id })
            .await
            .unwrap();

        assert!(result.offered.is_empty());
        assert!(publisher.published().is_empty());
    }
}
