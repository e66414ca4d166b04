//! LeaveWaitlistHandler - Command handler for leaving a waitlist.

use std::sync::Arc;

use crate::application::handlers::MAX_UPDATE_ATTEMPTS;
use crate::domain::event::{RegistrationError, RegistrationEvent};
use crate::domain::foundation::{
    DomainEventId, ErrorCode, EventId, SerializableDomainEvent, Timestamp, UserId,
};
use crate::ports::{EventPublisher, EventRepository};

/// Command to leave a waitlist.
#[derive(Debug, Clone)]
pub struct LeaveWaitlistCommand {
    pub event_id: EventId,
    pub user_id: UserId,
}

/// Handler for voluntary waitlist departures.
///
/// Entries behind the departing user shift forward; any live offer the
/// user held simply lapses with their entry.
pub struct LeaveWaitlistHandler {
    repository: Arc<dyn EventRepository>,
    event_publisher: Arc<dyn EventPublisher>,
}

impl LeaveWaitlistHandler {
    pub fn new(
        repository: Arc<dyn EventRepository>,
        event_publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            repository,
            event_publisher,
        }
    }

    pub async fn handle(&self, cmd: LeaveWaitlistCommand) -> Result<(), RegistrationError> {
        // 1. Remove the entry with optimistic retries
        let mut attempts = 0;
        let left_at = loop {
            attempts += 1;

            let mut event = self
                .repository
                .find_by_id(&cmd.event_id)
                .await?
                .ok_or(RegistrationError::EventNotFound(cmd.event_id))?;

            let now = Timestamp::now();
            if !event.leave_waitlist(&cmd.user_id, now) {
                return Err(RegistrationError::not_waitlisted(cmd.user_id));
            }

            match self.repository.update(&event).await {
                Ok(()) => break now,
                Err(e) if e.code == ErrorCode::VersionConflict && attempts < MAX_UPDATE_ATTEMPTS => {
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
        };

        // 2. Publish after the commit
        let domain_event = RegistrationEvent::WaitlistLeft {
            id: DomainEventId::new(),
            event_id: cmd.event_id,
            user_id: cmd.user_id,
            occurred_at: left_at,
        };
        self.event_publisher
            .publish(domain_event.to_envelope())
            .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemoryEventPublisher, InMemoryEventRepository};
    use crate::domain::event::{AttendeeRecord, Event};

    fn user(id: &str) -> UserId {
        UserId::new(id).unwrap()
    }

    async fn fixture(
        event: Event,
    ) -> (
        LeaveWaitlistHandler,
        Arc<InMemoryEventRepository>,
        Arc<InMemoryEventPublisher>,
    ) {
        let repository = Arc::new(InMemoryEventRepository::new());
        repository.insert(&event).await.unwrap();
        let publisher = Arc::new(InMemoryEventPublisher::new());
        let handler = LeaveWaitlistHandler::new(repository.clone(), publisher.clone());
        (handler, repository, publisher)
    }

    fn full_event_with_waitlist(waiting: &[&str]) -> Event {
        let now = Timestamp::now();
        let mut event = Event::free(EventId::new(), "Rust Meetup", 1, now).unwrap();
        event.admit(AttendeeRecord::free(user("alice"), now), now);
        for w in waiting {
            event.join_waitlist(user(w), now).unwrap();
        }
        event
    }

    #[tokio::test]
    async fn leaving_shifts_later_entries_forward() {
        let event = full_event_with_waitlist(&["bob", "carol"]);
        let event_id = event.id;
        let (handler, repository, publisher) = fixture(event).await;

        handler
            .handle(LeaveWaitlistCommand {
                event_id,
                user_id: user("bob"),
            })
            .await
            .unwrap();

        let stored = repository.find_by_id(&event_id).await.unwrap().unwrap();
        assert_eq!(stored.waitlist_position(&user("carol")), Some(1));
        assert_eq!(publisher.published()[0].event_type, "waitlist.left.v1");
    }

    #[tokio::test]
    async fn rejects_user_not_on_waitlist() {
        let event = full_event_with_waitlist(&["bob"]);
        let event_id = event.id;
        let (handler, _repository, _publisher) = fixture(event).await;

        let err = handler
            .handle(LeaveWaitlistCommand {
                event_id,
                user_id: user("carol"),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, RegistrationError::NotWaitlisted(_)));
    }
}
