//! IssueTokenHandler - Command handler for issuing a check-in token.

use std::sync::Arc;

use crate::application::handlers::MAX_UPDATE_ATTEMPTS;
use crate::domain::event::{CheckInPayload, RegistrationError};
use crate::domain::foundation::{ErrorCode, EventId, Timestamp, UserId};
use crate::ports::EventRepository;

/// Command to issue a check-in token.
#[derive(Debug, Clone)]
pub struct IssueTokenCommand {
    pub event_id: EventId,
    pub user_id: UserId,
}

/// Result of token issuance.
#[derive(Debug, Clone)]
pub struct IssueTokenResult {
    /// Full payload, ready to render as a scannable code.
    pub payload: CheckInPayload,

    /// The payload in its encoded wire form.
    pub encoded: String,
}

/// Handler for check-in token issuance.
///
/// Re-issuing replaces any unused token the attendee holds, so a lost
/// ticket is revoked the moment a new one is generated.
pub struct IssueTokenHandler {
    repository: Arc<dyn EventRepository>,
}

impl IssueTokenHandler {
    pub fn new(repository: Arc<dyn EventRepository>) -> Self {
        Self { repository }
    }

    pub async fn handle(&self, cmd: IssueTokenCommand) -> Result<IssueTokenResult, RegistrationError> {
        let mut attempts = 0;
        let token = loop {
            attempts += 1;

            let mut event = self
                .repository
                .find_by_id(&cmd.event_id)
                .await?
                .ok_or(RegistrationError::EventNotFound(cmd.event_id))?;

            if !event.status.accepts_check_in() {
                return Err(RegistrationError::event_closed(
                    cmd.event_id,
                    event.status.display_name(),
                ));
            }

            let now = Timestamp::now();
            let token = event.issue_token(&cmd.user_id, now)?;

            match self.repository.update(&event).await {
                Ok(()) => break token,
                Err(e) if e.code == ErrorCode::VersionConflict && attempts < MAX_UPDATE_ATTEMPTS => {
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
        };

        let payload = CheckInPayload {
            event_id: cmd.event_id,
            user_id: cmd.user_id,
            token: token.value,
            issued_at: token.issued_at,
        };
        let encoded = payload.encode();

        Ok(IssueTokenResult { payload, encoded })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryEventRepository;
    use crate::domain::event::{AttendeeRecord, Event, EventStatus};

    fn user(id: &str) -> UserId {
        UserId::new(id).unwrap()
    }

    async fn fixture(event: Event) -> (IssueTokenHandler, Arc<InMemoryEventRepository>) {
        let repository = Arc::new(InMemoryEventRepository::new());
        repository.insert(&event).await.unwrap();
        (IssueTokenHandler::new(repository.clone()), repository)
    }

    fn event_with_attendee(user_id: &str) -> Event {
        let now = Timestamp::now();
        let mut event = Event::free(EventId::new(), "Rust Meetup", 5, now).unwrap();
        event.admit(AttendeeRecord::free(user(user_id), now), now);
        event
    }

    #[tokio::test]
    async fn issues_encodable_token_for_attendee() {
        let event = event_with_attendee("alice");
        let event_id = event.id;
        let (handler, repository) = fixture(event).await;

        let result = handler
            .handle(IssueTokenCommand {
                event_id,
                user_id: user("alice"),
            })
            .await
            .unwrap();

        assert_eq!(result.payload.event_id, event_id);
        assert_eq!(result.payload.token.len(), 64);

        let decoded = CheckInPayload::decode(&result.encoded).unwrap();
        assert_eq!(decoded, result.payload);

        let stored = repository.find_by_id(&event_id).await.unwrap().unwrap();
        assert_eq!(
            stored.latest_token(&user("alice")).unwrap().value,
            result.payload.token
        );
    }

    #[tokio::test]
    async fn reissue_returns_a_different_token() {
        let event = event_with_attendee("alice");
        let event_id = event.id;
        let (handler, _repository) = fixture(event).await;

        let first = handler
            .handle(IssueTokenCommand {
                event_id,
                user_id: user("alice"),
            })
            .await
            .unwrap();
        let second = handler
            .handle(IssueTokenCommand {
                event_id,
                user_id: user("alice"),
            })
            .await
            .unwrap();

        assert_ne!(first.payload.token, second.payload.token);
    }

    #[tokio::test]
    async fn rejects_non_attendee() {
        let event = event_with_attendee("alice");
        let event_id = event.id;
        let (handler, _repository) = fixture(event).await;

        let err = handler
            .handle(IssueTokenCommand {
                event_id,
                user_id: user("bob"),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, RegistrationError::NotRegistered(_)));
    }

    #[tokio::test]
    async fn rejects_completed_event() {
        let mut event = event_with_attendee("alice");
        event.status = EventStatus::Completed;
        let event_id = event.id;
        let (handler, _repository) = fixture(event).await;

        let err = handler
            .handle(IssueTokenCommand {
                event_id,
                user_id: user("alice"),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, RegistrationError::EventClosed { .. }));
    }
}
