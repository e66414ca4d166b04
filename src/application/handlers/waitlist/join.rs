//! JoinWaitlistHandler - Command handler for joining a full event's waitlist.

use std::sync::Arc;

use crate::application::handlers::MAX_UPDATE_ATTEMPTS;
use crate::domain::event::{RegistrationError, RegistrationEvent};
use crate::domain::foundation::{
    DomainEventId, ErrorCode, EventId, SerializableDomainEvent, Timestamp, UserId,
};
use crate::ports::{EventPublisher, EventRepository, UserDirectory};

/// Command to join a waitlist.
#[derive(Debug, Clone)]
pub struct JoinWaitlistCommand {
    pub event_id: EventId,
    pub user_id: UserId,
}

/// Result of joining a waitlist.
#[derive(Debug, Clone)]
pub struct JoinWaitlistResult {
    /// 1-based queue position at join time.
    pub position: u32,
}

/// Handler for waitlist joins.
///
/// Joining is only accepted while the event is full; a freed slot always
/// flows through promotion rather than a racing direct registration.
pub struct JoinWaitlistHandler {
    repository: Arc<dyn EventRepository>,
    user_directory: Arc<dyn UserDirectory>,
    event_publisher: Arc<dyn EventPublisher>,
}

impl JoinWaitlistHandler {
    pub fn new(
        repository: Arc<dyn EventRepository>,
        user_directory: Arc<dyn UserDirectory>,
        event_publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            repository,
            user_directory,
            event_publisher,
        }
    }

    pub async fn handle(
        &self,
        cmd: JoinWaitlistCommand,
    ) -> Result<JoinWaitlistResult, RegistrationError> {
        // 1. Validate the user exists
        if self
            .user_directory
            .find_user(&cmd.user_id)
            .await?
            .is_none()
        {
            return Err(RegistrationError::user_not_found(cmd.user_id));
        }

        // 2. Append to the queue with optimistic retries
        let mut attempts = 0;
        let (position, joined_at) = loop {
            attempts += 1;

            let mut event = self
                .repository
                .find_by_id(&cmd.event_id)
                .await?
                .ok_or(RegistrationError::EventNotFound(cmd.event_id))?;

            if !event.status.accepts_registrations() {
                return Err(RegistrationError::event_closed(
                    cmd.event_id,
                    event.status.display_name(),
                ));
            }

            let now = Timestamp::now();
            let position = event.join_waitlist(cmd.user_id.clone(), now)?;

            match self.repository.update(&event).await {
                Ok(()) => break (position, now),
                Err(e) if e.code == ErrorCode::VersionConflict && attempts < MAX_UPDATE_ATTEMPTS => {
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
        };

        // 3. Publish after the commit
        let domain_event = RegistrationEvent::WaitlistJoined {
            id: DomainEventId::new(),
            event_id: cmd.event_id,
            user_id: cmd.user_id,
            position,
            occurred_at: joined_at,
        };
        self.event_publisher
            .publish(domain_event.to_envelope())
            .await?;

        Ok(JoinWaitlistResult { position })
    }
}
