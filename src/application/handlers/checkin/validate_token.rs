//! ValidateTokenHandler - Command handler for door-side token validation.

use std::sync::Arc;

use crate::application::handlers::MAX_UPDATE_ATTEMPTS;
use crate::domain::event::{CheckInPayload, RegistrationError, RegistrationEvent};
use crate::domain::foundation::{
    DomainEventId, ErrorCode, SerializableDomainEvent, Timestamp, UserId,
};
use crate::ports::{EventPublisher, EventRepository, UserDirectory};

/// Command to validate a scanned check-in payload.
#[derive(Debug, Clone)]
pub struct ValidateTokenCommand {
    /// The scanned payload in its encoded wire form.
    pub encoded: String,
}

/// Result of a successful check-in.
#[derive(Debug, Clone)]
pub struct ValidateTokenResult {
    pub user_id: UserId,
    pub checked_in_at: Timestamp,
}

/// Handler for check-in validation.
///
/// Token consumption and the attendee's check-in flag land in the same
/// versioned commit, so two door scanners racing on the same token admit
/// exactly one of them.
pub struct ValidateTokenHandler {
    repository: Arc<dyn EventRepository>,
    user_directory: Arc<dyn UserDirectory>,
    event_publisher: Arc<dyn EventPublisher>,
}

impl ValidateTokenHandler {
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
        cmd: ValidateTokenCommand,
    ) -> Result<ValidateTokenResult, RegistrationError> {
        // 1. Decode the payload
        let payload = CheckInPayload::decode(&cmd.encoded)
            .map_err(|e| RegistrationError::malformed_payload(e.to_string()))?;

        // 2. Verify the scanned user exists
        if self.user_directory.find_user(&payload.user_id).await?.is_none() {
            return Err(RegistrationError::user_not_found(payload.user_id));
        }

        // 3. Consume the token with optimistic retries
        let mut attempts = 0;
        let checked_in_at = loop {
            attempts += 1;

            let mut event = self
                .repository
                .find_by_id(&payload.event_id)
                .await?
                .ok_or(RegistrationError::EventNotFound(payload.event_id))?;

            if !event.status.accepts_check_in() {
                return Err(RegistrationError::event_closed(
                    payload.event_id,
                    event.status.display_name(),
                ));
            }

            let now = Timestamp::now();
            let checked_in_at = event.check_in(&payload.user_id, &payload.token, now)?;

            match self.repository.update(&event).await {
                Ok(()) => break checked_in_at,
                Err(e) if e.code == ErrorCode::VersionConflict && attempts < MAX_UPDATE_ATTEMPTS => {
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
        };

        // 4. Publish after the commit
        let domain_event = RegistrationEvent::CheckInCompleted {
            id: DomainEventId::new(),
            event_id: payload.event_id,
            user_id: payload.user_id.clone(),
            occurred_at: checked_in_at,
        };
        self.event_publisher
            .publish(domain_event.to_envelope())
            .await?;

        Ok(ValidateTokenResult {
            user_id: payload.user_id,
            checked_in_at,
        })
    }
}
