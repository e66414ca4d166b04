//! RegisterHandler - Command handler for registering a user for an event.

use std::sync::Arc;

use tracing::warn;

use crate::application::handlers::MAX_UPDATE_ATTEMPTS;
use crate::domain::event::{
    AdmitOutcome, AttendeeRecord, Event, RegistrationError, RegistrationEvent,
};
use crate::domain::foundation::{
    DomainEventId, ErrorCode, EventId, SerializableDomainEvent, Timestamp, UserId,
};
use crate::ports::{
    EventPublisher, EventRepository, Notification, NotificationDispatcher, NotificationKind,
    UserDirectory,
};

/// Command to register a user for an event.
#[derive(Debug, Clone)]
pub struct RegisterCommand {
    pub event_id: EventId,
    pub user_id: UserId,
}

/// Outcome of a registration attempt.
#[derive(Debug, Clone)]
pub enum RegisterOutcome {
    /// Free event: the slot is held and the registration is active.
    Confirmed { event: Event },

    /// Paid event: no slot is held yet. The caller must create a payment
    /// intent and complete payment; confirmation seats the registration.
    PaymentRequired { amount_minor: i64, currency: String },
}

/// Handler for direct event registration.
///
/// Free events are seated immediately. Paid events only return a payment
/// directive here; the payment reconciler seats them at confirmation.
pub struct RegisterHandler {
    repository: Arc<dyn EventRepository>,
    user_directory: Arc<dyn UserDirectory>,
    event_publisher: Arc<dyn EventPublisher>,
    notifier: Arc<dyn NotificationDispatcher>,
}

impl RegisterHandler {
    pub fn new(
        repository: Arc<dyn EventRepository>,
        user_directory: Arc<dyn UserDirectory>,
        event_publisher: Arc<dyn EventPublisher>,
        notifier: Arc<dyn NotificationDispatcher>,
    ) -> Self {
        Self {
            repository,
            user_directory,
            event_publisher,
            notifier,
        }
    }

    pub async fn handle(&self, cmd: RegisterCommand) -> Result<RegisterOutcome, RegistrationError> {
        // 1. Validate the user exists before touching event state
        if self
            .user_directory
            .find_user(&cmd.user_id)
            .await?
            .is_none()
        {
            return Err(RegistrationError::user_not_found(cmd.user_id));
        }

        // 2. Load-mutate-commit with optimistic retries
        let mut attempts = 0;
        let committed = loop {
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
            if event.active_attendee(&cmd.user_id).is_some() {
                return Err(RegistrationError::already_registered(cmd.user_id));
            }

            // Paid events hold no slot until payment confirmation.
            if event.is_paid {
                if event.is_full() {
                    return Err(RegistrationError::event_full(true));
                }
                return Ok(RegisterOutcome::PaymentRequired {
                    amount_minor: event.price_minor,
                    currency: event.currency.clone(),
                });
            }

            let now = Timestamp::now();
            match event.admit(AttendeeRecord::free(cmd.user_id.clone(), now), now) {
                AdmitOutcome::Admitted => {}
                AdmitOutcome::Full => return Err(RegistrationError::event_full(true)),
                AdmitOutcome::AlreadyAdmitted => {
                    return Err(RegistrationError::already_registered(cmd.user_id))
                }
            }

            match self.repository.update(&event).await {
                Ok(()) => break event,
                Err(e) if e.code == ErrorCode::VersionConflict && attempts < MAX_UPDATE_ATTEMPTS => {
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
        };

        // 3. Publish and notify after the commit
        let domain_event = RegistrationEvent::RegistrationConfirmed {
            id: DomainEventId::new(),
            event_id: cmd.event_id,
            user_id: cmd.user_id.clone(),
            payment_reference: None,
            occurred_at: Timestamp::now(),
        };
        self.event_publisher
            .publish(domain_event.to_envelope())
            .await?;

        if let Err(e) = self
            .notifier
            .notify(Notification::new(
                cmd.user_id.clone(),
                cmd.event_id,
                NotificationKind::RegistrationConfirmed,
            ))
            .await
        {
            warn!(user_id = %cmd.user_id, event_id = %cmd.event_id, error = %e,
                "confirmation notification failed");
        }

        Ok(RegisterOutcome::Confirmed { event: committed })
    }
}
