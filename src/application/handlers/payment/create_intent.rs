//! CreatePaymentIntentHandler - Command handler for starting a ticket payment.

use std::sync::Arc;

use crate::application::handlers::MAX_UPDATE_ATTEMPTS;
use crate::domain::event::{PaymentIntentRecord, RegistrationError, RegistrationEvent};
use crate::domain::foundation::{
    DomainEventId, ErrorCode, EventId, SerializableDomainEvent, Timestamp, UserId,
};
use crate::ports::{
    CreateIntentRequest, EventPublisher, EventRepository, PaymentGateway, UserDirectory,
};

/// Command to create a payment intent for a paid event.
#[derive(Debug, Clone)]
pub struct CreatePaymentIntentCommand {
    pub event_id: EventId,
    pub user_id: UserId,
}

/// Result of intent creation.
#[derive(Debug, Clone)]
pub struct CreatePaymentIntentResult {
    /// Gateway reference of the intent.
    pub reference: String,

    /// Client secret for completing the payment.
    pub client_secret: String,

    pub amount_minor: i64,
    pub currency: String,

    /// True when an existing open intent was returned instead of a new one.
    pub reused: bool,
}

/// Handler for payment intent creation.
///
/// Idempotent per (event, user): an open intent is returned as-is, so a
/// double-submitted checkout never charges twice. The gateway call happens
/// before any aggregate mutation; the mirror record is committed after.
pub struct CreatePaymentIntentHandler {
    repository: Arc<dyn EventRepository>,
    user_directory: Arc<dyn UserDirectory>,
    gateway: Arc<dyn PaymentGateway>,
    event_publisher: Arc<dyn EventPublisher>,
}

impl CreatePaymentIntentHandler {
    pub fn new(
        repository: Arc<dyn EventRepository>,
        user_directory: Arc<dyn UserDirectory>,
        gateway: Arc<dyn PaymentGateway>,
        event_publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            repository,
            user_directory,
            gateway,
            event_publisher,
        }
    }

    pub async fn handle(
        &self,
        cmd: CreatePaymentIntentCommand,
    ) -> Result<CreatePaymentIntentResult, RegistrationError> {
        // 1. Validate the user exists
        if self
            .user_directory
            .find_user(&cmd.user_id)
            .await?
            .is_none()
        {
            return Err(RegistrationError::user_not_found(cmd.user_id));
        }

        // 2. Validate event state and check for an existing open intent
        let event = self
            .repository
            .find_by_id(&cmd.event_id)
            .await?
            .ok_or(RegistrationError::EventNotFound(cmd.event_id))?;

        if !event.is_paid {
            return Err(RegistrationError::payment_not_required(cmd.event_id));
        }
        if !event.status.accepts_registrations() {
            return Err(RegistrationError::event_closed(
                cmd.event_id,
                event.status.display_name(),
            ));
        }
        if event.active_attendee(&cmd.user_id).is_some() {
            return Err(RegistrationError::already_registered(cmd.user_id));
        }
        if event.is_full() {
            return Err(RegistrationError::event_full(true));
        }

        if let Some(existing) = event.open_intent(&cmd.user_id) {
            return Ok(CreatePaymentIntentResult {
                reference: existing.reference.clone(),
                client_secret: existing.client_secret.clone(),
                amount_minor: existing.amount_minor,
                currency: existing.currency.clone(),
                reused: true,
            });
        }

        // 3. Register the intent with the gateway (outside the commit loop)
        let intent = self
            .gateway
            .create_intent(CreateIntentRequest {
                event_id: cmd.event_id,
                user_id: cmd.user_id.clone(),
                amount_minor: event.price_minor,
                currency: event.currency.clone(),
                idempotency_key: Some(format!("intent-{}-{}", cmd.event_id, cmd.user_id)),
            })
            .await?;

        // 4. Record the mirror with optimistic retries
        let mut attempts = 0;
        let created_at = loop {
            attempts += 1;

            let mut event = self
                .repository
                .find_by_id(&cmd.event_id)
                .await?
                .ok_or(RegistrationError::EventNotFound(cmd.event_id))?;

            // Lost the race against a parallel submit: keep the winner's intent.
            if let Some(existing) = event.open_intent(&cmd.user_id) {
                return Ok(CreatePaymentIntentResult {
                    reference: existing.reference.clone(),
                    client_secret: existing.client_secret.clone(),
                    amount_minor: existing.amount_minor,
                    currency: existing.currency.clone(),
                    reused: true,
                });
            }

            let now = Timestamp::now();
            event.record_intent(
                PaymentIntentRecord::new(
                    cmd.user_id.clone(),
                    intent.reference.clone(),
                    intent.client_secret.clone(),
                    intent.amount_minor,
                    intent.currency.clone(),
                    now,
                ),
                now,
            );

            match self.repository.update(&event).await {
                Ok(()) => break now,
                Err(e) if e.code == ErrorCode::VersionConflict && attempts < MAX_UPDATE_ATTEMPTS => {
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
        };

        // 5. Publish after the commit
        let domain_event = RegistrationEvent::PaymentIntentCreated {
            id: DomainEventId::new(),
            event_id: cmd.event_id,
            user_id: cmd.user_id,
            reference: intent.reference.clone(),
            amount_minor: intent.amount_minor,
            currency: intent.currency.clone(),
            occurred_at: created_at,
        };
        self.event_publisher
            .publish(domain_event.to_envelope())
            .await?;

        Ok(CreatePaymentIntentResult {
            reference: intent.reference,
            client_secret: intent.client_secret,
            amount_minor: intent.amount_minor,
            currency: intent.currency,
            reused: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::gateway::MockPaymentGateway;
    use crate::adapters::memory::{
        InMemoryEventPublisher, InMemoryEventRepository, InMemoryUserDirectory,
    };
    use crate::domain::event::Event;

    fn user(id: &str) -> UserId {
        UserId::new(id).unwrap()
    }

    struct Fixture {
        handler: CreatePaymentIntentHandler,
        gateway: Arc<MockPaymentGateway>,
        publisher: Arc<InMemoryEventPublisher>,
    }

    async fn fixture(event: Event, users: &[&str]) -> Fixture {
        let repository = Arc::new(InMemoryEventRepository::new());
        repository.insert(&event).await.unwrap();

        let directory = Arc::new(InMemoryUserDirectory::new());
        for id in users {
            directory.add_user(user(id), format!("{}@example.com", id));
        }

        let gateway = Arc::new(MockPaymentGateway::new());
        let publisher = Arc::new(InMemoryEventPublisher::new());
        let handler = CreatePaymentIntentHandler::new(
            repository,
            directory,
            gateway.clone(),
            publisher.clone(),
        );
        Fixture {
            handler,
            gateway,
            publisher,
        }
    }

    fn paid_event(capacity: u32) -> Event {
        Event::paid(
            EventId::new(),
            "RustConf",
            capacity,
            50_00,
            "usd",
            Timestamp::now(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn creates_intent_and_records_mirror() {
        let event = paid_event(10);
        let event_id = event.id;
        let f = fixture(event, &["alice"]).await;

        let result = f
            .handler
            .handle(CreatePaymentIntentCommand {
                event_id,
                user_id: user("alice"),
            })
            .await
            .unwrap();

        assert!(!result.reused);
        assert_eq!(result.amount_minor, 50_00);
        assert_eq!(f.gateway.created_intents(), 1);
        assert_eq!(
            f.publisher.published()[0].event_type,
            "payment.intent_created.v1"
        );
    }

    #[tokio::test]
    async fn second_call_reuses_open_intent_without_gateway_call() {
        let event = paid_event(10);
        let event_id = event.id;
        let f = fixture(event, &["alice"]).await;

        let first = f
            .handler
            .handle(CreatePaymentIntentCommand {
                event_id,
                user_id: user("alice"),
            })
            .await
            .unwrap();
        let second = f
            .handler
            .handle(CreatePaymentIntentCommand {
                event_id,
                user_id: user("alice"),
            })
            .await
            .unwrap();

        assert!(second.reused);
        assert_eq!(first.reference, second.reference);
        assert_eq!(f.gateway.created_intents(), 1);
        assert_eq!(f.publisher.published().len(), 1);
    }

    #[tokio::test]
    async fn free_event_rejects_intent_creation() {
        let event = Event::free(EventId::new(), "Rust Meetup", 10, Timestamp::now()).unwrap();
        let event_id = event.id;
        let f = fixture(event, &["alice"]).await;

        let err = f
            .handler
            .handle(CreatePaymentIntentCommand {
                event_id,
                user_id: user("alice"),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, RegistrationError::PaymentNotRequired(_)));
    }

    #[tokio::test]
    async fn full_event_rejects_intent_creation() {
        let mut event = paid_event(1);
        let now = Timestamp::now();
        event.admit(
            crate::domain::event::AttendeeRecord::paid(user("bob"), "pi_0".to_string(), now),
            now,
        );
        let event_id = event.id;
        let f = fixture(event, &["alice"]).await;

        let err = f
            .handler
            .handle(CreatePaymentIntentCommand {
                event_id,
                user_id: user("alice"),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, RegistrationError::EventFull { .. }));
        assert_eq!(f.gateway.created_intents(), 0);
    }

    #[tokio::test]
    async fn gateway_failure_propagates() {
        let event = paid_event(10);
        let event_id = event.id;
        let f = fixture(event, &["alice"]).await;
        f.gateway.fail_next_create("gateway down");

        let err = f
            .handler
            .handle(CreatePaymentIntentCommand {
                event_id,
                user_id: user("alice"),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, RegistrationError::GatewayFailed { .. }));
        assert!(f.publisher.published().is_empty());
    }
}
