//! CreateEventHandler - Command handler for creating a bookable event.

use std::sync::Arc;

use crate::domain::event::{Event, RegistrationError, RegistrationEvent};
use crate::domain::foundation::{DomainEventId, EventId, SerializableDomainEvent, Timestamp};
use crate::ports::{EventPublisher, EventRepository};

/// Command to create an event.
#[derive(Debug, Clone)]
pub struct CreateEventCommand {
    pub title: String,
    pub capacity: u32,
    /// Ticket price in minor units. `None` creates a free event.
    pub price_minor: Option<i64>,
    /// ISO 4217 currency code, required when `price_minor` is set.
    pub currency: Option<String>,
}

/// Result of successful event creation.
#[derive(Debug, Clone)]
pub struct CreateEventResult {
    pub event: Event,
}

/// Handler for creating events.
pub struct CreateEventHandler {
    repository: Arc<dyn EventRepository>,
    event_publisher: Arc<dyn EventPublisher>,
}

impl CreateEventHandler {
    pub fn new(
        repository: Arc<dyn EventRepository>,
        event_publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            repository,
            event_publisher,
        }
    }

    pub async fn handle(
        &self,
        cmd: CreateEventCommand,
    ) -> Result<CreateEventResult, RegistrationError> {
        let now = Timestamp::now();
        let event_id = EventId::new();

        // 1. Build and validate the aggregate
        let event = match cmd.price_minor {
            Some(price) => {
                let currency = cmd.currency.ok_or_else(|| {
                    RegistrationError::validation("currency", "required for a paid event")
                })?;
                Event::paid(event_id, cmd.title, cmd.capacity, price, currency, now)?
            }
            None => Event::free(event_id, cmd.title, cmd.capacity, now)?,
        };

        // 2. Persist
        self.repository.insert(&event).await?;

        // 3. Publish creation event
        let domain_event = RegistrationEvent::Created {
            id: DomainEventId::new(),
            event_id,
            title: event.title.clone(),
            capacity: event.capacity,
            is_paid: event.is_paid,
            occurred_at: now,
        };
        self.event_publisher
            .publish(domain_event.to_envelope())
            .await?;

        Ok(CreateEventResult { event })
    }
}
