//! EventPublisher port - interface for publishing domain events.
//!
//! The domain publishes events without knowing the transport (in-memory
//! bus, message broker, outbox table).

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, EventEnvelope};

/// Port for publishing domain events.
///
/// Implementations must ensure:
/// - Events are delivered at-least-once (consumers may see duplicates and
///   deduplicate on the envelope's event ID)
/// - `publish_all` is atomic where the adapter supports it
/// - Errors are propagated to the caller
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish a single event envelope.
    async fn publish(&self, event: EventEnvelope) -> Result<(), DomainError>;

    /// Publish multiple events.
    ///
    /// All events are published or none are, where the adapter supports
    /// atomic publishing; otherwise sequential best-effort delivery.
    async fn publish_all(&self, events: Vec<EventEnvelope>) -> Result<(), DomainError>;
}
