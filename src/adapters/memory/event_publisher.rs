//! In-memory event publisher for testing.
//!
//! Captures published envelopes for assertions instead of delivering them
//! anywhere.
//!
//! # Security Note
//!
//! This adapter is for **testing only** and should not be used in production.
//! It uses `.expect()` on lock operations which will panic if locks are poisoned.

use async_trait::async_trait;
use std::sync::RwLock;

use crate::domain::foundation::{DomainError, EventEnvelope};
use crate::ports::EventPublisher;

/// In-memory event publisher for testing.
///
/// # Panics
///
/// Methods may panic if internal locks are poisoned. This is acceptable
/// for test code but this adapter should NOT be used in production.
pub struct InMemoryEventPublisher {
    published: RwLock<Vec<EventEnvelope>>,
}

impl InMemoryEventPublisher {
    /// Creates a new empty publisher.
    pub fn new() -> Self {
        Self {
            published: RwLock::new(Vec::new()),
        }
    }

    /// Returns all published events (for test assertions).
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn published(&self) -> Vec<EventEnvelope> {
        self.published
            .read()
            .expect("InMemoryEventPublisher: published lock poisoned")
            .clone()
    }

    /// Returns events of a specific type.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn events_of_type(&self, event_type: &str) -> Vec<EventEnvelope> {
        self.published()
            .into_iter()
            .filter(|e| e.event_type == event_type)
            .collect()
    }

    /// Checks if a specific event type was published.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn has_event(&self, event_type: &str) -> bool {
        self.published()
            .iter()
            .any(|e| e.event_type == event_type)
    }

    /// Clears all published events (for test isolation).
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn clear(&self) {
        self.published
            .write()
            .expect("InMemoryEventPublisher: published write lock poisoned")
            .clear();
    }
}

impl Default for InMemoryEventPublisher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventPublisher {
    async fn publish(&self, event: EventEnvelope) -> Result<(), DomainError> {
        self.published
            .write()
            .expect("InMemoryEventPublisher: published write lock poisoned")
            .push(event);
        Ok(())
    }

    async fn publish_all(&self, events: Vec<EventEnvelope>) -> Result<(), DomainError> {
        let mut published = self
            .published
            .write()
            .expect("InMemoryEventPublisher: published write lock poisoned");
        published.extend(events);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn envelope(event_type: &str) -> EventEnvelope {
        EventEnvelope::new(event_type, "agg-1", "Event", json!({}))
    }

    #[tokio::test]
    async fn publish_captures_envelope() {
        let publisher = InMemoryEventPublisher::new();

        publisher.publish(envelope("test.event.v1")).await.unwrap();

        assert_eq!(publisher.published().len(), 1);
        assert!(publisher.has_event("test.event.v1"));
    }

    #[tokio::test]
    async fn publish_all_preserves_order() {
        let publisher = InMemoryEventPublisher::new();

        publisher
            .publish_all(vec![envelope("type.a.v1"), envelope("type.b.v1")])
            .await
            .unwrap();

        let types: Vec<String> = publisher
            .published()
            .iter()
            .map(|e| e.event_type.clone())
            .collect();
        assert_eq!(types, vec!["type.a.v1", "type.b.v1"]);
    }

    #[tokio::test]
    async fn events_of_type_filters() {
        let publisher = InMemoryEventPublisher::new();

        publisher.publish(envelope("type.a.v1")).await.unwrap();
        publisher.publish(envelope("type.b.v1")).await.unwrap();
        publisher.publish(envelope("type.a.v1")).await.unwrap();

        assert_eq!(publisher.events_of_type("type.a.v1").len(), 2);
    }

    #[tokio::test]
    async fn clear_removes_all_events() {
        let publisher = InMemoryEventPublisher::new();
        publisher.publish(envelope("type.a.v1")).await.unwrap();

        publisher.clear();

        assert!(publisher.published().is_empty());
    }
}
