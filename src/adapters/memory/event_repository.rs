//! In-memory event repository for testing.
//!
//! Provides deterministic, lock-based persistence for unit tests, including
//! the same version check-and-bump behavior a database-backed adapter gives
//! the command handlers.
//!
//! # Security Note
//!
//! This adapter is for **testing only** and should not be used in production.
//! It uses `.expect()` on lock operations which will panic if locks are poisoned.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::domain::event::Event;
use crate::domain::foundation::{DomainError, ErrorCode, EventId};
use crate::ports::EventRepository;

/// In-memory repository for Event aggregates.
///
/// Stores full aggregate clones keyed by event ID. `update` is a
/// compare-and-swap on the aggregate version, so concurrency tests exercise
/// the same retry paths a real store would.
///
/// # Panics
///
/// Methods may panic if internal locks are poisoned. This is acceptable
/// for test code but this adapter should NOT be used in production.
pub struct InMemoryEventRepository {
    events: RwLock<HashMap<EventId, Event>>,
}

impl InMemoryEventRepository {
    /// Creates a new empty repository.
    pub fn new() -> Self {
        Self {
            events: RwLock::new(HashMap::new()),
        }
    }

    /// Returns count of stored events (for test assertions).
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn event_count(&self) -> usize {
        self.events
            .read()
            .expect("InMemoryEventRepository: events lock poisoned")
            .len()
    }
}

impl Default for InMemoryEventRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventRepository for InMemoryEventRepository {
    async fn insert(&self, event: &Event) -> Result<(), DomainError> {
        let mut events = self
            .events
            .write()
            .expect("InMemoryEventRepository: events write lock poisoned");

        if events.contains_key(&event.id) {
            return Err(DomainError::new(
                ErrorCode::EventExists,
                format!("Event {} already exists", event.id),
            ));
        }

        events.insert(event.id, event.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &EventId) -> Result<Option<Event>, DomainError> {
        let events = self
            .events
            .read()
            .expect("InMemoryEventRepository: events lock poisoned");
        Ok(events.get(id).cloned())
    }

    async fn find_by_payment_reference(
        &self,
        reference: &str,
    ) -> Result<Option<Event>, DomainError> {
        let events = self
            .events
            .read()
            .expect("InMemoryEventRepository: events lock poisoned");
        Ok(events
            .values()
            .find(|e| e.intent_by_reference(reference).is_some())
            .cloned())
    }

    async fn update(&self, event: &Event) -> Result<(), DomainError> {
        let mut events = self
            .events
            .write()
            .expect("InMemoryEventRepository: events write lock poisoned");

        let stored = events.get_mut(&event.id).ok_or_else(|| {
            DomainError::new(
                ErrorCode::EventNotFound,
                format!("Event {} not found", event.id),
            )
        })?;

        if stored.version != event.version {
            return Err(DomainError::new(
                ErrorCode::VersionConflict,
                format!(
                    "Event {} version mismatch: stored {} vs submitted {}",
                    event.id, stored.version, event.version
                ),
            ));
        }

        let mut updated = event.clone();
        updated.version += 1;
        *stored = updated;
        Ok(())
    }

    async fn delete(&self, id: &EventId) -> Result<(), DomainError> {
        let mut events = self
            .events
            .write()
            .expect("InMemoryEventRepository: events write lock poisoned");
        events.remove(id);
        Ok(())
    }
}
