//! Event repository port (write side).
//!
//! Defines the contract for persisting and retrieving Event aggregates.
//!
//! # Design
//!
//! - **Single consistency boundary**: the whole aggregate is written in one
//!   operation
//! - **Optimistic locking**: `update` is a compare-and-swap on the aggregate
//!   version; concurrent writers lose with `VersionConflict` and must reload
//! - **Reference lookup**: payment callbacks only carry a gateway reference,
//!   so the repository can resolve an event from one

use crate::domain::event::Event;
use crate::domain::foundation::{DomainError, EventId};
use async_trait::async_trait;

/// Repository port for Event aggregate persistence.
///
/// Implementations must ensure:
/// - Unique event ID constraint on insert
/// - Version check-and-bump on update (the stored aggregate is persisted
///   with `version + 1` only if the stored version equals `event.version`)
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Insert a new event.
    ///
    /// # Errors
    ///
    /// - `EventExists` if an event with this ID already exists
    /// - `DatabaseError` on persistence failure
    async fn insert(&self, event: &Event) -> Result<(), DomainError>;

    /// Find an event by its ID.
    ///
    /// Returns `None` if not found.
    async fn find_by_id(&self, id: &EventId) -> Result<Option<Event>, DomainError>;

    /// Find the event holding a payment intent with the given gateway
    /// reference.
    ///
    /// Used by the payment reconciler, whose callbacks identify a payment
    /// but not an event. Returns `None` if no event holds the reference.
    async fn find_by_payment_reference(
        &self,
        reference: &str,
    ) -> Result<Option<Event>, DomainError>;

    /// Update an existing event with a version check.
    ///
    /// # Errors
    ///
    /// - `EventNotFound` if the event doesn't exist
    /// - `VersionConflict` if the stored version differs from
    ///   `event.version`; the caller should reload and retry
    /// - `DatabaseError` on persistence failure
    async fn update(&self, event: &Event) -> Result<(), DomainError>;

    /// Delete an event (primarily for testing).
    ///
    /// In production, events transition to Cancelled rather than being deleted.
    async fn delete(&self, id: &EventId) -> Result<(), DomainError>;
}
