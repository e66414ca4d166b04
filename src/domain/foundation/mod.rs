//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, error types, and the domain-event
//! infrastructure that form the vocabulary of the Gatherly domain.

mod errors;
mod events;
mod ids;
mod timestamp;

pub use errors::{DomainError, ErrorCode, ValidationError};
pub use events::{
    DomainEvent, DomainEventId, EventEnvelope, EventMetadata, SerializableDomainEvent,
};
pub use ids::{EventId, UserId};
pub use timestamp::Timestamp;
