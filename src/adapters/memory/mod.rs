//! In-memory adapter implementations for testing.
//!
//! Deterministic, lock-based implementations of the persistence and
//! messaging ports. Handler unit tests and integration tests run against
//! these instead of external infrastructure.

mod event_publisher;
mod event_repository;
mod user_directory;

pub use event_publisher::InMemoryEventPublisher;
pub use event_repository::InMemoryEventRepository;
pub use user_directory::InMemoryUserDirectory;
